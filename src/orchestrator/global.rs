/*!
 * Process-Wide Orchestrator
 *
 * One explicitly installed orchestrator per process. `init` must run before
 * `get` is useful, and `shutdown` must run before the process exits so the
 * timer cannot fire into a half torn-down process.
 */

use super::checks::CheckSuite;
use super::config::OrchestratorConfig;
use super::harness::TestOrchestrator;
use crate::core::errors::{OrchestratorError, OrchestratorResult};
use std::sync::OnceLock;
use tracing::warn;

static ORCHESTRATOR: OnceLock<TestOrchestrator> = OnceLock::new();

/// Start and install the process-wide orchestrator
pub fn init<S>(config: OrchestratorConfig, suite: S) -> OrchestratorResult<&'static TestOrchestrator>
where
    S: CheckSuite,
{
    if ORCHESTRATOR.get().is_some() {
        return Err(OrchestratorError::AlreadyInitialized);
    }

    let orchestrator = TestOrchestrator::start(config, suite)?;
    if let Err(loser) = ORCHESTRATOR.set(orchestrator) {
        // Lost a concurrent init race; do not leave a second batch armed
        if let Err(e) = loser.shutdown() {
            warn!(error = %e, "Failed to stop redundant orchestrator");
        }
        return Err(OrchestratorError::AlreadyInitialized);
    }

    ORCHESTRATOR.get().ok_or(OrchestratorError::AlreadyInitialized)
}

/// The installed orchestrator, if `init` has run
pub fn get() -> Option<&'static TestOrchestrator> {
    ORCHESTRATOR.get()
}

/// Stop the installed orchestrator; a no-op if none was installed
pub fn shutdown() -> OrchestratorResult<()> {
    match ORCHESTRATOR.get() {
        Some(orchestrator) => orchestrator.shutdown(),
        None => Ok(()),
    }
}
