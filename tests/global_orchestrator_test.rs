/*!
 * Process-Wide Orchestrator Tests
 *
 * Kept in its own test binary: the installed orchestrator lives for the
 * whole process.
 */

use crossthread_harness::orchestrator::global;
use crossthread_harness::{OrchestratorConfig, OrchestratorError};
use std::time::Duration;

#[test]
fn test_global_lifecycle() {
    assert!(global::get().is_none());
    // Shutdown without init is harmless
    global::shutdown().unwrap();

    let config = OrchestratorConfig::new().with_startup_delay(Duration::from_millis(20));
    let orchestrator = global::init(config, || 0).unwrap();
    assert!(global::get().is_some());

    let second = global::init(OrchestratorConfig::immediate(), || 1);
    assert!(matches!(second, Err(OrchestratorError::AlreadyInitialized)));

    assert_eq!(orchestrator.wait_for_completion(Duration::from_secs(2)), Some(0));
    global::shutdown().unwrap();
    assert!(!orchestrator.thread().is_running());
}
