/*!
 * Orchestrator Configuration
 */

use crate::core::limits::{DEFAULT_STARTUP_DELAY, ORCHESTRATOR_THREAD_NAME};
use crate::core::types::ShutdownPolicy;
use std::time::Duration;

/// Test orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay before the check batch starts (default: 500ms)
    pub startup_delay: Duration,

    /// Name of the orchestrator's owned thread
    pub thread_name: String,

    /// Fate of queued work when the orchestrator shuts down
    pub shutdown: ShutdownPolicy,
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self {
            startup_delay: DEFAULT_STARTUP_DELAY,
            thread_name: ORCHESTRATOR_THREAD_NAME.to_string(),
            shutdown: ShutdownPolicy::Drain,
        }
    }

    /// Start the batch as soon as the orchestrator is up
    pub fn immediate() -> Self {
        Self {
            startup_delay: Duration::ZERO,
            ..Self::new()
        }
    }

    /// Defaults overridden by the environment
    ///
    /// - HARNESS_STARTUP_DELAY_MS: startup delay in milliseconds
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(ms) = std::env::var("HARNESS_STARTUP_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.startup_delay = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_shutdown(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(OrchestratorConfig::new().startup_delay, Duration::from_millis(500));
        assert_eq!(OrchestratorConfig::immediate().startup_delay, Duration::ZERO);

        let config = OrchestratorConfig::new()
            .with_startup_delay(Duration::from_millis(20))
            .with_shutdown(ShutdownPolicy::Discard);
        assert_eq!(config.startup_delay, Duration::from_millis(20));
        assert_eq!(config.shutdown, ShutdownPolicy::Discard);
        assert_eq!(config.thread_name, ORCHESTRATOR_THREAD_NAME);
    }
}
