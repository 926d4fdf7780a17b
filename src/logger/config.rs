/*!
 * Logger Configuration
 */

use crate::core::limits::{DEFAULT_FLUSH_DELAY, LOGGER_THREAD_NAME};
use std::path::PathBuf;
use std::time::Duration;

/// Logger subsystem configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Name of the logger's owned thread
    pub thread_name: String,

    /// Delay between a write and its deferred flush (default: 100ms)
    pub flush_delay: Duration,

    /// Append flushed lines to this file; `None` discards them
    pub path: Option<PathBuf>,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self {
            thread_name: LOGGER_THREAD_NAME.to_string(),
            flush_delay: DEFAULT_FLUSH_DELAY,
            path: None,
        }
    }

    /// Defaults overridden by the environment
    ///
    /// - HARNESS_LOG_PATH: file receiving flushed lines
    /// - HARNESS_FLUSH_DELAY_MS: deferred flush delay in milliseconds
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(path) = std::env::var("HARNESS_LOG_PATH") {
            config.path = Some(PathBuf::from(path));
        }
        if let Some(ms) = std::env::var("HARNESS_FLUSH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.flush_delay = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}
