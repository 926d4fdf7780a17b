/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Owned-thread errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ThreadError {
    #[error("Thread '{0}' is not running")]
    #[diagnostic(
        code(thread::not_running),
        help("Call create_thread() before posting work, and do not post after shutdown().")
    )]
    NotRunning(String),

    #[error("Failed to spawn thread '{name}': {reason}")]
    #[diagnostic(
        code(thread::spawn_failed),
        help("The OS refused to create a thread. Check process thread limits.")
    )]
    SpawnFailed { name: String, reason: String },

    #[error("Thread '{0}' panicked while shutting down")]
    #[diagnostic(
        code(thread::join_failed),
        help("A task escaped the worker's panic guard. View logs for the panic message.")
    )]
    JoinFailed(String),
}

/// One-shot timer errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum TimerError {
    #[error("Failed to arm timer '{name}': {reason}")]
    #[diagnostic(
        code(timer::arm_failed),
        help("The timer driver thread could not be spawned.")
    )]
    ArmFailed { name: String, reason: String },

    #[error("Timer '{0}' target thread is not running")]
    #[diagnostic(
        code(timer::target_unavailable),
        help("Start the target OwnedThread before arming a timer that delivers onto it.")
    )]
    TargetUnavailable(String),
}

/// Bounded invocation errors
///
/// Every variant resolves to an absent result in the `Option` form of the API.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum InvokeError {
    #[error("Invocation on '{thread}' timed out after {elapsed_ms}ms (timeout: {timeout_ms}ms)")]
    #[diagnostic(
        code(invoke::timeout),
        help("The operation may still complete later on the owner thread.")
    )]
    Timeout {
        thread: String,
        elapsed_ms: u64,
        timeout_ms: u64,
    },

    #[error("Owner thread '{0}' is not accepting work")]
    #[diagnostic(
        code(invoke::thread_unavailable),
        help("The owner thread was never started or has been shut down.")
    )]
    ThreadUnavailable(String),

    #[error("Reentrant invocation on owner thread '{0}'")]
    #[diagnostic(
        code(invoke::reentrant),
        help("Call the operation directly when already running on the owner thread.")
    )]
    Reentrant(String),

    #[error("Operation on '{thread}' panicked: {message}")]
    #[diagnostic(
        code(invoke::operation_panicked),
        help("Capture failures in the operation's return value instead of panicking.")
    )]
    OperationPanicked { thread: String, message: String },
}

impl InvokeError {
    /// Create a timeout error
    pub fn timeout(thread: &str, elapsed: Duration, timeout: Duration) -> Self {
        Self::Timeout {
            thread: thread.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Orchestrator errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum OrchestratorError {
    #[error("Orchestrator already initialized")]
    #[diagnostic(
        code(orchestrator::already_initialized),
        help("The process-wide orchestrator can only be installed once.")
    )]
    AlreadyInitialized,

    #[error("Orchestrator thread error: {0}")]
    #[diagnostic(code(orchestrator::thread))]
    Thread(#[from] ThreadError),

    #[error("Orchestrator timer error: {0}")]
    #[diagnostic(code(orchestrator::timer))]
    Timer(#[from] TimerError),
}

/// Logger subsystem errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum LoggerError {
    #[error("Failed to open log sink: {0}")]
    #[diagnostic(
        code(logger::sink_open_failed),
        help("Check that the log path's directory exists and is writable.")
    )]
    SinkOpenFailed(String),

    #[error("Logger thread error: {0}")]
    #[diagnostic(code(logger::thread))]
    Thread(#[from] ThreadError),
}

pub type ThreadResult<T> = Result<T, ThreadError>;
pub type LoggerResult<T> = Result<T, LoggerError>;
pub type TimerResult<T> = Result<T, TimerError>;
pub type InvokeResult<T> = Result<T, InvokeError>;
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
