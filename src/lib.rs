/*!
 * Cross-Thread Harness Library
 * Bounded cross-thread invocation and a delayed-start check orchestrator
 */

pub mod callbacks;
pub mod core;
pub mod invoke;
pub mod logger;
pub mod monitoring;
pub mod orchestrator;
pub mod thread;
pub mod timer;

// Re-exports
pub use callbacks::CallbackRegistry;
pub use crate::core::errors::*;
pub use crate::core::sync::Signal;
pub use crate::core::types::{ShutdownPolicy, StatusCode, SubscriptionId, TimeoutAction};
pub use invoke::{invoke, invoke_with, BoundedInvoker, InvocationRequest};
pub use logger::{logger_checks, Logger, LoggerConfig};
pub use monitoring::init_tracing;
pub use orchestrator::{
    CheckBatch, CheckContext, CheckReport, CheckSuite, OrchestratorConfig, Phase, TestOrchestrator,
};
pub use thread::{Job, OwnedThread, ThreadState};
pub use timer::{OneShotTimer, TimerState};
