/*!
 * Orchestrator Module
 * Delayed-start execution of a check batch on a dedicated thread
 */

pub mod checks;
pub mod config;
pub mod global;
pub mod harness;

// Re-export public API
pub use checks::{CheckBatch, CheckContext, CheckOutcome, CheckReport, CheckSuite};
pub use config::OrchestratorConfig;
pub use harness::{Phase, TestOrchestrator};
