/*!
 * Logger Module
 * Sample subsystem owning its own thread, and the checks that exercise it
 */

pub mod checks;
pub mod config;
pub mod data;
pub mod subsystem;

// Re-export public API
pub use checks::logger_checks;
pub use config::LoggerConfig;
pub use data::{LogData, MemorySink};
pub use subsystem::{
    Logger, StatusCallback, FLUSH_FAILURE, FLUSH_SUCCESS, WRITE_FAILURE, WRITE_SUCCESS,
};
