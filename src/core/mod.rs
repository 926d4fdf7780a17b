/*!
 * Core Module
 * Fundamental harness types, limits, errors and synchronization
 */

pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use sync::Signal;
pub use types::*;
