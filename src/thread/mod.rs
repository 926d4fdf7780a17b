/*!
 * Thread Module
 * Owned worker threads and the jobs posted to them
 */

pub mod job;
pub mod owned;

// Re-export public API
pub use job::{panic_message, Job};
pub use owned::{OwnedThread, ThreadState};
