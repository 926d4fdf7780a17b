/*!
 * Invoke Module
 * Bounded cross-thread call/response
 */

pub mod invoker;
pub mod request;

// Re-export public API
pub use invoker::{invoke, invoke_with, BoundedInvoker};
pub use request::InvocationRequest;
