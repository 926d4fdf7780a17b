/*!
 * Callbacks Module
 * Subscription points for asynchronous notifications
 */

pub mod registry;

pub use registry::{CallbackRegistry, HandlerFn};
