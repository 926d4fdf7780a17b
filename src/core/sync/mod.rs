/*!
 * Synchronization Primitives
 *
 * Bounded wait/notify used to hand completion across threads:
 * - `Signal`: single-slot flag, one waiter, timeout-bounded wait
 *
 * # Use Cases
 *
 * - **Invocation completion**: caller blocks until the owner thread finishes
 * - **Callback observation**: a subscriber waits for a notification fired on another thread
 */

mod signal;

pub use signal::Signal;
