/*!
 * Timer Module
 * Delayed, cross-thread callback delivery
 */

pub mod oneshot;

pub use oneshot::{OneShotTimer, TimerCallback, TimerState};
