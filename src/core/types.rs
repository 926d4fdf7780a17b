/*!
 * Core Types
 * Common types used across the harness
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate status code returned by a check suite (0 = all passed)
pub type StatusCode = i32;

/// Opaque token identifying one callback subscription
///
/// Returned by `subscribe` and handed back to `unsubscribe`; two closures with
/// identical bodies still get distinct tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// What to do on shutdown with tasks still queued on an owned thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Run every queued task before the worker exits
    #[default]
    Drain,
    /// Drop queued tasks without running them
    Discard,
}

/// What a timed-out caller leaves behind on the owner thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutAction {
    /// The operation still runs whenever the owner thread reaches it
    #[default]
    LetRun,
    /// The operation is skipped if it has not started when the caller gives up
    CancelPending,
}
