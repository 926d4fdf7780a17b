/*!
 * Single-Slot Signal
 *
 * Wait/notify flag built on parking_lot's Mutex + Condvar pair.
 *
 * # Design: Check-Then-Wait Under One Lock
 *
 * The raised flag is inspected and waited on while holding the same mutex
 * that `raise` takes, so a raise that lands before the waiter arrives is
 * never lost. A successful wait consumes the flag, leaving the signal ready
 * for the next cycle.
 *
 * One waiter per signal at a time. `raise` wakes one thread only.
 */

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Single-slot wait/notify primitive with bounded waits
#[derive(Debug, Default)]
pub struct Signal {
    raised: Mutex<bool>,
    condvar: Condvar,
}

impl Signal {
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Raise the signal and wake the waiter, if any
    ///
    /// Raising an already raised signal leaves it raised.
    pub fn raise(&self) {
        let mut raised = self.raised.lock();
        *raised = true;
        self.condvar.notify_one();
    }

    /// Block until raised or until `timeout` elapses
    ///
    /// Returns `true` and clears the flag when raised, `false` on timeout with
    /// the state left untouched. A zero timeout polls.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut raised = self.raised.lock();

        if !*raised && !timeout.is_zero() {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => {
                    // Loop absorbs spurious wakeups
                    while !*raised {
                        if self.condvar.wait_until(&mut raised, deadline).timed_out() {
                            break;
                        }
                    }
                }
                None => {
                    while !*raised {
                        self.condvar.wait(&mut raised);
                    }
                }
            }
        }

        let woken = *raised;
        *raised = false;
        woken
    }

    /// Peek at the flag without consuming it
    pub fn is_raised(&self) -> bool {
        *self.raised.lock()
    }

    /// Drop a pending raise without waiting
    pub fn reset(&self) {
        *self.raised.lock() = false;
    }
}
