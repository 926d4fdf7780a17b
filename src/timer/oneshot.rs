/*!
 * One-Shot Timer
 *
 * Fires a registered callback once, after a delay, on a designated owned
 * thread.
 *
 * # Design
 *
 * Each timer has one driver thread, spawned on the first `start` and parked
 * on a condvar between armings. Each `start` bumps a generation counter and
 * wakes the driver with the new deadline. On expiry the driver posts a fire
 * job onto the target thread; the job re-checks the generation under the
 * firing lock, so a `stop` or re-`start` that wins the race turns the job
 * into a no-op.
 *
 * The firing lock is reentrant: the callback may stop or restart its own
 * timer from inside the callback.
 *
 * The timer never checks whether the callback's target is still alive.
 * Clear the callback before tearing the target down.
 */

use crate::core::errors::{TimerError, TimerResult};
use crate::thread::{Job, OwnedThread};
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Callback invoked on timer expiry
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed,
    Fired,
}

struct Arming {
    generation: u64,
    state: TimerState,
    /// `None` while armed means expired with the fire job in flight
    deadline: Option<Instant>,
    driver_running: bool,
    closed: bool,
}

impl Arming {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.state == TimerState::Armed
    }
}

struct TimerShared {
    name: String,
    arming: Mutex<Arming>,
    wake: Condvar,
    callback: Mutex<Option<TimerCallback>>,
    firing: ReentrantMutex<()>,
    fire_count: AtomicU64,
    drivers_spawned: AtomicU64,
}

/// One-shot delay timer delivering onto an owned thread
pub struct OneShotTimer {
    shared: Arc<TimerShared>,
    target: OwnedThread,
}

impl OneShotTimer {
    pub fn new(name: impl Into<String>, target: &OwnedThread) -> Self {
        Self {
            shared: Arc::new(TimerShared {
                name: name.into(),
                arming: Mutex::new(Arming {
                    generation: 0,
                    state: TimerState::Idle,
                    deadline: None,
                    driver_running: false,
                    closed: false,
                }),
                wake: Condvar::new(),
                callback: Mutex::new(None),
                firing: ReentrantMutex::new(()),
                fire_count: AtomicU64::new(0),
                drivers_spawned: AtomicU64::new(0),
            }),
            target: target.clone(),
        }
    }

    /// Register the expiry callback, replacing any previous one
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.callback.lock() = Some(Arc::new(callback));
    }

    /// Remove the expiry callback; a later expiry fires nothing
    pub fn clear_callback(&self) {
        *self.shared.callback.lock() = None;
    }

    pub fn has_callback(&self) -> bool {
        self.shared.callback.lock().is_some()
    }

    /// Arm the timer; restarting an armed timer replaces its deadline
    pub fn start(&self, delay: Duration) -> TimerResult<()> {
        if !self.target.is_running() {
            return Err(TimerError::TargetUnavailable(self.shared.name.clone()));
        }

        let mut arming = self.shared.arming.lock();
        arming.generation += 1;
        arming.state = TimerState::Armed;
        // An unrepresentable deadline never expires
        arming.deadline = Some(Instant::now().checked_add(delay).unwrap_or_else(far_future));
        let generation = arming.generation;

        if !arming.driver_running {
            let shared = self.shared.clone();
            let target = self.target.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-driver", self.shared.name))
                .spawn(move || drive(shared, target));

            if let Err(e) = spawned {
                arming.state = TimerState::Idle;
                arming.deadline = None;
                return Err(TimerError::ArmFailed {
                    name: self.shared.name.clone(),
                    reason: e.to_string(),
                });
            }
            arming.driver_running = true;
            self.shared.drivers_spawned.fetch_add(1, Ordering::Relaxed);
        }
        drop(arming);
        self.shared.wake.notify_all();

        debug!(
            timer = %self.shared.name,
            generation,
            delay_ms = delay.as_millis() as u64,
            "Timer armed"
        );
        Ok(())
    }

    /// Cancel a pending expiry
    ///
    /// Once this returns the callback will not start for the current arming,
    /// even if the deadline already passed and the fire job is queued.
    /// If the callback is running on another thread, waits for it to finish.
    pub fn stop(&self) {
        let _firing = self.shared.firing.lock();
        let mut arming = self.shared.arming.lock();
        if arming.state == TimerState::Armed {
            arming.generation += 1;
            arming.state = TimerState::Idle;
            arming.deadline = None;
            self.shared.wake.notify_all();
            debug!(timer = %self.shared.name, "Timer stopped");
        }
    }

    pub fn state(&self) -> TimerState {
        self.shared.arming.lock().state
    }

    pub fn is_armed(&self) -> bool {
        self.state() == TimerState::Armed
    }

    /// Time left before expiry, if armed
    pub fn remaining(&self) -> Option<Duration> {
        let arming = self.shared.arming.lock();
        match arming.state {
            TimerState::Armed => Some(
                arming
                    .deadline
                    .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                    .unwrap_or(Duration::ZERO),
            ),
            _ => None,
        }
    }

    /// Number of callback invocations over the timer's lifetime
    pub fn fire_count(&self) -> u64 {
        self.shared.fire_count.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    #[cfg(test)]
    fn drivers_spawned(&self) -> u64 {
        self.shared.drivers_spawned.load(Ordering::Relaxed)
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.stop();
        self.clear_callback();
        // The driver exits on its own; it is not joined so a drop on the
        // target thread cannot wait on it
        self.shared.arming.lock().closed = true;
        self.shared.wake.notify_all();
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(60 * 60 * 24 * 365)
}

fn drive(shared: Arc<TimerShared>, target: OwnedThread) {
    debug!(timer = %shared.name, "Timer driver started");
    let mut arming = shared.arming.lock();

    loop {
        if arming.closed {
            break;
        }

        let deadline = match (arming.state, arming.deadline) {
            (TimerState::Armed, Some(deadline)) => deadline,
            _ => {
                shared.wake.wait(&mut arming);
                continue;
            }
        };

        if Instant::now() < deadline {
            // Woken early by a stop, restart or close: re-evaluate
            shared.wake.wait_until(&mut arming, deadline);
            continue;
        }

        // Expired; the fire job decides whether this arming still counts
        let generation = arming.generation;
        arming.deadline = None;
        drop(arming);

        let job_shared = shared.clone();
        let posted = target.post_job(Job::new("timer-expired", move || {
            job_shared.fire(generation)
        }));

        arming = shared.arming.lock();
        if let Err(e) = posted {
            warn!(timer = %shared.name, error = %e, "Timer expired but target thread is gone");
            if arming.is_current(generation) {
                arming.state = TimerState::Idle;
            }
        }
    }

    arming.driver_running = false;
    debug!(timer = %shared.name, "Timer driver exited");
}

impl TimerShared {
    fn fire(&self, generation: u64) {
        let _firing = self.firing.lock();
        {
            let mut arming = self.arming.lock();
            if !arming.is_current(generation) {
                return;
            }
            arming.state = TimerState::Fired;
            arming.deadline = None;
        }

        // Clone out so the callback may replace or clear itself
        let callback = self.callback.lock().clone();
        match callback {
            Some(callback) => {
                self.fire_count.fetch_add(1, Ordering::AcqRel);
                debug!(timer = %self.name, "Timer fired");
                callback();
            }
            None => debug!(timer = %self.name, "Timer fired with no callback"),
        }
    }
}
