/*!
 * Test Orchestrator
 *
 * Owns one thread and one timer. On start the timer is armed for the startup
 * delay; when it expires the check batch runs on the orchestrator's own
 * thread, exactly once, and the aggregate status is recorded.
 *
 * # Lifecycle
 *
 * Constructed -> Waiting -> Running -> Complete
 *
 * The timer callback reaches the orchestrator through a `Weak`, and is
 * cleared on shutdown and on drop, so an expiry can never land in a torn-down
 * orchestrator.
 */

use super::checks::{CheckReport, CheckSuite};
use super::config::OrchestratorConfig;
use crate::core::errors::OrchestratorResult;
use crate::core::limits::SUITE_PANICKED;
use crate::core::types::StatusCode;
use crate::thread::{panic_message, Job, OwnedThread};
use crate::timer::OneShotTimer;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Orchestrator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Waiting,
    Running,
    Complete,
}

struct Progress {
    phase: Phase,
    status: Option<StatusCode>,
    report: Option<CheckReport>,
}

struct OrchestratorInner {
    config: OrchestratorConfig,
    thread: OwnedThread,
    timer: OneShotTimer,
    suite: Mutex<Option<Box<dyn CheckSuite>>>,
    progress: Mutex<Progress>,
    progress_changed: Condvar,
    complete: AtomicBool,
}

/// Delayed-start runner for a check suite
#[derive(Clone)]
pub struct TestOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl TestOrchestrator {
    /// Create the orchestrator thread and arm the startup timer
    pub fn start<S>(config: OrchestratorConfig, suite: S) -> OrchestratorResult<Self>
    where
        S: CheckSuite,
    {
        let thread = OwnedThread::with_policy(config.thread_name.clone(), config.shutdown);
        thread.create_thread()?;

        let timer = OneShotTimer::new(format!("{}-startup", config.thread_name), &thread);
        let inner = Arc::new(OrchestratorInner {
            config,
            thread,
            timer,
            suite: Mutex::new(Some(Box::new(suite))),
            progress: Mutex::new(Progress {
                phase: Phase::Constructed,
                status: None,
                report: None,
            }),
            progress_changed: Condvar::new(),
            complete: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        inner.timer.set_callback(move || run_if_alive(&weak));

        inner.set_phase(Phase::Waiting);
        inner.timer.start(inner.config.startup_delay)?;

        info!(
            thread = %inner.config.thread_name,
            delay_ms = inner.config.startup_delay.as_millis() as u64,
            "Check batch scheduled"
        );
        Ok(Self { inner })
    }

    /// Run the batch now instead of waiting for the startup delay
    ///
    /// The batch still executes on the orchestrator thread. Has no effect
    /// once the batch has started.
    pub fn trigger(&self) -> OrchestratorResult<()> {
        self.inner.timer.stop();
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .thread
            .post_job(Job::new("orchestrator-run", move || run_if_alive(&weak)))?;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.inner.complete.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> Phase {
        self.inner.progress.lock().phase
    }

    /// Aggregate status, once complete
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.progress.lock().status
    }

    /// Per-check outcomes, if the suite reports them
    pub fn report(&self) -> Option<CheckReport> {
        self.inner.progress.lock().report.clone()
    }

    /// Block until the batch completes or `timeout` elapses
    pub fn wait_for_completion(&self, timeout: Duration) -> Option<StatusCode> {
        let deadline = Instant::now().checked_add(timeout);
        let mut progress = self.inner.progress.lock();

        while progress.phase != Phase::Complete {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .progress_changed
                        .wait_until(&mut progress, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                None => self.inner.progress_changed.wait(&mut progress),
            }
        }
        progress.status
    }

    pub fn thread(&self) -> &OwnedThread {
        &self.inner.thread
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Disarm the timer and stop the orchestrator thread
    ///
    /// A batch already running finishes first. Call before process exit.
    pub fn shutdown(&self) -> OrchestratorResult<()> {
        self.inner.timer.clear_callback();
        self.inner.timer.stop();
        self.inner.thread.shutdown()?;
        info!(thread = %self.inner.config.thread_name, "Orchestrator shut down");
        Ok(())
    }
}

fn run_if_alive(weak: &Weak<OrchestratorInner>) {
    if let Some(inner) = weak.upgrade() {
        inner.run();
    }
}

impl OrchestratorInner {
    fn set_phase(&self, phase: Phase) {
        self.progress.lock().phase = phase;
        self.progress_changed.notify_all();
    }

    fn run(&self) {
        self.timer.stop();

        let Some(mut suite) = self.suite.lock().take() else {
            debug!("Check batch already ran");
            return;
        };

        self.set_phase(Phase::Running);
        info!("Running check batch");

        let (status, report) =
            match panic::catch_unwind(AssertUnwindSafe(|| (suite.run_all(), suite.report()))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    error!(panic = %panic_message(payload.as_ref()), "Check batch panicked");
                    (SUITE_PANICKED, None)
                }
            };

        info!(status, "RUN_ALL return value");

        {
            let mut progress = self.progress.lock();
            progress.phase = Phase::Complete;
            progress.status = Some(status);
            progress.report = report;
        }
        self.complete.store(true, Ordering::Release);
        self.progress_changed.notify_all();
    }
}

impl Drop for OrchestratorInner {
    fn drop(&mut self) {
        self.timer.clear_callback();
        self.timer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_runs_after_delay_on_own_thread() {
        let ran_on = Arc::new(Mutex::new(None));
        let slot = ran_on.clone();
        let suite = move || {
            *slot.lock() = std::thread::current().name().map(String::from);
            0
        };

        let config = OrchestratorConfig::new()
            .with_startup_delay(Duration::from_millis(30))
            .with_thread_name("orch-unit");
        let orchestrator = TestOrchestrator::start(config, suite).unwrap();
        assert_eq!(orchestrator.phase(), Phase::Waiting);
        assert!(!orchestrator.is_complete());

        assert_eq!(orchestrator.wait_for_completion(Duration::from_secs(2)), Some(0));
        assert!(orchestrator.is_complete());
        assert_eq!(orchestrator.phase(), Phase::Complete);
        assert_eq!(ran_on.lock().as_deref(), Some("orch-unit"));

        orchestrator.shutdown().unwrap();
    }

    #[test]
    fn test_trigger_runs_once() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let suite = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            7
        };

        let config = OrchestratorConfig::new()
            .with_startup_delay(Duration::from_secs(60))
            .with_thread_name("orch-trigger");
        let orchestrator = TestOrchestrator::start(config, suite).unwrap();

        orchestrator.trigger().unwrap();
        orchestrator.trigger().unwrap();
        assert_eq!(orchestrator.wait_for_completion(Duration::from_secs(2)), Some(7));

        orchestrator.shutdown().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_before_delay_never_runs() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let suite = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            0
        };

        let config = OrchestratorConfig::new()
            .with_startup_delay(Duration::from_millis(50))
            .with_thread_name("orch-early-stop");
        let orchestrator = TestOrchestrator::start(config, suite).unwrap();
        orchestrator.shutdown().unwrap();

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.wait_for_completion(Duration::ZERO), None);
        assert!(orchestrator.trigger().is_err());
    }

    #[test]
    fn test_panicking_suite_still_completes() {
        let config = OrchestratorConfig::new()
            .with_startup_delay(Duration::from_millis(10))
            .with_thread_name("orch-panic");
        let orchestrator =
            TestOrchestrator::start(config, || -> StatusCode { panic!("suite blew up") }).unwrap();

        assert_eq!(
            orchestrator.wait_for_completion(Duration::from_secs(2)),
            Some(SUITE_PANICKED)
        );
        assert_eq!(orchestrator.phase(), Phase::Complete);
        assert!(orchestrator.is_complete());
        assert!(orchestrator.report().is_none());
        assert!(orchestrator.thread().is_running());

        orchestrator.shutdown().unwrap();
    }
}
