/*!
 * Owned Thread
 *
 * A named worker thread draining a FIFO job queue.
 *
 * # Design: Composition Over "Is-A Thread"
 *
 * Subsystems hold an `OwnedThread` handle and post work to it. The handle is
 * cheap to clone; the worker shuts down when `shutdown` is called or the last
 * handle drops.
 *
 * The worker closure owns only the receiver and a few shared counters, never
 * the handle itself, so dropping the handles always ends the thread.
 */

use super::job::Job;
use crate::core::errors::{ThreadError, ThreadResult};
use crate::core::types::ShutdownPolicy;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of an owned thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Created,
    Running,
    Stopped,
}

/// Counters shared with the worker loop
#[derive(Debug, Default)]
struct WorkerStats {
    executed: AtomicU64,
    panicked: AtomicU64,
    discarded: AtomicU64,
}

struct Worker {
    state: ThreadState,
    sender: Option<flume::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

struct ThreadInner {
    name: String,
    policy: ShutdownPolicy,
    worker: Mutex<Worker>,
    os_id: OnceLock<thread::ThreadId>,
    discard: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

/// Handle to a worker thread with its own task queue
#[derive(Clone)]
pub struct OwnedThread {
    inner: Arc<ThreadInner>,
}

impl OwnedThread {
    /// Create a stopped thread handle; call `create_thread` to start it
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, ShutdownPolicy::default())
    }

    pub fn with_policy(name: impl Into<String>, policy: ShutdownPolicy) -> Self {
        Self {
            inner: Arc::new(ThreadInner {
                name: name.into(),
                policy,
                worker: Mutex::new(Worker {
                    state: ThreadState::Created,
                    sender: None,
                    handle: None,
                }),
                os_id: OnceLock::new(),
                discard: Arc::new(AtomicBool::new(false)),
                stats: Arc::new(WorkerStats::default()),
            }),
        }
    }

    /// Create and immediately start a thread
    pub fn spawn(name: impl Into<String>) -> ThreadResult<Self> {
        let thread = Self::new(name);
        thread.create_thread()?;
        Ok(thread)
    }

    /// Start the worker loop
    ///
    /// Calling this on a running thread does nothing. A stopped thread cannot
    /// be restarted.
    pub fn create_thread(&self) -> ThreadResult<()> {
        let mut worker = self.inner.worker.lock();
        match worker.state {
            ThreadState::Running => return Ok(()),
            ThreadState::Stopped => return Err(ThreadError::NotRunning(self.inner.name.clone())),
            ThreadState::Created => {}
        }

        let (tx, rx) = flume::unbounded::<Job>();
        let name = self.inner.name.clone();
        let discard = self.inner.discard.clone();
        let stats = self.inner.stats.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&name, rx, &discard, &stats))
            .map_err(|e| ThreadError::SpawnFailed {
                name: self.inner.name.clone(),
                reason: e.to_string(),
            })?;

        let _ = self.inner.os_id.set(handle.thread().id());
        worker.sender = Some(tx);
        worker.handle = Some(handle);
        worker.state = ThreadState::Running;

        info!(thread = %self.inner.name, "Owned thread started");
        Ok(())
    }

    /// Enqueue a task for the worker; never blocks
    pub fn post<F>(&self, task: F) -> ThreadResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_job(Job::new("task", task))
    }

    /// Enqueue a labelled job for the worker; never blocks
    pub fn post_job(&self, job: Job) -> ThreadResult<()> {
        let worker = self.inner.worker.lock();
        let sender = worker
            .sender
            .as_ref()
            .ok_or_else(|| ThreadError::NotRunning(self.inner.name.clone()))?;

        sender
            .send(job)
            .map_err(|_| ThreadError::NotRunning(self.inner.name.clone()))
    }

    /// Stop accepting work, settle queued jobs per policy and join the worker
    ///
    /// Joining is skipped when called from the worker itself; the worker
    /// still exits once the current job returns.
    pub fn shutdown(&self) -> ThreadResult<()> {
        self.inner.shutdown()
    }

    /// Whether the calling OS thread is this worker
    pub fn is_current(&self) -> bool {
        self.inner
            .os_id
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    pub fn is_running(&self) -> bool {
        self.inner.worker.lock().state == ThreadState::Running
    }

    pub fn state(&self) -> ThreadState {
        self.inner.worker.lock().state
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Jobs queued but not yet picked up by the worker
    pub fn pending(&self) -> usize {
        self.inner
            .worker
            .lock()
            .sender
            .as_ref()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn executed_count(&self) -> u64 {
        self.inner.stats.executed.load(Ordering::Relaxed)
    }

    pub fn panicked_count(&self) -> u64 {
        self.inner.stats.panicked.load(Ordering::Relaxed)
    }

    pub fn discarded_count(&self) -> u64 {
        self.inner.stats.discarded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for OwnedThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedThread")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

impl ThreadInner {
    fn shutdown(&self) -> ThreadResult<()> {
        let handle = {
            let mut worker = self.worker.lock();
            if worker.state != ThreadState::Running {
                worker.state = ThreadState::Stopped;
                return Ok(());
            }
            worker.state = ThreadState::Stopped;
            if self.policy == ShutdownPolicy::Discard {
                self.discard.store(true, Ordering::Release);
            }
            // Dropping the only sender lets the worker fall out of recv()
            worker.sender = None;
            worker.handle.take()
        };

        let Some(handle) = handle else {
            return Ok(());
        };

        if handle.thread().id() == thread::current().id() {
            debug!(thread = %self.name, "Shutdown from own worker, detaching");
            return Ok(());
        }

        handle
            .join()
            .map_err(|_| ThreadError::JoinFailed(self.name.clone()))?;
        info!(thread = %self.name, "Owned thread stopped");
        Ok(())
    }
}

impl Drop for ThreadInner {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(thread = %self.name, error = %e, "Owned thread did not stop cleanly");
        }
    }
}

fn run_worker(name: &str, rx: flume::Receiver<Job>, discard: &AtomicBool, stats: &WorkerStats) {
    debug!(thread = %name, "Worker loop entered");

    while let Ok(job) = rx.recv() {
        if discard.load(Ordering::Acquire) {
            stats.discarded.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let label = job.label();
        trace!(
            thread = %name,
            job = label,
            queued_us = job.posted_at().elapsed().as_micros() as u64,
            "Running job"
        );
        match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
            Ok(()) => {
                stats.executed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                stats.panicked.fetch_add(1, Ordering::Relaxed);
                error!(
                    thread = %name,
                    job = label,
                    panic = %super::job::panic_message(payload.as_ref()),
                    "Job panicked on owned thread"
                );
            }
        }
    }

    debug!(thread = %name, "Worker loop exited");
}
