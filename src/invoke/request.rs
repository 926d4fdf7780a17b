/*!
 * Invocation Requests
 *
 * One bounded call: an operation plus its arguments, posted as a job onto
 * the owner thread, with the caller blocked on a completion signal.
 *
 * # Design: Shared Completion Slot
 *
 * The result slot and its signal live behind an `Arc` held by both the caller
 * and the posted job. A caller that times out simply drops its half; a late
 * completion writes into a slot nobody reads and frees it when the job ends.
 */

use crate::core::errors::{InvokeError, InvokeResult};
use crate::core::sync::Signal;
use crate::core::types::TimeoutAction;
use crate::monitoring::span_invocation;
use crate::thread::{panic_message, Job, OwnedThread};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

type Operation<A, R> = Box<dyn FnOnce(A) -> R + Send + 'static>;

/// State shared between the waiting caller and the job on the owner thread
struct Completion<R> {
    slot: Mutex<Option<thread::Result<R>>>,
    signal: Signal,
    abandoned: AtomicBool,
}

impl<R> Completion<R> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            signal: Signal::new(),
            abandoned: AtomicBool::new(false),
        }
    }
}

/// A single bounded cross-thread call, consumed by `submit`
pub struct InvocationRequest<A, R> {
    operation: Operation<A, R>,
    args: A,
    target: OwnedThread,
    timeout: Duration,
    on_timeout: TimeoutAction,
}

impl<A, R> InvocationRequest<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    pub fn new<F>(target: &OwnedThread, timeout: Duration, operation: F, args: A) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        Self {
            operation: Box::new(operation),
            args,
            target: target.clone(),
            timeout,
            on_timeout: TimeoutAction::default(),
        }
    }

    /// Choose what happens to the operation if the caller gives up first
    pub fn on_timeout(mut self, action: TimeoutAction) -> Self {
        self.on_timeout = action;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Post the operation to the owner thread and wait for it
    ///
    /// Blocks for at most the request's timeout plus scheduling overhead.
    /// Must not be called from the owner thread itself.
    pub fn submit(self) -> InvokeResult<R> {
        let Self {
            operation,
            args,
            target,
            timeout,
            on_timeout,
        } = self;

        let span = span_invocation(target.name(), timeout.as_millis() as u64);

        if target.is_current() {
            span.record_outcome("reentrant");
            return Err(InvokeError::Reentrant(target.name().to_string()));
        }

        let completion = Arc::new(Completion::new());
        let remote = completion.clone();
        let parent = span.span().clone();

        let job = Job::new("invocation", move || {
            if on_timeout == TimeoutAction::CancelPending && remote.abandoned.load(Ordering::Acquire)
            {
                debug!(parent: &parent, "Skipping operation abandoned by its caller");
                return;
            }
            let outcome = {
                let _entered = parent.enter();
                panic::catch_unwind(AssertUnwindSafe(move || operation(args)))
            };
            // Store before raising: the caller reads the slot only after the signal
            *remote.slot.lock() = Some(outcome);
            remote.signal.raise();
        });

        let start = Instant::now();
        if target.post_job(job).is_err() {
            span.record_outcome("unavailable");
            return Err(InvokeError::ThreadUnavailable(target.name().to_string()));
        }

        if !completion.signal.wait_for(timeout) {
            completion.abandoned.store(true, Ordering::Release);
            span.record_outcome("timeout");
            return Err(InvokeError::timeout(target.name(), start.elapsed(), timeout));
        }

        let outcome = completion.slot.lock().take();
        match outcome {
            Some(Ok(value)) => {
                span.record_outcome("completed");
                Ok(value)
            }
            Some(Err(payload)) => {
                span.record_outcome("panicked");
                Err(InvokeError::OperationPanicked {
                    thread: target.name().to_string(),
                    message: panic_message(payload.as_ref()),
                })
            }
            None => {
                span.record_outcome("timeout");
                Err(InvokeError::timeout(target.name(), start.elapsed(), timeout))
            }
        }
    }
}
