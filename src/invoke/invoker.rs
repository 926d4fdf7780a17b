/*!
 * Bounded Invoker
 *
 * Runs operations on the thread that owns them and blocks the caller until
 * they finish or a timeout elapses.
 *
 * ```ignore
 * let flush = BoundedInvoker::new(logger.thread(), Duration::from_millis(100));
 * let flushed: Option<bool> = flush.invoke({
 *     let data = logger.data();
 *     move || data.lock().flush()
 * });
 * ```
 *
 * A timeout only bounds the wait. The operation still runs when the owner
 * thread reaches it unless the invoker was built with
 * `TimeoutAction::CancelPending`.
 *
 * Callers must not invoke onto their own thread; doing so resolves
 * immediately to `InvokeError::Reentrant`.
 */

use super::request::InvocationRequest;
use crate::core::errors::InvokeResult;
use crate::core::types::TimeoutAction;
use crate::thread::OwnedThread;
use std::time::Duration;
use tracing::debug;

/// Invoker bound to one owner thread and one timeout
#[derive(Debug, Clone)]
pub struct BoundedInvoker {
    target: OwnedThread,
    timeout: Duration,
    on_timeout: TimeoutAction,
}

impl BoundedInvoker {
    pub fn new(target: &OwnedThread, timeout: Duration) -> Self {
        Self {
            target: target.clone(),
            timeout,
            on_timeout: TimeoutAction::default(),
        }
    }

    /// Skip operations that have not started by the time their caller gives up
    pub fn cancel_on_timeout(mut self) -> Self {
        self.on_timeout = TimeoutAction::CancelPending;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn target(&self) -> &OwnedThread {
        &self.target
    }

    /// Run `operation(args)` on the owner thread, reporting why it failed
    pub fn try_invoke_with<F, A, R>(&self, operation: F, args: A) -> InvokeResult<R>
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        InvocationRequest::new(&self.target, self.timeout, operation, args)
            .on_timeout(self.on_timeout)
            .submit()
    }

    pub fn try_invoke<F, R>(&self, operation: F) -> InvokeResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.try_invoke_with(move |()| operation(), ())
    }

    /// Run `operation(args)` on the owner thread; `None` if it did not complete in time
    pub fn invoke_with<F, A, R>(&self, operation: F, args: A) -> Option<R>
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        self.try_invoke_with(operation, args)
            .map_err(|e| debug!(error = %e, "Bounded invocation resolved without a value"))
            .ok()
    }

    pub fn invoke<F, R>(&self, operation: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.invoke_with(move |()| operation(), ())
    }

    /// Run a result-less operation; `Some(())` means it completed in time
    pub fn invoke_unit<F>(&self, operation: F) -> Option<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.invoke(operation)
    }
}

/// One-off bounded invocation onto `target`
pub fn invoke<F, R>(target: &OwnedThread, timeout: Duration, operation: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    BoundedInvoker::new(target, timeout).invoke(operation)
}

/// One-off bounded invocation onto `target` with an argument payload
pub fn invoke_with<F, A, R>(target: &OwnedThread, timeout: Duration, operation: F, args: A) -> Option<R>
where
    F: FnOnce(A) -> R + Send + 'static,
    A: Send + 'static,
    R: Send + 'static,
{
    BoundedInvoker::new(target, timeout).invoke_with(operation, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::InvokeError;
    use std::time::Instant;

    #[test]
    fn test_invoke_matches_direct_call() {
        let owner = OwnedThread::spawn("invoker-owner").unwrap();
        let invoker = BoundedInvoker::new(&owner, Duration::from_millis(500));

        let square = |x: u64| x * x;
        assert_eq!(invoker.invoke_with(square, 12), Some(square(12)));
        assert_eq!(invoker.invoke(|| "done".to_string()).as_deref(), Some("done"));
        assert_eq!(invoker.invoke_unit(|| {}), Some(()));
    }

    #[test]
    fn test_invoke_on_stopped_thread_is_immediate() {
        let owner = OwnedThread::spawn("invoker-stopped").unwrap();
        owner.shutdown().unwrap();

        let start = Instant::now();
        let invoker = BoundedInvoker::new(&owner, Duration::from_secs(5));
        assert!(matches!(
            invoker.try_invoke(|| 1),
            Err(InvokeError::ThreadUnavailable(_))
        ));
        assert_eq!(invoker.invoke(|| 1), None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_reentrant_invoke_is_rejected() {
        let owner = OwnedThread::spawn("invoker-reentrant").unwrap();
        let inner = BoundedInvoker::new(&owner, Duration::from_secs(5));
        let outer = BoundedInvoker::new(&owner, Duration::from_secs(5));

        let nested = outer.invoke(move || inner.try_invoke(|| 1)).unwrap();
        assert!(matches!(nested, Err(InvokeError::Reentrant(_))));
    }

    #[test]
    fn test_builder_accessors() {
        let owner = OwnedThread::new("invoker-cold");
        let invoker = BoundedInvoker::new(&owner, Duration::from_millis(5))
            .with_timeout(Duration::from_millis(50))
            .cancel_on_timeout();
        assert_eq!(invoker.timeout(), Duration::from_millis(50));
        assert_eq!(invoker.target().name(), "invoker-cold");
    }
}
