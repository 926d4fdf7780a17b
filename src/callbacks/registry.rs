/*!
 * Callback Registry
 * Ordered multi-subscriber notification point
 */

use crate::core::types::SubscriptionId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Subscriber callback; runs on the notifying component's thread
pub type HandlerFn<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Handler registry invoked synchronously by the owning component
///
/// Handlers run in subscription order on whichever thread calls `notify`.
/// Any state a handler shares with its subscriber must be guarded by the
/// subscriber's own lock.
pub struct CallbackRegistry<A> {
    handlers: Mutex<Vec<(SubscriptionId, HandlerFn<A>)>>,
    next_id: AtomicU64,
}

impl<A> CallbackRegistry<A> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler; the returned token removes it again
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().push((id, Arc::new(handler)));
        info!(subscription = %id, "Registered callback handler");
        id
    }

    /// Unregister a handler
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        let removed = handlers.len() != before;
        if removed {
            info!(subscription = %id, "Unregistered callback handler");
        }
        removed
    }

    /// Invoke every handler in subscription order, returning how many ran
    ///
    /// The handler list is snapshotted first, so a handler may subscribe or
    /// unsubscribe without deadlocking; such changes apply from the next call.
    pub fn notify(&self, args: &A) -> usize {
        let snapshot: Vec<HandlerFn<A>> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in &snapshot {
            handler(args);
        }

        if !snapshot.is_empty() {
            debug!(handlers = snapshot.len(), "Notified callback handlers");
        }
        snapshot.len()
    }

    /// Check if handler exists
    pub fn exists(&self, id: SubscriptionId) -> bool {
        self.handlers.lock().iter().any(|(sub, _)| *sub == id)
    }

    /// Get handler count
    pub fn count(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }
}

impl<A> Default for CallbackRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_notify_in_subscription_order() {
        let registry = CallbackRegistry::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            registry.subscribe(move |value: &u32| seen.lock().push(format!("{tag}{value}")));
        }

        assert_eq!(registry.notify(&7), 3);
        assert_eq!(*seen.lock(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_unsubscribe_by_token() {
        let registry = CallbackRegistry::<()>::new();
        let hits = Arc::new(AtomicU64::new(0));

        // Identical closures still get distinct tokens
        let make = |hits: Arc<AtomicU64>| {
            move |_: &()| {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        };
        let first = registry.subscribe(make(hits.clone()));
        let second = registry.subscribe(make(hits.clone()));
        assert_ne!(first, second);

        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        assert!(!registry.exists(first));
        assert!(registry.exists(second));

        registry.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let registry = Arc::new(CallbackRegistry::<()>::new());
        let slot = Arc::new(Mutex::new(None));

        let reg = registry.clone();
        let own = slot.clone();
        let id = registry.subscribe(move |_| {
            if let Some(id) = *own.lock() {
                reg.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        assert_eq!(registry.notify(&()), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.notify(&()), 0);
    }
}
