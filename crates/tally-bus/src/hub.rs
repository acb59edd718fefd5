//! Handler lists with revocable subscription handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Callback invoked for every emitted event.
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct HubInner<E> {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(u64, EventHandler<E>)>>,
}

/// A list of handlers for one notification stream.
///
/// Cheap to clone; clones share the handler list.
pub struct EventHub<E> {
    inner: Arc<HubInner<E>>,
}

impl<E: 'static> EventHub<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                next_id: AtomicU64::new(1),
                handlers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register a handler. It stays registered until the returned handle is
    /// dropped or cancelled.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(&self, handler: EventHandler<E>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().push((id, handler));

        let hub: Weak<HubInner<E>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            revoke: Some(Box::new(move || {
                if let Some(inner) = hub.upgrade() {
                    inner.handlers.write().retain(|(h, _)| *h != id);
                }
            })),
        }
    }

    /// Invoke every handler. Returns the number of handlers called.
    ///
    /// Handlers run outside the list lock, so a handler may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, event: &E) -> usize {
        let handlers: Vec<EventHandler<E>> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.read().len()
    }
}

impl<E: 'static> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("handlers", &self.inner.handlers.read().len())
            .finish()
    }
}

/// Handle for a registered handler.
///
/// Dropping the handle (or calling [`cancel`](Self::cancel)) removes the
/// handler from its hub. Revoking after the hub is gone is a no-op.
pub struct Subscription {
    id: u64,
    revoke: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Hub-local handler id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Revoke the handler now.
    pub fn cancel(mut self) {
        self.revoke_now();
    }

    fn revoke_now(&mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.revoke_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.revoke.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> EventHandler<u32> {
        let counter = counter.clone();
        Arc::new(move |n: &u32| {
            counter.fetch_add(*n as usize, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_subscribers() {
        let hub = EventHub::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let _a = hub.subscribe(counting_handler(&counter));
        let _b = hub.subscribe(counting_handler(&counter));

        assert_eq!(hub.emit(&2), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_drop_revokes() {
        let hub = EventHub::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let sub = hub.subscribe(counting_handler(&counter));
        assert_eq!(hub.handler_count(), 1);
        drop(sub);

        assert_eq!(hub.handler_count(), 0);
        assert_eq!(hub.emit(&1), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_only_removes_own_handler() {
        let hub = EventHub::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let keep = hub.subscribe(counting_handler(&counter));
        let gone = hub.subscribe(counting_handler(&counter));
        assert_ne!(keep.id(), gone.id());

        gone.cancel();

        assert_eq!(hub.handler_count(), 1);
        hub.emit(&1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outlives_hub() {
        let hub = EventHub::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let sub = hub.subscribe(counting_handler(&counter));

        drop(hub);
        drop(sub);
    }

    #[test]
    fn test_handler_may_touch_hub_during_emit() {
        let hub = EventHub::<u32>::new();
        let inner_hub = hub.clone();
        let _sub = hub.subscribe(Arc::new(move |_: &u32| {
            // Would deadlock if emit held the handler lock.
            let _ = inner_hub.handler_count();
        }));

        assert_eq!(hub.emit(&0), 1);
    }
}
