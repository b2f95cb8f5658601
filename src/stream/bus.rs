//! Typed event bus for stream subscribers.
//!
//! Registration is keyed by [`EventKind`]; `EventKind::Any` is the catch-all
//! channel that additionally receives every decoded server record. Callbacks
//! run synchronously in registration order, and a panicking callback is
//! isolated so its siblings (and the stream) keep going.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::events::{EventKind, StreamEvent};

type Callback = Arc<dyn Fn(&StreamEvent) + Send + Sync + 'static>;

/// Handle returned by [`EventBus::subscribe`]; pass it to
/// [`EventBus::unsubscribe`] to remove exactly that registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    kind: EventKind,
    id: u64,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<(u64, Callback)>>,
}

/// Subscriber registry with per-callback isolation.
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback for `kind`. Duplicates are permitted; invocation
    /// order is registration order.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&StreamEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        SubscriptionHandle { kind, id }
    }

    /// Remove one registration. Returns false if the handle was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut registry = self.lock();
        if let Some(callbacks) = registry.subscribers.get_mut(&handle.kind) {
            let before = callbacks.len();
            callbacks.retain(|(id, _)| *id != handle.id);
            return callbacks.len() < before;
        }
        false
    }

    /// Drop every registration for every kind.
    pub fn clear(&self) {
        self.lock().subscribers.clear();
    }

    /// Dispatch a decoded server record: kind-specific subscribers first,
    /// then the catch-all channel.
    pub fn publish(&self, event: &StreamEvent) {
        self.dispatch(event.kind(), event);
        self.dispatch(EventKind::Any, event);
    }

    /// Dispatch an engine-synthesized notification to its kind only.
    pub fn notify(&self, event: &StreamEvent) {
        self.dispatch(event.kind(), event);
    }

    fn dispatch(&self, kind: EventKind, event: &StreamEvent) {
        // Snapshot under the lock so callbacks can themselves subscribe or
        // unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = {
            let registry = self.lock();
            match registry.subscribers.get(&kind) {
                Some(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::warn!(kind = kind.as_str(), "subscriber panicked; continuing");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        let count: usize = registry.subscribers.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("subscribers", &count)
            .finish()
    }
}
