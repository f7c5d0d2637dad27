use crate::state::{Fields, Origin};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::error;

#[cfg(test)]
mod tests;

/// Listener invoked synchronously after each store mutation commits,
/// carrying the originating identity, the entity id, and the entity's
/// current record.
pub type Listener = Box<dyn Fn(Origin, &str, &Fields) + Send + Sync>;

/// Handle returned by [`EventBus::register`], usable to remove the listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Ordered list of change listeners.
///
/// Listeners run in registration order. A panicking listener is caught and
/// logged; later listeners still run and the mutation stands.
pub struct EventBus {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a listener; it will observe every subsequent mutation.
    pub fn register(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .expect("listener list lock poisoned")
            .push((id, listener));
        id
    }

    /// Remove a previously registered listener. Unknown ids are a no-op.
    pub fn unregister(&self, id: ListenerId) {
        self.listeners
            .write()
            .expect("listener list lock poisoned")
            .retain(|(listener_id, _)| *listener_id != id);
    }

    /// Call every listener in registration order with the committed change.
    pub fn notify(&self, origin: Origin, entity_id: &str, fields: &Fields) {
        let listeners = self.listeners.read().expect("listener list lock poisoned");
        for (id, listener) in listeners.iter() {
            let call = AssertUnwindSafe(|| listener(origin, entity_id, fields));
            if catch_unwind(call).is_err() {
                error!(listener = id.0, entity = %entity_id, "listener panicked, continuing");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
