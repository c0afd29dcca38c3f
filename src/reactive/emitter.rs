//! Typed synchronous pub/sub for view events.
//!
//! Subscribers are `Arc<dyn Fn(&T)>`; `emit` snapshots the subscriber list
//! under the lock and calls back with the lock released, so a callback may
//! subscribe or unsubscribe without deadlocking. A subscriber removed during
//! an emission still sees that emission; one added during it does not.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by [`EventEmitter::subscribe`]; pass to
/// [`EventEmitter::unsubscribe`] to detach.
pub type Subscription = u64;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct EventEmitter<T> {
    subscribers: Mutex<Vec<(Subscription, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Detach a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: Subscription) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id);
    }

    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Callback<T>> = {
            let subscribers = self.subscribers.lock();
            subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for callback in snapshot {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
