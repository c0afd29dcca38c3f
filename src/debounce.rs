//! DebounceGate: coalesces a burst of triggers into one delayed action.
//!
//! Each trigger supersedes any pending one; only the newest scheduled action
//! fires, after a full quiet window. There is no queue: superseded triggers
//! are dropped entirely, which matches a clear-and-reset timer.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Quiet window for free-text search input.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct DebounceGate {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl DebounceGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `action` to run after the quiet window, superseding any
    /// pending trigger. The superseded task wakes, sees a newer generation
    /// and exits without running its action.
    pub fn trigger<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) == generation {
                action().await;
            }
        });
    }

    /// Drop any pending trigger without scheduling a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
