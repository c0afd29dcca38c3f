//! PollScheduler: a fixed-interval background refresh.
//!
//! Drives a silent reload of the current page and statistics, independent of
//! user action. A tick that fails is the tick callback's problem (logged,
//! skipped); the schedule itself never stops until [`PollScheduler::stop`] or
//! drop. Stopping aborts the timer task so nothing leaks past teardown.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Default refresh interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct PollScheduler {
    interval: Duration,
    disposed: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            disposed: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Start ticking. The first tick fires one full interval from now.
    /// Restarting replaces any previous schedule.
    pub fn start<F, Fut>(&self, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        self.disposed.store(false, Ordering::SeqCst);

        let disposed = Arc::clone(&self.disposed);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if disposed.load(Ordering::SeqCst) {
                    break;
                }
                tick().await;
            }
        });

        *self.handle.lock() = Some(handle);
    }

    /// Cancel the recurring timer. Idempotent; also runs on drop.
    pub fn stop(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
