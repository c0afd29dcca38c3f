//! RosterClient: the single owner of all reconciliation state.
//!
//! One instance holds the cache, selection, query state, pagination,
//! statistics and timers that would otherwise live as page-level globals.
//! Renderers subscribe to [`ViewEvent`]s and read state back through the
//! accessors; the mutation and query methods live in their own submodules.

mod mutation;
mod query;

pub use query::QueryState;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::sync::Mutex as TokioMutex;

use crate::auth::AuthProvider;
use crate::cache::RecordCache;
use crate::debounce::{DebounceGate, SEARCH_DEBOUNCE};
use crate::poll::{PollScheduler, POLL_INTERVAL};
use crate::reactive::{EventEmitter, Subscription, ViewEvent};
use crate::selection::{SelectionSummary, SelectionTracker};
use crate::transport::RecordTransport;
use crate::types::{PageInfo, RecordId, StatisticsReport, Student};

/// Records shown per page.
pub const PAGE_SIZE: u32 = 10;

/// Interactive yes/no prompt for destructive mutations. Returning `false`
/// aborts the mutation before any state change or network call.
pub type ConfirmFn = dyn Fn(&str) -> bool + Send + Sync;

// ============================================================================
// Options
// ============================================================================

/// Configuration for [`RosterClient`]. `None` fields take the defaults the
/// upstream UI uses (10 per page, 500 ms debounce, 30 s poll).
pub struct RosterClientOptions {
    pub transport: Arc<dyn RecordTransport>,
    pub auth: Arc<dyn AuthProvider>,
    pub page_size: Option<u32>,
    pub debounce_delay: Option<Duration>,
    pub poll_interval: Option<Duration>,
    /// Confirmation prompt. `None` means non-interactive: destructive
    /// mutations proceed unprompted.
    pub confirm: Option<Arc<ConfirmFn>>,
}

impl RosterClientOptions {
    pub fn new(transport: Arc<dyn RecordTransport>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            transport,
            auth,
            page_size: None,
            debounce_delay: None,
            poll_interval: None,
            confirm: None,
        }
    }
}

// ============================================================================
// RosterClient
// ============================================================================

pub struct RosterClient {
    transport: Arc<dyn RecordTransport>,
    auth: Arc<dyn AuthProvider>,
    cache: RecordCache,
    selection: SelectionTracker,
    events: EventEmitter<ViewEvent>,
    page_size: u32,
    confirm: Option<Arc<ConfirmFn>>,

    /// Current `(filters, page)` pair; a change to either invalidates every
    /// in-flight list response via `epoch`.
    query: Mutex<QueryState>,
    /// Generation counter: bumped at each list dispatch, checked at arrival.
    epoch: AtomicU64,
    pagination: Mutex<PageInfo>,
    statistics: Mutex<Option<StatisticsReport>>,
    current_edit: Mutex<Option<i64>>,

    /// Temp-id source for optimistic creates, seeded from the wall clock so
    /// values stay unique across client instances.
    temp_ids: AtomicU64,
    /// Per-record async locks serializing mutations on the same record.
    locks: Mutex<HashMap<String, Arc<TokioMutex<()>>>>,

    debounce: DebounceGate,
    poll: PollScheduler,
}

impl RosterClient {
    pub fn new(options: RosterClientOptions) -> Arc<Self> {
        let page_size = options.page_size.unwrap_or(PAGE_SIZE);
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(1);

        Arc::new(Self {
            transport: options.transport,
            auth: options.auth,
            cache: RecordCache::new(),
            selection: SelectionTracker::new(),
            events: EventEmitter::new(),
            page_size,
            confirm: options.confirm,
            query: Mutex::new(QueryState::default()),
            epoch: AtomicU64::new(0),
            pagination: Mutex::new(PageInfo::empty(1, page_size)),
            statistics: Mutex::new(None),
            current_edit: Mutex::new(None),
            temp_ids: AtomicU64::new(seed),
            locks: Mutex::new(HashMap::new()),
            debounce: DebounceGate::new(options.debounce_delay.unwrap_or(SEARCH_DEBOUNCE)),
            poll: PollScheduler::new(options.poll_interval.unwrap_or(POLL_INTERVAL)),
        })
    }

    // -----------------------------------------------------------------------
    // Render-side accessors
    // -----------------------------------------------------------------------

    /// The current page as last known, in render order.
    pub fn records(&self) -> Vec<Student> {
        self.cache.snapshot()
    }

    pub fn pagination(&self) -> PageInfo {
        *self.pagination.lock()
    }

    pub fn statistics(&self) -> Option<StatisticsReport> {
        self.statistics.lock().clone()
    }

    pub fn current_query(&self) -> QueryState {
        self.query.lock().clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The record id loaded into the edit form, if any.
    pub fn editing(&self) -> Option<i64> {
        *self.current_edit.lock()
    }

    pub fn on_event(&self, callback: impl Fn(&ViewEvent) + Send + Sync + 'static) -> Subscription {
        self.events.subscribe(callback)
    }

    pub fn off_event(&self, subscription: Subscription) {
        self.events.unsubscribe(subscription);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select(&self, id: RecordId, checked: bool) {
        self.selection.set(id, checked);
        self.emit_selection();
    }

    /// The select-all toggle over the currently rendered page.
    pub fn select_all(&self, checked: bool) {
        self.selection.set_all(&self.cache.ids(), checked);
        self.emit_selection();
    }

    pub fn selection_summary(&self) -> SelectionSummary {
        self.selection.summary(&self.cache.ids())
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Start the background refresh of the current page and statistics.
    /// Holds only a weak reference, so dropping the client stops the timer.
    pub fn start_polling(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.poll.start(move || {
            let weak = weak.clone();
            async move {
                if let Some(client) = weak.upgrade() {
                    client.poll_tick().await;
                }
            }
        });
    }

    /// Cancel the background refresh. Must be called on page teardown;
    /// dropping the client does it too.
    pub fn stop_polling(&self) {
        self.poll.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }

    async fn poll_tick(&self) {
        self.refresh_silent().await;
        self.load_statistics().await;
    }

    // -----------------------------------------------------------------------
    // Internal plumbing shared by query.rs / mutation.rs
    // -----------------------------------------------------------------------

    pub(crate) fn emit(&self, event: ViewEvent) {
        self.events.emit(&event);
    }

    pub(crate) fn emit_records(&self) {
        self.events.emit(&ViewEvent::RecordsChanged);
    }

    pub(crate) fn emit_selection(&self) {
        self.events
            .emit(&ViewEvent::SelectionChanged(self.selection_summary()));
    }

    /// Swap the cache wholesale. Selection is row-scoped, so every
    /// replacement clears it.
    pub(crate) fn replace_records(&self, records: Vec<Student>) {
        self.cache.replace(records);
        self.selection.clear();
        self.emit_records();
        self.emit_selection();
    }

    pub(crate) fn next_temp_id(&self) -> u64 {
        self.temp_ids.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn confirmed(&self, prompt: &str) -> bool {
        match &self.confirm {
            Some(confirm) => confirm(prompt),
            None => true,
        }
    }

    pub(crate) fn set_editing(&self, id: Option<i64>) {
        *self.current_edit.lock() = id;
    }

    /// Serialize work under the named slot. Lock creation is synchronous;
    /// the guard is held across the future, so two mutations on the same
    /// record run strictly one after the other.
    pub(crate) async fn with_lock<T, F: std::future::Future<Output = T>>(
        &self,
        key: String,
        f: F,
    ) -> T {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(TokioMutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;
        f.await
    }

    pub(crate) fn transport(&self) -> &dyn RecordTransport {
        &*self.transport
    }

    pub(crate) fn auth(&self) -> &dyn AuthProvider {
        &*self.auth
    }

    pub(crate) fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub(crate) fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub(crate) fn debounce(&self) -> &DebounceGate {
        &self.debounce
    }
}
