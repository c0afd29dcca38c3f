//! Query side of the client: filters, pagination, list loads, statistics.
//!
//! Every list dispatch captures a generation number from `epoch`; a response
//! is applied only when no newer dispatch has happened since. Two responses
//! arriving out of order therefore can never leave the cache on a superseded
//! `(filters, page)` pair: the older one is discarded on arrival.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::reactive::{StatusMessage, ViewEvent};
use crate::types::{FilterSet, ListPage, ListQuery, StudentStatus};

use super::RosterClient;

/// The `(filters, page)` pair the controller owns.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub filters: FilterSet,
    pub page: u32,
}

impl Default for QueryState {
    /// Page 1, no constraints.
    fn default() -> Self {
        Self {
            filters: FilterSet::default(),
            page: 1,
        }
    }
}

impl QueryState {
    /// Pages are 1-based.
    pub fn current_page(&self) -> u32 {
        self.page.max(1)
    }
}

/// How a list load reports progress and failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    /// User-triggered: skeleton indicator plus an error message on failure.
    Interactive,
    /// Post-mutation reload: no indicator, failures still surfaced.
    Background,
    /// Poll tick: no indicator, failures only logged.
    Silent,
}

impl RosterClient {
    // -----------------------------------------------------------------------
    // Loads
    // -----------------------------------------------------------------------

    /// Load the current page, with the loading indicator.
    pub async fn load(&self) {
        self.load_page(LoadMode::Interactive).await;
    }

    /// Authoritative reload after a committed mutation: picks up the
    /// server-assigned ids and any pagination-total drift.
    pub(crate) async fn reload(&self) {
        self.load_page(LoadMode::Background).await;
    }

    /// Poll-tick refresh: no indicator, failures logged and retried at the
    /// next interval.
    pub async fn refresh_silent(&self) {
        self.load_page(LoadMode::Silent).await;
    }

    async fn load_page(&self, mode: LoadMode) {
        let generation = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let state = self.query.lock();
            ListQuery {
                filters: state.filters.clone(),
                page: state.current_page(),
                limit: self.page_size(),
            }
        };

        if mode == LoadMode::Interactive {
            self.emit(ViewEvent::LoadingChanged(true));
        }

        let result = self.transport().list(&query).await;

        if mode == LoadMode::Interactive {
            self.emit(ViewEvent::LoadingChanged(false));
        }

        // Staleness gate: a newer dispatch supersedes this response, whatever
        // it carries.
        if self.epoch.load(Ordering::SeqCst) != generation {
            tracing::debug!(
                page = query.page,
                "discarding superseded list response"
            );
            return;
        }

        match result {
            Ok(page) => self.apply_page(page),
            Err(e) => match mode {
                // Keep showing the last good cache; only report.
                LoadMode::Silent => {
                    tracing::warn!(error = %e, "background refresh failed");
                }
                _ => self.emit(ViewEvent::Message(StatusMessage::error(e.user_message()))),
            },
        }
    }

    fn apply_page(&self, page: ListPage) {
        self.replace_records(page.records);
        *self.pagination.lock() = page.pagination;
        self.emit(ViewEvent::PaginationChanged(page.pagination));
    }

    // -----------------------------------------------------------------------
    // Filters and navigation
    // -----------------------------------------------------------------------

    /// Debounced free-text search: schedules a filter change after the quiet
    /// window; rapid keystrokes supersede each other and only the last value
    /// queries.
    pub fn search_input(self: &Arc<Self>, text: impl Into<String>) {
        let text = text.into();
        let client = Arc::clone(self);
        self.debounce().trigger(move || async move {
            client.set_search(text).await;
        });
    }

    pub async fn set_search(&self, text: impl Into<String>) {
        let text = text.into();
        let trimmed = text.trim();
        let search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.update_filters(|filters| filters.search = search).await;
    }

    pub async fn set_status_filter(&self, status: Option<StudentStatus>) {
        self.update_filters(|filters| filters.status = status).await;
    }

    pub async fn set_program_filter(&self, program: Option<String>) {
        self.update_filters(|filters| filters.program = program)
            .await;
    }

    pub async fn set_grade_bounds(&self, min: Option<f64>, max: Option<f64>) {
        self.update_filters(|filters| {
            filters.grade_min = min;
            filters.grade_max = max;
        })
        .await;
    }

    /// Any filter change resets to page 1: the old page number is meaningless
    /// against a different result set.
    async fn update_filters(&self, mutate: impl FnOnce(&mut FilterSet)) {
        {
            let mut state = self.query.lock();
            mutate(&mut state.filters);
            state.page = 1;
        }
        self.load_page(LoadMode::Interactive).await;
    }

    /// Navigate to a page. Deliberately not clamped: a page past the current
    /// total renders empty rather than snapping back (the next authoritative
    /// totals still come from the server).
    pub async fn set_page(&self, page: u32) {
        {
            let mut state = self.query.lock();
            state.page = page.max(1);
        }
        self.load_page(LoadMode::Interactive).await;
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Refresh the dashboard numbers. Failures are logged, never surfaced:
    /// statistics are decoration, not the record of truth.
    pub async fn load_statistics(&self) {
        match self.transport().statistics().await {
            Ok(report) => {
                *self.statistics.lock() = Some(report.clone());
                self.emit(ViewEvent::StatisticsChanged(report));
            }
            Err(e) => {
                tracing::warn!(error = %e, "statistics refresh failed");
            }
        }
    }
}
