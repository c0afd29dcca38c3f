use std::time::Duration;

use crate::selection::SelectionSummary;
use crate::types::{PageInfo, StatisticsReport};

/// How long a transient status message stays on screen before the renderer
/// dismisses it.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, auto-dismissed user notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything the renderer needs to know about, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The cache content changed; re-read [`crate::cache::RecordCache::snapshot`].
    RecordsChanged,
    /// Authoritative pagination metadata from the latest list response.
    PaginationChanged(PageInfo),
    /// The selection set or its aggregate indicator changed.
    SelectionChanged(SelectionSummary),
    /// Fresh statistics for the dashboard cards and charts.
    StatisticsChanged(StatisticsReport),
    /// A transient status message (see [`MESSAGE_TTL`]).
    Message(StatusMessage),
    /// Whether a non-silent list request is in flight (skeleton rows).
    LoadingChanged(bool),
}
