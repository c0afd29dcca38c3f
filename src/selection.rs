//! SelectionTracker: the set of checked record ids for batch delete.
//!
//! Checkbox state is row-scoped, not cache-scoped: whenever the cache is
//! replaced the selection is cleared, so the tracked set is always a subset
//! of the rendered page's ids.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::types::RecordId;

/// Aggregate state for the select-all indicator and the batch-delete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSummary {
    pub count: usize,
    /// True when every rendered row is checked (and there is at least one).
    pub all_selected: bool,
    /// Batch delete is enabled only with a non-empty selection.
    pub enabled: bool,
}

impl SelectionSummary {
    /// Label for the batch-delete action, carrying the live count.
    pub fn label(&self) -> String {
        format!("Eliminar seleccionados ({})", self.count)
    }
}

#[derive(Default)]
pub struct SelectionTracker {
    selected: Mutex<HashSet<RecordId>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck a single row.
    pub fn set(&self, id: RecordId, checked: bool) {
        let mut selected = self.selected.lock();
        if checked {
            selected.insert(id);
        } else {
            selected.remove(&id);
        }
    }

    pub fn toggle(&self, id: RecordId) {
        let mut selected = self.selected.lock();
        if !selected.insert(id) {
            selected.remove(&id);
        }
    }

    /// The select-all toggle: set every rendered row to the same state.
    pub fn set_all(&self, page_ids: &[RecordId], checked: bool) {
        let mut selected = self.selected.lock();
        if checked {
            selected.extend(page_ids.iter().copied());
        } else {
            for id in page_ids {
                selected.remove(id);
            }
        }
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        self.selected.lock().contains(&id)
    }

    /// Selected ids in the given page order.
    pub fn selected_in(&self, page_ids: &[RecordId]) -> Vec<RecordId> {
        let selected = self.selected.lock();
        page_ids
            .iter()
            .copied()
            .filter(|id| selected.contains(id))
            .collect()
    }

    pub fn summary(&self, page_ids: &[RecordId]) -> SelectionSummary {
        let selected = self.selected.lock();
        let count = page_ids.iter().filter(|id| selected.contains(id)).count();
        SelectionSummary {
            count,
            all_selected: count > 0 && count == page_ids.len(),
            enabled: count > 0,
        }
    }

    /// Invalidate everything. Called on every cache replacement.
    pub fn clear(&self) {
        self.selected.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.lock().is_empty()
    }
}
