//! RecordCache: the ordered in-memory snapshot of the current page.
//!
//! Single source of truth for rendering. Every operation is synchronous and
//! local; nothing here touches the network. The owning client emits a view
//! event right after each mutation, before any request is awaited, so the UI
//! always reflects optimistic state first.

use parking_lot::Mutex;

use crate::types::{RecordId, Student, StudentPatch};

/// Invariant: at most one record per id, in server order (newest first after
/// an authoritative replace).
#[derive(Default)]
pub struct RecordCache {
    records: Mutex<Vec<Student>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swap the full sequence. Used after every authoritative
    /// list response.
    pub fn replace(&self, records: Vec<Student>) {
        *self.records.lock() = records;
    }

    /// Optimistic create: prepend.
    pub fn insert_front(&self, record: Student) {
        let mut records = self.records.lock();
        records.retain(|r| r.id != record.id);
        records.insert(0, record);
    }

    /// Optimistic update: merge fields into the matching record. Returns the
    /// pre-patch record for rollback, or `None` (no-op) if absent.
    pub fn patch(&self, id: RecordId, patch: &StudentPatch) -> Option<Student> {
        let mut records = self.records.lock();
        let record = records.iter_mut().find(|r| r.id == id)?;
        let previous = record.clone();
        record.apply_patch(patch);
        Some(previous)
    }

    /// Put a record back in place, matched by id. Used to roll back a
    /// failed optimistic patch; position is unchanged since patching never
    /// reorders. Returns false if the id is gone.
    pub fn restore(&self, record: Student) -> bool {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Optimistic delete. Returns the removed record, if present.
    pub fn remove(&self, id: RecordId) -> Option<Student> {
        let mut records = self.records.lock();
        let index = records.iter().position(|r| r.id == id)?;
        Some(records.remove(index))
    }

    /// Optimistic batch delete. Ids absent from the cache are skipped.
    pub fn remove_many(&self, ids: &[RecordId]) -> Vec<Student> {
        let mut records = self.records.lock();
        let mut removed = Vec::new();
        records.retain(|r| {
            if ids.contains(&r.id) {
                removed.push(r.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Full copy of the current page, for rendering and for pre-mutation
    /// snapshots.
    pub fn snapshot(&self) -> Vec<Student> {
        self.records.lock().clone()
    }

    pub fn get(&self, id: RecordId) -> Option<Student> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.lock().iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
