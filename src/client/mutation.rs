//! Mutation side of the client: optimistic apply, commit, rollback.
//!
//! Every mutation follows the same lifecycle, in this order and never
//! interleaved within one mutation: snapshot the pre-edit state, apply the
//! optimistic edit to the cache, emit, send the request, then either commit
//! (drop the snapshot, reload authoritatively) or roll back (replay the
//! snapshot, surface the failure). Mutations on the same record are
//! serialized by a per-record lock, so a snapshot is always taken against
//! settled state and rollback always lands on the true pre-mutation cache.

use crate::error::{Result, ValidationError};
use crate::reactive::{StatusMessage, ViewEvent};
use crate::types::{RecordId, Student, StudentDraft, StudentPatch};

use super::RosterClient;

impl RosterClient {
    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Optimistic create: the draft appears at the top of the page with a
    /// temporary id before the request is sent. On commit the page is
    /// reloaded so the server-assigned id takes over; the temp id is never
    /// treated as final.
    pub async fn create_student(&self, draft: StudentDraft) -> Result<()> {
        let temp_id = RecordId::Pending(self.next_temp_id());
        let record = Student {
            id: temp_id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            program: draft.program.clone(),
            grade: draft.grade,
            status: draft.status.unwrap_or_default(),
            user_id: self.auth().current_user().map(|u| u.id),
            created_at: None,
        };

        self.cache().insert_front(record);
        self.emit_records();
        self.emit(ViewEvent::Message(StatusMessage::info("Creating student...")));

        match self.transport().create(&draft).await {
            Ok(ack) => {
                self.emit(ViewEvent::Message(StatusMessage::success(
                    ack.message
                        .unwrap_or_else(|| "Student created".to_string()),
                )));
                self.set_editing(None);
                self.reload().await;
                Ok(())
            }
            Err(e) => {
                self.cache().remove(temp_id);
                self.emit_records();
                self.emit(ViewEvent::Message(StatusMessage::error(e.user_message())));
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Optimistic update. The pre-patch record is the rollback snapshot; a
    /// patch against an id missing from the cache is a silent cache no-op
    /// but the request is still sent (the record may live on another page).
    pub async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<()> {
        self.with_lock(format!("record:{id}"), async {
            let record_id = RecordId::Committed(id);
            let snapshot = self.cache().patch(record_id, &patch);
            self.emit_records();
            self.emit(ViewEvent::Message(StatusMessage::info("Updating student...")));

            match self.transport().update(id, &patch).await {
                Ok(ack) => {
                    self.emit(ViewEvent::Message(StatusMessage::success(
                        ack.message
                            .unwrap_or_else(|| "Student updated".to_string()),
                    )));
                    self.set_editing(None);
                    self.reload().await;
                    Ok(())
                }
                Err(e) => {
                    if let Some(previous) = snapshot {
                        self.cache().restore(previous);
                    }
                    self.emit_records();
                    self.emit(ViewEvent::Message(StatusMessage::error(e.user_message())));
                    Err(e.into())
                }
            }
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Confirmed, optimistic single delete. The full page is the rollback
    /// snapshot, so a failed delete restores order as well as content.
    pub async fn delete_student(&self, id: i64) -> Result<()> {
        if !self.confirmed("Delete this student?") {
            return Err(ValidationError::ConfirmationDeclined.into());
        }

        self.with_lock(format!("record:{id}"), async {
            let record_id = RecordId::Committed(id);
            let snapshot = self.cache().snapshot();
            self.cache().remove(record_id);
            self.selection().set(record_id, false);
            self.emit_records();
            self.emit_selection();
            self.emit(ViewEvent::Message(StatusMessage::info("Deleting student...")));

            match self.transport().delete(id).await {
                Ok(ack) => {
                    self.emit(ViewEvent::Message(StatusMessage::success(
                        ack.message
                            .unwrap_or_else(|| "Student deleted".to_string()),
                    )));
                    self.reload().await;
                    Ok(())
                }
                Err(e) => {
                    self.replace_records(snapshot);
                    self.emit(ViewEvent::Message(StatusMessage::error(e.user_message())));
                    Err(e.into())
                }
            }
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Batch delete
    // -----------------------------------------------------------------------

    /// Confirmed, optimistic batch delete of the current selection.
    ///
    /// Rejected locally, before the coordinator is ever involved, when the
    /// selection is empty or the user lacks the admin role. A partial server
    /// outcome (some ids failed) still commits: the reload reconciles the
    /// cache with whatever actually survived.
    pub async fn batch_delete_selected(&self) -> Result<()> {
        if !self.auth().is_admin() {
            self.emit(ViewEvent::Message(StatusMessage::warning(
                ValidationError::NotPermitted.to_string(),
            )));
            return Err(ValidationError::NotPermitted.into());
        }

        let selected = self.selection().selected_in(&self.cache().ids());
        let ids: Vec<i64> = selected.iter().filter_map(|id| id.committed()).collect();
        if ids.is_empty() {
            self.emit(ViewEvent::Message(StatusMessage::warning(
                ValidationError::EmptySelection.to_string(),
            )));
            return Err(ValidationError::EmptySelection.into());
        }

        if !self.confirmed(&format!("Delete {} student(s)?", ids.len())) {
            return Err(ValidationError::ConfirmationDeclined.into());
        }

        self.with_lock("batch".to_string(), async {
            let snapshot = self.cache().snapshot();
            self.cache().remove_many(&selected);
            self.selection().clear();
            self.emit_records();
            self.emit_selection();
            self.emit(ViewEvent::Message(StatusMessage::info(
                "Deleting students...",
            )));

            match self.transport().batch_delete(&ids).await {
                Ok(outcome) => {
                    self.emit(ViewEvent::Message(StatusMessage::success(format!(
                        "{} student(s) deleted",
                        outcome.deleted
                    ))));
                    if !outcome.errors.is_empty() {
                        tracing::warn!(
                            failed = outcome.errors.len(),
                            "batch delete skipped some ids"
                        );
                    }
                    self.reload().await;
                    Ok(())
                }
                Err(e) => {
                    self.replace_records(snapshot);
                    self.emit(ViewEvent::Message(StatusMessage::error(e.user_message())));
                    Err(e.into())
                }
            }
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Edit flow
    // -----------------------------------------------------------------------

    /// Load a record for the edit form and enter edit mode.
    pub async fn begin_edit(&self, id: i64) -> Result<Student> {
        match self.transport().read_one(id).await {
            Ok(student) => {
                self.set_editing(Some(id));
                Ok(student)
            }
            Err(e) => {
                self.emit(ViewEvent::Message(StatusMessage::error(e.user_message())));
                Err(e.into())
            }
        }
    }

    pub fn cancel_edit(&self) {
        self.set_editing(None);
    }

    /// Route a submitted form: update when editing, create otherwise.
    pub async fn submit_form(&self, draft: StudentDraft) -> Result<()> {
        match self.editing() {
            Some(id) => self.update_student(id, draft.into()).await,
            None => self.create_student(draft).await,
        }
    }
}
