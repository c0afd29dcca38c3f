//! Mutation coordinator tests: optimistic apply, commit, rollback.
//!
//! The rollback invariant under test: for every mutation kind, if the remote
//! call fails (transport error, application error, or local validation), the
//! cache afterwards is element-wise equal to the cache before the optimistic
//! edit.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use roster_client::auth::Role;
use roster_client::error::{RosterError, TransportError, ValidationError};
use roster_client::reactive::MessageLevel;
use roster_client::types::{RecordId, StudentDraft, StudentPatch};

use super::support::{make_client, seed_dataset, ClientBuilder, EventLog, MockTransport};

fn draft(name: &str, email: &str, program: &str) -> StudentDraft {
    StudentDraft {
        name: name.to_string(),
        email: email.to_string(),
        program: program.to_string(),
        grade: None,
        status: None,
    }
}

fn name_patch(name: &str) -> StudentPatch {
    StudentPatch {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_failure_rolls_back_the_optimistic_insert() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;
    let before = client.records();

    transport.fail_create(TransportError::Api {
        status: 503,
        message: "No se pudo crear el estudiante.".to_string(),
    });
    let log = EventLog::attach(&client);

    let result = client.create_student(draft("Ana", "ana@x.co", "CS")).await;

    assert!(matches!(result, Err(RosterError::Transport(_))));
    assert_eq!(client.records(), before);
    assert!(log.has_message(MessageLevel::Error, "No se pudo crear"));
}

#[tokio::test]
async fn create_connection_failure_surfaces_generic_message() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let client = make_client(transport.clone());
    client.load().await;
    let before = client.records();

    transport.fail_create(TransportError::Connection("socket closed".to_string()));
    let log = EventLog::attach(&client);

    let result = client.create_student(draft("Ana", "ana@x.co", "CS")).await;

    assert!(result.is_err());
    assert_eq!(client.records(), before);
    assert!(log.has_message(MessageLevel::Error, "Connection error"));
}

#[tokio::test]
async fn create_success_reloads_with_server_id() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let client = make_client(transport.clone());
    client.load().await;

    client
        .create_student(draft("Ana", "ana@x.co", "CS"))
        .await
        .unwrap();

    let records = client.records();
    assert_eq!(records[0].name, "Ana");
    // The temp id never survives the authoritative reload.
    assert_eq!(records[0].id, RecordId::Committed(3));
    assert!(records.iter().all(|r| !r.id.is_pending()));
    assert_eq!(client.pagination().total, 3);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_applies_optimistically_before_the_request_resolves() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;

    transport.push_update_delay(Duration::from_millis(50));
    let updater = client.clone();
    let handle =
        tokio::spawn(async move { updater.update_student(2, name_patch("Renamed")).await });

    tokio::time::sleep(Duration::from_millis(15)).await;
    let mid_flight = client
        .records()
        .into_iter()
        .find(|r| r.id == RecordId::Committed(2))
        .unwrap();
    assert_eq!(mid_flight.name, "Renamed");

    handle.await.unwrap().unwrap();
    let settled = transport.dataset();
    assert_eq!(
        settled
            .iter()
            .find(|r| r.id == RecordId::Committed(2))
            .unwrap()
            .name,
        "Renamed"
    );
}

#[tokio::test]
async fn update_failure_restores_the_pre_patch_record() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;
    let before = client.records();

    transport.fail_update(TransportError::Api {
        status: 404,
        message: "Estudiante no encontrado.".to_string(),
    });
    let log = EventLog::attach(&client);

    let result = client.update_student(2, name_patch("Ghost")).await;

    assert!(result.is_err());
    assert_eq!(client.records(), before);
    assert!(log.has_message(MessageLevel::Error, "no encontrado"));
}

#[tokio::test]
async fn update_on_a_record_outside_the_page_still_reaches_the_server() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;

    // Id 99 is not in the cache; the optimistic patch is a no-op.
    let before = client.records();
    let result = client.update_student(99, name_patch("Elsewhere")).await;

    assert!(result.is_err()); // mock answers 404
    assert_eq!(client.records(), before);
    assert_eq!(transport.update_calls().len(), 1);
}

#[tokio::test]
async fn second_update_on_the_same_record_waits_for_the_first() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;

    transport.push_update_delay(Duration::from_millis(60));

    let first = client.clone();
    let h1 = tokio::spawn(async move { first.update_student(1, name_patch("First")).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = client.clone();
    let h2 = tokio::spawn(async move { second.update_student(1, name_patch("Second")).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // While the first request is in flight, the queued mutation has not
    // touched the cache: its snapshot will be taken against settled state.
    let mid_flight = client
        .records()
        .into_iter()
        .find(|r| r.id == RecordId::Committed(1))
        .unwrap();
    assert_eq!(mid_flight.name, "First");

    h1.await.unwrap().unwrap();
    h2.await.unwrap().unwrap();

    let calls = transport.update_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.name.as_deref(), Some("First"));
    assert_eq!(calls[1].1.name.as_deref(), Some("Second"));

    let settled = transport.dataset();
    assert_eq!(
        settled
            .iter()
            .find(|r| r.id == RecordId::Committed(1))
            .unwrap()
            .name,
        "Second"
    );
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_asks_for_confirmation_and_declining_aborts() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let prompts: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = prompts.clone();
    let client = ClientBuilder::new(transport.clone())
        .confirm(move |prompt| {
            seen.lock().push(prompt.to_string());
            false
        })
        .build();
    client.load().await;
    let before = client.records();

    let result = client.delete_student(2).await;

    assert!(matches!(
        result,
        Err(RosterError::Validation(ValidationError::ConfirmationDeclined))
    ));
    assert_eq!(*prompts.lock(), vec!["Delete this student?".to_string()]);
    assert_eq!(client.records(), before);
    assert!(transport.delete_calls().is_empty());
}

#[tokio::test]
async fn delete_success_removes_the_row_and_reloads_totals() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;

    client.delete_student(2).await.unwrap();

    let ids: Vec<RecordId> = client.records().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![RecordId::Committed(3), RecordId::Committed(1)]);
    assert_eq!(client.pagination().total, 2);
}

#[tokio::test]
async fn delete_failure_restores_content_and_order() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;
    let before = client.records();

    transport.fail_delete(TransportError::Connection("reset by peer".to_string()));
    let result = client.delete_student(2).await;

    assert!(result.is_err());
    assert_eq!(client.records(), before);
}

// ============================================================================
// Batch delete
// ============================================================================

#[tokio::test]
async fn batch_delete_with_empty_selection_never_reaches_the_network() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;
    let log = EventLog::attach(&client);

    let result = client.batch_delete_selected().await;

    assert!(matches!(
        result,
        Err(RosterError::Validation(ValidationError::EmptySelection))
    ));
    assert!(transport.batch_calls().is_empty());
    assert!(log.has_message(MessageLevel::Warning, "No records selected"));
}

#[tokio::test]
async fn batch_delete_requires_the_admin_role() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = ClientBuilder::new(transport.clone())
        .role(Role::Student)
        .build();
    client.load().await;
    client.select_all(true);

    let result = client.batch_delete_selected().await;

    assert!(matches!(
        result,
        Err(RosterError::Validation(ValidationError::NotPermitted))
    ));
    assert!(transport.batch_calls().is_empty());
}

#[tokio::test]
async fn batch_delete_partial_outcome_commits_and_reconciles() {
    // The server knows ids 1 and 2; id 999 appears on the rendered page (a
    // poll raced a concurrent delete) but is already gone server-side.
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let stale = {
        let mut record = super::support::student(999, "Fantasma", "f@x.co", "CS");
        record.created_at = None;
        record
    };
    {
        let stale = stale.clone();
        transport.on_list(move |query| {
            let mut records = vec![stale.clone()];
            records.extend(seed_dataset(2));
            let total = records.len() as u64;
            Ok(roster_client::types::ListPage {
                records,
                pagination: roster_client::types::PageInfo {
                    total,
                    page: query.page,
                    limit: query.limit,
                    total_pages: 1,
                },
                message: None,
            })
        });
    }

    let client = make_client(transport.clone());
    client.load().await;
    client.select_all(true);
    transport.reset_list_responder();
    let log = EventLog::attach(&client);

    client.batch_delete_selected().await.unwrap();

    let calls = transport.batch_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec![999, 2, 1]);

    // Two real deletions reported; the ghost id surfaced as an error but did
    // not fail the batch, and the reload settled on the surviving truth.
    assert!(log.has_message(MessageLevel::Success, "2 student(s) deleted"));
    assert!(client.records().is_empty());
    assert_eq!(client.pagination().total, 0);
}

#[tokio::test]
async fn batch_delete_failure_restores_the_page_and_total_zero_is_a_failure() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let client = make_client(transport.clone());
    client.load().await;
    client.select_all(true);
    let before = client.records();

    transport.fail_batch_delete(TransportError::Api {
        status: 400,
        message: "No se pudo eliminar ningún estudiante".to_string(),
    });
    let log = EventLog::attach(&client);

    let result = client.batch_delete_selected().await;

    assert!(result.is_err());
    assert_eq!(client.records(), before);
    assert!(log.has_message(MessageLevel::Error, "No se pudo eliminar"));
}

#[tokio::test]
async fn batch_delete_confirmation_prompt_carries_the_count() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(3)));
    let prompts: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = prompts.clone();
    let client = ClientBuilder::new(transport.clone())
        .confirm(move |prompt| {
            seen.lock().push(prompt.to_string());
            false
        })
        .build();
    client.load().await;
    client.select_all(true);

    let result = client.batch_delete_selected().await;

    assert!(result.is_err());
    assert_eq!(*prompts.lock(), vec!["Delete 3 student(s)?".to_string()]);
    assert!(transport.batch_calls().is_empty());
}

// ============================================================================
// Edit flow
// ============================================================================

#[tokio::test]
async fn submit_routes_to_update_while_editing_and_create_otherwise() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let client = make_client(transport.clone());
    client.load().await;

    let loaded = client.begin_edit(2).await.unwrap();
    assert_eq!(loaded.name, "Student 2");
    assert_eq!(client.editing(), Some(2));

    client
        .submit_form(draft("Student 2 Edited", "student2@x.co", "CS"))
        .await
        .unwrap();
    assert_eq!(transport.update_calls().len(), 1);
    // A committed update leaves edit mode.
    assert_eq!(client.editing(), None);

    client
        .submit_form(draft("Ana", "ana@x.co", "CS"))
        .await
        .unwrap();
    assert_eq!(transport.create_calls().len(), 1);
}

#[tokio::test]
async fn begin_edit_failure_surfaces_and_keeps_mode_unchanged() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let client = make_client(transport.clone());
    client.load().await;
    let log = EventLog::attach(&client);

    let result = client.begin_edit(42).await;

    assert!(result.is_err());
    assert_eq!(client.editing(), None);
    assert!(log.has_message(MessageLevel::Error, "no encontrado"));

    client.begin_edit(1).await.unwrap();
    client.cancel_edit();
    assert_eq!(client.editing(), None);
}

// ============================================================================
// Message ordering
// ============================================================================

#[tokio::test]
async fn mutations_emit_progress_then_outcome() {
    let transport = Arc::new(MockTransport::with_dataset(seed_dataset(2)));
    let client = make_client(transport.clone());
    client.load().await;
    let log = EventLog::attach(&client);

    client
        .create_student(draft("Ana", "ana@x.co", "CS"))
        .await
        .unwrap();

    let messages = log.messages();
    let first = messages.first().unwrap();
    assert_eq!(first.level, MessageLevel::Info);
    assert!(first.text.contains("Creating"));
    assert!(messages
        .iter()
        .any(|m| m.level == MessageLevel::Success && m.text.contains("creado")));
}
