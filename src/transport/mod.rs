//! The Remote Record Service boundary.
//!
//! [`RecordTransport`] is the seam between the reconciliation core and the
//! network: the core only ever sees typed payloads or a classified
//! [`TransportError`]. The reqwest-backed implementation lives behind the
//! `http` feature; tests drive the core entirely through mocks.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{
    BatchDeleteOutcome, ListPage, ListQuery, MutationAck, StatisticsReport, Student, StudentDraft,
    StudentPatch,
};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Stateless remote endpoints for the roster.
///
/// Implementations fold the HTTP-level outcome into the error taxonomy:
/// a response is `Ok` only when the status is 2xx and any `success` flag in
/// the body is true. Everything else comes back as a [`TransportError`], so
/// callers never inspect status codes or flags themselves.
#[async_trait]
pub trait RecordTransport: Send + Sync {
    /// Filtered, paginated list. Empty pages are `Ok` with an empty record
    /// vector and the server's (possibly zero) totals.
    async fn list(&self, query: &ListQuery) -> Result<ListPage, TransportError>;

    async fn read_one(&self, id: i64) -> Result<Student, TransportError>;

    async fn create(&self, draft: &StudentDraft) -> Result<MutationAck, TransportError>;

    async fn update(&self, id: i64, patch: &StudentPatch) -> Result<MutationAck, TransportError>;

    async fn delete(&self, id: i64) -> Result<MutationAck, TransportError>;

    /// Admin-only. Partial failure is still `Ok`: the outcome reports what
    /// was deleted and which ids failed.
    async fn batch_delete(&self, ids: &[i64]) -> Result<BatchDeleteOutcome, TransportError>;

    async fn statistics(&self) -> Result<StatisticsReport, TransportError>;
}
