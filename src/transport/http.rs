//! reqwest-backed [`RecordTransport`] for the PHP roster API.
//!
//! Endpoint paths and body shapes follow the upstream service. Every request
//! carries the auth collaborator's bearer token; classification of failures
//! into the [`TransportError`] taxonomy happens here so the core never sees
//! raw HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::auth::AuthProvider;
use crate::error::TransportError;
use crate::types::{
    BatchDeleteOutcome, ListPage, ListQuery, MutationAck, StatisticsReport, Student, StudentDraft,
    StudentPatch,
};

use super::RecordTransport;

pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
}

impl HttpTransport {
    /// `base_url` is the service root, e.g. `http://localhost/crud_estudiantes`.
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            auth,
        }
    }

    pub fn with_client(
        base_url: impl Into<String>,
        client: reqwest::Client,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            auth,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/php/{name}.php", self.base_url)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.auth.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Run a request and fold status/flag/body into the error taxonomy.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Connection(format!("invalid response body: {e}")))?;

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        if status.as_u16() == 401 {
            return Err(TransportError::Unauthorized(
                message.unwrap_or_else(|| "Session is no longer valid".to_string()),
            ));
        }

        let success_flag = body.get("success").and_then(Value::as_bool);
        if !status.is_success() || success_flag == Some(false) {
            return Err(TransportError::api(status.as_u16(), message));
        }

        serde_json::from_value(body)
            .map_err(|e| TransportError::Connection(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl RecordTransport for HttpTransport {
    async fn list(&self, query: &ListQuery) -> Result<ListPage, TransportError> {
        let mut params = query.filters.to_params();
        params.push(("page", query.page.to_string()));
        params.push(("limit", query.limit.to_string()));

        let builder = self
            .request(reqwest::Method::GET, self.endpoint("students"))
            .query(&params);
        self.execute(builder).await
    }

    async fn read_one(&self, id: i64) -> Result<Student, TransportError> {
        let builder = self
            .request(reqwest::Method::GET, self.endpoint("read_one"))
            .query(&[("id", id)]);
        self.execute(builder).await
    }

    async fn create(&self, draft: &StudentDraft) -> Result<MutationAck, TransportError> {
        let builder = self
            .request(reqwest::Method::POST, self.endpoint("create"))
            .json(draft);
        self.execute(builder).await
    }

    async fn update(&self, id: i64, patch: &StudentPatch) -> Result<MutationAck, TransportError> {
        let mut body = serde_json::to_value(patch)
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        body["id"] = json!(id);

        let builder = self
            .request(reqwest::Method::PUT, self.endpoint("update"))
            .json(&body);
        self.execute(builder).await
    }

    async fn delete(&self, id: i64) -> Result<MutationAck, TransportError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.endpoint("delete"))
            .json(&json!({ "id": id }));
        self.execute(builder).await
    }

    async fn batch_delete(&self, ids: &[i64]) -> Result<BatchDeleteOutcome, TransportError> {
        let builder = self
            .request(reqwest::Method::DELETE, self.endpoint("batch_delete"))
            .json(&json!({ "ids": ids }));
        self.execute(builder).await
    }

    async fn statistics(&self) -> Result<StatisticsReport, TransportError> {
        let builder = self.request(reqwest::Method::GET, self.endpoint("statistics"));
        self.execute(builder).await
    }
}
