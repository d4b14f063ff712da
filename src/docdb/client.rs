//! Document store client
//!
//! [`DocumentStore`] is the seam the explorer talks to. [`HttpDocumentStore`]
//! implements it against the metadata REST API:
//!
//! ```text
//! GET {scheme}://{host}/{version}/{database}/{collection}
//!     ?filter={json}&projection={json}&limit={n}
//! ```
//!
//! The response is either a JSON array of records or an object with a
//! `data` array.

use crate::config::DocDbConfig;
use crate::docdb::filter::{projection_json, DocFilter};
use crate::error::RemoteQueryError;
use crate::metrics;
use crate::remote::{ClientMetrics, ClientMetricsSnapshot, RetryPolicy};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Longest response body kept in a `Status` error
const MAX_ERROR_BODY: usize = 512;

/// Read-only access to a document collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return at most `limit` records matching `filter`, projected to `projection`
    ///
    /// Implementations reject an empty filter with
    /// [`RemoteQueryError::EmptyFilter`] instead of returning the whole
    /// collection.
    async fn query(
        &self,
        filter: &DocFilter,
        projection: &[&str],
        limit: usize,
    ) -> Result<Vec<Value>, RemoteQueryError>;
}

/// HTTP client for the metadata API
pub struct HttpDocumentStore {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
    retry_policy: RetryPolicy,
    metrics: Arc<ClientMetrics>,
}

impl HttpDocumentStore {
    /// Create a client from configuration
    pub fn new(config: &DocDbConfig) -> Result<Self, RemoteQueryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(RemoteQueryError::Transport)?;

        Ok(Self {
            client,
            endpoint: config.collection_url(),
            request_timeout: config.request_timeout(),
            retry_policy: RetryPolicy::default().with_max_retries(config.max_retries),
            metrics: Arc::new(ClientMetrics::default()),
        })
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Collection endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call counters
    pub fn metrics(&self) -> ClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn send_once(
        &self,
        filter: &str,
        projection: &str,
        limit: usize,
    ) -> Result<Vec<Value>, RemoteQueryError> {
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("filter", filter),
                ("projection", projection),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .map_err(RemoteQueryError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_body(&mut body);
            return Err(RemoteQueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteQueryError::Decode(e.to_string()))?;
        let mut records = decode_records(body)?;
        records.truncate(limit);
        Ok(records)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn query(
        &self,
        filter: &DocFilter,
        projection: &[&str],
        limit: usize,
    ) -> Result<Vec<Value>, RemoteQueryError> {
        if filter.is_empty() {
            return Err(RemoteQueryError::EmptyFilter);
        }

        let filter_json = filter.to_json().to_string();
        let projection_json = projection_json(projection).to_string();
        let mut attempt = 0;

        loop {
            let start = Instant::now();
            let result = tokio::time::timeout(
                self.request_timeout,
                self.send_once(&filter_json, &projection_json, limit),
            )
            .await
            .unwrap_or(Err(RemoteQueryError::Timeout(self.request_timeout)));

            match result {
                Ok(records) => {
                    let elapsed = start.elapsed();
                    self.metrics.record_success(elapsed);
                    metrics::record_remote("docdb", "query", elapsed.as_secs_f64(), true);
                    debug!(
                        filter = %filter_json,
                        records = records.len(),
                        "DocDB query succeeded"
                    );
                    return Ok(records);
                },
                Err(e) if e.is_transient() && self.retry_policy.should_retry(attempt) => {
                    self.metrics.record_retry();
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(
                        "DocDB query failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    self.metrics.record_failure();
                    metrics::record_remote(
                        "docdb",
                        "query",
                        start.elapsed().as_secs_f64(),
                        false,
                    );
                    return Err(e);
                },
            }
        }
    }
}

/// Extract the record list from a response body
fn decode_records(body: Value) -> Result<Vec<Value>, RemoteQueryError> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(RemoteQueryError::Decode(
                "expected an array of records".to_string(),
            )),
        },
        other => Err(RemoteQueryError::Decode(format!(
            "expected an array of records, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_body(body: &mut String) {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
}
