//! Object store client
//!
//! [`ObjectStore`] is the seam the S3 explorer talks to. [`S3ObjectStore`]
//! implements it with the AWS SDK for metadata and presigning and a plain
//! HTTP client for downloading through a presigned URL.

use crate::config::{CredentialsConfig, ObjectStoreConfig};
use crate::error::RemoteError;
use crate::metrics;
use crate::objects::descriptor::ObjectMetadata;
use crate::remote::{ClientMetrics, ClientMetricsSnapshot};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Read access to an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Size, content type, last-modified and etag of one object
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, RemoteError>;

    /// Time-limited GET URL for one object
    async fn presign(&self, bucket: &str, key: &str, expiry: Duration)
        -> Result<String, RemoteError>;

    /// Download the body behind a (presigned) URL
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    http: reqwest::Client,
    request_timeout: Duration,
    metrics: Arc<ClientMetrics>,
}

impl S3ObjectStore {
    /// Build a client from configuration
    ///
    /// Resolves credentials according to `config.credentials`; the default
    /// source is the standard AWS provider chain.
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self, RemoteError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        loader = match &config.credentials {
            CredentialsConfig::Default => loader,
            CredentialsConfig::Profile { name } => loader.profile_name(name),
            CredentialsConfig::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                session_token.clone(),
                None,
                "data-explorer-config",
            )),
            CredentialsConfig::Anonymous => loader.no_credentials(),
        };

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            credentials = ?config.credentials,
            "Object store client configured"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            http,
            request_timeout: config.request_timeout(),
            metrics: Arc::new(ClientMetrics::default()),
        })
    }

    /// Call counters
    pub fn metrics(&self) -> ClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn timed<T, F>(&self, operation: &str, fut: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(self.request_timeout, fut)
            .await
            .unwrap_or(Err(RemoteError::Timeout(self.request_timeout)));
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => self.metrics.record_success(elapsed),
            Err(e) => {
                self.metrics.record_failure();
                warn!(operation, error = %e, "Object store call failed");
            },
        }
        metrics::record_remote("s3", operation, elapsed.as_secs_f64(), result.is_ok());
        result
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, RemoteError> {
        let timeout = self.request_timeout;
        self.timed("head_object", async {
            let output = self
                .client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, timeout))?;

            Ok(ObjectMetadata {
                size_bytes: output.content_length().and_then(|n| u64::try_from(n).ok()),
                content_type: output.content_type().map(str::to_string),
                last_modified: output
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
                etag: output.e_tag().map(str::to_string),
            })
        })
        .await
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String, RemoteError> {
        self.timed("presign", async {
            let presigning =
                PresigningConfig::expires_in(expiry).map_err(|e| RemoteError::Presign(e.to_string()))?;

            let request = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| RemoteError::Presign(DisplayErrorContext(&e).to_string()))?;

            debug!(bucket, key, expiry_secs = expiry.as_secs(), "Presigned GET URL");
            Ok(request.uri().to_string())
        })
        .await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let timeout = self.request_timeout;
        self.timed("fetch", async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, timeout))?;

            let status = response.status();
            if !status.is_success() {
                return Err(match status.as_u16() {
                    404 => RemoteError::NotFound(url_without_query(url)),
                    403 => RemoteError::AccessDenied(url_without_query(url)),
                    code => RemoteError::Service(format!("HTTP {}", code)),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| map_reqwest_error(e, timeout))?;
            Ok(body.to_vec())
        })
        .await
    }
}

/// Classify an SDK failure
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, timeout: Duration) -> RemoteError
where
    E: std::error::Error + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::ServiceError(ctx) => match ctx.raw().status().as_u16() {
            404 => RemoteError::NotFound(message),
            403 => RemoteError::AccessDenied(message),
            _ => RemoteError::Service(message),
        },
        SdkError::TimeoutError(_) => RemoteError::Timeout(timeout),
        SdkError::DispatchFailure(_) => RemoteError::Network(message),
        SdkError::ResponseError(_) => RemoteError::InvalidResponse(message),
        _ => RemoteError::Service(message),
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(timeout)
    } else {
        // Presigned URLs carry signatures in the query string
        RemoteError::Network(err.without_url().to_string())
    }
}

/// URL with the query string removed, safe for messages and logs
pub fn url_without_query(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        },
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}
