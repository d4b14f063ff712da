//! Object descriptors: metadata, media kind and access URL for one key

use crate::error::RemoteError;
use crate::objects::classify::{classify, MediaKind};
use crate::objects::client::ObjectStore;
use crate::types::ObjectRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// `2024-03-01 12:00:00+00:00`
const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Metadata returned by a head lookup
///
/// Every field is optional because stores may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    /// Content length in bytes
    pub size_bytes: Option<u64>,
    /// MIME type
    pub content_type: Option<String>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag, quotes included as returned
    pub etag: Option<String>,
}

impl ObjectMetadata {
    /// Info pane JSON; missing fields read `"Unknown"`
    pub fn info_json(&self) -> Value {
        let unknown = || Value::from("Unknown");
        json!({
            "Size": self.size_bytes.map(Value::from).unwrap_or_else(unknown),
            "ContentType": self.content_type.clone().map(Value::from).unwrap_or_else(unknown),
            "LastModified": self
                .last_modified
                .map(|t| Value::from(t.format(LAST_MODIFIED_FORMAT).to_string()))
                .unwrap_or_else(unknown),
            "ETag": self.etag.clone().map(Value::from).unwrap_or_else(unknown),
        })
    }
}

/// A presigned URL and the instant it stops working
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessUrl {
    /// Presigned GET URL
    pub url: String,
    /// Expiry as Unix seconds
    pub expires_at_unix: i64,
}

impl AccessUrl {
    /// URL valid for `expiry` starting at `issued_at`
    pub fn new(url: String, issued_at: DateTime<Utc>, expiry: Duration) -> Self {
        let expiry_secs = i64::try_from(expiry.as_secs()).unwrap_or(i64::MAX);
        Self {
            url,
            expires_at_unix: issued_at.timestamp().saturating_add(expiry_secs),
        }
    }

    /// True once the URL must no longer be used
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at_unix
    }

    /// True once the URL must no longer be used
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Everything the S3 tab shows for one `(bucket, key)`
///
/// Failures are captured as fields: `error` when the metadata lookup
/// failed, `url_error` when metadata succeeded but presigning failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDescriptor {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Preview kind from the key suffix
    pub kind: MediaKind,
    /// Metadata, when the lookup succeeded
    pub metadata: Option<ObjectMetadata>,
    /// Metadata lookup failure
    pub error: Option<String>,
    /// Presigned URL, when generated
    pub access_url: Option<AccessUrl>,
    /// Presigning failure
    pub url_error: Option<String>,
}

impl ObjectDescriptor {
    /// Address of the described object
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.bucket, &self.key)
    }

    /// Info pane JSON: metadata fields or `{"Error": msg}`
    pub fn info_json(&self) -> Value {
        match (&self.metadata, &self.error) {
            (Some(metadata), _) => metadata.info_json(),
            (None, Some(error)) => json!({ "Error": error }),
            (None, None) => json!({}),
        }
    }

    /// Presigned URL, if generated and not yet expired
    pub fn valid_url(&self) -> Option<&str> {
        self.access_url
            .as_ref()
            .filter(|u| !u.is_expired())
            .map(|u| u.url.as_str())
    }
}

/// Look up metadata and presign a URL for one object
///
/// Never fails: remote errors are recorded on the descriptor. Presigning is
/// skipped when the metadata lookup failed.
pub async fn describe(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    expiry: Duration,
) -> ObjectDescriptor {
    let mut descriptor = ObjectDescriptor {
        bucket: bucket.to_string(),
        key: key.to_string(),
        kind: classify(key),
        metadata: None,
        error: None,
        access_url: None,
        url_error: None,
    };

    match store.head_object(bucket, key).await {
        Ok(metadata) => descriptor.metadata = Some(metadata),
        Err(e) => {
            descriptor.error = Some(e.to_string());
            return descriptor;
        },
    }

    let issued_at = Utc::now();
    match store.presign(bucket, key, expiry).await {
        Ok(url) => descriptor.access_url = Some(AccessUrl::new(url, issued_at, expiry)),
        Err(e) => descriptor.url_error = Some(e.to_string()),
    }

    debug!(
        bucket,
        key,
        kind = %descriptor.kind,
        presigned = descriptor.access_url.is_some(),
        "Described object"
    );
    descriptor
}

/// Temp file suffix for a key: its extension with the dot, or `.tmp`
pub fn temp_suffix(key: &str) -> String {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => ".tmp".to_string(),
    }
}

/// Download `url` into a persisted temp file named after `key`'s extension
///
/// The caller owns the returned file and is responsible for removing it.
pub async fn download_to_temp(
    store: &dyn ObjectStore,
    key: &str,
    url: &str,
) -> Result<PathBuf, RemoteError> {
    let bytes = store.fetch(url).await?;
    let suffix = temp_suffix(key);

    tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
        use std::io::Write;
        let mut file = tempfile::Builder::new()
            .prefix("explorer-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.into_temp_path()
            .keep()
            .map_err(|e| e.error)
    })
    .await
    .map_err(|e| RemoteError::InvalidResponse(format!("download task failed: {}", e)))?
    .map_err(|e| RemoteError::InvalidResponse(format!("failed to write temp file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_info_json_unknown_fields() {
        let metadata = ObjectMetadata {
            size_bytes: Some(1024),
            ..Default::default()
        };
        assert_eq!(
            metadata.info_json(),
            json!({
                "Size": 1024,
                "ContentType": "Unknown",
                "LastModified": "Unknown",
                "ETag": "Unknown"
            })
        );
    }

    #[test]
    fn test_info_json_full() {
        let metadata = ObjectMetadata {
            size_bytes: Some(5),
            content_type: Some("image/png".to_string()),
            last_modified: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            etag: Some("\"abc\"".to_string()),
        };
        let info = metadata.info_json();
        assert_eq!(info["ContentType"], "image/png");
        assert_eq!(info["LastModified"], "2024-03-01 12:00:00+00:00");
        assert_eq!(info["ETag"], "\"abc\"");
    }

    #[test]
    fn test_access_url_expiry() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let url = AccessUrl::new("https://x".to_string(), issued, Duration::from_secs(3600));
        assert_eq!(url.expires_at_unix, issued.timestamp() + 3600);
        assert!(!url.is_expired_at(issued + chrono::Duration::seconds(3599)));
        assert!(url.is_expired_at(issued + chrono::Duration::seconds(3600)));
    }

    #[test]
    fn test_temp_suffix() {
        assert_eq!(temp_suffix("session/video.mp4"), ".mp4");
        assert_eq!(temp_suffix("archive.tar.gz"), ".gz");
        assert_eq!(temp_suffix("README"), ".tmp");
        assert_eq!(temp_suffix("dir.d/noext"), ".tmp");
    }

    #[test]
    fn test_error_info_json() {
        let descriptor = ObjectDescriptor {
            bucket: "b".to_string(),
            key: "k".to_string(),
            kind: MediaKind::Other,
            metadata: None,
            error: Some("Object not found: k".to_string()),
            access_url: None,
            url_error: None,
        };
        assert_eq!(descriptor.info_json(), json!({"Error": "Object not found: k"}));
        assert!(descriptor.valid_url().is_none());
        assert_eq!(descriptor.object_ref().to_string(), "s3://b/k");
    }
}
