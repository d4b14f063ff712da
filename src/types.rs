//! Core data types shared across the exploration tabs
//!
//! # Key Types
//!
//! - **`Timestamp`**: milliseconds since the Unix epoch
//! - **`TimePoint`**: a `(timestamp, value)` pair, e.g. a flagged outlier
//! - **`ObjectRef`**: a `(bucket, key)` address in the object store
//!
//! # Example
//!
//! ```rust
//! use data_explorer::types::{ObjectRef, TimePoint};
//!
//! let point = TimePoint::new(1_000, 21.5);
//! assert_eq!(point.value, 21.5);
//!
//! let object = ObjectRef::new("aind-open-data", "session/video.mp4");
//! assert!(!object.is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// A single `(timestamp, value)` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Timestamp in milliseconds
    pub timestamp: Timestamp,
    /// Value at that timestamp
    pub value: f64,
}

impl TimePoint {
    /// Create a new point
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp as a UTC datetime, if representable
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Address of one object in the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

impl ObjectRef {
    /// Create a new object reference
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// True when either half of the address is missing
    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty() || self.key.is_empty()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ref_empty() {
        assert!(ObjectRef::new("", "key").is_empty());
        assert!(ObjectRef::new("bucket", "").is_empty());
        assert!(!ObjectRef::new("bucket", "key").is_empty());
    }

    #[test]
    fn test_object_ref_display() {
        let object = ObjectRef::new("bucket", "dir/file.png");
        assert_eq!(object.to_string(), "s3://bucket/dir/file.png");
    }

    #[test]
    fn test_time_point_datetime() {
        // 2024-01-01 00:00:00 UTC
        let point = TimePoint::new(1_704_067_200_000, 1.0);
        let dt = point.datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
