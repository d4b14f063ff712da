//! Error types for the exploration core

use std::time::Duration;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Rolling statistics error
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Dataset loading error
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Object store error
    #[error("Object store error: {0}")]
    Remote(#[from] RemoteError),

    /// Document store error
    #[error("Document store error: {0}")]
    RemoteQuery(#[from] RemoteQueryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by the rolling outlier computation
///
/// These are local validation failures. They are surfaced to the user as
/// inline validation messages, never as a crash.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Window or sigma out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown variable name
    #[error("Variable not found: {0}")]
    NotFound(String),
}

/// Errors raised while loading the reference dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header has no timestamp column
    #[error("Missing timestamp column '{0}'")]
    MissingTimestampColumn(String),

    /// Two columns share a name
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Timestamp cell could not be parsed
    #[error("Invalid timestamp '{value}' on line {line}")]
    InvalidTimestamp {
        /// Raw cell content
        value: String,
        /// 1-based line number in the source file
        line: u64,
    },

    /// Numeric cell could not be parsed
    #[error("Invalid value '{value}' for column '{column}' on line {line}")]
    InvalidValue {
        /// Column name
        column: String,
        /// Raw cell content
        value: String,
        /// 1-based line number in the source file
        line: u64,
    },

    /// Two rows share a timestamp
    #[error("Duplicate timestamp {0}")]
    DuplicateTimestamp(i64),

    /// Column lengths disagree with the index
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Index length
        expected: usize,
        /// Column length
        actual: usize,
    },
}

/// Errors from the object store (metadata lookup, presigning, downloads)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Object or bucket does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Credentials do not grant access
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Service returned an error response
    #[error("Service error: {0}")]
    Service(String),

    /// Signed URL could not be generated
    #[error("Presign error: {0}")]
    Presign(String),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the document store
#[derive(Error, Debug)]
pub enum RemoteQueryError {
    /// Caller attempted to query with no criteria
    #[error("Refusing to query with an empty filter")]
    EmptyFilter,

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body was not the expected JSON shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl RemoteQueryError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteQueryError::Transport(_) | RemoteQueryError::Timeout(_) => true,
            RemoteQueryError::Status { status, .. } => *status >= 500,
            RemoteQueryError::EmptyFilter | RemoteQueryError::Decode(_) => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_error_converts() {
        let err: Error = StatsError::NotFound("Pressure".to_string()).into();
        let display = err.to_string();
        assert!(display.contains("Statistics error"));
        assert!(display.contains("Pressure"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RemoteQueryError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(RemoteQueryError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!RemoteQueryError::Status {
            status: 404,
            body: String::new()
        }
        .is_transient());
        assert!(!RemoteQueryError::EmptyFilter.is_transient());
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }
}
