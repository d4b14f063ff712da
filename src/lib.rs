//! Data Explorer - interactive data-exploration core
//!
//! The backing services of a four-tab exploration dashboard:
//! - Rolling-window outlier detection over a CSV time series
//! - A hello-world greeting widget
//! - A metadata document store explorer (MongoDB-style filters)
//! - An S3 object browser with media classification and presigned previews
//!
//! The [`server`] module binds all four tabs to a JSON HTTP API.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Prometheus metrics
pub mod metrics;

/// Retry policy and call counters shared by the remote clients
pub mod remote;

/// Time series loading, rolling statistics and outlier reports
pub mod timeseries;

/// Document store filters, client and explorer
pub mod docdb;

/// Object store classification, client and explorer
pub mod objects;

/// Output pane state and the greeting widget
pub mod view;

/// Tab catalogue and per-tab services
pub mod dashboard;

/// HTTP API
pub mod server;

// Re-export main types
pub use config::ApplicationConfig;
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use types::{ObjectRef, TimePoint, Timestamp};
