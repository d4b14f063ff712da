//! Time-series exploration for the visualization tab
//!
//! Loads a read-only reference dataset once per process and derives rolling
//! averages and outlier markers from it.
//!
//! # Pipeline
//!
//! ```text
//! CSV file ──load once──▶ TimeSeries ──column──▶ rolling mean
//!                                                    │
//!                                          residual = raw - mean
//!                                                    │
//!                                          rolling std(residual)
//!                                                    │
//!                                 |residual| > std * sigma ──▶ outliers
//! ```
//!
//! Results are memoized by `(variable, window, sigma)` because the source
//! series never changes after it is loaded.
//!
//! # Example
//!
//! ```rust
//! use data_explorer::timeseries::{compute_outliers, TimeSeries};
//!
//! let index: Vec<i64> = (0..10).map(|i| i * 86_400_000).collect();
//! let values: Vec<f64> = (0..10).map(|i| 20.0 + i as f64).collect();
//! let series = TimeSeries::new(index, vec![("Temperature".to_string(), values)]).unwrap();
//!
//! let report = compute_outliers(&series, "Temperature", 3, 2.0).unwrap();
//! assert_eq!(report.defined_average_count(), 8);
//! ```

pub mod cache;
pub mod dataset;
pub mod series;
pub mod service;
pub mod stats;

pub use cache::{StatsCache, StatsCacheSnapshot, StatsKey};
pub use dataset::Dataset;
pub use series::{parse_timestamp, TimeSeries, TIMESTAMP_COLUMN};
pub use service::{VisualizationParams, VisualizationService};
pub use stats::{
    compute_outliers, rolling_mean, rolling_sample_std, rolling_stats, OutlierReport,
    RollingStats,
};
