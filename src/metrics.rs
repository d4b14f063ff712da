//! Prometheus metrics for the exploration service
//!
//! Remote calls (document store, object store), memoized statistics and
//! discarded stale explorer responses are counted here.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    // === Remote Calls ===

    /// Total remote requests
    pub static ref REMOTE_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "explorer_remote_requests_total",
        "Total remote requests by service, operation and status",
        &["service", "operation", "status"]
    ).unwrap();

    /// Remote request duration
    pub static ref REMOTE_DURATION: HistogramVec = register_histogram_vec!(
        "explorer_remote_duration_seconds",
        "Remote request latency in seconds",
        &["service", "operation"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();

    // === Local Computation ===

    /// Outlier report cache lookups
    pub static ref STATS_CACHE_TOTAL: CounterVec = register_counter_vec!(
        "explorer_stats_cache_total",
        "Outlier report cache lookups by result",
        &["result"]
    ).unwrap();

    /// Responses dropped because a newer request superseded them
    pub static ref STALE_RESPONSES_TOTAL: CounterVec = register_counter_vec!(
        "explorer_stale_responses_total",
        "Superseded explorer responses discarded",
        &["explorer"]
    ).unwrap();

    // === Error Counters ===

    /// Total errors by type
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "explorer_errors_total",
        "Total errors by type and operation",
        &["error_type", "operation"]
    ).unwrap();

    // === System Health ===

    /// Health status (0=unhealthy, 1=healthy)
    pub static ref HEALTH_STATUS: Gauge = register_gauge!(
        "explorer_health_status",
        "Service health status (0=unhealthy, 1=healthy)"
    ).unwrap();
}

/// Initialize metrics system
pub fn init() {
    HEALTH_STATUS.set(1.0);
    tracing::info!("Metrics system initialized");
}

/// Get metrics in Prometheus text format
///
/// # Returns
///
/// Result containing the formatted metrics string, or an error if encoding fails
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics contain invalid UTF-8: {}", e))
}

/// Record a remote call
#[inline]
pub fn record_remote(service: &str, operation: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    REMOTE_REQUESTS_TOTAL
        .with_label_values(&[service, operation, status])
        .inc();

    REMOTE_DURATION
        .with_label_values(&[service, operation])
        .observe(duration_secs);
}

/// Record an outlier report cache lookup
#[inline]
pub fn record_stats_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    STATS_CACHE_TOTAL.with_label_values(&[result]).inc();
}

/// Record a superseded response
#[inline]
pub fn record_stale(explorer: &str) {
    STALE_RESPONSES_TOTAL.with_label_values(&[explorer]).inc();
}

/// Record an error
#[inline]
pub fn record_error(error_type: &str, operation: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, operation])
        .inc();
}
