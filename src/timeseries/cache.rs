//! Memoization of outlier reports
//!
//! The reference dataset is immutable once loaded, so a report is a pure
//! function of `(variable, window, sigma)`. Entries are evicted LRU when the
//! cache is full; there is no TTL.

use crate::error::StatsError;
use crate::metrics;
use crate::timeseries::stats::OutlierReport;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key for one parameter combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsKey {
    variable: String,
    window: usize,
    // f64 is not Hash; the bit pattern is exact for identical inputs
    sigma_bits: u64,
}

impl StatsKey {
    /// Create a key; `-0.0` and `0.0` map to the same entry
    pub fn new(variable: impl Into<String>, window: usize, sigma: f64) -> Self {
        let sigma = if sigma == 0.0 { 0.0 } else { sigma };
        Self {
            variable: variable.into(),
            window,
            sigma_bits: sigma.to_bits(),
        }
    }
}

/// LRU cache of outlier reports
pub struct StatsCache {
    entries: Mutex<LruCache<StatsKey, Arc<OutlierReport>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatsCacheSnapshot {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that required a computation
    pub misses: u64,
    /// Current number of entries
    pub entries: usize,
}

impl StatsCache {
    /// Create a cache holding at most `capacity` reports (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached report or compute and store it
    ///
    /// Failed computations are not cached. The lock is not held while
    /// `compute` runs, so two callers racing on the same key may both compute.
    pub fn get_or_compute<F>(&self, key: StatsKey, compute: F) -> Result<Arc<OutlierReport>, StatsError>
    where
        F: FnOnce() -> Result<OutlierReport, StatsError>,
    {
        if let Some(report) = self.entries.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_stats_cache(true);
            return Ok(report.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_stats_cache(false);

        let report = Arc::new(compute()?);
        self.entries.lock().put(key, report.clone());
        Ok(report)
    }

    /// Current counters
    pub fn snapshot(&self) -> StatsCacheSnapshot {
        StatsCacheSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }
}
