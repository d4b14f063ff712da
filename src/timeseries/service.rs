//! Visualization tab: dataset + memoized outlier reports

use crate::config::DatasetConfig;
use crate::error::{Result, StatsError};
use crate::timeseries::cache::{StatsCache, StatsCacheSnapshot, StatsKey};
use crate::timeseries::dataset::Dataset;
use crate::timeseries::stats::{compute_outliers, OutlierReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Widget values for the visualization tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationParams {
    /// Selected variable
    pub variable: String,
    /// Rolling window size
    pub window: usize,
    /// Outlier threshold multiplier
    pub sigma: f64,
}

/// Serves outlier reports for the visualization tab
///
/// Holds the process-wide dataset and a report cache. Widget bounds
/// (`max_window`, `max_sigma`) are enforced here so out-of-range slider
/// values surface as validation messages.
pub struct VisualizationService {
    dataset: Arc<Dataset>,
    cache: StatsCache,
    defaults: VisualizationParams,
    max_window: usize,
    max_sigma: f64,
}

impl VisualizationService {
    /// Create a service from configuration
    pub fn new(dataset: Arc<Dataset>, config: &DatasetConfig) -> Self {
        Self {
            dataset,
            cache: StatsCache::new(config.stats_cache_entries),
            defaults: VisualizationParams {
                variable: config.default_variable.clone(),
                window: config.default_window,
                sigma: config.default_sigma,
            },
            max_window: config.max_window,
            max_sigma: config.max_sigma,
        }
    }

    /// Initial widget values
    pub fn defaults(&self) -> &VisualizationParams {
        &self.defaults
    }

    /// Upper bound of the window slider
    pub fn max_window(&self) -> usize {
        self.max_window
    }

    /// Upper bound of the sigma slider
    pub fn max_sigma(&self) -> f64 {
        self.max_sigma
    }

    /// Variable selector options, in dataset column order
    pub fn variables(&self) -> Result<Vec<String>> {
        Ok(self.dataset.get()?.variables().to_vec())
    }

    /// Outlier report for the given widget values
    pub fn outliers(&self, params: &VisualizationParams) -> Result<Arc<OutlierReport>> {
        self.check_bounds(params)?;
        let series = self.dataset.get()?;

        let key = StatsKey::new(&params.variable, params.window, params.sigma);
        let report = self.cache.get_or_compute(key, || {
            debug!(
                variable = %params.variable,
                window = params.window,
                sigma = params.sigma,
                "Computing rolling outliers"
            );
            compute_outliers(&series, &params.variable, params.window, params.sigma)
        })?;

        Ok(report)
    }

    /// Cache counters
    pub fn cache_stats(&self) -> StatsCacheSnapshot {
        self.cache.snapshot()
    }

    fn check_bounds(&self, params: &VisualizationParams) -> std::result::Result<(), StatsError> {
        if params.window == 0 || params.window > self.max_window {
            return Err(StatsError::InvalidArgument(format!(
                "window must be between 1 and {}, got {}",
                self.max_window, params.window
            )));
        }
        if params.sigma.is_nan() || params.sigma < 0.0 || params.sigma > self.max_sigma {
            return Err(StatsError::InvalidArgument(format!(
                "sigma must be between 0 and {}, got {}",
                self.max_sigma, params.sigma
            )));
        }
        Ok(())
    }
}
