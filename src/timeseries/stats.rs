//! Rolling mean, rolling residual deviation and outlier flagging
//!
//! For a trailing window of `w` points ending at index `i`:
//!
//! - `average[i]` is the arithmetic mean of the raw values, undefined for
//!   `i < w - 1` and for windows containing a missing (NaN) value; a window
//!   of identical values averages to exactly that value
//! - `residual[i] = raw[i] - average[i]`
//! - `residual_std[i]` is the sample standard deviation (n - 1) of the
//!   defined residuals in the window, undefined for `i < w - 1` or when
//!   fewer than two residuals are defined
//! - index `i` is an outlier iff `|residual[i]| > residual_std[i] * sigma`
//!
//! Flagged points are reported at their *average* value, not the raw value.
//! The chart overlays outlier markers on the smoothed line.

use crate::error::StatsError;
use crate::timeseries::series::TimeSeries;
use crate::types::{TimePoint, Timestamp};
use serde::Serialize;

/// Trailing arithmetic mean over `window` points
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                return None;
            }
            Some(window_mean(slice))
        })
        .collect()
}

/// Mean of a window; exact when every value is equal
fn window_mean(slice: &[f64]) -> f64 {
    match slice.split_first() {
        Some((first, rest)) if rest.iter().all(|v| v == first) => *first,
        _ => slice.iter().sum::<f64>() / slice.len() as f64,
    }
}

/// Trailing sample standard deviation over the defined values in each window
pub fn rolling_sample_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let defined: Vec<f64> = values[i + 1 - window..=i]
                .iter()
                .filter_map(|v| v.filter(|x| !x.is_nan()))
                .collect();
            sample_std(&defined)
        })
        .collect()
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if values.iter().all(|v| *v == values[0]) {
        return Some(0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / (n - 1.0)).sqrt())
}

/// Per-index rolling statistics for one variable
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStats {
    /// Trailing mean
    pub average: Vec<Option<f64>>,
    /// Raw value minus trailing mean
    pub residual: Vec<Option<f64>>,
    /// Trailing sample std of the residual
    pub residual_std: Vec<Option<f64>>,
}

impl RollingStats {
    /// Outlier flag per index, undefined where the std is undefined
    ///
    /// The comparison is strict: a residual exactly equal to `std * sigma`
    /// is not an outlier.
    pub fn outlier_flags(&self, sigma: f64) -> Vec<Option<bool>> {
        self.residual
            .iter()
            .zip(&self.residual_std)
            .map(|(r, s)| match (r, s) {
                (Some(r), Some(s)) => Some(r.abs() > s * sigma),
                _ => None,
            })
            .collect()
    }
}

/// Compute rolling statistics for a raw column
pub fn rolling_stats(values: &[f64], window: usize) -> Result<RollingStats, StatsError> {
    validate_window(window)?;

    let average = rolling_mean(values, window);
    let residual: Vec<Option<f64>> = values
        .iter()
        .zip(&average)
        .map(|(raw, avg)| avg.map(|a| raw - a).filter(|r| !r.is_nan()))
        .collect();
    let residual_std = rolling_sample_std(&residual, window);

    Ok(RollingStats {
        average,
        residual,
        residual_std,
    })
}

fn validate_window(window: usize) -> Result<(), StatsError> {
    if window == 0 {
        return Err(StatsError::InvalidArgument(
            "window must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_sigma(sigma: f64) -> Result<(), StatsError> {
    if sigma.is_nan() || sigma < 0.0 {
        return Err(StatsError::InvalidArgument(format!(
            "sigma must be a non-negative number, got {sigma}"
        )));
    }
    Ok(())
}

/// Smoothed line plus outlier markers for one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    /// Variable the report was computed for
    pub variable: String,
    /// Window size
    pub window: usize,
    /// Sigma multiplier
    pub sigma: f64,
    /// Timestamp index shared by `average`
    pub timestamps: Vec<Timestamp>,
    /// Trailing mean; `None` where undefined
    pub average: Vec<Option<f64>>,
    /// Flagged points at their average value
    pub outliers: Vec<TimePoint>,
}

impl OutlierReport {
    /// Number of indices with a defined average
    pub fn defined_average_count(&self) -> usize {
        self.average.iter().filter(|v| v.is_some()).count()
    }

    /// Smoothed line as `(timestamp, value)` pairs, skipping undefined points
    pub fn average_points(&self) -> Vec<TimePoint> {
        self.timestamps
            .iter()
            .zip(&self.average)
            .filter_map(|(ts, v)| v.map(|v| TimePoint::new(*ts, v)))
            .collect()
    }
}

/// Rolling average and outlier markers for `variable`
///
/// # Errors
///
/// - `StatsError::NotFound` if the series has no such variable
/// - `StatsError::InvalidArgument` if `window == 0` or `sigma` is negative/NaN
///
/// An empty series yields an empty report.
pub fn compute_outliers(
    series: &TimeSeries,
    variable: &str,
    window: usize,
    sigma: f64,
) -> Result<OutlierReport, StatsError> {
    let values = series
        .column(variable)
        .ok_or_else(|| StatsError::NotFound(variable.to_string()))?;
    validate_window(window)?;
    validate_sigma(sigma)?;

    let stats = rolling_stats(values, window)?;
    let timestamps = series.timestamps();

    let outliers = stats
        .outlier_flags(sigma)
        .iter()
        .enumerate()
        .filter_map(|(i, flag)| match (flag, stats.average[i]) {
            (Some(true), Some(avg)) => Some(TimePoint::new(timestamps[i], avg)),
            _ => None,
        })
        .collect();

    Ok(OutlierReport {
        variable: variable.to_string(),
        window,
        sigma,
        timestamps: timestamps.to_vec(),
        average: stats.average,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(values: Vec<f64>) -> TimeSeries {
        let index = (0..values.len() as i64).map(|i| i * 1000).collect();
        TimeSeries::new(index, vec![("v".to_string(), values)]).unwrap()
    }

    #[test]
    fn test_rolling_mean() {
        let avg = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(avg, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_mean_window_larger_than_input() {
        let avg = rolling_mean(&[1.0, 2.0], 5);
        assert_eq!(avg, vec![None, None]);
    }

    #[test]
    fn test_rolling_mean_nan_poisons_window() {
        let avg = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert_eq!(avg, vec![None, None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn test_rolling_sample_std() {
        let values = vec![Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0)];
        let std = rolling_sample_std(&values, 2);
        assert_eq!(std[0], None);
        assert!((std[1].unwrap() - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(std[2], Some(0.0));
    }

    #[test]
    fn test_rolling_sample_std_needs_two_values() {
        let values = vec![None, None, Some(1.0), None, Some(3.0)];
        let std = rolling_sample_std(&values, 3);
        assert_eq!(std[2], None);
        assert_eq!(std[3], None);
        assert!((std[4].unwrap() - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_window_one_never_flags() {
        let series = series_of(vec![1.0, 100.0, -50.0, 3.0]);
        let report = compute_outliers(&series, "v", 1, 0.0).unwrap();
        assert_eq!(
            report.average,
            vec![Some(1.0), Some(100.0), Some(-50.0), Some(3.0)]
        );
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_constant_series_never_flags() {
        let series = series_of(vec![5.0; 20]);
        let report = compute_outliers(&series, "v", 4, 0.0).unwrap();
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_flat_runs_of_inexact_values_never_flag() {
        for value in [0.1, 23.7, 21.5, 1e-3] {
            let series = series_of(vec![value; 20]);
            for sigma in [0.0, 3.0, 10.0] {
                let report = compute_outliers(&series, "v", 3, sigma).unwrap();
                assert!(
                    report.outliers.is_empty(),
                    "{} flagged at sigma {}: {:?}",
                    value,
                    sigma,
                    report.outliers
                );
            }
        }
    }

    #[test]
    fn test_flat_window_mean_is_exact() {
        let avg = rolling_mean(&[0.1; 7], 7);
        assert_eq!(avg[6], Some(0.1));

        let stats = rolling_stats(&[23.7; 10], 4).unwrap();
        assert!(stats.residual[3..].iter().all(|r| *r == Some(0.0)));
        assert!(stats.residual_std[3..].iter().all(|s| *s == Some(0.0)));
    }

    #[test]
    fn test_flat_stretch_after_variation() {
        let mut values = vec![20.0, 22.5, 19.0, 21.0, 23.0, 18.5];
        values.extend(vec![21.7; 14]);
        let series = series_of(values);

        let report = compute_outliers(&series, "v", 4, 0.0).unwrap();
        // Once the window is entirely flat the residual is exactly zero
        assert!(report
            .outliers
            .iter()
            .all(|p| p.timestamp < 9_000));
    }

    #[test]
    fn test_outliers_use_average_value() {
        let mut values = vec![0.0; 12];
        values[10] = 40.0;
        let series = series_of(values);

        let report = compute_outliers(&series, "v", 4, 1.0).unwrap();
        let spike = report
            .outliers
            .iter()
            .find(|p| p.timestamp == 10_000)
            .expect("spike flagged");
        assert_eq!(spike.value, 10.0);
    }

    #[test]
    fn test_unknown_variable() {
        let series = series_of(vec![1.0, 2.0]);
        let err = compute_outliers(&series, "missing", 2, 1.0).unwrap_err();
        assert_eq!(err, StatsError::NotFound("missing".to_string()));
    }

    #[test]
    fn test_invalid_arguments() {
        let series = series_of(vec![1.0, 2.0]);
        assert!(matches!(
            compute_outliers(&series, "v", 0, 1.0),
            Err(StatsError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute_outliers(&series, "v", 2, -1.0),
            Err(StatsError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute_outliers(&series, "v", 2, f64::NAN),
            Err(StatsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_series() {
        let series = TimeSeries::new(Vec::new(), vec![("v".to_string(), Vec::new())]).unwrap();
        let report = compute_outliers(&series, "v", 3, 1.0).unwrap();
        assert!(report.average.is_empty());
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn test_strict_inequality_at_boundary() {
        let stats = RollingStats {
            average: vec![Some(0.0)],
            residual: vec![Some(2.0)],
            residual_std: vec![Some(1.0)],
        };
        assert_eq!(stats.outlier_flags(2.0), vec![Some(false)]);
        assert_eq!(stats.outlier_flags(1.9), vec![Some(true)]);
    }

    #[test]
    fn test_average_points_skip_undefined() {
        let series = series_of(vec![1.0, 2.0, 3.0]);
        let report = compute_outliers(&series, "v", 2, 1.0).unwrap();
        let points = report.average_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], TimePoint::new(1000, 1.5));
    }
}
