//! Lazily loaded, process-wide reference dataset

use crate::error::DatasetError;
use crate::timeseries::series::TimeSeries;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Read-only dataset loaded on first use
///
/// The first successful `get()` parses the source file; later calls return
/// the same `Arc`. A failed load is not cached and is retried on the next
/// call. There is no teardown.
pub struct Dataset {
    source: PathBuf,
    series: OnceCell<Arc<TimeSeries>>,
}

impl Dataset {
    /// Dataset backed by a CSV file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: path.into(),
            series: OnceCell::new(),
        }
    }

    /// Dataset that is already in memory
    pub fn preloaded(series: TimeSeries) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            series: OnceCell::with_value(Arc::new(series)),
        }
    }

    /// Source path
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// True once the series has been loaded
    pub fn is_loaded(&self) -> bool {
        self.series.get().is_some()
    }

    /// The loaded series, parsing the source on first call
    pub fn get(&self) -> Result<Arc<TimeSeries>, DatasetError> {
        self.series
            .get_or_try_init(|| {
                let series = TimeSeries::from_csv_path(&self.source)?;
                info!(
                    path = %self.source.display(),
                    rows = series.len(),
                    "Reference dataset loaded"
                );
                Ok(Arc::new(series))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loads_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,Temperature").unwrap();
        writeln!(file, "2015-02-02 14:19:00,23.7").unwrap();
        file.flush().unwrap();

        let dataset = Dataset::from_path(file.path());
        assert!(!dataset.is_loaded());

        let first = dataset.get().unwrap();
        assert!(dataset.is_loaded());

        // Contents changing on disk does not affect the loaded copy
        writeln!(file, "2015-02-02 14:20:00,99.0").unwrap();
        file.flush().unwrap();

        let second = dataset.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_missing_file_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.csv");
        let dataset = Dataset::from_path(&path);

        assert!(matches!(dataset.get(), Err(DatasetError::Io(_))));
        assert!(!dataset.is_loaded());

        std::fs::write(&path, "date,CO2\n2015-02-02,721.25\n").unwrap();
        assert_eq!(dataset.get().unwrap().len(), 1);
    }

    #[test]
    fn test_preloaded() {
        let series = TimeSeries::new(vec![1], vec![("x".to_string(), vec![1.0])]).unwrap();
        let dataset = Dataset::preloaded(series);
        assert!(dataset.is_loaded());
        assert_eq!(dataset.get().unwrap().variables(), &["x"]);
    }
}
