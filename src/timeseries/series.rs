//! In-memory time series keyed by a sorted, unique timestamp index

use crate::error::DatasetError;
use crate::types::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Name of the index column in CSV input
pub const TIMESTAMP_COLUMN: &str = "date";

/// Accepted datetime layouts, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp cell into milliseconds since the epoch
///
/// Naive datetimes are interpreted as UTC. A bare date maps to midnight.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Ordered records of `(timestamp, value-per-variable)`
///
/// The index is strictly increasing. Instances are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Sorted unique timestamps
    index: Vec<Timestamp>,
    /// Variable names in source order
    variables: Vec<String>,
    /// Values per variable, aligned with `index`
    columns: HashMap<String, Vec<f64>>,
}

impl TimeSeries {
    /// Build a series from an index and named columns
    ///
    /// Rows are reordered by timestamp. Duplicate timestamps, duplicate column
    /// names and columns whose length differs from the index are rejected.
    pub fn new(
        index: Vec<Timestamp>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, DatasetError> {
        for (pos, (name, values)) in columns.iter().enumerate() {
            if columns[..pos].iter().any(|(earlier, _)| earlier == name) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
            if values.len() != index.len() {
                return Err(DatasetError::LengthMismatch {
                    column: name.clone(),
                    expected: index.len(),
                    actual: values.len(),
                });
            }
        }

        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by_key(|&i| index[i]);

        for pair in order.windows(2) {
            if index[pair[0]] == index[pair[1]] {
                return Err(DatasetError::DuplicateTimestamp(index[pair[0]]));
            }
        }

        let sorted_index: Vec<Timestamp> = order.iter().map(|&i| index[i]).collect();
        let mut variables = Vec::with_capacity(columns.len());
        let mut by_name = HashMap::with_capacity(columns.len());

        for (name, values) in columns {
            let sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
            by_name.insert(name.clone(), sorted);
            variables.push(name);
        }

        Ok(Self {
            index: sorted_index,
            variables,
            columns: by_name,
        })
    }

    /// Load from a CSV file with a `date` column
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let series = Self::from_csv_reader(file)?;
        debug!(
            path = %path.display(),
            rows = series.len(),
            variables = series.variables.len(),
            "Loaded time series"
        );
        Ok(series)
    }

    /// Load from any CSV source with a `date` column
    ///
    /// Every other column is parsed as `f64`; empty cells become NaN.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let ts_pos = headers
            .iter()
            .position(|h| h == TIMESTAMP_COLUMN)
            .ok_or_else(|| DatasetError::MissingTimestampColumn(TIMESTAMP_COLUMN.to_string()))?;
        if headers.iter().filter(|h| *h == TIMESTAMP_COLUMN).count() > 1 {
            return Err(DatasetError::DuplicateColumn(TIMESTAMP_COLUMN.to_string()));
        }

        let names: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos != ts_pos)
            .map(|(pos, name)| (pos, name.to_string()))
            .collect();

        let mut index = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for record in csv.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw_ts = record.get(ts_pos).unwrap_or_default();
            let ts = parse_timestamp(raw_ts).ok_or_else(|| DatasetError::InvalidTimestamp {
                value: raw_ts.to_string(),
                line,
            })?;
            index.push(ts);

            for (slot, (pos, name)) in names.iter().enumerate() {
                let cell = record.get(*pos).unwrap_or_default();
                let value = if cell.is_empty() {
                    f64::NAN
                } else {
                    cell.parse::<f64>()
                        .map_err(|_| DatasetError::InvalidValue {
                            column: name.clone(),
                            value: cell.to_string(),
                            line,
                        })?
                };
                values[slot].push(value);
            }
        }

        let columns = names
            .into_iter()
            .map(|(_, name)| name)
            .zip(values)
            .collect();

        Self::new(index, columns)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when there are no records
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sorted timestamp index
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.index
    }

    /// Variable names in source order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Values of one variable, aligned with `timestamps()`
    pub fn column(&self, variable: &str) -> Option<&[f64]> {
        self.columns.get(variable).map(Vec::as_slice)
    }
}
