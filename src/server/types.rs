//! Request and response types for the HTTP API

use crate::dashboard::Catalogue;
use crate::docdb::SearchView;
use crate::objects::{MediaKind, ObjectView, Preview};
use crate::timeseries::{OutlierReport, VisualizationParams};
use crate::types::TimePoint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Common Types
// =============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error body for 4xx/5xx responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Tab bar response
pub type TabsResponse = Catalogue;

// =============================================================================
// Visualization Types
// =============================================================================

/// Variable selector options and slider settings
#[derive(Debug, Serialize)]
pub struct VariablesResponse {
    pub variables: Vec<String>,
    pub defaults: VisualizationParams,
    pub max_window: usize,
    pub max_sigma: f64,
}

/// Outlier query parameters; missing values take the widget defaults
#[derive(Debug, Default, Deserialize)]
pub struct OutliersQuery {
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub sigma: Option<f64>,
}

impl OutliersQuery {
    /// Fill missing values from `defaults`
    pub fn resolve(self, defaults: &VisualizationParams) -> VisualizationParams {
        VisualizationParams {
            variable: self.variable.unwrap_or_else(|| defaults.variable.clone()),
            window: self.window.unwrap_or(defaults.window),
            sigma: self.sigma.unwrap_or(defaults.sigma),
        }
    }
}

/// Smoothed line and outlier markers
#[derive(Debug, Serialize)]
pub struct OutliersResponse {
    pub variable: String,
    pub window: usize,
    pub sigma: f64,
    /// Defined points of the rolling average
    pub average: Vec<TimePoint>,
    /// Flagged points, plotted at their average value
    pub outliers: Vec<TimePoint>,
}

impl From<&OutlierReport> for OutliersResponse {
    fn from(report: &OutlierReport) -> Self {
        Self {
            variable: report.variable.clone(),
            window: report.window,
            sigma: report.sigma,
            average: report.average_points(),
            outliers: report.outliers.clone(),
        }
    }
}

// =============================================================================
// Hello World Types
// =============================================================================

/// Greeting request
#[derive(Debug, Deserialize)]
pub struct HelloRequest {
    #[serde(default)]
    pub name: String,
}

/// Greeting response
#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub markdown: String,
}

// =============================================================================
// DocDB Types
// =============================================================================

/// DocDB panes
#[derive(Debug, Serialize)]
pub struct DocDbStateResponse {
    pub status: String,
    pub count: String,
    pub view: SearchView,
    pub project_options: Vec<String>,
}

// =============================================================================
// Object Store Types
// =============================================================================

/// Object selector submission
#[derive(Debug, Deserialize)]
pub struct ObjectFetchRequest {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub key: String,
}

/// S3 explorer panes
#[derive(Debug, Serialize)]
pub struct ObjectStateResponse {
    pub status: String,
    pub info: Value,
    pub kind: Option<MediaKind>,
    pub preview: Option<Preview>,
    pub default_bucket: String,
}

impl ObjectStateResponse {
    /// Panes for `view`
    pub fn from_view(view: &ObjectView, default_bucket: &str) -> Self {
        Self {
            status: view.status_text(),
            info: view.info_json(),
            kind: view.kind(),
            preview: view.preview().cloned(),
            default_bucket: default_bucket.to_string(),
        }
    }
}

/// Local copy of the loaded object
#[derive(Debug, Serialize)]
pub struct ObjectDownloadResponse {
    pub key: String,
    pub path: String,
}
