//! HTTP handlers for the dashboard API
//!
//! Local validation failures (bad window or sigma, unknown variable) are
//! 4xx responses. Remote failures are not HTTP errors: they are part of the
//! explorer's view state and come back with 200.

use super::types::*;
use super::AppState;
use crate::dashboard::catalogue;
use crate::docdb::{count_text, status_text, SearchParams};
use crate::error::{Error, RemoteError, StatsError};
use crate::metrics;
use crate::view::greet;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

// =============================================================================
// Health & Metrics Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint
pub async fn metrics() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (StatusCode::OK, [("content-type", "text/plain")], body),
        Err(e) => {
            error!(error = %e, "Failed to gather metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e,
            )
        },
    }
}

/// Tab bar
pub async fn tabs() -> Json<TabsResponse> {
    Json(catalogue())
}

// =============================================================================
// Visualization Handlers
// =============================================================================

/// Variable selector options and slider settings
pub async fn viz_variables(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let viz = &state.dashboard.visualization;
    match viz.variables() {
        Ok(variables) => (
            StatusCode::OK,
            Json(VariablesResponse {
                variables,
                defaults: viz.defaults().clone(),
                max_window: viz.max_window(),
                max_sigma: viz.max_sigma(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e, "viz_variables"),
    }
}

/// Rolling average and outliers for the widget values
pub async fn viz_outliers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OutliersQuery>,
) -> impl IntoResponse {
    let viz = &state.dashboard.visualization;
    let params = query.resolve(viz.defaults());

    match viz.outliers(&params) {
        Ok(report) => {
            debug!(
                variable = %params.variable,
                window = params.window,
                sigma = params.sigma,
                outliers = report.outliers.len(),
                "Served outlier report"
            );
            (StatusCode::OK, Json(OutliersResponse::from(report.as_ref()))).into_response()
        },
        Err(e) => error_response(e, "viz_outliers"),
    }
}

// =============================================================================
// Hello World Handler
// =============================================================================

/// Greeting for the submitted name
pub async fn hello(Json(req): Json<HelloRequest>) -> Json<HelloResponse> {
    Json(HelloResponse {
        markdown: greet(&req.name),
    })
}

// =============================================================================
// DocDB Handlers
// =============================================================================

/// Submit search criteria and return the resulting panes
pub async fn docdb_search(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SearchParams>,
) -> Json<DocDbStateResponse> {
    state.dashboard.docdb.search(&params).await;
    Json(docdb_panes(&state))
}

/// Current DocDB panes
pub async fn docdb_state(State(state): State<Arc<AppState>>) -> Json<DocDbStateResponse> {
    Json(docdb_panes(&state))
}

fn docdb_panes(state: &AppState) -> DocDbStateResponse {
    let view = state.dashboard.docdb.state();
    DocDbStateResponse {
        status: status_text(&view).to_string(),
        count: count_text(&view),
        view,
        project_options: state.dashboard.project_options.clone(),
    }
}

// =============================================================================
// Object Store Handlers
// =============================================================================

/// Submit bucket and key and return the resulting panes
pub async fn objects_fetch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ObjectFetchRequest>,
) -> Json<ObjectStateResponse> {
    state.dashboard.objects.fetch(&req.bucket, &req.key).await;
    let view = state.dashboard.objects.state();
    Json(ObjectStateResponse::from_view(
        &view,
        &state.dashboard.default_bucket,
    ))
}

/// Current S3 explorer panes
pub async fn objects_state(State(state): State<Arc<AppState>>) -> Json<ObjectStateResponse> {
    let view = state.dashboard.objects.state();
    Json(ObjectStateResponse::from_view(
        &view,
        &state.dashboard.default_bucket,
    ))
}

/// Download the loaded object to a local temp file
///
/// 404 when nothing is loaded, 409 once the access URL has expired.
pub async fn objects_download(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.dashboard.objects.state();
    let key = view.descriptor().map(|d| d.key.clone());

    match state.dashboard.objects.download().await {
        Ok(path) => {
            debug!(path = %path.display(), "Downloaded object to temp file");
            (
                StatusCode::OK,
                Json(ObjectDownloadResponse {
                    key: key.unwrap_or_default(),
                    path: path.display().to_string(),
                }),
            )
                .into_response()
        },
        Err(e) => {
            let status = match &e {
                RemoteError::NotFound(_) => StatusCode::NOT_FOUND,
                RemoteError::Presign(_) => StatusCode::CONFLICT,
                _ => {
                    error!(error = %e, "Object download failed");
                    metrics::record_error("remote", "s3_download");
                    StatusCode::BAD_GATEWAY
                },
            };
            (status, Json(ErrorResponse::new(e.to_string()))).into_response()
        },
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

fn error_response(err: Error, operation: &str) -> axum::response::Response {
    let status = match &err {
        Error::Stats(StatsError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
        Error::Stats(StatsError::NotFound(_)) => StatusCode::NOT_FOUND,
        _ => {
            error!(operation, error = %err, "Request failed");
            metrics::record_error("internal", operation);
            StatusCode::INTERNAL_SERVER_ERROR
        },
    };
    (status, Json(ErrorResponse::new(err.to_string()))).into_response()
}
