//! HTTP API Integration Tests
//!
//! Drives the real router with in-memory collaborators.
//!
//! # Test Coverage
//!
//! 1. **Health & Metrics** - GET /health, GET /metrics
//! 2. **Tabs** - GET /api/v1/tabs
//! 3. **Visualization** - Variables, outliers, validation errors
//! 4. **Hello World** - POST /api/v1/hello
//! 5. **DocDB** - Search submission and pane state
//! 6. **S3** - Fetch submission, pane state and download

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use data_explorer::config::ApplicationConfig;
use data_explorer::dashboard::Dashboard;
use data_explorer::docdb::{DocFilter, DocumentStore};
use data_explorer::error::{RemoteError, RemoteQueryError};
use data_explorer::objects::{ObjectMetadata, ObjectStore};
use data_explorer::server::{build_router, AppState};
use data_explorer::timeseries::{Dataset, TimeSeries};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// =============================================================================
// Test Collaborators
// =============================================================================

struct EchoStore;

#[async_trait]
impl DocumentStore for EchoStore {
    async fn query(
        &self,
        filter: &DocFilter,
        _projection: &[&str],
        limit: usize,
    ) -> Result<Vec<Value>, RemoteQueryError> {
        let records = (0..limit + 5)
            .map(|i| json!({"name": format!("asset_{i}"), "filter": filter.to_json()}))
            .take(limit)
            .collect();
        Ok(records)
    }
}

struct MemoryObjects;

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, RemoteError> {
        if key.starts_with("missing/") {
            return Err(RemoteError::NotFound(format!("s3://{}/{}", bucket, key)));
        }
        Ok(ObjectMetadata {
            size_bytes: Some(10),
            content_type: Some("image/png".to_string()),
            last_modified: None,
            etag: None,
        })
    }

    async fn presign(&self, bucket: &str, key: &str, _: Duration) -> Result<String, RemoteError> {
        Ok(format!("https://{}.local/{}?sig=x", bucket, key))
    }

    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
        Ok(b"image-bytes".to_vec())
    }
}

fn test_series() -> TimeSeries {
    let index = (0..40).map(|i| i * 3_600_000).collect();
    let mut temperature: Vec<f64> = (0..40).map(|i| 21.0 + (i as f64 * 0.5).sin()).collect();
    temperature[30] += 25.0;
    let humidity = (0..40).map(|i| 27.0 + (i % 3) as f64).collect();
    TimeSeries::new(
        index,
        vec![
            ("Temperature".to_string(), temperature),
            ("Humidity".to_string(), humidity),
        ],
    )
    .unwrap()
}

fn create_router() -> Router {
    let mut config = ApplicationConfig::default();
    config.docdb.project_options = vec!["ecephys".to_string(), "behavior".to_string()];
    config.object_store.default_bucket = "demo-bucket".to_string();

    let dashboard = Dashboard::new(
        &config,
        Arc::new(Dataset::preloaded(test_series())),
        Arc::new(EchoStore),
        Arc::new(MemoryObjects),
    );
    build_router(Arc::new(AppState {
        dashboard,
        config: config.server.clone(),
    }))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get_request(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn post_request(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

// =============================================================================
// Health, Metrics and Tabs
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_router();
    let (status, body) = get_request(&router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let router = create_router();
    get_request(&router, "/api/v1/viz/outliers").await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("explorer_stats_cache_total"));
}

#[tokio::test]
async fn test_tabs_endpoint() {
    let router = create_router();
    let (status, body) = get_request(&router, "/api/v1/tabs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["site"], "Panel Playground");
    let titles: Vec<&str> = body["tabs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Data Visualization Tutorial",
            "Hello World",
            "DocDB Explorer",
            "S3 Explorer"
        ]
    );
}

// =============================================================================
// Visualization
// =============================================================================

#[tokio::test]
async fn test_variables_endpoint() {
    let router = create_router();
    let (status, body) = get_request(&router, "/api/v1/viz/variables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["variables"], json!(["Temperature", "Humidity"]));
    assert_eq!(body["defaults"]["variable"], "Temperature");
    assert_eq!(body["defaults"]["window"], 30);
    assert_eq!(body["defaults"]["sigma"], 10.0);
}

#[tokio::test]
async fn test_outliers_with_defaults() {
    let router = create_router();
    let (status, body) = get_request(&router, "/api/v1/viz/outliers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["variable"], "Temperature");
    assert_eq!(body["window"], 30);
    // 40 points, window 30
    assert_eq!(body["average"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_outliers_flags_spike() {
    let router = create_router();
    let (status, body) = get_request(
        &router,
        "/api/v1/viz/outliers?variable=Temperature&window=10&sigma=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let outliers = body["outliers"].as_array().unwrap();
    let spike = outliers
        .iter()
        .find(|p| p["timestamp"] == 30 * 3_600_000i64)
        .expect("spike flagged");
    // Plotted on the average line, well below the raw spike
    assert!(spike["value"].as_f64().unwrap() < 30.0);
}

#[tokio::test]
async fn test_outliers_validation_errors() {
    let router = create_router();

    let (status, body) = get_request(&router, "/api/v1/viz/outliers?window=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("window"));

    let (status, _) = get_request(&router, "/api/v1/viz/outliers?sigma=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_request(&router, "/api/v1/viz/outliers?variable=Pressure").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Pressure"));
}

// =============================================================================
// Hello World
// =============================================================================

#[tokio::test]
async fn test_hello_endpoint() {
    let router = create_router();

    let (status, body) = post_request(&router, "/api/v1/hello", json!({"name": "Ada"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markdown"], "Hello, **Ada**!");

    let (_, body) = post_request(&router, "/api/v1/hello", json!({})).await;
    assert_eq!(body["markdown"], "Hello, ****!");
}

// =============================================================================
// DocDB
// =============================================================================

#[tokio::test]
async fn test_docdb_initial_state() {
    let router = create_router();
    let (status, body) = get_request(&router, "/api/v1/docdb/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Enter search criteria above...");
    assert_eq!(body["count"], "**Records found:** 0");
    assert_eq!(body["view"]["state"], "waiting");
    assert_eq!(body["project_options"], json!(["ecephys", "behavior"]));
}

#[tokio::test]
async fn test_docdb_search() {
    let router = create_router();
    let (status, body) = post_request(
        &router,
        "/api/v1/docdb/search",
        json!({"project_names": ["ecephys"], "subject_id": "632269"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Query successful");
    assert_eq!(body["count"], "**Records found:** 10 (showing max 10)");
    assert_eq!(body["view"]["state"], "ready");
    assert_eq!(
        body["view"]["data"]["filter"]["subject.subject_id"],
        "632269"
    );

    let (_, state) = get_request(&router, "/api/v1/docdb/state").await;
    assert_eq!(state["count"], body["count"]);
}

#[tokio::test]
async fn test_docdb_empty_criteria() {
    let router = create_router();
    let (status, body) = post_request(
        &router,
        "/api/v1/docdb/search",
        json!({"project_names": [], "subject_id": "  "}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"]["state"], "waiting");
    assert_eq!(body["count"], "**Records found:** 0");
}

// =============================================================================
// S3
// =============================================================================

#[tokio::test]
async fn test_objects_initial_state() {
    let router = create_router();
    let (status, body) = get_request(&router, "/api/v1/objects/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Enter bucket name and object key above...");
    assert_eq!(body["info"], json!({}));
    assert_eq!(body["default_bucket"], "demo-bucket");
    assert!(body["preview"].is_null());
}

#[tokio::test]
async fn test_objects_fetch_image() {
    let router = create_router();
    let (status, body) = post_request(
        &router,
        "/api/v1/objects/fetch",
        json!({"bucket": "demo-bucket", "key": "frames/cell.png"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Image preview loaded");
    assert_eq!(body["kind"], "image");
    assert_eq!(body["info"]["Size"], 10);
    assert_eq!(body["info"]["ETag"], "Unknown");
    assert_eq!(
        body["preview"]["url"],
        "https://demo-bucket.local/frames/cell.png?sig=x"
    );
}

#[tokio::test]
async fn test_objects_fetch_missing() {
    let router = create_router();
    let (status, body) = post_request(
        &router,
        "/api/v1/objects/fetch",
        json!({"bucket": "demo-bucket", "key": "missing/a.pdf"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["status"],
        "Error: Object not found: s3://demo-bucket/missing/a.pdf"
    );
    assert!(body["info"]["Error"].is_string());
    assert!(body["kind"].is_null());
    assert!(body["preview"].is_null());
}

#[tokio::test]
async fn test_objects_download() {
    let router = create_router();

    let (status, body) = post_request(&router, "/api/v1/objects/download", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no object loaded"));

    post_request(
        &router,
        "/api/v1/objects/fetch",
        json!({"bucket": "demo-bucket", "key": "frames/cell.png"}),
    )
    .await;

    let (status, body) = post_request(&router, "/api/v1/objects/download", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "frames/cell.png");

    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    assert_eq!(std::fs::read(&path).unwrap(), b"image-bytes");
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_objects_download_after_failed_fetch() {
    let router = create_router();
    post_request(
        &router,
        "/api/v1/objects/fetch",
        json!({"bucket": "demo-bucket", "key": "missing/a.pdf"}),
    )
    .await;

    let (status, _) = post_request(&router, "/api/v1/objects/download", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
