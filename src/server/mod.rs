//! HTTP binding layer for the dashboard
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/tabs` - Tab bar
//! - `GET /api/v1/viz/variables` - Variable selector options
//! - `GET /api/v1/viz/outliers?variable=&window=&sigma=` - Rolling average and outliers
//! - `POST /api/v1/hello` - Greeting
//! - `POST /api/v1/docdb/search` - Submit DocDB criteria
//! - `GET /api/v1/docdb/state` - Current DocDB panes
//! - `POST /api/v1/objects/fetch` - Submit bucket and key
//! - `GET /api/v1/objects/state` - Current S3 panes
//! - `POST /api/v1/objects/download` - Copy the loaded object to a temp file

pub mod handlers;
#[allow(missing_docs)]
pub mod types;

use crate::config::ServerConfig;
use crate::dashboard::Dashboard;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// =============================================================================
// Application State
// =============================================================================

/// Shared state behind every handler
pub struct AppState {
    /// Tab services
    pub dashboard: Dashboard,
    /// Server configuration
    pub config: ServerConfig,
}

// =============================================================================
// Router and Server Setup
// =============================================================================

/// Build CORS layer from configuration
fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/v1/tabs", get(handlers::tabs))
        // Visualization tab
        .route("/api/v1/viz/variables", get(handlers::viz_variables))
        .route("/api/v1/viz/outliers", get(handlers::viz_outliers))
        // Hello world tab
        .route("/api/v1/hello", post(handlers::hello))
        // DocDB tab
        .route("/api/v1/docdb/search", post(handlers::docdb_search))
        .route("/api/v1/docdb/state", get(handlers::docdb_state))
        // S3 tab
        .route("/api/v1/objects/fetch", post(handlers::objects_fetch))
        .route("/api/v1/objects/state", get(handlers::objects_state))
        .route("/api/v1/objects/download", post(handlers::objects_download))
        // State, tracing and CORS
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.cors_allowed_origins))
}

/// Bind and serve until a shutdown signal arrives
pub async fn serve(state: Arc<AppState>) -> crate::Result<()> {
    let addr: SocketAddr = state.config.listen_addr.parse().map_err(|e| {
        crate::Error::Configuration(format!(
            "Invalid listen address {}: {}",
            state.config.listen_addr, e
        ))
    })?;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// A failed signal registration is logged and that signal is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {},
            Err(e) => {
                warn!(
                    error = %e,
                    "Ctrl+C handler installation failed - graceful shutdown unavailable"
                );
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(
                    error = %e,
                    "SIGTERM handler installation failed - SIGTERM shutdown unavailable"
                );
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
