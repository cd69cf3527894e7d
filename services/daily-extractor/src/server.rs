//! HTTP server for extractor status and metrics.
//!
//! Provides endpoints for:
//! - Ledger statistics and last-run counts
//! - Per-date status report
//! - Prometheus metrics

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::extractor::RunCounts;
use crate::ledger::{Ledger, StatusReport};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub tracked: usize,
    pub successful: usize,
    pub failed: usize,
    pub last_run: RunCounts,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub last_run: Arc<RwLock<RunCounts>>,
    pub prometheus: PrometheusHandle,
}

// ============================================================================
// Router
// ============================================================================

/// Create the status API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(status_handler))
        .route("/report", get(report_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /status - ledger statistics plus the most recent run's counts.
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let stats = {
        let ledger = state.ledger.lock().await;
        ledger.stats()
    };
    let last_run = *state.last_run.read().await;

    Json(StatusResponse {
        service: "daily-extractor".to_string(),
        tracked: stats.tracked,
        successful: stats.successful,
        failed: stats.failed,
        last_run,
    })
}

/// GET /report - per-date successful/failed breakdown.
async fn report_handler(
    Extension(state): Extension<Arc<ServerState>>,
) -> Json<StatusReport> {
    let report = {
        let ledger = state.ledger.lock().await;
        ledger.report()
    };
    Json(report)
}

/// GET /metrics - Prometheus exposition.
async fn metrics_handler(Extension(state): Extension<Arc<ServerState>>) -> String {
    state.prometheus.render()
}

/// GET /health - health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "daily-extractor"
    }))
}

/// Start the HTTP server.
pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting extractor status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
