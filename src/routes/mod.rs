// Read-only query API over the files the pipeline produces

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::artifact_repo::ArtifactRepo;
use crate::snapshot_repo::SnapshotRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) snapshots: Arc<SnapshotRepo>,
    pub(crate) artifacts: Arc<ArtifactRepo>,
    pub(crate) io_timeout: Duration,
}

pub fn app(
    snapshots: Arc<SnapshotRepo>,
    artifacts: Arc<ArtifactRepo>,
    io_timeout: Duration,
) -> Router {
    let state = AppState {
        snapshots,
        artifacts,
        io_timeout,
    };
    Router::new()
        .route("/", get(|| async { "sysreport query API" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .route("/api/summary", get(http::summary_handler)) // GET /api/summary
        .route("/api/metrics/latest", get(http::latest_metrics_handler)) // GET /api/metrics/latest
        .route("/api/metrics/history/{hours}", get(http::history_handler)) // GET /api/metrics/history/{hours}
        .route("/api/system/info", get(http::system_info_handler)) // GET /api/system/info
        .route("/api/alerts/recent", get(http::recent_alerts_handler)) // GET /api/alerts/recent
        .route("/api/reports/latest", get(http::latest_report_handler)) // GET /api/reports/latest
        .route("/api/reports/list", get(http::list_reports_handler)) // GET /api/reports/list
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
