// GET handlers. Each one rereads files; no state beyond the repos.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde_json::{Value, json};

use super::AppState;
use crate::aggregation::window_start;
use crate::error::ProcessorError;
use crate::snapshot_repo::run_blocking;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const RECENT_ALERTS: usize = 50;

fn now_iso() -> String {
    chrono::Local::now().to_rfc3339()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": message, "timestamp": now_iso() })),
    )
        .into_response()
}

fn internal_error(e: ProcessorError) -> Response {
    tracing::warn!(error = %e, "query API read failed");
    let status = if matches!(e, ProcessorError::Timeout(_)) {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({ "error": e.to_string(), "timestamp": now_iso() })),
    )
        .into_response()
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({ "name": NAME, "version": VERSION }))
}

/// GET /api/health
pub(super) async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "timestamp": now_iso() }))
}

/// GET /api/summary: latest_summary.json verbatim.
pub(super) async fn summary_handler(State(state): State<AppState>) -> Response {
    let artifacts = state.artifacts.clone();
    match run_blocking(state.io_timeout, move || {
        artifacts.latest_summary_json().map_err(Into::into)
    })
    .await
    {
        Ok(Some(body)) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Ok(None) => not_found("No summary available yet"),
        Err(e) => internal_error(e),
    }
}

/// GET /api/metrics/latest: newest parseable snapshot, as written by the producer.
pub(super) async fn latest_metrics_handler(State(state): State<AppState>) -> Response {
    let snapshots = state.snapshots.clone();
    match run_blocking(state.io_timeout, move || snapshots.latest_raw()).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => not_found("No metrics available yet"),
        Err(e) => internal_error(e),
    }
}

/// GET /api/metrics/history/{hours}: raw snapshots of the trailing window, ascending.
pub(super) async fn history_handler(
    State(state): State<AppState>,
    Path(hours): Path<u32>,
) -> Response {
    let start = window_start(
        chrono::Utc::now().timestamp(),
        Duration::from_secs(u64::from(hours) * 3600),
    );
    let snapshots = state.snapshots.clone();
    match run_blocking(state.io_timeout, move || snapshots.load_raw_since(start)).await {
        Ok(window) => Json(json!({
            "hours": hours,
            "count": window.snapshots.len(),
            "metrics": window.snapshots,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/system/info: `system` object of the newest snapshot.
pub(super) async fn system_info_handler(State(state): State<AppState>) -> Response {
    let snapshots = state.snapshots.clone();
    match run_blocking(state.io_timeout, move || snapshots.latest_raw()).await {
        Ok(Some(mut snapshot)) => match snapshot.get_mut("system").map(Value::take) {
            Some(system) if system.is_object() => Json(system).into_response(),
            _ => not_found("No system info available yet"),
        },
        Ok(None) => not_found("No system info available yet"),
        Err(e) => internal_error(e),
    }
}

/// GET /api/alerts/recent: last 50 alerts, newest first; empty when there is no log.
pub(super) async fn recent_alerts_handler(State(state): State<AppState>) -> Response {
    let snapshots = state.snapshots.clone();
    match run_blocking(state.io_timeout, move || {
        snapshots.recent_alerts(RECENT_ALERTS).map_err(Into::into)
    })
    .await
    {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/reports/latest: latest_report.html.
pub(super) async fn latest_report_handler(State(state): State<AppState>) -> Response {
    let artifacts = state.artifacts.clone();
    match run_blocking(state.io_timeout, move || {
        artifacts.latest_report().map_err(Into::into)
    })
    .await
    {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "No report available yet").into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/reports/list: historical reports, newest first.
pub(super) async fn list_reports_handler(State(state): State<AppState>) -> Response {
    let artifacts = state.artifacts.clone();
    match run_blocking(state.io_timeout, move || {
        artifacts.list_reports().map_err(Into::into)
    })
    .await
    {
        Ok(reports) => Json(reports).into_response(),
        Err(ProcessorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Json(Vec::<crate::artifact_repo::ReportEntry>::new()).into_response()
        }
        Err(e) => internal_error(e),
    }
}
