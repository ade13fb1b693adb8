//! HTTP request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::api::server::VisitServer;

/// Service banner at the root path.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "visit-tracker",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/visit-count", "/health", "/admin/reset-visits"]
    }))
}

/// Health check.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Read-only visit count query. Payload shape kept compatible with the old
/// endpoint (`count` and `total_visits` report the same value).
pub async fn visit_count(State(state): State<Arc<VisitServer>>) -> Response {
    match state.lifecycle.counter() {
        Ok(counter) => {
            let total = counter.current();
            Json(json!({
                "count": total,
                "total_visits": total,
                "update_time": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
            }))
            .into_response()
        }
        Err(e) => counter_unavailable(e),
    }
}

/// Administrative reset. Forces a write-back of the zeroed count; if the
/// flush acknowledgement does not land in time the reset still took effect
/// in memory, which the response reports.
pub async fn reset_visits(State(state): State<Arc<VisitServer>>) -> Response {
    match state.lifecycle.counter() {
        Ok(counter) => match counter.reset().await {
            Ok(()) => {
                Json(json!({ "count": 0, "total_visits": 0, "flushed": true })).into_response()
            }
            Err(e) => {
                warn!("reset flush did not complete: {}", e);
                (
                    StatusCode::ACCEPTED,
                    Json(json!({ "count": 0, "total_visits": 0, "flushed": false })),
                )
                    .into_response()
            }
        },
        Err(e) => counter_unavailable(e),
    }
}

/// Fallback for unknown paths. Routed through the counting middleware like
/// everything else, since the old server counted every non-excluded hit.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

fn counter_unavailable(err: crate::core::errors::CounterError) -> Response {
    warn!("visit counter unavailable: {}", err);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
