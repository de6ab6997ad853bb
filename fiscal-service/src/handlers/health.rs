use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;
use crate::AppState;

const SERVICE_NAME: &str = "fiscal-service";

/// Liveness plus a dependency probe. In-memory deployments skip the database.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mongodb = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => "up",
            Err(e) => {
                tracing::error!(error = %e, "MongoDB health check failed");
                "down"
            }
        },
        None => "in-memory",
    };
    let queue = match state.queue.health_check().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Queue health check failed");
            "down"
        }
    };

    // The queue is best-effort; only the database decides health.
    let (status, label) = if mongodb == "down" {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "mongodb": mongodb,
                "queue": queue
            }
        })),
    )
}

pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => StatusCode::OK,
            Err(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        None => StatusCode::OK,
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
