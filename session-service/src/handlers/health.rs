use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{Json, extract::State, http::StatusCode, http::header, response::IntoResponse};
use serde_json::json;

/// Liveness: the process is up.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "session-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: the session store answers a ping.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.sessions.store().health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
