use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use dropfade_lifecycle::MetricsSnapshot;
use tracing::warn;

use super::AppState;
use super::schemas::HealthResponse;

/// `GET /health` -- returns service status together with a metrics snapshot.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Pings the metadata store and returns a snapshot of lifecycle counters.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Metadata store unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let reachable = match state.manager.check_state_store().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "metadata store health check failed");
            false
        }
    };

    let (status, label) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: label.into(),
        state_store: if reachable { "ok" } else { "unavailable" }.into(),
        metrics: state.manager.metrics().snapshot(),
    };

    (status, Json(body))
}

/// `GET /metrics` -- returns lifecycle counters as JSON.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    summary = "Lifecycle metrics",
    description = "Returns current drop lifecycle counters for monitoring.",
    responses(
        (status = 200, description = "Current metric counters", body = MetricsSnapshot)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.manager.metrics().snapshot()))
}
