//! Handlers for health and liveness endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "storage": { "status": "ok", "message": "Reachable" },
///     "delete_queue": { "status": "ok", "message": "Free slots: 100" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let storage_check = check_storage(&state).await;
    let queue_check = check_delete_queue(&state);

    let all_healthy = storage_check.is_ok() && queue_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage: storage_check,
            delete_queue: queue_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks that the storage backend is reachable.
///
/// # Endpoint
///
/// `GET /ping`
///
/// Returns **200 OK** or **500 Internal Server Error** with an empty body.
pub async fn ping_handler(State(state): State<AppState>) -> StatusCode {
    match state.url_service.ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn check_storage(state: &AppState) -> CheckStatus {
    match state.url_service.ping().await {
        Ok(()) => CheckStatus::ok("Reachable"),
        Err(_) => CheckStatus::error("Storage unreachable"),
    }
}

/// Checks that the delete worker is still accepting intents.
fn check_delete_queue(state: &AppState) -> CheckStatus {
    let queue = state.url_service.delete_queue();
    if queue.is_closed() {
        CheckStatus::error("Delete queue is closed")
    } else {
        CheckStatus::ok(format!("Free slots: {}", queue.capacity()))
    }
}
