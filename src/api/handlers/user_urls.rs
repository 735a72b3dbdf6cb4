//! Handlers for the caller's own URLs.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::user_urls::UserUrlResponse;
use crate::api::middleware::identity::KnownUser;
use crate::error::AppError;
use crate::state::AppState;

/// Lists every URL the caller has shortened, deleted ones included.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response Codes
///
/// - **200 OK**: `[{"short_url", "original_url"}]` in id order
/// - **204 No Content**: no valid token, or the caller owns nothing
pub async fn user_urls_handler(
    State(state): State<AppState>,
    KnownUser(user_id): KnownUser,
) -> Result<Response, AppError> {
    let Some(user_id) = user_id else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let urls = state.url_service.user_urls(user_id).await?;
    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<UserUrlResponse> = urls
        .into_iter()
        .map(|(id, original_url)| UserUrlResponse {
            short_url: state.url_service.short_url(id),
            original_url,
        })
        .collect();

    Ok(Json(body).into_response())
}

/// Queues the caller's URLs for deletion.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// ```json
/// ["1", "2", "3"]
/// ```
///
/// # Response Codes
///
/// - **202 Accepted**: intents queued; deletes apply later and only to ids the
///   caller owns
/// - **400 Bad Request**: an id is not a number
/// - **401 Unauthorized**: no valid token
/// - **503 Service Unavailable**: the delete worker has stopped
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    KnownUser(user_id): KnownUser,
    Json(ids): Json<Vec<String>>,
) -> Result<StatusCode, AppError> {
    let Some(user_id) = user_id else {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "Token cookie is missing or invalid" }),
        ));
    };

    let ids = parse_ids(&ids)?;
    state.url_service.delete_urls(ids, user_id).await?;

    Ok(StatusCode::ACCEPTED)
}

fn parse_ids(raw: &[String]) -> Result<Vec<i64>, AppError> {
    raw.iter()
        .map(|id| {
            id.trim()
                .parse::<i64>()
                .map_err(|_| AppError::bad_request("Invalid short URL id", json!({ "id": id })))
        })
        .collect()
}
