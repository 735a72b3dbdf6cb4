//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short id to its original URL.
///
/// # Endpoint
///
/// `GET /{id}`
///
/// # Errors
///
/// - 400 Bad Request if `id` is not a number
/// - 404 Not Found if no entry has this id
/// - 410 Gone if the entry was deleted by its owner
pub async fn redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::bad_request("Invalid short URL id", json!({ "id": id })))?;

    let original_url = state.url_service.original_url(id).await?;

    Ok(Redirect::temporary(&original_url))
}
