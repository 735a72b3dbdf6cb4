//! Handlers for link shortening endpoints.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{
    BatchShortenItem, BatchShortenResult, ShortenRequest, ShortenResponse,
};
use crate::api::middleware::identity::CurrentUser;
use crate::domain::entities::BatchUrl;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL sent as the raw request body.
///
/// # Endpoint
///
/// `POST /`
///
/// # Response Codes
///
/// - **201 Created**: short URL as `text/plain`
/// - **409 Conflict**: URL was shortened before; body is the existing short URL
/// - **400 Bad Request**: body is not an absolute http(s) URL
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    body: String,
) -> Result<Response, AppError> {
    let url = body.trim();
    if url.is_empty() {
        return Err(AppError::bad_request("Request body is empty", json!({})));
    }

    let shortened = state.url_service.shorten(url, user.id()).await?;
    let status = if shortened.existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        user.set_cookie(),
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.url_service.short_url(shortened.id),
    )
        .into_response())
}

/// Shortens a URL sent as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/1" }
/// ```
///
/// 201 for a new URL, 409 with the existing short URL otherwise.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ShortenRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let shortened = state.url_service.shorten(&payload.url, user.id()).await?;
    let status = if shortened.existed {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        user.set_cookie(),
        Json(ShortenResponse {
            result: state.url_service.short_url(shortened.id),
        }),
    )
        .into_response())
}

/// Shortens several URLs in one request.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [{ "correlation_id": "a", "original_url": "https://example.com" }]
/// ```
///
/// # Response
///
/// **201 Created** with one item per newly shortened URL. URLs that were
/// already shortened are omitted.
///
/// ```json
/// [{ "correlation_id": "a", "short_url": "http://localhost:8080/1" }]
/// ```
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Vec<BatchShortenItem>>,
) -> Result<Response, AppError> {
    for item in &payload {
        item.validate()?;
    }

    let items: Vec<BatchUrl> = payload.into_iter().map(Into::into).collect();
    let inserted = state.url_service.shorten_batch(items, user.id()).await?;

    let results: Vec<BatchShortenResult> = inserted
        .into_iter()
        .map(|item| BatchShortenResult {
            short_url: state.url_service.short_url(item.url_id),
            correlation_id: item.correlation_id,
        })
        .collect();

    Ok((StatusCode::CREATED, user.set_cookie(), Json(results)).into_response())
}
