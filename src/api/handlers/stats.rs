//! Handler for internal service statistics.

use std::net::IpAddr;

use axum::{Json, extract::State, http::HeaderMap};
use serde_json::json;

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

const REAL_IP_HEADER: &str = "x-real-ip";

/// Returns the number of stored URLs and users.
///
/// # Endpoint
///
/// `GET /api/internal/stats`
///
/// # Access
///
/// Allowed only when a trusted subnet is configured and the `X-Real-IP`
/// header names an address inside it. Everything else gets **403 Forbidden**.
pub async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let Some(subnet) = state.trusted_subnet else {
        return Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "No trusted subnet configured" }),
        ));
    };

    let client_ip = real_ip(&headers).ok_or_else(|| {
        AppError::forbidden(
            "Forbidden",
            json!({ "reason": "X-Real-IP header is missing or invalid" }),
        )
    })?;

    if !subnet.contains(client_ip) {
        return Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "Client is outside the trusted subnet" }),
        ));
    }

    let stats = state.url_service.stats().await?;
    Ok(Json(stats.into()))
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
