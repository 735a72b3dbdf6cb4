//! Cookie-based user identity.
//!
//! Users are identified by a signed token carried in the `token` cookie.
//!
//! # Cookie Format
//!
//! ```text
//! Cookie: token=<hex>
//! ```
//!
//! Handlers that create data take [`CurrentUser`], which mints a new user and
//! token when the cookie is missing or invalid. Handlers that only read or
//! act on existing data take [`KnownUser`], which never creates anything.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderName,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
};

use crate::application::services::ResolvedUser;
use crate::error::AppError;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

/// Caller identity, created on demand.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub ResolvedUser);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.user_id
    }

    /// `Set-Cookie` header for a freshly issued token, if any.
    ///
    /// Usable directly as a response part.
    pub fn set_cookie(&self) -> Option<[(HeaderName, String); 1]> {
        self.0
            .issued
            .then(|| [(SET_COOKIE, token_cookie(&self.0.token))])
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers);
        let resolved = state
            .user_service
            .resolve_or_create(token.as_deref())
            .await?;
        Ok(Self(resolved))
    }
}

/// Caller identity if the request carries a valid token.
#[derive(Debug, Clone, Copy)]
pub struct KnownUser(pub Option<i64>);

impl FromRequestParts<AppState> for KnownUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers);
        Ok(Self(state.user_service.resolve(token.as_deref())))
    }
}

/// Extracts the `token` cookie value.
///
/// Handles multiple cookies in one `Cookie` header and ignores the others.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|cookie_header| cookie_header.to_str().ok())
        .find_map(|cookie_str| {
            cookie_str.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some(TOKEN_COOKIE), Some(value)) if !value.is_empty() => {
                        Some(value.to_string())
                    }
                    _ => None,
                }
            })
        })
}

fn token_cookie(token: &str) -> String {
    format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}
