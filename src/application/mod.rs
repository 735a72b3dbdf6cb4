//! Application layer services implementing business logic.
//!
//! Services consume the [`crate::domain::repositories::UrlStorage`] trait and
//! the delete queue, and give HTTP handlers a small API that already speaks
//! [`crate::error::AppError`].
//!
//! # Available Services
//!
//! - [`services::url_service::UrlService`] - Shortening, lookup and queued deletion
//! - [`services::user_service::UserService`] - Token verification and user creation

pub mod services;
