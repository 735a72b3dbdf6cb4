//! # URL Shortener
//!
//! A URL shortening service with per-user ownership and asynchronous batched
//! deletion, built with Axum over in-memory, file or PostgreSQL storage.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Entities, the storage trait and the delete pipeline
//! - **Application Layer** ([`application`]) - Shortening and identity services
//! - **Infrastructure Layer** ([`infrastructure`]) - Storage backends
//! - **API Layer** ([`api`]) - REST handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Numeric short ids, one per distinct original URL
//! - Users identified by an HMAC-signed cookie token
//! - Deletion requests acknowledged immediately and applied in batches
//! - Three interchangeable storage backends with identical semantics
//!
//! ## Quick Start
//!
//! ```bash
//! # Persist to a log file (or set DATABASE_URL for PostgreSQL)
//! export FILE_STORAGE_PATH="./urls.log"
//! export USER_SIGNING_SECRET="change-me"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{TokenSigner, UrlService, UserService};
    pub use crate::domain::delete_worker::{DeleteQueue, DeleteWorker, DeleteWorkerSettings};
    pub use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats, UrlEntry};
    pub use crate::domain::repositories::{StorageError, StorageResult, UrlStorage};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
