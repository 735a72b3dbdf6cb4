//! Storage backend implementations.
//!
//! Concrete implementations of [`UrlStorage`], one of which is selected at
//! startup from configuration.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - In-process maps, lost on exit
//! - [`FileStorage`] - Append-only log replayed into an in-memory cache
//! - [`PgStorage`] - PostgreSQL with embedded migrations

pub mod file_storage;
pub mod memory_storage;
pub mod pg_storage;
mod url_index;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use pg_storage::PgStorage;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{Config, StorageBackend};
use crate::domain::repositories::UrlStorage;

/// Opens the backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the log file cannot be replayed or the database is
/// unreachable.
pub async fn open_storage(config: &Config) -> Result<Arc<dyn UrlStorage>> {
    let storage: Arc<dyn UrlStorage> = match &config.storage {
        StorageBackend::Memory => {
            tracing::warn!("No persistent storage configured, data is lost on exit");
            Arc::new(MemoryStorage::new())
        }
        StorageBackend::File { path } => Arc::new(
            FileStorage::open(path)
                .await
                .with_context(|| format!("Failed to open URL log at {path}"))?,
        ),
        StorageBackend::Postgres { database_url } => Arc::new(
            PgStorage::connect(
                database_url,
                config.db_max_connections,
                config.db_connect_timeout(),
            )
            .await
            .context("Failed to connect to database")?,
        ),
    };

    tracing::info!(backend = config.storage.name(), "Storage ready");
    Ok(storage)
}
