//! Errors reported by storage backends.

use thiserror::Error;

/// Failure modes of a [`super::UrlStorage`] operation.
///
/// Ownership mismatches on delete are deliberately absent: they are silent
/// no-ops, not errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("url not found")]
    NotFound,

    #[error("url already exists")]
    AlreadyExists,

    #[error("url has been deleted")]
    Deleted,

    #[error("url cannot be stored: {0}")]
    InvalidUrl(String),

    #[error("corrupt storage log at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
