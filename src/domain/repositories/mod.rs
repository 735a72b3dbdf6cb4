//! Storage trait definitions for the domain layer.
//!
//! The [`UrlStorage`] trait is the single seam between the core logic and the
//! three backends in `crate::infrastructure::persistence`. A mock is generated
//! via `mockall` for unit tests.
//!
//! # Testing
//!
//! See the backend contract suite in `tests/storage_*.rs`.

pub mod storage_error;
pub mod url_storage;

pub use storage_error::{StorageError, StorageResult};
pub use url_storage::UrlStorage;

#[cfg(test)]
pub use url_storage::MockUrlStorage;
