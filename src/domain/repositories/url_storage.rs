//! Storage capability shared by every backend.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::storage_error::StorageResult;
use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats};

/// Storage interface for users and shortened URL entries.
///
/// One instance is selected at startup and shared by request handlers and the
/// delete pipeline.
///
/// # Guarantees
///
/// - Original URLs are unique: a second insert of the same URL never creates
///   a new id.
/// - Entry ids are strictly increasing and never reused.
/// - Deletion is a soft delete and `is_deleted` never reverts.
/// - A [`DeletionIntent`] only applies when the requester owns the entry.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryStorage`] - in-process only
/// - [`crate::infrastructure::persistence::FileStorage`] - cache over an append-only log
/// - [`crate::infrastructure::persistence::PgStorage`] - PostgreSQL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlStorage: Send + Sync {
    /// Allocates a fresh user id.
    async fn create_user(&self) -> StorageResult<i64>;

    /// Stores `url` for `owner_id` and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns [`super::StorageError::AlreadyExists`] if the URL was ever
    /// inserted before. Callers resolve the existing id with
    /// [`UrlStorage::get_url_id`].
    async fn insert_url(&self, url: &str, owner_id: i64) -> StorageResult<i64>;

    /// Resolves an existing URL to its id.
    async fn get_url_id(&self, url: &str) -> StorageResult<i64>;

    /// Returns the original URL behind `id`.
    ///
    /// # Errors
    ///
    /// - [`super::StorageError::NotFound`] if no entry has this id
    /// - [`super::StorageError::Deleted`] if the entry was soft-deleted
    async fn get_url(&self, id: i64) -> StorageResult<String>;

    /// Lists every entry ever owned by `owner_id`, deleted ones included.
    ///
    /// A user without entries gets an empty map.
    async fn list_user_urls(&self, owner_id: i64) -> StorageResult<BTreeMap<i64, String>>;

    /// Inserts each URL that is not yet present.
    ///
    /// URLs that already exist are left out of the result instead of failing
    /// the batch.
    async fn insert_batch(
        &self,
        urls: Vec<BatchUrl>,
        owner_id: i64,
    ) -> StorageResult<Vec<BatchUrlId>>;

    /// Applies ownership-checked soft deletes in order.
    async fn delete_batch(&self, intents: &[DeletionIntent]) -> StorageResult<()>;

    /// Returns entry and user counts.
    async fn stats(&self) -> StorageResult<StorageStats>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StorageResult<()>;

    /// Releases file handles or connections. Safe to call more than once.
    async fn close(&self);
}
