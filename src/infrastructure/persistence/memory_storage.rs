//! Purely in-process storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::url_index::UrlIndex;
use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats};
use crate::domain::repositories::{StorageError, StorageResult, UrlStorage};

/// Storage that keeps everything in memory behind a read/write lock.
///
/// Reads share the lock; inserts and deletes take it exclusively. Contents
/// are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    index: RwLock<UrlIndex>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        debug!("Using in-memory storage");
        Self::default()
    }
}

#[async_trait]
impl UrlStorage for MemoryStorage {
    async fn create_user(&self) -> StorageResult<i64> {
        Ok(self.index.write().await.create_user())
    }

    async fn insert_url(&self, url: &str, owner_id: i64) -> StorageResult<i64> {
        self.index.write().await.insert(url, owner_id)
    }

    async fn get_url_id(&self, url: &str) -> StorageResult<i64> {
        self.index.read().await.get_id(url)
    }

    async fn get_url(&self, id: i64) -> StorageResult<String> {
        self.index.read().await.get(id).map(str::to_owned)
    }

    async fn list_user_urls(&self, owner_id: i64) -> StorageResult<BTreeMap<i64, String>> {
        Ok(self.index.read().await.user_urls(owner_id))
    }

    async fn insert_batch(
        &self,
        urls: Vec<BatchUrl>,
        owner_id: i64,
    ) -> StorageResult<Vec<BatchUrlId>> {
        let mut index = self.index.write().await;
        let mut inserted = Vec::with_capacity(urls.len());

        for item in urls {
            match index.insert(&item.original_url, owner_id) {
                Ok(url_id) => inserted.push(BatchUrlId {
                    correlation_id: item.correlation_id,
                    url_id,
                }),
                Err(StorageError::AlreadyExists) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(inserted)
    }

    async fn delete_batch(&self, intents: &[DeletionIntent]) -> StorageResult<()> {
        let mut index = self.index.write().await;
        let applied = intents
            .iter()
            .filter(|intent| index.apply_delete(**intent))
            .count();
        debug!(requested = intents.len(), applied, "Applied deletion batch");
        Ok(())
    }

    async fn stats(&self) -> StorageResult<StorageStats> {
        Ok(self.index.read().await.stats())
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) {
        debug!("Closing in-memory storage");
    }
}
