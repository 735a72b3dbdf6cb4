//! Shortening, lookup and deletion of URLs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use url::Url;

use crate::domain::delete_worker::DeleteQueue;
use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats};
use crate::domain::repositories::{StorageError, UrlStorage};
use crate::error::AppError;

/// Outcome of [`UrlService::shorten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortened {
    pub id: i64,
    /// True when the URL had been shortened before and `id` is the old one.
    pub existed: bool,
}

/// Facade over the storage and the delete queue used by HTTP handlers.
pub struct UrlService {
    storage: Arc<dyn UrlStorage>,
    delete_queue: DeleteQueue,
    base_url: String,
}

impl UrlService {
    pub fn new(
        storage: Arc<dyn UrlStorage>,
        delete_queue: DeleteQueue,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            delete_queue,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn short_url(&self, id: i64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub fn delete_queue(&self) -> &DeleteQueue {
        &self.delete_queue
    }

    /// Shortens `url` on behalf of `user_id`.
    ///
    /// A URL shortened before, by anyone, resolves to its existing id with
    /// `existed` set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `url` is not an absolute http(s) URL.
    pub async fn shorten(&self, url: &str, user_id: i64) -> Result<Shortened, AppError> {
        validate_url(url)?;

        match self.storage.insert_url(url, user_id).await {
            Ok(id) => Ok(Shortened { id, existed: false }),
            Err(StorageError::AlreadyExists) => {
                let id = self.storage.get_url_id(url).await?;
                Ok(Shortened { id, existed: true })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Shortens several URLs at once. Already shortened URLs are left out of
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty batch or if any URL is
    /// invalid; nothing is stored in that case.
    pub async fn shorten_batch(
        &self,
        items: Vec<BatchUrl>,
        user_id: i64,
    ) -> Result<Vec<BatchUrlId>, AppError> {
        if items.is_empty() {
            return Err(AppError::bad_request("Batch must not be empty", json!({})));
        }
        for item in &items {
            validate_url(&item.original_url).map_err(|_| {
                AppError::bad_request(
                    "Invalid URL format",
                    json!({
                        "correlation_id": item.correlation_id,
                        "url": item.original_url,
                    }),
                )
            })?;
        }

        Ok(self.storage.insert_batch(items, user_id).await?)
    }

    pub async fn original_url(&self, id: i64) -> Result<String, AppError> {
        Ok(self.storage.get_url(id).await?)
    }

    pub async fn user_urls(&self, user_id: i64) -> Result<BTreeMap<i64, String>, AppError> {
        Ok(self.storage.list_user_urls(user_id).await?)
    }

    pub async fn stats(&self) -> Result<StorageStats, AppError> {
        Ok(self.storage.stats().await?)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        Ok(self.storage.ping().await?)
    }

    /// Queues `ids` for deletion on behalf of `user_id` and returns without
    /// waiting for the deletes to be applied.
    ///
    /// Ownership is checked when the batch is flushed; ids the user does not
    /// own are silently ignored then.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] once the delete worker has stopped.
    pub async fn delete_urls(&self, ids: Vec<i64>, user_id: i64) -> Result<(), AppError> {
        let intents: Vec<DeletionIntent> = ids
            .into_iter()
            .map(|url_id| DeletionIntent::new(url_id, user_id))
            .collect();
        if intents.is_empty() {
            return Ok(());
        }

        let count = intents.len();
        self.delete_queue.enqueue(intents).await.map_err(|e| {
            tracing::warn!(user_id, error = %e, "Rejected deletion request");
            AppError::unavailable("Deletion is not available", json!({}))
        })?;

        tracing::debug!(user_id, count, "Queued deletion request");
        Ok(())
    }
}

/// Accepts absolute http(s) URLs, stored exactly as given.
///
/// `Url::parse` would percent-encode embedded whitespace, but the raw string
/// is what gets stored, so whitespace is rejected up front for every backend.
fn validate_url(raw: &str) -> Result<(), AppError> {
    if raw.chars().any(char::is_whitespace) {
        return Err(AppError::bad_request(
            "URL must not contain whitespace",
            json!({ "url": raw }),
        ));
    }

    let parsed = Url::parse(raw).map_err(|e| {
        AppError::bad_request(
            "Invalid URL format",
            json!({ "url": raw, "reason": e.to_string() }),
        )
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
        return Err(AppError::bad_request(
            "Only absolute http and https URLs can be shortened",
            json!({ "url": raw }),
        ));
    }

    Ok(())
}
