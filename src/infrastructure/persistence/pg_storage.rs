//! PostgreSQL storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use crate::domain::entities::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats};
use crate::domain::repositories::{StorageError, StorageResult, UrlStorage};

const INSERT_URL: &str = r#"
    INSERT INTO urls (original_url, user_id)
    VALUES ($1, $2)
    ON CONFLICT (original_url) DO NOTHING
    RETURNING id
"#;

/// PostgreSQL storage for users and URL entries.
///
/// Uniqueness of original URLs is enforced by the `urls.original_url`
/// constraint; deletion batches commit in a single transaction.
pub struct PgStorage {
    pool: Arc<PgPool>,
}

impl PgStorage {
    /// Wraps an existing pool. Migrations are expected to be applied.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the connection or a migration
    /// fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("Database migrations applied");

        Ok(Self::new(Arc::new(pool)))
    }
}

#[async_trait]
impl UrlStorage for PgStorage {
    async fn create_user(&self) -> StorageResult<i64> {
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO users DEFAULT VALUES RETURNING id")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(id)
    }

    async fn insert_url(&self, url: &str, owner_id: i64) -> StorageResult<i64> {
        sqlx::query_scalar::<_, i64>(INSERT_URL)
            .bind(url)
            .bind(owner_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(StorageError::AlreadyExists)
    }

    async fn get_url_id(&self, url: &str) -> StorageResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM urls WHERE original_url = $1")
            .bind(url)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn get_url(&self, id: i64) -> StorageResult<String> {
        let row = sqlx::query_as::<_, (String, bool)>(
            "SELECT original_url, is_deleted FROM urls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some((_, true)) => Err(StorageError::Deleted),
            Some((original_url, false)) => Ok(original_url),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_user_urls(&self, owner_id: i64) -> StorageResult<BTreeMap<i64, String>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, original_url FROM urls WHERE user_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn insert_batch(
        &self,
        urls: Vec<BatchUrl>,
        owner_id: i64,
    ) -> StorageResult<Vec<BatchUrlId>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(urls.len());

        for item in urls {
            let id = sqlx::query_scalar::<_, i64>(INSERT_URL)
                .bind(&item.original_url)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(url_id) = id {
                inserted.push(BatchUrlId {
                    correlation_id: item.correlation_id,
                    url_id,
                });
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete_batch(&self, intents: &[DeletionIntent]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        let mut applied = 0;

        for intent in intents {
            let result = sqlx::query(
                "UPDATE urls SET is_deleted = TRUE WHERE id = $1 AND user_id = $2 AND NOT is_deleted",
            )
            .bind(intent.url_id)
            .bind(intent.user_id)
            .execute(&mut *tx)
            .await?;
            applied += result.rows_affected();
        }

        tx.commit().await?;
        debug!(requested = intents.len(), applied, "Applied deletion batch");
        Ok(())
    }

    async fn stats(&self) -> StorageResult<StorageStats> {
        let (urls, users) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM urls), (SELECT COUNT(*) FROM users)",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(StorageStats { urls, users })
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
