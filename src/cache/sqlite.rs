//! SQLite Repository Module
//!
//! Embedded, file-backed persistence for cached images.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use tracing::debug;

use crate::cache::{CachedImage, ImageRepository};
use crate::error::{CacheError, Result};

/// SQLite-backed repository holding one pool for its whole lifetime.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (or creates) the database file and runs migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.migrate().await?;
        debug!(path = %path.display(), "SQLite image repository opened");
        Ok(repo)
    }

    /// Opens a private in-memory database.
    ///
    /// The single connection is never recycled, otherwise its contents vanish.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::StorageUnavailable(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cached_images (
                id TEXT PRIMARY KEY NOT NULL,
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                file_type TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cached_images_timestamp ON cached_images(timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_image(row: &SqliteRow) -> Result<CachedImage> {
    Ok(CachedImage {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        file_size: row.try_get::<i64, _>("file_size")? as u64,
        file_type: row.try_get("file_type")?,
        content: row.try_get("content")?,
        timestamp: row.try_get::<i64, _>("timestamp")? as u64,
    })
}

#[async_trait]
impl ImageRepository for SqliteRepository {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, image: CachedImage) -> Result<()> {
        sqlx::query(
            "INSERT INTO cached_images (id, file_name, file_size, file_type, content, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&image.id)
        .bind(&image.file_name)
        .bind(image.file_size as i64)
        .bind(&image.file_type)
        .bind(&image.content)
        .bind(image.timestamp as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CachedImage>> {
        let row = sqlx::query("SELECT * FROM cached_images WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_image).transpose()
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cached_images WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<CachedImage>> {
        let rows = sqlx::query("SELECT * FROM cached_images")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_image).collect()
    }

    async fn clear(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cached_images")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn remove_created_before(&self, cutoff_ms: u64) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cached_images WHERE timestamp <= ?1")
            .bind(cutoff_ms as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
