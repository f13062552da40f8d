//! SQLite implementation of the link store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::domain::entities::UrlRecord;
use crate::domain::store::LinkStore;
use crate::error::AppError;

/// SQLite-backed store for short link mappings.
///
/// Timestamps are persisted as Unix epoch seconds (UTC), keeping the schema
/// portable and the dump export trivial. Queries bind at runtime so the crate
/// builds without a database present.
pub struct SqliteLinkStore {
    pool: SqlitePool,
}

impl SqliteLinkStore {
    /// Opens the store at `database_url` and applies pending migrations.
    ///
    /// In-memory databases (`sqlite::memory:`) are restricted to a single
    /// pooled connection: each SQLite in-memory connection holds its own
    /// private database, so a larger pool would scatter rows across
    /// disconnected stores.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the database cannot be opened or a
    /// migration fails.
    pub async fn open(database_url: &str) -> Result<Self, AppError> {
        let max_connections = if database_url.contains(":memory:") { 1 } else { 8 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                AppError::internal("Migration failed", serde_json::json!({ "reason": e.to_string() }))
            })?;

        Ok(Self { pool })
    }
}

fn record_from_row(row: &SqliteRow) -> Result<UrlRecord, sqlx::Error> {
    let key: String = row.try_get("key")?;
    let url: String = row.try_get("url")?;
    let created_secs: i64 = row.try_get("created_at")?;
    let created_at = DateTime::from_timestamp(created_secs, 0).unwrap_or_default();
    Ok(UrlRecord::new(key, url, created_at))
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn put(&self, key: &str, url: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO links (key, url, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET url = excluded.url, created_at = excluded.created_at",
        )
        .bind(key)
        .bind(url)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query("SELECT key, url, created_at FROM links WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM links WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn dump(&self) -> Result<Vec<UrlRecord>, AppError> {
        let rows = sqlx::query("SELECT key, url, created_at FROM links ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(row)?);
        }
        Ok(records)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
