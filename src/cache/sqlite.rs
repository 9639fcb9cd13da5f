//! SQLite-backed result cache.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use log::{error, info};
use sqlx::{Row, SqlitePool};

use super::ScanCache;
use crate::error_handling::DatabaseError;
use crate::models::{Classification, ScanResult};

const SCHEMA: &str = include_str!("../../migrations/0001_scan_results.sql");

/// Result cache persisted in a SQLite file (WAL mode).
#[derive(Debug, Clone)]
pub struct SqliteScanCache {
    pool: SqlitePool,
}

impl SqliteScanCache {
    /// Opens (creating if needed) the database at `db_path` and applies the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` when the file cannot be created or the
    /// database cannot be opened or migrated.
    pub async fn open(db_path: &Path) -> Result<Self, DatabaseError> {
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(db_path)
        {
            Ok(_) => info!("Cache database created at {}", db_path.display()),
            Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Using existing cache database {}", db_path.display())
            }
            Err(e) => {
                error!("Failed to create cache database file: {e}");
                return Err(DatabaseError::FileCreationError(e.to_string()));
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.to_string_lossy()))
            .await
            .map_err(|e| {
                error!("Failed to connect to cache database: {e}");
                DatabaseError::SqlError(e)
            })?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await
            .map_err(|e| {
                error!("Failed to set WAL mode: {e}");
                DatabaseError::SqlError(e)
            })?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ScanCache for SqliteScanCache {
    async fn get(&self, url: &str) -> Result<Option<ScanResult>> {
        let row = sqlx::query(
            "SELECT url, classification, reason, created_at FROM scan_results WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let classification: String = row.try_get("classification")?;
        let created_at: i64 = row.try_get("created_at")?;
        Ok(Some(ScanResult {
            url: row.try_get("url")?,
            classification: Classification::from_str(&classification)
                .with_context(|| format!("unknown classification '{classification}'"))?,
            reason: row.try_get("reason")?,
            created_at: DateTime::from_timestamp_millis(created_at)
                .with_context(|| format!("invalid timestamp {created_at}"))?,
        }))
    }

    async fn put(&self, result: &ScanResult) -> Result<()> {
        sqlx::query(
            "INSERT INTO scan_results (url, classification, reason, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET
                 classification = excluded.classification,
                 reason = excluded.reason,
                 created_at = excluded.created_at",
        )
        .bind(&result.url)
        .bind(result.classification.as_ref())
        .bind(&result.reason)
        .bind(result.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp() -> (SqliteScanCache, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = SqliteScanCache::open(&dir.path().join("cache.db")).await.unwrap();
        (cache, dir)
    }

    #[tokio::test]
    async fn test_sqlite_round_trip() {
        let (cache, _dir) = open_temp().await;
        assert!(cache.get("http://example.com").await.unwrap().is_none());

        let result = ScanResult::new(
            "http://example.com",
            Classification::Suspicious,
            "URL does not use HTTPS",
        );
        cache.put(&result).await.unwrap();

        let stored = cache.get("http://example.com").await.unwrap().unwrap();
        assert_eq!(stored.classification, Classification::Suspicious);
        assert_eq!(stored.reason, "URL does not use HTTPS");
        assert_eq!(
            stored.created_at.timestamp_millis(),
            result.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_sqlite_upsert_replaces() {
        let (cache, _dir) = open_temp().await;
        cache
            .put(&ScanResult::new("http://a.test", Classification::Safe, "first"))
            .await
            .unwrap();
        cache
            .put(&ScanResult::new("http://a.test", Classification::Malicious, "second"))
            .await
            .unwrap();

        let stored = cache.get("http://a.test").await.unwrap().unwrap();
        assert_eq!(stored.classification, Classification::Malicious);
        assert_eq!(stored.reason, "second");
    }

    #[tokio::test]
    async fn test_sqlite_reopen_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        {
            let cache = SqliteScanCache::open(&path).await.unwrap();
            cache
                .put(&ScanResult::new("http://kept.test", Classification::Safe, "URL appears safe"))
                .await
                .unwrap();
        }
        let cache = SqliteScanCache::open(&path).await.unwrap();
        assert!(cache.get("http://kept.test").await.unwrap().is_some());
    }
}
