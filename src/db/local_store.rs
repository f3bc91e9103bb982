// src/db/local_store.rs

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;

use crate::common::error::StoreError;

/// A whole serialized collection plus the version it was written at.
/// Version 0 means "never written".
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub version: u64,
    pub payload: String,
}

/// Key/value port for on-device persistence. Writes are compare-and-swap on
/// the stored version so two writers can never interleave a lost update.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Replaces the value only if the stored version still equals `expected_version`.
    /// Returns the new version.
    async fn write(&self, key: &str, expected_version: u64, payload: &str) -> Result<u64, StoreError>;
}

// =========================================================================
//  SQLITE
// =========================================================================

#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database behind `database_url` and runs the
    /// embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // `sqlite::memory:` lives and dies with its one connection.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn current_version(&self, key: &str) -> Result<u64, StoreError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM collections WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version.unwrap_or(0) as u64)
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn read(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let row = sqlx::query("SELECT version, payload FROM collections WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| StoredValue {
            version: r.get::<i64, _>("version") as u64,
            payload: r.get("payload"),
        }))
    }

    async fn write(&self, key: &str, expected_version: u64, payload: &str) -> Result<u64, StoreError> {
        let now = Utc::now().to_rfc3339();

        let result = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO collections (key, version, payload, updated_at)
                VALUES (?, 1, ?, ?)
                ON CONFLICT (key) DO NOTHING
                "#,
            )
            .bind(key)
            .bind(payload)
            .bind(&now)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE collections
                SET payload = ?, version = version + 1, updated_at = ?
                WHERE key = ? AND version = ?
                "#,
            )
            .bind(payload)
            .bind(&now)
            .bind(key)
            .bind(expected_version as i64)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found: self.current_version(key).await?,
            });
        }

        Ok(expected_version + 1)
    }
}

// =========================================================================
//  IN-MEMORY
// =========================================================================

/// Non-durable store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a key as if an earlier session had written it.
    pub async fn seed(&self, key: &str, payload: impl Into<String>) {
        let mut entries = self.entries.write().await;
        let version = entries.get(key).map(|v| v.version).unwrap_or(0) + 1;
        entries.insert(key.to_string(), StoredValue { version, payload: payload.into() });
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn read(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, expected_version: u64, payload: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let found = entries.get(key).map(|v| v.version).unwrap_or(0);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found,
            });
        }

        let version = expected_version + 1;
        entries.insert(key.to_string(), StoredValue { version, payload: payload.to_string() });
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_rejects_stale_writes() {
        let store = MemoryLocalStore::new();
        assert_eq!(store.write("k", 0, "[]").await.unwrap(), 1);
        assert_eq!(store.write("k", 1, "[1]").await.unwrap(), 2);

        let err = store.write("k", 1, "[2]").await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 1, found: 2, .. }));
        assert_eq!(store.read("k").await.unwrap().unwrap().payload, "[1]");
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_and_checks_versions() {
        let store = SqliteLocalStore::connect("sqlite::memory:").await.unwrap();
        assert!(store.read("school_students").await.unwrap().is_none());

        store.write("school_students", 0, "[]").await.unwrap();
        let v2 = store.write("school_students", 1, r#"[{"id":"a"}]"#).await.unwrap();
        assert_eq!(v2, 2);

        let err = store.write("school_students", 0, "[]").await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { found: 2, .. }));

        let stored = store.read("school_students").await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.payload, r#"[{"id":"a"}]"#);
    }
}
