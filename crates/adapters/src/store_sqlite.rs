//! SQLite fingerprint store implementation

use asset_regen_domain::{Fingerprint, FingerprintRecord, FingerprintStore, StoreError};
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::collections::BTreeMap;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UPSERT_SQL: &str = r#"
    INSERT INTO fingerprints (category, fingerprint, stored_at)
    VALUES (?, ?, ?)
    ON CONFLICT(category) DO UPDATE SET
        fingerprint = excluded.fingerprint,
        stored_at = excluded.stored_at
"#;

/// SQLite-backed transactional fingerprint store
pub struct SqliteFingerprintStore {
    pool: SqlitePool,
}

impl SqliteFingerprintStore {
    /// Open (or create) the database at `db_path`
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fingerprints (
                category TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }
}

fn format_timestamp(at: OffsetDateTime) -> Result<String, StoreError> {
    at.format(&Rfc3339)
        .map_err(|e| StoreError::Write(format!("Failed to format timestamp: {}", e)))
}

#[async_trait]
impl FingerprintStore for SqliteFingerprintStore {
    async fn load_all(&self) -> Result<BTreeMap<String, FingerprintRecord>, StoreError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT category, fingerprint, stored_at FROM fingerprints")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (category, fingerprint, stored_at_str) in rows {
            let stored_at = OffsetDateTime::parse(&stored_at_str, &Rfc3339).map_err(|e| {
                StoreError::Corrupt(format!("category {}: bad timestamp: {}", category, e))
            })?;

            records.insert(
                category.clone(),
                FingerprintRecord {
                    category,
                    fingerprint: Fingerprint::new(fingerprint),
                    stored_at,
                },
            );
        }

        Ok(records)
    }

    async fn upsert(&self, record: &FingerprintRecord) -> Result<(), StoreError> {
        sqlx::query(UPSERT_SQL)
            .bind(&record.category)
            .bind(record.fingerprint.as_str())
            .bind(format_timestamp(record.stored_at)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    async fn upsert_many(&self, records: &[FingerprintRecord]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for record in records {
            sqlx::query(UPSERT_SQL)
                .bind(&record.category)
                .bind(record.fingerprint.as_str())
                .bind(format_timestamp(record.stored_at)?)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Write(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, category: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM fingerprints WHERE category = ?")
            .bind(category)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM fingerprints")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(category: &str, fingerprint: &str) -> FingerprintRecord {
        FingerprintRecord {
            category: category.to_string(),
            fingerprint: Fingerprint::new(fingerprint),
            stored_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_load_roundtrip() {
        let store = SqliteFingerprintStore::in_memory().await.unwrap();

        store
            .upsert_many(&[record("eyes", "aaa"), record("body", "bbb")])
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["eyes"].fingerprint.as_str(), "aaa");
        assert_eq!(loaded["body"], record("body", "bbb"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let store = SqliteFingerprintStore::in_memory().await.unwrap();

        store.upsert(&record("eyes", "aaa")).await.unwrap();
        store.upsert(&record("eyes", "ccc")).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["eyes"].fingerprint.as_str(), "ccc");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = SqliteFingerprintStore::in_memory().await.unwrap();
        store
            .upsert_many(&[record("eyes", "a"), record("hat", "b"), record("body", "c")])
            .await
            .unwrap();

        store.remove("hat").await.unwrap();
        let loaded = store.load_all().await.unwrap();
        assert!(!loaded.contains_key("hat"));
        assert_eq!(loaded.len(), 2);

        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_corrupt() {
        let store = SqliteFingerprintStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO fingerprints (category, fingerprint, stored_at) VALUES (?, ?, ?)")
            .bind("eyes")
            .bind("aaa")
            .bind("yesterday")
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.load_all().await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("fingerprints.sqlite");

        {
            let store = SqliteFingerprintStore::new(&path).await.unwrap();
            store.upsert(&record("mouth", "m1")).await.unwrap();
            store.pool.close().await;
        }

        let store = SqliteFingerprintStore::new(&path).await.unwrap();
        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded["mouth"].fingerprint.as_str(), "m1");
    }
}
