//! Fingerprint store backend selection

use asset_regen_domain::{FingerprintStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::store_file::JsonFileFingerprintStore;
use crate::store_memory::InMemoryFingerprintStore;
use crate::store_sqlite::SqliteFingerprintStore;

/// Which fingerprint store to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// SQLite, falling back to the JSON file when SQLite cannot be opened
    #[default]
    Auto,
    Sqlite,
    File,
    Memory,
}

/// Open the configured fingerprint store
pub async fn open_fingerprint_store(
    backend: StoreBackend,
    db_path: &Path,
    fallback_path: &Path,
) -> Result<Arc<dyn FingerprintStore>, StoreError> {
    let store: Arc<dyn FingerprintStore> = match backend {
        StoreBackend::Auto => match SqliteFingerprintStore::new(db_path).await {
            Ok(store) => Arc::new(store),
            Err(error) => {
                tracing::warn!(
                    db_path = %db_path.display(),
                    fallback = %fallback_path.display(),
                    error = %error,
                    "SQLite store unavailable, using JSON file store"
                );
                Arc::new(JsonFileFingerprintStore::new(fallback_path))
            }
        },
        StoreBackend::Sqlite => Arc::new(SqliteFingerprintStore::new(db_path).await?),
        StoreBackend::File => Arc::new(JsonFileFingerprintStore::new(fallback_path)),
        StoreBackend::Memory => Arc::new(InMemoryFingerprintStore::new()),
    };

    tracing::debug!(backend = store.backend(), "Opened fingerprint store");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn auto_prefers_sqlite() {
        let dir = TempDir::new().expect("temp dir");
        let store = open_fingerprint_store(
            StoreBackend::Auto,
            &dir.path().join("state.sqlite"),
            &dir.path().join("hashes.json"),
        )
        .await
        .unwrap();

        assert_eq!(store.backend(), "sqlite");
    }

    #[tokio::test]
    async fn auto_falls_back_to_file_store() {
        let dir = TempDir::new().expect("temp dir");
        // A regular file where the database's parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let store = open_fingerprint_store(
            StoreBackend::Auto,
            &blocker.join("state.sqlite"),
            &dir.path().join("hashes.json"),
        )
        .await
        .unwrap();

        assert_eq!(store.backend(), "json-file");
    }

    #[tokio::test]
    async fn explicit_sqlite_reports_failure() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let result = open_fingerprint_store(
            StoreBackend::Sqlite,
            &blocker.join("state.sqlite"),
            &dir.path().join("hashes.json"),
        )
        .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn memory_backend() {
        let dir = TempDir::new().expect("temp dir");
        let store = open_fingerprint_store(
            StoreBackend::Memory,
            &dir.path().join("unused.sqlite"),
            &dir.path().join("unused.json"),
        )
        .await
        .unwrap();

        assert_eq!(store.backend(), "memory");
        assert!(!dir.path().join("unused.sqlite").exists());
    }
}
