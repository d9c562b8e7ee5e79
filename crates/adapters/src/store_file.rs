//! Flat JSON file fingerprint store
//!
//! Persists `{category: fingerprint}` as a single JSON object. Used when the
//! SQLite backend cannot be opened.

use asset_regen_domain::{Fingerprint, FingerprintRecord, FingerprintStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tokio::sync::Mutex;

/// JSON blob fingerprint store
pub struct JsonFileFingerprintStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileFingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, Fingerprint>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn write_map(&self, map: &BTreeMap<String, Fingerprint>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Write(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(map).map_err(|e| StoreError::Write(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }

    async fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Fingerprint>),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        f(&mut map);
        self.write_map(&map).await
    }
}

#[async_trait]
impl FingerprintStore for JsonFileFingerprintStore {
    async fn load_all(&self) -> Result<BTreeMap<String, FingerprintRecord>, StoreError> {
        let map = self.read_map().await?;

        // The blob keeps no per-record timestamps; the file's mtime stands in
        let stored_at = match fs::metadata(&self.path).await.and_then(|m| m.modified()) {
            Ok(modified) => OffsetDateTime::from(modified),
            Err(_) => OffsetDateTime::UNIX_EPOCH,
        };

        Ok(map
            .into_iter()
            .map(|(category, fingerprint)| {
                let record = FingerprintRecord {
                    category: category.clone(),
                    fingerprint,
                    stored_at,
                };
                (category, record)
            })
            .collect())
    }

    async fn upsert(&self, record: &FingerprintRecord) -> Result<(), StoreError> {
        self.modify(|map| {
            map.insert(record.category.clone(), record.fingerprint.clone());
        })
        .await
    }

    async fn upsert_many(&self, records: &[FingerprintRecord]) -> Result<(), StoreError> {
        self.modify(|map| {
            for record in records {
                map.insert(record.category.clone(), record.fingerprint.clone());
            }
        })
        .await
    }

    async fn remove(&self, category: &str) -> Result<(), StoreError> {
        self.modify(|map| {
            map.remove(category);
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_map(&BTreeMap::new()).await
    }

    fn backend(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn record(category: &str, fingerprint: &str) -> FingerprintRecord {
        FingerprintRecord {
            category: category.to_string(),
            fingerprint: Fingerprint::new(fingerprint),
            stored_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let store = JsonFileFingerprintStore::new(dir.path().join("hashes.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_flat_mapping() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("state").join("hashes.json");
        let store = JsonFileFingerprintStore::new(&path);

        store
            .upsert_many(&[record("eyes", "e1"), record("hat", "h1")])
            .await
            .unwrap();
        store.upsert(&record("eyes", "e2")).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.expect("read blob");
        let value: Value = serde_json::from_str(&contents).expect("valid json");
        assert_eq!(value["eyes"], "e2");
        assert_eq!(value["hat"], "h1");

        let reopened = JsonFileFingerprintStore::new(&path);
        let loaded = reopened.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["eyes"].fingerprint.as_str(), "e2");
        assert_eq!(loaded["eyes"].category, "eyes");
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let dir = TempDir::new().expect("temp dir");
        let store = JsonFileFingerprintStore::new(dir.path().join("hashes.json"));

        store
            .upsert_many(&[record("eyes", "e1"), record("hat", "h1")])
            .await
            .unwrap();
        store.remove("eyes").await.unwrap();
        assert_eq!(
            store.load_all().await.unwrap().keys().collect::<Vec<_>>(),
            vec!["hat"]
        );

        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_blob_is_corrupt() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("hashes.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = JsonFileFingerprintStore::new(&path);
        assert!(matches!(store.load_all().await, Err(StoreError::Corrupt(_))));
        assert!(matches!(
            store.upsert(&record("eyes", "e1")).await,
            Err(StoreError::Corrupt(_))
        ));

        store.clear().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
