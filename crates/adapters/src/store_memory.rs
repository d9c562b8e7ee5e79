//! In-memory fingerprint store for testing and offline mode

use asset_regen_domain::{FingerprintRecord, FingerprintStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory fingerprint store implementation
pub struct InMemoryFingerprintStore {
    records: RwLock<BTreeMap<String, FingerprintRecord>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryFingerprintStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            writes: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Number of records written so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail as if the backend were unreachable
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryFingerprintStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FingerprintStore for InMemoryFingerprintStore {
    async fn load_all(&self) -> Result<BTreeMap<String, FingerprintRecord>, StoreError> {
        self.check_available()?;
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(records.clone())
    }

    async fn upsert(&self, record: &FingerprintRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        records.insert(record.category.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, category: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        records.remove(category);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        records.clear();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
