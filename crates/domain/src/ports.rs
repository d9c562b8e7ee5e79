//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the tracker and the systems it
//! collaborates with. Adapters implement these traits to connect to real
//! infrastructure.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    CategoryConfig, Fingerprint, FingerprintRecord, GlobalStyleSettings, RegenerationEvent,
    StyleEngineSettings,
};

/// Port for reading the current generation configuration.
///
/// Providers return `None` when a value is unavailable; the tracker
/// substitutes defaults instead of failing.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Current configuration of a category
    async fn category_config(&self, category: &str) -> Option<CategoryConfig>;

    /// Global style settings
    async fn global_style_settings(&self) -> Option<GlobalStyleSettings>;

    /// Style-engine settings narrowed to a category
    async fn style_engine_settings(&self, category: &str) -> Option<StyleEngineSettings>;
}

/// Error type for fingerprint store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Write failed: {0}")]
    Write(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Port for persisting fingerprints across sessions
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Load every stored fingerprint
    async fn load_all(&self) -> Result<BTreeMap<String, FingerprintRecord>, StoreError>;

    /// Insert or replace a category's fingerprint
    async fn upsert(&self, record: &FingerprintRecord) -> Result<(), StoreError>;

    /// Insert or replace several fingerprints, atomically where the backend allows
    async fn upsert_many(&self, records: &[FingerprintRecord]) -> Result<(), StoreError> {
        for record in records {
            self.upsert(record).await?;
        }
        Ok(())
    }

    /// Remove a single category's fingerprint
    async fn remove(&self, category: &str) -> Result<(), StoreError>;

    /// Remove every stored fingerprint
    async fn clear(&self) -> Result<(), StoreError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Port for counting reusable assets already in the asset cache
#[async_trait]
pub trait CacheSizeOracle: Send + Sync {
    /// Number of cached assets available for a category
    async fn count_available(&self, category: &str) -> usize;
}

/// Oracle for deployments without an asset cache
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCacheOracle;

#[async_trait]
impl CacheSizeOracle for EmptyCacheOracle {
    async fn count_available(&self, _category: &str) -> usize {
        0
    }
}

/// Port for resolving which image provider is active
pub trait ActiveProviderResolver: Send + Sync {
    fn active_provider_name(&self) -> String;
}

/// Resolver returning a fixed provider name
#[derive(Debug, Clone, Default)]
pub struct FixedProviderResolver(pub String);

impl ActiveProviderResolver for FixedProviderResolver {
    fn active_provider_name(&self) -> String {
        self.0.clone()
    }
}

/// Port for observers of tracker decisions
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RegenerationEvent);
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &RegenerationEvent) {}
}

/// Error type for hash providers
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Hash primitive unavailable: {0}")]
    Unavailable(String),
    #[error("Digest failed: {0}")]
    Failed(String),
}

/// Port for digesting canonical configuration bytes
pub trait HashProvider: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Result<Fingerprint, HashError>;

    /// Whether digests are collision resistant
    fn is_cryptographic(&self) -> bool;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
