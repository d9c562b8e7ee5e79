//! asset-regen adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite, JSON file and in-memory fingerprint stores
//! - `settings`: TOML generation-settings provider
//! - `cache`: Filesystem asset cache oracle
//! - `events`: Tracing, JSONL and fan-out event sinks

mod cache_fs;
mod config_toml;
pub mod events;
mod store_file;
mod store_memory;
mod store_select;
mod store_sqlite;

/// Re-exports for fingerprint store adapters
pub mod store {
    pub use crate::store_file::JsonFileFingerprintStore;
    pub use crate::store_memory::InMemoryFingerprintStore;
    pub use crate::store_select::{StoreBackend, open_fingerprint_store};
    pub use crate::store_sqlite::SqliteFingerprintStore;
}

/// Re-exports for configuration provider adapters
pub mod settings {
    pub use crate::config_toml::{SettingsError, TomlConfigurationProvider};
}

/// Re-exports for asset cache adapters
pub mod cache {
    pub use crate::cache_fs::FsCacheSizeOracle;
}
