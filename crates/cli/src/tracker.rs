//! Wiring of the change tracker from configuration

use anyhow::{Context, Result};
use asset_regen_adapters::{
    cache::FsCacheSizeOracle,
    events::{FanoutEventSink, JsonlEventSink, TracingEventSink},
    settings::TomlConfigurationProvider,
    store::open_fingerprint_store,
};
use asset_regen_domain::{
    EventSink, FingerprintStore, FixedProviderResolver, SystemClock,
    usecases::{ChangeTracker, TrackerError},
};
use std::sync::Arc;

use crate::config::AppConfig;

pub type CliTracker =
    ChangeTracker<TomlConfigurationProvider, dyn FingerprintStore, FanoutEventSink, SystemClock>;

/// Build and initialize a tracker from configuration
pub async fn build_tracker(config: &AppConfig) -> Result<CliTracker> {
    let mut tracker = assemble(config).await?;

    tracker
        .initialize()
        .await
        .context("Failed to load stored fingerprints")?;

    log_ready(&tracker);
    Ok(tracker)
}

/// Build a tracker for commands that clear stored fingerprints.
///
/// Corrupt stored records are logged and skipped so the clear can overwrite them.
pub async fn build_tracker_for_repair(config: &AppConfig) -> Result<CliTracker> {
    let mut tracker = assemble(config).await?;

    match tracker.initialize().await {
        Ok(()) => {}
        Err(TrackerError::CorruptRecord(msg)) => {
            tracing::warn!(error = %msg, "Stored fingerprints are corrupt, starting empty");
        }
        Err(e) => return Err(e).context("Failed to load stored fingerprints"),
    }

    log_ready(&tracker);
    Ok(tracker)
}

async fn assemble(config: &AppConfig) -> Result<CliTracker> {
    let provider = Arc::new(
        TomlConfigurationProvider::load(&config.general.settings_path)
            .context("Failed to load generation settings")?,
    );

    let store = open_fingerprint_store(
        config.general.store_backend,
        &config.general.state_db_path,
        &config.general.fallback_state_path,
    )
    .await
    .context("Failed to open fingerprint store")?;

    let mut events = FanoutEventSink::new(vec![Arc::new(TracingEventSink) as Arc<dyn EventSink>]);
    if let Some(path) = &config.general.events_path {
        let sink = JsonlEventSink::new(path.clone())
            .with_context(|| format!("Failed to open event log: {}", path.display()))?;
        events.push(Arc::new(sink));
    }

    let tracker = ChangeTracker::new(
        provider,
        store,
        Arc::new(events),
        Arc::new(SystemClock),
        config.tracker_config(),
    )
    .with_cache_oracle(Arc::new(FsCacheSizeOracle::new(&config.general.cache_dir)))
    .with_provider_resolver(Arc::new(FixedProviderResolver(
        config.providers.active.clone(),
    )));

    Ok(tracker)
}

fn log_ready(tracker: &CliTracker) {
    tracing::debug!(
        categories = ?tracker.categories(),
        enabled = tracker.is_enabled(),
        "Change tracker ready"
    );
}
