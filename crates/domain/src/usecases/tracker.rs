//! Change tracker use case - decides which categories must be regenerated

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use time::OffsetDateTime;

use crate::{
    estimate::{self, CacheSavings, CostEstimate, CostTable, TimeEstimate, TimeTable},
    fingerprint::{HashStrategy, canonical_input},
    model::{
        CategoryChange, CategoryConfig, ChangeReport, ChangedCategory, DEFAULT_CATEGORIES,
        Fingerprint, FingerprintRecord, RegenerationEvent, RegenerationPlan, RegenerationReason,
        TrackerStatus,
    },
    ports::{
        ActiveProviderResolver, CacheSizeOracle, Clock, ConfigurationProvider, EmptyCacheOracle,
        EventSink, FingerprintStore, FixedProviderResolver, StoreError,
    },
};

/// Message attached to plans that regenerated nothing
pub const NO_CHANGES_MESSAGE: &str = "No configuration changes detected";

/// Configuration for the change tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Categories tracked by this deployment
    pub categories: Vec<String>,
    /// Whether change tracking starts enabled
    pub enabled: bool,
    /// Reserved; clamped to [0, 1] but never consulted by detection
    pub change_threshold: f64,
    /// Provider price list used for cost estimates
    pub cost_table: CostTable,
    /// Per-mode generation speed used for time estimates
    pub time_table: TimeTable,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            enabled: true,
            change_threshold: 0.0,
            cost_table: CostTable::default(),
            time_table: TimeTable::default(),
        }
    }
}

/// Errors from the change tracker
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Fingerprint store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Corrupt fingerprint record: {0}")]
    CorruptRecord(String),
    #[error("Fingerprint hashing failed: {0}")]
    HashFailure(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

impl From<StoreError> for TrackerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Corrupt(msg) => TrackerError::CorruptRecord(msg),
            other => TrackerError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Content-addressed change tracker.
///
/// Holds one fingerprint per category in memory and mirrors it to a
/// [`FingerprintStore`]. The in-memory mapping is authoritative for the life
/// of the process; persistence failures are logged and never abort a pass.
///
/// Mutating operations take `&mut self`. Callers sharing a tracker must
/// serialize access themselves.
pub struct ChangeTracker<P, S, E, Cl>
where
    P: ConfigurationProvider + ?Sized,
    S: FingerprintStore + ?Sized,
    E: EventSink + ?Sized,
    Cl: Clock + ?Sized,
{
    provider: Arc<P>,
    store: Arc<S>,
    events: Arc<E>,
    clock: Arc<Cl>,
    hasher: HashStrategy,
    cache_oracle: Arc<dyn CacheSizeOracle>,
    provider_resolver: Arc<dyn ActiveProviderResolver>,
    config: TrackerConfig,
    stored: BTreeMap<String, Fingerprint>,
    last_generation_time: Option<OffsetDateTime>,
}

impl<P, S, E, Cl> ChangeTracker<P, S, E, Cl>
where
    P: ConfigurationProvider + ?Sized,
    S: FingerprintStore + ?Sized,
    E: EventSink + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        provider: Arc<P>,
        store: Arc<S>,
        events: Arc<E>,
        clock: Arc<Cl>,
        mut config: TrackerConfig,
    ) -> Self {
        let mut seen = HashSet::new();
        config.categories.retain(|c| seen.insert(c.clone()));
        config.change_threshold = clamp_threshold(config.change_threshold).unwrap_or(0.0);

        let default_provider = config
            .cost_table
            .entries()
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_default();

        Self {
            provider,
            store,
            events,
            clock,
            hasher: HashStrategy::default(),
            cache_oracle: Arc::new(EmptyCacheOracle),
            provider_resolver: Arc::new(FixedProviderResolver(default_provider)),
            config,
            stored: BTreeMap::new(),
            last_generation_time: None,
        }
    }

    pub fn with_hasher(mut self, hasher: HashStrategy) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_cache_oracle(mut self, oracle: Arc<dyn CacheSizeOracle>) -> Self {
        self.cache_oracle = oracle;
        self
    }

    pub fn with_provider_resolver(mut self, resolver: Arc<dyn ActiveProviderResolver>) -> Self {
        self.provider_resolver = resolver;
        self
    }

    /// Load stored fingerprints.
    ///
    /// An unreachable store leaves the tracker usable with an empty mapping,
    /// so every category is treated as new. Malformed records are returned as
    /// [`TrackerError::CorruptRecord`].
    pub async fn initialize(&mut self) -> Result<(), TrackerError> {
        self.stored.clear();

        let records = match self.store.load_all().await {
            Ok(records) => records,
            Err(StoreError::Corrupt(msg)) => return Err(TrackerError::CorruptRecord(msg)),
            Err(e) => {
                tracing::warn!(
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to load stored fingerprints, treating every category as new"
                );
                return Ok(());
            }
        };

        for (category, record) in records {
            if self.is_known(&category) {
                self.stored.insert(category, record.fingerprint);
            } else {
                tracing::debug!(category = %category, "Ignoring fingerprint for unknown category");
            }
        }

        tracing::info!(
            backend = self.store.backend(),
            loaded = self.stored.len(),
            "Loaded stored fingerprints"
        );

        Ok(())
    }

    /// Compute the fingerprint of a category, fetching its configuration
    /// from the provider when none is given
    pub async fn compute_fingerprint(
        &self,
        category: &str,
        config: Option<&CategoryConfig>,
    ) -> Result<Fingerprint, TrackerError> {
        let fetched;
        let config = match config {
            Some(config) => config,
            None => {
                fetched = self
                    .provider
                    .category_config(category)
                    .await
                    .unwrap_or_default();
                &fetched
            }
        };

        let global_style = self
            .provider
            .global_style_settings()
            .await
            .unwrap_or_default();
        let style_engine = self
            .provider
            .style_engine_settings(category)
            .await
            .unwrap_or_default();

        let input = canonical_input(config, &global_style, &style_engine)
            .map_err(|e| TrackerError::HashFailure(e.to_string()))?;

        self.hasher
            .digest(input.as_bytes())
            .map_err(|e| TrackerError::HashFailure(e.to_string()))
    }

    /// Whether a single category's configuration differs from its stored fingerprint
    pub async fn has_config_changed(&self, category: &str) -> Result<bool, TrackerError> {
        self.ensure_known(category)?;
        if !self.config.enabled {
            return Ok(false);
        }
        Ok(self.category_change(category).await?.has_changed)
    }

    /// Compare every category against its stored fingerprint. Never writes the store.
    pub async fn detect_changes(&self) -> Result<ChangeReport, TrackerError> {
        let timestamp = self.clock.now();

        if !self.config.enabled {
            return Ok(ChangeReport {
                categories: vec![],
                changed_count: 0,
                timestamp,
            });
        }

        let mut categories = Vec::with_capacity(self.config.categories.len());
        for category in &self.config.categories {
            categories.push(self.category_change(category).await?);
        }

        let changed_count = categories.iter().filter(|c| c.has_changed).count();

        tracing::debug!(
            categories = categories.len(),
            changed = changed_count,
            "Detected configuration changes"
        );

        Ok(ChangeReport {
            categories,
            changed_count,
            timestamp,
        })
    }

    /// Regenerate every changed category plus any explicitly requested ones.
    ///
    /// With nothing requested and nothing changed this returns immediately
    /// without writing the store or emitting events.
    pub async fn regenerate_changed(
        &mut self,
        requested: &[String],
    ) -> Result<RegenerationPlan, TrackerError> {
        let report = self.detect_changes().await?;

        let requested: Vec<&String> = requested
            .iter()
            .filter(|category| {
                let known = self.is_known(category);
                if !known {
                    tracing::warn!(category = %category, "Ignoring regeneration request for unknown category");
                }
                known
            })
            .collect();

        if requested.is_empty() && !report.has_changes() {
            tracing::info!("{}", NO_CHANGES_MESSAGE);
            return Ok(RegenerationPlan {
                regenerated: vec![],
                skipped: self.config.categories.clone(),
                message: NO_CHANGES_MESSAGE.to_string(),
                report,
            });
        }

        let now = self.clock.now();
        let categories = self.config.categories.clone();
        let mut regenerated = Vec::new();
        let mut skipped = Vec::new();
        let mut records = Vec::new();
        let mut events = Vec::new();

        for category in categories {
            let change = report.get(&category);
            let changed = change.is_some_and(|c| c.has_changed);
            let forced = requested.iter().any(|r| **r == category);

            if !changed && !forced {
                events.push(RegenerationEvent::Skipped {
                    category: category.clone(),
                    reason: RegenerationReason::NoChanges,
                });
                skipped.push(category);
                continue;
            }

            let fingerprint = match change {
                Some(c) => c.current_fingerprint.clone(),
                None => self.compute_fingerprint(&category, None).await?,
            };
            let reason = if changed {
                RegenerationReason::ConfigChanged
            } else {
                RegenerationReason::Forced
            };

            records.push(FingerprintRecord {
                category: category.clone(),
                fingerprint: fingerprint.clone(),
                stored_at: now,
            });
            events.push(RegenerationEvent::CategoryStarted {
                category: category.clone(),
                reason,
                fingerprint,
            });
            regenerated.push(category);
        }

        for record in &records {
            self.stored
                .insert(record.category.clone(), record.fingerprint.clone());
        }

        if !records.is_empty() {
            if let Err(e) = self.store.upsert_many(&records).await {
                tracing::error!(
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to persist fingerprints, keeping in-memory state"
                );
            }
        }

        for event in &events {
            self.events.emit(event);
        }

        self.last_generation_time = Some(now);

        tracing::info!(
            regenerated = ?regenerated,
            skipped = skipped.len(),
            "Regeneration pass complete"
        );

        Ok(RegenerationPlan {
            message: format!("Regenerated {} categories", regenerated.len()),
            regenerated,
            skipped,
            report,
        })
    }

    /// Forget every stored fingerprint so the next pass treats all categories as new
    pub async fn force_regenerate_all(&mut self) {
        self.stored.clear();
        if let Err(e) = self.store.clear().await {
            tracing::error!(backend = self.store.backend(), error = %e, "Failed to clear fingerprint store");
        }

        tracing::info!("Forced regeneration of all categories");
        self.events.emit(&RegenerationEvent::ForceAll);
    }

    /// Forget a single category's fingerprint
    pub async fn force_regenerate_category(&mut self, category: &str) -> Result<(), TrackerError> {
        self.ensure_known(category)?;

        self.stored.remove(category);
        if let Err(e) = self.store.remove(category).await {
            tracing::error!(
                backend = self.store.backend(),
                category = %category,
                error = %e,
                "Failed to remove stored fingerprint"
            );
        }

        tracing::info!(category = %category, "Forced regeneration of category");
        self.events.emit(&RegenerationEvent::ForceCategory {
            category: category.to_string(),
        });
        Ok(())
    }

    /// Build estimation descriptors for the changed categories of a report
    pub async fn changed_categories(&self, report: &ChangeReport) -> Vec<ChangedCategory> {
        let mut changed = Vec::new();
        for category in report.changed() {
            let config = self
                .provider
                .category_config(category)
                .await
                .unwrap_or_default();
            changed.push(ChangedCategory {
                category: category.to_string(),
                config,
            });
        }
        changed
    }

    pub fn estimate_regeneration_cost(&self, changed: &[ChangedCategory]) -> CostEstimate {
        let provider = self.provider_resolver.active_provider_name();
        estimate::estimate_cost(changed, &provider, &self.config.cost_table)
    }

    pub fn estimate_regeneration_time(&self, changed: &[ChangedCategory]) -> TimeEstimate {
        estimate::estimate_time(changed, &self.config.time_table)
    }

    pub async fn estimate_cache_savings(&self, changed: &[ChangedCategory]) -> CacheSavings {
        let provider = self.provider_resolver.active_provider_name();
        estimate::estimate_cache_savings(
            changed,
            self.cache_oracle.as_ref(),
            &provider,
            &self.config.cost_table,
            &self.config.time_table,
        )
        .await
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        tracing::info!(enabled, "Change tracking toggled");
        self.events
            .emit(&RegenerationEvent::EnabledChanged { enabled });
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Store the change threshold, clamped to [0, 1]. NaN is ignored.
    pub fn set_change_threshold(&mut self, threshold: f64) {
        match clamp_threshold(threshold) {
            Some(value) => self.config.change_threshold = value,
            None => tracing::warn!("Ignoring NaN change threshold"),
        }
    }

    pub fn change_threshold(&self) -> f64 {
        self.config.change_threshold
    }

    pub fn categories(&self) -> &[String] {
        &self.config.categories
    }

    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            enabled: self.config.enabled,
            last_generation_time: self.last_generation_time,
            stored_hashes: self.stored.clone(),
            change_threshold: self.config.change_threshold,
            categories: self.config.categories.clone(),
        }
    }

    /// Clear stored fingerprints, persisted records and the last generation time
    pub async fn reset(&mut self) {
        self.stored.clear();
        self.last_generation_time = None;
        if let Err(e) = self.store.clear().await {
            tracing::error!(backend = self.store.backend(), error = %e, "Failed to clear fingerprint store");
        }
        tracing::info!("Change tracker reset");
    }

    async fn category_change(&self, category: &str) -> Result<CategoryChange, TrackerError> {
        let current = self.compute_fingerprint(category, None).await?;
        let stored = self.stored.get(category).cloned();

        Ok(CategoryChange {
            category: category.to_string(),
            has_changed: stored.as_ref() != Some(&current),
            is_new: stored.is_none(),
            current_fingerprint: current,
            stored_fingerprint: stored,
        })
    }

    fn is_known(&self, category: &str) -> bool {
        self.config.categories.iter().any(|c| c == category)
    }

    fn ensure_known(&self, category: &str) -> Result<(), TrackerError> {
        if self.is_known(category) {
            Ok(())
        } else {
            Err(TrackerError::UnknownCategory(category.to_string()))
        }
    }
}

fn clamp_threshold(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value.clamp(0.0, 1.0))
    }
}
