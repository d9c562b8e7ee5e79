//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

/// Categories tracked when a deployment does not configure its own list
pub const DEFAULT_CATEGORIES: [&str; 5] = ["background", "body", "eyes", "mouth", "hat"];

/// How a category's assets are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Generated locally from parameters
    #[default]
    Procedural,
    /// Generated by an external image service
    Ai,
    /// Procedural base refined by an external service
    Hybrid,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Procedural => "procedural",
            GenerationMode::Ai => "ai",
            GenerationMode::Hybrid => "hybrid",
        }
    }

    /// Whether generation in this mode calls a paid provider
    pub fn is_billed(&self) -> bool {
        !matches!(self, GenerationMode::Procedural)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-category generation parameters, as supplied by the configuration provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Number of trait variants to generate
    #[serde(default)]
    pub trait_count: u32,
    /// Complexity scale
    #[serde(default)]
    pub complexity: f64,
    /// Seed driving the color scheme
    #[serde(default)]
    pub color_seed: String,
    /// Generation mode
    #[serde(default)]
    pub generation_mode: GenerationMode,
    /// Provider-specific options, opaque to the tracker
    #[serde(default)]
    pub mode_options: BTreeMap<String, serde_json::Value>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            trait_count: 0,
            complexity: 0.0,
            color_seed: String::new(),
            generation_mode: GenerationMode::Procedural,
            mode_options: BTreeMap::new(),
        }
    }
}

/// Global style settings shared by every category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStyleSettings {
    pub master_prompt: String,
    pub negative_prompt: String,
    pub active_preset: Option<String>,
    pub lock_color_palette: bool,
    pub locked_colors: Vec<String>,
    pub use_master_seed: bool,
    pub master_seed: Option<u64>,
    pub ai_generation_enabled: bool,
}

/// Style-engine settings, already narrowed to a single category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleEngineSettings {
    pub master_style_prompt: String,
    pub active_preset: Option<String>,
    /// Prompt template specific to the category
    pub category_template: Option<String>,
    /// Negative prompt computed for the category
    pub negative_prompt: String,
}

/// Lowercase hex digest of a canonicalized category configuration.
///
/// Fingerprints produced by the fallback hasher are base-36 instead; they
/// only ever compare equal to fingerprints from the same hasher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted fingerprint of a category at the time it was last regenerated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub category: String,
    pub fingerprint: Fingerprint,
    #[serde(with = "time::serde::rfc3339")]
    pub stored_at: OffsetDateTime,
}

/// Change state of a single category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChange {
    pub category: String,
    pub current_fingerprint: Fingerprint,
    pub stored_fingerprint: Option<Fingerprint>,
    pub has_changed: bool,
    pub is_new: bool,
}

/// Result of comparing every category against its stored fingerprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub categories: Vec<CategoryChange>,
    pub changed_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        self.changed_count > 0
    }

    /// Names of categories whose fingerprint differs from the stored one
    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(|c| c.has_changed)
            .map(|c| c.category.as_str())
    }

    pub fn get(&self, category: &str) -> Option<&CategoryChange> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Outcome of a regeneration pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationPlan {
    pub regenerated: Vec<String>,
    pub skipped: Vec<String>,
    pub message: String,
    pub report: ChangeReport,
}

/// Why a category was regenerated or skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationReason {
    ConfigChanged,
    Forced,
    NoChanges,
}

impl RegenerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationReason::ConfigChanged => "config_changed",
            RegenerationReason::Forced => "forced",
            RegenerationReason::NoChanges => "no_changes",
        }
    }
}

impl fmt::Display for RegenerationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted by the tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum RegenerationEvent {
    #[serde(rename = "regeneration:categoryStarted")]
    CategoryStarted {
        category: String,
        reason: RegenerationReason,
        fingerprint: Fingerprint,
    },
    #[serde(rename = "regeneration:skipped")]
    Skipped {
        category: String,
        reason: RegenerationReason,
    },
    #[serde(rename = "regeneration:enabledChanged")]
    EnabledChanged { enabled: bool },
    #[serde(rename = "regeneration:forceAll")]
    ForceAll,
    #[serde(rename = "regeneration:forceCategory")]
    ForceCategory { category: String },
}

impl RegenerationEvent {
    /// Stable wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            RegenerationEvent::CategoryStarted { .. } => "regeneration:categoryStarted",
            RegenerationEvent::Skipped { .. } => "regeneration:skipped",
            RegenerationEvent::EnabledChanged { .. } => "regeneration:enabledChanged",
            RegenerationEvent::ForceAll => "regeneration:forceAll",
            RegenerationEvent::ForceCategory { .. } => "regeneration:forceCategory",
        }
    }
}

/// A changed category together with the configuration it will be regenerated from
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedCategory {
    pub category: String,
    pub config: CategoryConfig,
}

/// Snapshot of tracker state for status reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStatus {
    pub enabled: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_generation_time: Option<OffsetDateTime>,
    pub stored_hashes: BTreeMap<String, Fingerprint>,
    pub change_threshold: f64,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_wire_name() {
        let event = RegenerationEvent::CategoryStarted {
            category: "eyes".to_string(),
            reason: RegenerationReason::ConfigChanged,
            fingerprint: Fingerprint::new("abc"),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], event.name());
        assert_eq!(value["category"], "eyes");
        assert_eq!(value["reason"], "config_changed");
        assert_eq!(value["fingerprint"], "abc");

        let value = serde_json::to_value(RegenerationEvent::ForceAll).unwrap();
        assert_eq!(value["event"], "regeneration:forceAll");
    }

    #[test]
    fn generation_mode_parses_snake_case() {
        let config: CategoryConfig =
            serde_json::from_str(r#"{"trait_count": 3, "generation_mode": "hybrid"}"#).unwrap();
        assert_eq!(config.generation_mode, GenerationMode::Hybrid);
        assert!(config.generation_mode.is_billed());
        assert!(!GenerationMode::Procedural.is_billed());
        assert_eq!(config.complexity, 0.0);
    }
}
