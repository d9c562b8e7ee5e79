//! Configuration loading and management

use anyhow::{Context, Result};
use asset_regen_adapters::store::StoreBackend;
use asset_regen_domain::{
    DEFAULT_CATEGORIES,
    estimate::{CostTable, ProviderCost, TimeTable},
    usecases::TrackerConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Generation settings read by the configuration provider
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    #[serde(default)]
    pub store_backend: StoreBackend,

    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_fallback_state_path")]
    pub fallback_state_path: PathBuf,

    /// Root of the generated asset cache, one directory per category
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Append tracker events to this JSONL file
    #[serde(default)]
    pub events_path: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default)]
    pub change_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_active_provider")]
    pub active: String,

    #[serde(default = "default_costs")]
    pub costs: Vec<ProviderCost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_procedural_secs")]
    pub procedural_secs_per_trait: f64,

    #[serde(default = "default_ai_secs")]
    pub ai_secs_per_trait: f64,

    #[serde(default = "default_hybrid_secs")]
    pub hybrid_secs_per_trait: f64,
}

// Default value functions
fn default_settings_path() -> PathBuf {
    PathBuf::from("./generation.toml")
}

fn default_state_db_path() -> PathBuf {
    PathBuf::from("./.asset-regen/fingerprints.sqlite")
}

fn default_fallback_state_path() -> PathBuf {
    PathBuf::from("./.asset-regen/fingerprints.json")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_active_provider() -> String {
    "gemini".to_string()
}

fn default_costs() -> Vec<ProviderCost> {
    CostTable::default().entries().to_vec()
}

fn default_procedural_secs() -> f64 {
    TimeTable::default().procedural
}

fn default_ai_secs() -> f64 {
    TimeTable::default().ai
}

fn default_hybrid_secs() -> f64 {
    TimeTable::default().hybrid
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            store_backend: StoreBackend::default(),
            state_db_path: default_state_db_path(),
            fallback_state_path: default_fallback_state_path(),
            cache_dir: default_cache_dir(),
            events_path: None,
            log_level: default_log_level(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            categories: default_categories(),
            change_threshold: 0.0,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            active: default_active_provider(),
            costs: default_costs(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            procedural_secs_per_trait: default_procedural_secs(),
            ai_secs_per_trait: default_ai_secs(),
            hybrid_secs_per_trait: default_hybrid_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./asset-regen.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("ASSET_REGEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Log level from the config file, if one can be loaded.
    ///
    /// Load errors are left for the command to report once logging is up.
    pub fn configured_log_level(config_path: Option<&Path>) -> Option<String> {
        Self::load(config_path).ok().map(|c| c.general.log_level)
    }

    /// Tracker settings derived from this configuration
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            categories: self.tracking.categories.clone(),
            enabled: self.tracking.enabled,
            change_threshold: self.tracking.change_threshold,
            cost_table: CostTable::new(self.providers.costs.clone()),
            time_table: TimeTable {
                procedural: self.timing.procedural_secs_per_trait,
                ai: self.timing.ai_secs_per_trait,
                hybrid: self.timing.hybrid_secs_per_trait,
            },
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# asset-regen configuration

[general]
settings_path = "./generation.toml"
store_backend = "auto"  # auto, sqlite, file, memory
state_db_path = "./.asset-regen/fingerprints.sqlite"
fallback_state_path = "./.asset-regen/fingerprints.json"
cache_dir = "./assets"
# events_path = "./.asset-regen/events.jsonl"
log_level = "info"

[tracking]
enabled = true
categories = ["background", "body", "eyes", "mouth", "hat"]
# Reserved; detection compares fingerprints for equality only
change_threshold = 0.0

[providers]
active = "gemini"

[[providers.costs]]
name = "gemini"
per_image = 0.039

[[providers.costs]]
name = "openai"
per_image = 0.080

[[providers.costs]]
name = "stability"
per_image = 0.050

[timing]
procedural_secs_per_trait = 0.1
ai_secs_per_trait = 3.0
hybrid_secs_per_trait = 3.0
"#
        .to_string()
    }
}
