//! Generation settings loaded from a TOML file
//!
//! ```toml
//! [global_style]
//! master_prompt = "flat vector mascot"
//!
//! [style_engine]
//! master_style_prompt = "bold outlines"
//! negative_prompt = "blurry, watermark"
//! templates = { eyes = "{style} eyes, {seed}" }
//! negative_terms = { eyes = ["closed eyes"] }
//!
//! [categories.eyes]
//! trait_count = 12
//! generation_mode = "ai"
//! mode_options = { steps = 30 }
//! ```

use asset_regen_domain::{
    CategoryConfig, ConfigurationProvider, GlobalStyleSettings, StyleEngineSettings,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StyleEngineFile {
    master_style_prompt: String,
    active_preset: Option<String>,
    negative_prompt: String,
    templates: BTreeMap<String, String>,
    negative_terms: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    global_style: Option<GlobalStyleSettings>,
    style_engine: Option<StyleEngineFile>,
    categories: BTreeMap<String, CategoryConfig>,
}

/// Configuration provider backed by a generation-settings TOML file
#[derive(Debug, Clone, Default)]
pub struct TomlConfigurationProvider {
    settings: SettingsFile,
}

impl TomlConfigurationProvider {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, SettingsError> {
        let settings = toml::from_str(content).map_err(|e| SettingsError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { settings })
    }

    /// Load settings from a file. A missing file yields an empty provider.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Generation settings not found, every category uses defaults"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let provider = Self::from_toml(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            categories = provider.settings.categories.len(),
            "Loaded generation settings"
        );
        Ok(provider)
    }

    /// Categories that have an explicit configuration
    pub fn configured_categories(&self) -> Vec<&str> {
        self.settings.categories.keys().map(String::as_str).collect()
    }
}

/// Base negative prompt followed by the category's extra terms
fn category_negative_prompt(style: &StyleEngineFile, category: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !style.negative_prompt.trim().is_empty() {
        parts.push(style.negative_prompt.trim());
    }
    if let Some(terms) = style.negative_terms.get(category) {
        parts.extend(terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()));
    }
    parts.join(", ")
}

#[async_trait]
impl ConfigurationProvider for TomlConfigurationProvider {
    async fn category_config(&self, category: &str) -> Option<CategoryConfig> {
        self.settings.categories.get(category).cloned()
    }

    async fn global_style_settings(&self) -> Option<GlobalStyleSettings> {
        self.settings.global_style.clone()
    }

    async fn style_engine_settings(&self, category: &str) -> Option<StyleEngineSettings> {
        let style = self.settings.style_engine.as_ref()?;
        Some(StyleEngineSettings {
            master_style_prompt: style.master_style_prompt.clone(),
            active_preset: style.active_preset.clone(),
            category_template: style.templates.get(category).cloned(),
            negative_prompt: category_negative_prompt(style, category),
        })
    }
}
