//! Cost and time estimation for a set of changed categories
//!
//! These are advisory numbers for operators deciding whether to run a
//! regeneration pass. Nothing here touches the fingerprint store.

use serde::{Deserialize, Serialize};

use crate::model::{ChangedCategory, GenerationMode};
use crate::ports::CacheSizeOracle;

/// Per-image price of a generation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCost {
    pub name: String,
    pub per_image: f64,
}

/// Ordered provider price list; the first entry is the default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable(Vec<ProviderCost>);

impl CostTable {
    pub fn new(entries: Vec<ProviderCost>) -> Self {
        Self(entries)
    }

    /// Resolve the per-image cost of a provider, defaulting to the first entry
    pub fn per_image_cost(&self, provider: &str) -> (String, f64) {
        match self.0.iter().find(|p| p.name == provider).or_else(|| self.0.first()) {
            Some(entry) => (entry.name.clone(), entry.per_image),
            None => (provider.to_string(), 0.0),
        }
    }

    pub fn entries(&self) -> &[ProviderCost] {
        &self.0
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self(vec![
            ProviderCost {
                name: "gemini".to_string(),
                per_image: 0.039,
            },
            ProviderCost {
                name: "openai".to_string(),
                per_image: 0.080,
            },
            ProviderCost {
                name: "stability".to_string(),
                per_image: 0.050,
            },
        ])
    }
}

/// Seconds needed to generate one trait in each mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeTable {
    pub procedural: f64,
    pub ai: f64,
    pub hybrid: f64,
}

impl TimeTable {
    pub fn seconds_per_trait(&self, mode: GenerationMode) -> f64 {
        match mode {
            GenerationMode::Procedural => self.procedural,
            GenerationMode::Ai => self.ai,
            GenerationMode::Hybrid => self.hybrid,
        }
    }
}

impl Default for TimeTable {
    fn default() -> Self {
        Self {
            procedural: 0.1,
            ai: 3.0,
            hybrid: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCost {
    pub category: String,
    pub mode: GenerationMode,
    pub trait_count: u32,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    /// Provider the prices were taken from
    pub provider: String,
    pub total: f64,
    pub breakdown: Vec<CategoryCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTime {
    pub category: String,
    pub mode: GenerationMode,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEstimate {
    pub total_seconds: f64,
    pub formatted: String,
    pub breakdown: Vec<CategoryTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySavings {
    pub category: String,
    pub cached: usize,
    pub needed: usize,
    pub reusable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSavings {
    pub reusable_assets: usize,
    pub cost_saved: f64,
    pub time_saved_seconds: f64,
    pub breakdown: Vec<CategorySavings>,
}

/// Cost of regenerating the changed categories with the given provider
pub fn estimate_cost(changed: &[ChangedCategory], provider: &str, table: &CostTable) -> CostEstimate {
    let (provider, per_image) = table.per_image_cost(provider);

    let breakdown: Vec<CategoryCost> = changed
        .iter()
        .map(|c| {
            let mode = c.config.generation_mode;
            let cost = if mode.is_billed() {
                f64::from(c.config.trait_count) * per_image
            } else {
                0.0
            };
            CategoryCost {
                category: c.category.clone(),
                mode,
                trait_count: c.config.trait_count,
                cost,
            }
        })
        .collect();

    let total = breakdown.iter().map(|c| c.cost).sum();

    CostEstimate {
        provider,
        total,
        breakdown,
    }
}

/// Wall-clock time needed to regenerate the changed categories
pub fn estimate_time(changed: &[ChangedCategory], table: &TimeTable) -> TimeEstimate {
    let breakdown: Vec<CategoryTime> = changed
        .iter()
        .map(|c| CategoryTime {
            category: c.category.clone(),
            mode: c.config.generation_mode,
            seconds: f64::from(c.config.trait_count)
                * table.seconds_per_trait(c.config.generation_mode),
        })
        .collect();

    let total_seconds: f64 = breakdown.iter().map(|c| c.seconds).sum();

    TimeEstimate {
        total_seconds,
        formatted: format_duration_ms(total_seconds * 1000.0),
        breakdown,
    }
}

/// Estimate how much of a regeneration the asset cache could absorb
pub async fn estimate_cache_savings(
    changed: &[ChangedCategory],
    oracle: &dyn CacheSizeOracle,
    provider: &str,
    costs: &CostTable,
    times: &TimeTable,
) -> CacheSavings {
    let (_, per_image) = costs.per_image_cost(provider);

    let mut savings = CacheSavings {
        reusable_assets: 0,
        cost_saved: 0.0,
        time_saved_seconds: 0.0,
        breakdown: Vec::with_capacity(changed.len()),
    };

    for c in changed {
        let cached = oracle.count_available(&c.category).await;
        let needed = c.config.trait_count as usize;
        let reusable = cached.min(needed);

        savings.reusable_assets += reusable;
        let mode = c.config.generation_mode;
        if mode.is_billed() {
            savings.cost_saved += reusable as f64 * per_image;
            savings.time_saved_seconds += reusable as f64 * times.seconds_per_trait(mode);
        }

        savings.breakdown.push(CategorySavings {
            category: c.category.clone(),
            cached,
            needed,
            reusable,
        });
    }

    savings
}

/// Render milliseconds as `"<m>m <s>s"`, or `"<s>s"` under a minute
pub fn format_duration_ms(ms: f64) -> String {
    let total_secs = (ms.max(0.0) / 1000.0).round() as u64;
    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else {
        format!("{}s", total_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn changed(category: &str, mode: GenerationMode, traits: u32) -> ChangedCategory {
        ChangedCategory {
            category: category.to_string(),
            config: CategoryConfig {
                trait_count: traits,
                generation_mode: mode,
                ..Default::default()
            },
        }
    }

    struct FakeOracle {
        counts: HashMap<String, usize>,
    }

    #[async_trait]
    impl CacheSizeOracle for FakeOracle {
        async fn count_available(&self, category: &str) -> usize {
            self.counts.get(category).copied().unwrap_or(0)
        }
    }

    #[test]
    fn cost_is_sum_of_billed_categories() {
        let table = CostTable::default();
        let estimate = estimate_cost(
            &[
                changed("background", GenerationMode::Procedural, 10),
                changed("eyes", GenerationMode::Ai, 5),
            ],
            "openai",
            &table,
        );

        assert_eq!(estimate.provider, "openai");
        assert!((estimate.total - 5.0 * 0.080).abs() < 1e-9);
        assert_eq!(estimate.breakdown[0].cost, 0.0);
        assert!((estimate.breakdown[1].cost - 0.4).abs() < 1e-9);
    }

    #[test]
    fn unknown_provider_uses_first_table_entry() {
        let table = CostTable::default();
        let estimate = estimate_cost(
            &[changed("hat", GenerationMode::Hybrid, 2)],
            "nonexistent",
            &table,
        );

        assert_eq!(estimate.provider, "gemini");
        assert!((estimate.total - 2.0 * 0.039).abs() < 1e-9);
    }

    #[test]
    fn empty_cost_table_costs_nothing() {
        let estimate = estimate_cost(
            &[changed("hat", GenerationMode::Ai, 4)],
            "openai",
            &CostTable::new(vec![]),
        );
        assert_eq!(estimate.total, 0.0);
    }

    #[test]
    fn time_uses_per_mode_rate() {
        let estimate = estimate_time(
            &[
                changed("background", GenerationMode::Procedural, 10),
                changed("body", GenerationMode::Ai, 20),
            ],
            &TimeTable::default(),
        );

        assert!((estimate.total_seconds - 61.0).abs() < 1e-9);
        assert_eq!(estimate.formatted, "1m 1s");
        assert_eq!(estimate.breakdown.len(), 2);
    }

    #[test]
    fn formats_short_and_long_durations() {
        assert_eq!(format_duration_ms(0.0), "0s");
        assert_eq!(format_duration_ms(59_400.0), "59s");
        assert_eq!(format_duration_ms(60_000.0), "1m 0s");
        assert_eq!(format_duration_ms(185_000.0), "3m 5s");
    }

    #[tokio::test]
    async fn cache_savings_reuse_is_capped_by_need() {
        let oracle = FakeOracle {
            counts: HashMap::from([
                ("eyes".to_string(), 8),
                ("body".to_string(), 2),
                ("background".to_string(), 50),
            ]),
        };

        let savings = estimate_cache_savings(
            &[
                changed("eyes", GenerationMode::Ai, 5),
                changed("body", GenerationMode::Hybrid, 10),
                changed("background", GenerationMode::Procedural, 10),
            ],
            &oracle,
            "openai",
            &CostTable::default(),
            &TimeTable::default(),
        )
        .await;

        assert_eq!(savings.reusable_assets, 5 + 2 + 10);
        assert!((savings.cost_saved - 7.0 * 0.080).abs() < 1e-9);
        assert!((savings.time_saved_seconds - 21.0).abs() < 1e-9);
        assert_eq!(savings.breakdown[0].reusable, 5);
        assert_eq!(savings.breakdown[1].reusable, 2);
    }
}
