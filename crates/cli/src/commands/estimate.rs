//! Estimate command - cost and time of regenerating changed categories

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use asset_regen_domain::{
    ChangeReport,
    estimate::{CacheSavings, CostEstimate, TimeEstimate},
};

use crate::args::OutputArgs;
use crate::config::AppConfig;
use crate::tracker::build_tracker;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateReport {
    changed: Vec<String>,
    cost: CostEstimate,
    time: TimeEstimate,
    cache_savings: CacheSavings,
}

pub async fn execute(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let tracker = build_tracker(&config).await?;

    let report = tracker.detect_changes().await?;
    let changed = tracker.changed_categories(&report).await;

    let estimate = EstimateReport {
        changed: changed.iter().map(|c| c.category.clone()).collect(),
        cost: tracker.estimate_regeneration_cost(&changed),
        time: tracker.estimate_regeneration_time(&changed),
        cache_savings: tracker.estimate_cache_savings(&changed).await,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        print_estimate(&report, &estimate);
    }

    Ok(())
}

fn print_estimate(report: &ChangeReport, estimate: &EstimateReport) {
    if estimate.changed.is_empty() {
        println!("No configuration changes detected");
        return;
    }

    println!(
        "{} of {} categories need regeneration",
        estimate.changed.len(),
        report.categories.len()
    );
    println!();

    for (cost, time) in estimate.cost.breakdown.iter().zip(&estimate.time.breakdown) {
        println!(
            "  {:<12} {:<10} {:>4} traits  ${:.3}  {:.1}s",
            cost.category, cost.mode, cost.trait_count, cost.cost, time.seconds
        );
    }

    println!();
    println!(
        "Total cost: ${:.3} ({})",
        estimate.cost.total, estimate.cost.provider
    );
    println!("Total time: {}", estimate.time.formatted);

    let savings = &estimate.cache_savings;
    if savings.reusable_assets > 0 {
        println!(
            "Cache could reuse {} assets, saving ${:.3} and {:.1}s",
            savings.reusable_assets, savings.cost_saved, savings.time_saved_seconds
        );
    }
}
