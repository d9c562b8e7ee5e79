//! Detect command - report configuration changes without regenerating

use anyhow::Result;
use asset_regen_domain::ChangeReport;
use std::path::PathBuf;

use crate::args::OutputArgs;
use crate::config::AppConfig;
use crate::tracker::build_tracker;

pub async fn execute(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let tracker = build_tracker(&config).await?;

    let report = tracker.detect_changes().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, tracker.is_enabled());
    }

    Ok(())
}

pub fn print_report(report: &ChangeReport, enabled: bool) {
    if !enabled {
        println!("Change tracking is disabled");
        return;
    }

    println!(
        "{} of {} categories changed",
        report.changed_count,
        report.categories.len()
    );
    println!();

    for change in &report.categories {
        let state = match (change.has_changed, change.is_new) {
            (_, true) => "new",
            (true, false) => "changed",
            (false, false) => "unchanged",
        };
        println!("  {:<12} {:<10} {}", change.category, state, change.current_fingerprint);
    }
}
