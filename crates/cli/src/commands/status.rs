//! Status command - show tracker state

use anyhow::Result;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;

use crate::args::OutputArgs;
use crate::config::AppConfig;
use crate::tracker::build_tracker;

pub async fn execute(args: OutputArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let tracker = build_tracker(&config).await?;
    let status = tracker.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("asset-regen Status");
    println!("==================");
    println!();
    println!("Enabled: {}", if status.enabled { "yes" } else { "no" });
    println!("Change threshold: {}", status.change_threshold);
    match status.last_generation_time {
        Some(at) => println!("Last generation: {}", at.format(&Rfc3339)?),
        None => println!("Last generation: never (this session)"),
    }
    println!();
    println!("Stored fingerprints:");
    for category in &status.categories {
        match status.stored_hashes.get(category) {
            Some(fingerprint) => println!("  {:<12} {}", category, fingerprint),
            None => println!("  {:<12} (none)", category),
        }
    }

    Ok(())
}
