//! Regenerate command - run a regeneration pass

use anyhow::Result;
use std::path::PathBuf;

use crate::args::RegenerateArgs;
use crate::config::AppConfig;
use crate::tracker::build_tracker;

pub async fn execute(args: RegenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let mut tracker = build_tracker(&config).await?;

    tracing::info!(requested = ?args.categories, "Starting regeneration pass");

    let plan = tracker.regenerate_changed(&args.categories).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", plan.message);
    if !plan.regenerated.is_empty() {
        println!();
        println!("Regenerate: {}", plan.regenerated.join(", "));
        println!("Skip:       {}", plan.skipped.join(", "));
    }

    Ok(())
}
