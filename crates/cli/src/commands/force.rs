//! Force command - forget stored fingerprints

use anyhow::Result;
use std::path::PathBuf;

use crate::args::ForceArgs;
use crate::config::AppConfig;
use crate::tracker::build_tracker_for_repair;

pub async fn execute(args: ForceArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let mut tracker = build_tracker_for_repair(&config).await?;

    match args.category {
        Some(category) if !args.all => {
            tracker.force_regenerate_category(&category).await?;
            println!("Category '{}' will regenerate on the next pass", category);
        }
        _ => {
            tracker.force_regenerate_all().await;
            println!("All categories will regenerate on the next pass");
        }
    }

    Ok(())
}
