//! Reset command - clear all tracker state

use anyhow::Result;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::tracker::build_tracker_for_repair;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let mut tracker = build_tracker_for_repair(&config).await?;

    tracker.reset().await;
    println!("Tracker state cleared");

    Ok(())
}
