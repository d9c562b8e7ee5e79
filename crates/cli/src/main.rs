//! asset-regen CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;
mod tracker;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging: RUST_LOG, then --log-level, then the config file
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config::AppConfig::configured_log_level(cli.config.as_deref()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Status(args) => commands::status::execute(args, cli.config).await,
        Commands::Detect(args) => commands::detect::execute(args, cli.config).await,
        Commands::Regenerate(args) => commands::regenerate::execute(args, cli.config).await,
        Commands::Estimate(args) => commands::estimate::execute(args, cli.config).await,
        Commands::Force(args) => commands::force::execute(args, cli.config).await,
        Commands::Reset => commands::reset::execute(cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
