//! CLI argument definitions

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// asset-regen: decide which generated asset categories are stale and need regenerating
#[derive(Parser, Debug)]
#[command(name = "asset-regen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show tracker status and stored fingerprints
    Status(OutputArgs),

    /// Report which categories changed since they were last regenerated
    Detect(OutputArgs),

    /// Regenerate changed categories and record their new fingerprints
    Regenerate(RegenerateArgs),

    /// Estimate cost and time of regenerating the changed categories
    Estimate(OutputArgs),

    /// Forget stored fingerprints so categories regenerate on the next pass
    Force(ForceArgs),

    /// Clear all tracker state and persisted fingerprints
    Reset,

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RegenerateArgs {
    /// Regenerate this category even if unchanged (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["all", "category"])))]
pub struct ForceArgs {
    /// Force every category
    #[arg(long)]
    pub all: bool,

    /// Force a single category
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./asset-regen.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
