//! Subcommand implementations

pub mod config;
pub mod detect;
pub mod estimate;
pub mod force;
pub mod regenerate;
pub mod reset;
pub mod status;
