//! asset-regen domain crate
//!
//! This crate contains the change-detection core following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `fingerprint`: Canonical serialization and hash providers
//! - `estimate`: Cost, time and cache-savings estimation
//! - `usecases`: The change tracker

pub mod estimate;
pub mod fingerprint;
pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
