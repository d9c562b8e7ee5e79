//! Application use cases / business logic

pub mod tracker;

pub use tracker::{ChangeTracker, NO_CHANGES_MESSAGE, TrackerConfig, TrackerError};
