//! Feature Engineering Engine
//!
//! Builds per-engine features over grouped telemetry: trailing rolling means,
//! first differences and run-to-failure RUL labels. Every transform works
//! per engine on cycle-sorted data and never looks at future cycles.

mod features;
mod grouping;
mod statistics;
mod transforms;

pub use features::{FeatureBuilder, FeatureConfig, FeatureRow, FeatureTable};
pub use grouping::EngineGroups;
pub use statistics::{centered_rolling_mean, diff, trailing_rolling_mean};
pub use transforms::{compute_rul, first_difference, rolling_mean};

use thiserror::Error;

/// Errors during feature construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Unknown sensor channel {0}: expected 1..=21")]
    UnknownChannel(usize),
    #[error("Rolling window must be at least 1, got {0}")]
    InvalidWindow(usize),
}
