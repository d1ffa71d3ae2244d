//! Fleet RUL Trainer
//!
//! Trains tree-ensemble regressors that map per-cycle sensor features to
//! remaining useful life across the whole fleet. Evaluation uses K-fold
//! cross-validation grouped by engine so no engine is seen on both sides
//! of a split.

mod cv;
mod ensemble;
mod metrics;
mod trainer;
mod tree;

pub use cv::{Fold, GroupKFold};
pub use ensemble::{
    BaggedTrees, BaggingParams, BoostingParams, FleetModel, GradientBoostedTrees, ModelKind,
    ModelSpec,
};
pub use metrics::rmse;
pub use trainer::{
    prediction_trace, CvSummary, FleetTrainer, TracePoint, TrainedModel, TrainingConfig,
    TrainingDataset, TrainingFailure, TrainingReport,
};
pub use tree::{RegressionTree, TreeParams};

use thiserror::Error;

/// Columns that identify a row and never feed a model
pub const EXCLUDED_COLUMNS: [&str; 3] = ["engine_id", "cycle", "rul"];

/// Errors during fleet model training and prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("Feature column missing from table: {0}")]
    MissingFeature(String),
    #[error("Column {0} identifies rows and cannot be used as a feature")]
    ExcludedFeature(String),
    #[error("Empty training data")]
    EmptyData,
    #[error("Not enough engines for grouped CV: {groups} groups, {splits} splits")]
    NotEnoughGroups { groups: usize, splits: usize },
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    #[error("Engine {0} not found in feature table")]
    UnknownEngine(u32),
}
