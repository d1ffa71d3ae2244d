//! Engine RUL Forecasting Pipeline
//!
//! Wires telemetry loading, feature construction, per-engine degradation
//! trends and fleet-wide model training into one batch run, then persists
//! the trained models and writes the training report and JSON results.

mod settings;
mod output;
mod runner;

pub use settings::{DataConfig, LogFormat, OutputConfig, PipelineConfig, TrendConfig, ENV_PREFIX};
pub use output::{
    training_report_text, EngineTrace, ForecastSummary, ModelFailure, ModelResult,
    PipelineOutput,
};
pub use runner::Pipeline;

use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Telemetry load failed: {0}")]
    Load(#[from] telemetry_loader::LoaderError),
    #[error("Feature construction failed: {0}")]
    Features(#[from] feature_engine::FeatureError),
    #[error("Health indicator column not found: {0}")]
    UnknownIndicator(String),
    #[error("Prediction trace failed: {0}")]
    Trace(#[from] fleet_trainer::TrainingError),
    #[error("Model store error: {0}")]
    Store(#[from] model_store::StoreError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Initialize logging at the given level (trace, debug, info, warn, error).
/// Unrecognized levels fall back to info.
pub fn init_logging(
    level: &str,
    format: LogFormat,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let max_level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_target(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}
