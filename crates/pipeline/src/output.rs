//! Output Contract and Training Report

use chrono::{DateTime, Utc};
use fleet_trainer::{TracePoint, TrainingReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use trend_forecaster::{EconomicValue, EngineForecast};

/// Trend projection for one engine as written to the results file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub slope: f64,
    pub intercept: f64,
    pub preventive_cycles: f64,
    pub predictive_cycles: f64,
    pub cycles_unlocked: f64,
    pub degenerate: bool,
}

impl From<&EngineForecast> for ForecastSummary {
    fn from(f: &EngineForecast) -> Self {
        Self {
            slope: f.slope,
            intercept: f.intercept,
            preventive_cycles: f.preventive_cycles,
            predictive_cycles: f.predictive_cycles,
            cycles_unlocked: f.cycles_unlocked(),
            degenerate: f.degenerate,
        }
    }
}

/// Evaluation of one trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub name: String,
    pub kind: String,
    pub cv_rmse: f64,
    pub fold_rmse: Vec<f64>,
    pub train_rmse: f64,
    pub feature_count: usize,
    pub model_path: PathBuf,
}

/// A model that did not train
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFailure {
    pub model: String,
    pub error: String,
}

/// Actual vs predicted RUL for one engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineTrace {
    pub engine_id: u32,
    pub model: String,
    pub points: Vec<TracePoint>,
}

/// Everything a run produces, serialized to the JSON results file.
/// Non-finite numbers are written as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub generated_at: DateTime<Utc>,
    pub data_path: PathBuf,
    pub record_count: usize,
    pub engine_count: usize,
    pub forecasts: BTreeMap<String, ForecastSummary>,
    pub economics: BTreeMap<String, EconomicValue>,
    pub forecast_failures: BTreeMap<String, String>,
    pub models: Vec<ModelResult>,
    pub model_failures: Vec<ModelFailure>,
    pub trace: Option<EngineTrace>,
}

impl PipelineOutput {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Plain-text report: a header line, then one RMSE line per trained model
pub fn training_report_text(report: &TrainingReport) -> String {
    let mut text = String::from("Model Results:\n");
    for trained in &report.trained {
        let _ = writeln!(text, "{} RMSE: {:.2}", trained.name, trained.cv.mean_rmse);
    }
    for failure in &report.failures {
        let _ = writeln!(text, "{} FAILED: {}", failure.model, failure.error);
    }
    text
}
