//! Pipeline Runner

use crate::output::{
    training_report_text, EngineTrace, ForecastSummary, ModelFailure, ModelResult,
    PipelineOutput,
};
use crate::{PipelineConfig, PipelineError};
use chrono::Utc;
use feature_engine::{FeatureBuilder, FeatureTable};
use fleet_trainer::{prediction_trace, FleetTrainer, TrainingReport};
use metrics::{counter, gauge};
use model_store::ModelStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use telemetry_loader::TelemetryLoader;
use tracing::{info, warn};
use trend_forecaster::{FleetForecast, TrendForecaster};

/// One configured batch run
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Load, forecast, train, persist and report
    pub fn run(&self) -> Result<PipelineOutput, PipelineError> {
        self.config.validate()?;
        let started = std::time::Instant::now();

        info!("Loading telemetry from {}", self.config.data.path.display());
        let records = TelemetryLoader::load_path(&self.config.data.path)?;
        let table = FeatureBuilder::new(self.config.features.clone()).build(&records)?;
        let engine_count = table.engine_ids().len();
        gauge!("rul_engines_loaded").set(engine_count as f64);

        let fleet = self.forecast_trends(&table)?;
        let economics = match &self.config.economics {
            Some(model) => fleet
                .forecasts
                .iter()
                .map(|(id, forecast)| (id.clone(), model.evaluate(forecast)))
                .collect(),
            None => BTreeMap::new(),
        };

        let trainer = FleetTrainer::new(self.config.training.clone());
        let report = trainer.train(&table);
        let models = self.persist_models(&report)?;

        write_file(&self.config.output.report_path, &training_report_text(&report))?;
        info!(
            "Training report written to {}",
            self.config.output.report_path.display()
        );

        let trace = self.longest_engine_trace(&report, &table)?;

        let output = PipelineOutput {
            generated_at: Utc::now(),
            data_path: self.config.data.path.clone(),
            record_count: records.len(),
            engine_count,
            forecasts: fleet
                .forecasts
                .iter()
                .map(|(id, f)| (id.clone(), ForecastSummary::from(f)))
                .collect(),
            economics,
            forecast_failures: fleet
                .failures
                .iter()
                .map(|(id, e)| (id.clone(), e.to_string()))
                .collect(),
            models,
            model_failures: report
                .failures
                .iter()
                .map(|f| ModelFailure {
                    model: f.model.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            trace,
        };

        write_file(&self.config.output.results_path, &output.to_json()?)?;
        info!(
            "Pipeline complete in {:.1}s: {} engines forecast, {} models trained",
            started.elapsed().as_secs_f64(),
            output.forecasts.len(),
            output.models.len()
        );
        Ok(output)
    }

    /// Fit a degradation trend per engine on the health indicator column
    fn forecast_trends(&self, table: &FeatureTable) -> Result<FleetForecast, PipelineError> {
        let indicator = &self.config.trend.health_indicator;
        if table.column_index(indicator).is_none() {
            return Err(PipelineError::UnknownIndicator(indicator.clone()));
        }

        let series = table.engine_ids().into_iter().filter_map(|id| {
            table
                .engine_series(id, indicator)
                .map(|points| (id.to_string(), points))
        });

        let forecaster = TrendForecaster::new(self.config.trend.thresholds);
        let fleet = forecaster.forecast_fleet(series, self.config.trend.stress_multiplier);

        let degenerate = fleet.forecasts.values().filter(|f| f.degenerate).count();
        counter!("rul_engines_forecast_total").increment(fleet.forecasts.len() as u64);
        counter!("rul_engine_forecast_failures_total").increment(fleet.failures.len() as u64);
        counter!("rul_degenerate_trends_total").increment(degenerate as u64);
        Ok(fleet)
    }

    /// Save every trained model as `{model_dir}/{name}_model.bin`
    fn persist_models(&self, report: &TrainingReport) -> Result<Vec<ModelResult>, PipelineError> {
        let mut results = Vec::with_capacity(report.trained.len());
        for trained in &report.trained {
            let path = self
                .config
                .output
                .model_dir
                .join(format!("{}_model.bin", trained.name));
            ModelStore::save(&trained.model, Some(trained.feature_names.as_slice()), &path)?;

            gauge!("rul_model_cv_rmse", "model" => trained.name.clone()).set(trained.cv.mean_rmse);
            results.push(ModelResult {
                name: trained.name.clone(),
                kind: trained.model.kind_name().to_string(),
                cv_rmse: trained.cv.mean_rmse,
                fold_rmse: trained.cv.fold_rmse.clone(),
                train_rmse: trained.train_rmse,
                feature_count: trained.feature_names.len(),
                model_path: path,
            });
        }
        for failure in &report.failures {
            counter!("rul_model_failures_total", "model" => failure.model.clone()).increment(1);
        }
        Ok(results)
    }

    /// Prediction trace of the best model along the longest engine run
    fn longest_engine_trace(
        &self,
        report: &TrainingReport,
        table: &FeatureTable,
    ) -> Result<Option<EngineTrace>, PipelineError> {
        let (Some(best), Some(engine_id)) = (report.best(), table.longest_engine()) else {
            warn!("No trained model; skipping prediction trace");
            return Ok(None);
        };

        let points = prediction_trace(
            &best.model,
            &best.feature_names,
            table,
            engine_id,
            self.config.output.trace_smoothing_window,
        )?;
        info!(
            "Prediction trace for engine {} ({} cycles) using {}",
            engine_id,
            points.len(),
            best.name
        );
        Ok(Some(EngineTrace {
            engine_id,
            model: best.name.clone(),
            points,
        }))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    let to_error = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}
