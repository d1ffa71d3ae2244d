//! Pipeline Configuration

use crate::PipelineError;
use config::{Config, Environment, File};
use feature_engine::{FeatureBuilder, FeatureConfig};
use fleet_trainer::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use trend_forecaster::{EconomicModel, Thresholds, NOMINAL_STRESS};

/// Environment variable prefix, e.g. `RUL__TREND__STRESS_MULTIPLIER=1.2`
pub const ENV_PREFIX: &str = "RUL";

/// Input data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Run-to-failure telemetry file
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/train_FD001.txt"),
        }
    }
}

/// Degradation trend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Feature column used as the health indicator
    pub health_indicator: String,
    pub thresholds: Thresholds,
    /// Applied to every fitted slope
    pub stress_multiplier: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            health_indicator: "sensor_12_rollmean_w5".to_string(),
            thresholds: Thresholds::default(),
            stress_multiplier: NOMINAL_STRESS,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `{name}_model.bin` files
    pub model_dir: PathBuf,
    /// Plain-text training report
    pub report_path: PathBuf,
    /// JSON results
    pub results_path: PathBuf,
    /// Centered window for smoothing the prediction trace
    pub trace_smoothing_window: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            report_path: PathBuf::from("reports/training_results.txt"),
            results_path: PathBuf::from("reports/results.json"),
            trace_smoothing_window: 5,
        }
    }
}

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub trend: TrendConfig,
    /// Economic constants; no economic value is computed when absent
    pub economics: Option<EconomicModel>,
    pub training: TrainingConfig,
    pub output: OutputConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            features: FeatureConfig::default(),
            trend: TrendConfig::default(),
            economics: None,
            training: TrainingConfig::default(),
            output: OutputConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl PipelineConfig {
    /// Layer an optional TOML file, then `RUL__`-prefixed environment
    /// variables, over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let indicator = &self.trend.health_indicator;
        if !FeatureBuilder::new(self.features.clone())
            .columns()
            .contains(indicator)
        {
            return Err(PipelineError::UnknownIndicator(indicator.clone()));
        }
        let stress = self.trend.stress_multiplier;
        if !(stress.is_finite() && stress > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "trend.stress_multiplier must be finite and positive, got {}",
                stress
            )));
        }
        let t = self.trend.thresholds;
        if !(t.preventive.is_finite() && t.predictive.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "trend.thresholds must be finite".to_string(),
            ));
        }
        if let Some(economics) = &self.economics {
            economics
                .validate()
                .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        }
        if self.output.trace_smoothing_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "output.trace_smoothing_window must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.trend.thresholds.preventive, 50.0);
        assert_eq!(config.trend.thresholds.predictive, 30.0);
        assert_eq!(config.training.n_splits, 5);
        assert_eq!(config.training.models.len(), 2);
        assert_eq!(config.features.channels, vec![7, 11, 12]);
        assert!(config.economics.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"
log_format = "json"

[data]
path = "fleet.txt"

[trend]
health_indicator = "sensor_7_rollmean_w5"
stress_multiplier = 1.5

[trend.thresholds]
preventive = 552.0

[economics]
cycles_per_day = 2.0
value_per_day = 10000.0

[training]
n_splits = 3
"#
        )
        .unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.data.path, PathBuf::from("fleet.txt"));
        assert_eq!(config.trend.health_indicator, "sensor_7_rollmean_w5");
        assert_eq!(config.trend.stress_multiplier, 1.5);
        assert_eq!(config.trend.thresholds.preventive, 552.0);
        assert_eq!(config.trend.thresholds.predictive, 30.0);
        assert_eq!(config.economics.unwrap().cycles_per_day, 2.0);
        assert_eq!(config.training.n_splits, 3);
        // Untouched sections keep defaults
        assert_eq!(config.training.models.len(), 2);
        assert_eq!(config.output.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = PipelineConfig::load(Some(Path::new("/nonexistent/rul.toml")));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = PipelineConfig::default();
        config.trend.stress_multiplier = 0.0;
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));

        let mut config = PipelineConfig::default();
        config.economics = Some(EconomicModel {
            cycles_per_day: 0.0,
            value_per_day: 1.0,
        });
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_indicator_checked_against_feature_columns() {
        let mut config = PipelineConfig::default();
        config.features.window = 7;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::UnknownIndicator(ref c)) if c == "sensor_12_rollmean_w5"
        ));

        config.trend.health_indicator = "sensor_12_rollmean_w7".to_string();
        assert!(config.validate().is_ok());

        config.trend.health_indicator = "sensor_4".to_string();
        assert!(config.validate().is_ok());

        config.features.channels = vec![7, 11];
        config.trend.health_indicator = "sensor_12_diff".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::UnknownIndicator(_))));
    }
}
