//! Fleet Trainer Implementation

use crate::cv::{groups_of, GroupKFold};
use crate::ensemble::{FleetModel, ModelSpec};
use crate::metrics::rmse;
use crate::{TrainingError, EXCLUDED_COLUMNS};
use feature_engine::{centered_rolling_mean, FeatureTable};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fleet training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of engine-grouped folds
    pub n_splits: usize,
    /// Models to train, each reported separately
    pub models: Vec<ModelSpec>,
    /// Explicit feature columns (None = every table column)
    pub features: Option<Vec<String>>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            models: vec![ModelSpec::random_forest(), ModelSpec::gradient_boosting()],
            features: None,
        }
    }
}

/// Feature matrix, labels and engine groups in table row order
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub groups: Vec<u32>,
    pub feature_names: Vec<String>,
}

impl TrainingDataset {
    /// Select `feature_names` from the table, in that order
    pub fn from_table(table: &FeatureTable, feature_names: &[String]) -> Result<Self, TrainingError> {
        if table.is_empty() || feature_names.is_empty() {
            return Err(TrainingError::EmptyData);
        }
        if let Some(name) = feature_names
            .iter()
            .find(|n| EXCLUDED_COLUMNS.contains(&n.as_str()))
        {
            return Err(TrainingError::ExcludedFeature(name.clone()));
        }

        let columns = feature_names
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| TrainingError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let x = Array2::from_shape_fn((table.len(), columns.len()), |(i, j)| {
            table.rows[i].values[columns[j]]
        });
        let y = table.rows.iter().map(|r| r.rul as f64).collect();
        let groups = table.rows.iter().map(|r| r.engine_id).collect();

        Ok(Self {
            x,
            y,
            groups,
            feature_names: feature_names.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Held-out error across grouped folds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub fold_rmse: Vec<f64>,
    pub mean_rmse: f64,
}

/// A model fitted on the full dataset with its evaluation
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub name: String,
    pub model: FleetModel,
    pub feature_names: Vec<String>,
    pub cv: CvSummary,
    /// Error of the final model on its own training rows
    pub train_rmse: f64,
}

/// A model that could not be trained
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingFailure {
    pub model: String,
    pub error: TrainingError,
}

/// Outcome of training every configured model
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub trained: Vec<TrainedModel>,
    pub failures: Vec<TrainingFailure>,
}

impl TrainingReport {
    /// Trained model with the lowest cross-validated RMSE
    pub fn best(&self) -> Option<&TrainedModel> {
        self.trained
            .iter()
            .min_by(|a, b| a.cv.mean_rmse.total_cmp(&b.cv.mean_rmse))
    }
}

/// Trains fleet-wide RUL regressors
pub struct FleetTrainer {
    config: TrainingConfig,
}

impl FleetTrainer {
    /// Create a new trainer
    pub fn new(config: TrainingConfig) -> Self {
        info!(
            "Creating fleet trainer: {} models, {} folds",
            config.models.len(),
            config.n_splits
        );
        Self { config }
    }

    /// Feature columns to train on for this table
    pub fn feature_names(&self, table: &FeatureTable) -> Vec<String> {
        match &self.config.features {
            Some(names) => names.clone(),
            None => table
                .columns
                .iter()
                .filter(|c| !EXCLUDED_COLUMNS.contains(&c.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Train every configured model. Never fails as a whole: problems are
    /// recorded per model in the report.
    pub fn train(&self, table: &FeatureTable) -> TrainingReport {
        let mut report = TrainingReport::default();
        let names = self.feature_names(table);

        let dataset = match TrainingDataset::from_table(table, &names) {
            Ok(d) => d,
            Err(e) => {
                warn!("Training data unusable: {}", e);
                report.failures = self
                    .config
                    .models
                    .iter()
                    .map(|spec| TrainingFailure {
                        model: spec.name.clone(),
                        error: e.clone(),
                    })
                    .collect();
                return report;
            }
        };

        for spec in &self.config.models {
            info!("Training {}...", spec.name);
            match self.train_model(spec, &dataset) {
                Ok(trained) => {
                    info!(
                        "{}: CV RMSE {:.2} over {} folds, train RMSE {:.2}",
                        trained.name,
                        trained.cv.mean_rmse,
                        trained.cv.fold_rmse.len(),
                        trained.train_rmse
                    );
                    report.trained.push(trained);
                }
                Err(error) => {
                    warn!("Training failed for {}: {}", spec.name, error);
                    report.failures.push(TrainingFailure {
                        model: spec.name.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Cross-validate one model by engine group, then fit it on all rows
    pub fn train_model(
        &self,
        spec: &ModelSpec,
        dataset: &TrainingDataset,
    ) -> Result<TrainedModel, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyData);
        }

        let folds = GroupKFold::new(self.config.n_splits)?.split(&dataset.groups)?;
        let mut fold_rmse = Vec::with_capacity(folds.len());

        for (k, fold) in folds.iter().enumerate() {
            debug!(
                "{} fold {}: {} train engines, {} test engines",
                spec.name,
                k,
                groups_of(&fold.train, &dataset.groups).len(),
                groups_of(&fold.test, &dataset.groups).len()
            );
            let model = spec.fit(dataset.x.view(), dataset.y.view(), &fold.train)?;
            let predicted: Vec<f64> = fold
                .test
                .iter()
                .map(|&i| model.predict_row(&dataset.x.row(i).to_vec()))
                .collect::<Result<_, _>>()?;
            let actual: Vec<f64> = fold.test.iter().map(|&i| dataset.y[i]).collect();
            fold_rmse.push(rmse(&predicted, &actual));
        }

        let mean_rmse = fold_rmse.iter().sum::<f64>() / fold_rmse.len() as f64;

        let all: Vec<usize> = (0..dataset.len()).collect();
        let model = spec.fit(dataset.x.view(), dataset.y.view(), &all)?;
        let fitted = model.predict(dataset.x.view())?;
        let train_rmse = rmse(&fitted.to_vec(), &dataset.y.to_vec());

        Ok(TrainedModel {
            name: spec.name.clone(),
            model,
            feature_names: dataset.feature_names.clone(),
            cv: CvSummary {
                fold_rmse,
                mean_rmse,
            },
            train_rmse,
        })
    }
}

impl Default for FleetTrainer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

/// Actual vs predicted RUL along one engine's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub cycle: u32,
    pub actual_rul: f64,
    pub predicted_rul: f64,
    /// Centered moving average of the prediction
    pub smoothed_rul: f64,
}

/// Predict along one engine's trajectory in cycle order
pub fn prediction_trace(
    model: &FleetModel,
    feature_names: &[String],
    table: &FeatureTable,
    engine_id: u32,
    smoothing_window: usize,
) -> Result<Vec<TracePoint>, TrainingError> {
    let columns = feature_names
        .iter()
        .map(|name| {
            table
                .column_index(name)
                .ok_or_else(|| TrainingError::MissingFeature(name.clone()))
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let rows: Vec<_> = table.engine_rows(engine_id).collect();
    if rows.is_empty() {
        return Err(TrainingError::UnknownEngine(engine_id));
    }

    let mut predicted = Vec::with_capacity(rows.len());
    for row in &rows {
        let features: Vec<f64> = columns.iter().map(|&c| row.values[c]).collect();
        predicted.push(model.predict_row(&features)?);
    }
    let smoothed = centered_rolling_mean(&predicted, smoothing_window);

    Ok(rows
        .iter()
        .zip(predicted.iter().zip(smoothed))
        .map(|(row, (&p, s))| TracePoint {
            cycle: row.cycle,
            actual_rul: row.rul as f64,
            predicted_rul: p,
            smoothed_rul: s,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::{BaggingParams, BoostingParams, ModelKind};
    use crate::tree::TreeParams;
    use feature_engine::FeatureBuilder;
    use telemetry_loader::TelemetryRecord;

    /// Ten engines whose sensor 7 rises and sensor 12 falls toward failure
    fn fleet_table() -> FeatureTable {
        let mut records = Vec::new();
        for engine_id in 1..=10u32 {
            let life = 20 + engine_id * 3;
            for cycle in 1..=life {
                let rul = (life - cycle) as f64;
                let mut r = TelemetryRecord {
                    engine_id,
                    cycle,
                    ..Default::default()
                };
                r.sensors[6] = 550.0 - 0.5 * rul;
                r.sensors[10] = 47.0 + 0.02 * (engine_id as f64);
                r.sensors[11] = 520.0 + 0.3 * rul;
                records.push(r);
            }
        }
        FeatureBuilder::default().build(&records).unwrap()
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            n_splits: 5,
            models: vec![
                ModelSpec {
                    name: "random_forest".to_string(),
                    kind: ModelKind::BaggedTrees(BaggingParams {
                        n_estimators: 10,
                        ..Default::default()
                    }),
                },
                ModelSpec {
                    name: "gradient_boosting".to_string(),
                    kind: ModelKind::GradientBoostedTrees(BoostingParams {
                        n_estimators: 30,
                        learning_rate: 0.2,
                        tree: TreeParams {
                            max_depth: Some(3),
                            ..Default::default()
                        },
                        seed: 7,
                    }),
                },
            ],
            features: None,
        }
    }

    #[test]
    fn test_default_features_exclude_identifiers() {
        let table = fleet_table();
        let names = FleetTrainer::default().feature_names(&table);
        assert_eq!(names.len(), table.columns.len());
        assert!(!names.iter().any(|n| n == "engine_id" || n == "cycle"));
    }

    #[test]
    fn test_trains_all_models_with_grouped_cv() {
        let table = fleet_table();
        let report = FleetTrainer::new(small_config()).train(&table);

        assert!(report.failures.is_empty());
        assert_eq!(report.trained.len(), 2);
        for trained in &report.trained {
            assert_eq!(trained.cv.fold_rmse.len(), 5);
            assert!(trained.cv.mean_rmse.is_finite());
            // Sensors encode RUL directly, so held-out error stays small
            assert!(trained.cv.mean_rmse < 10.0, "{}: {}", trained.name, trained.cv.mean_rmse);
            assert_eq!(trained.model.n_features(), trained.feature_names.len());
        }
        assert!(report.best().is_some());
    }

    #[test]
    fn test_missing_feature_reported_per_model() {
        let table = fleet_table();
        let config = TrainingConfig {
            features: Some(vec!["sensor_7".to_string(), "sensor_99".to_string()]),
            ..small_config()
        };
        let report = FleetTrainer::new(config).train(&table);

        assert!(report.trained.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].model, "random_forest");
        assert_eq!(
            report.failures[1].error,
            TrainingError::MissingFeature("sensor_99".to_string())
        );
    }

    #[test]
    fn test_identifier_feature_rejected() {
        let table = fleet_table();
        let result = TrainingDataset::from_table(&table, &["cycle".to_string()]);
        assert_eq!(result.unwrap_err(), TrainingError::ExcludedFeature("cycle".to_string()));
    }

    #[test]
    fn test_one_bad_model_does_not_stop_others() {
        let table = fleet_table();
        let mut config = small_config();
        config.models.insert(
            0,
            ModelSpec {
                name: "broken".to_string(),
                kind: ModelKind::BaggedTrees(BaggingParams {
                    n_estimators: 0,
                    ..Default::default()
                }),
            },
        );
        let report = FleetTrainer::new(config).train(&table);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].model, "broken");
        assert_eq!(report.trained.len(), 2);
    }

    #[test]
    fn test_too_few_engines_for_folds() {
        let table = fleet_table();
        let config = TrainingConfig {
            n_splits: 11,
            ..small_config()
        };
        let report = FleetTrainer::new(config).train(&table);
        assert!(report
            .failures
            .iter()
            .all(|f| f.error == TrainingError::NotEnoughGroups { groups: 10, splits: 11 }));
    }

    #[test]
    fn test_empty_table() {
        let report = FleetTrainer::new(small_config()).train(&FeatureTable::default());
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures.iter().all(|f| f.error == TrainingError::EmptyData));
    }

    #[test]
    fn test_prediction_trace_for_longest_engine() {
        let table = fleet_table();
        let report = FleetTrainer::new(small_config()).train(&table);
        let trained = &report.trained[0];
        let engine = table.longest_engine().unwrap();
        assert_eq!(engine, 10);

        let trace = prediction_trace(&trained.model, &trained.feature_names, &table, engine, 5).unwrap();
        assert_eq!(trace.len(), 50);
        assert_eq!(trace[0].cycle, 1);
        assert_eq!(trace.last().unwrap().actual_rul, 0.0);
        assert!(trace[0].predicted_rul > trace[49].predicted_rul);

        assert_eq!(
            prediction_trace(&trained.model, &trained.feature_names, &table, 99, 5).unwrap_err(),
            TrainingError::UnknownEngine(99)
        );
    }
}
