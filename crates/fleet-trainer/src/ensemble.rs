//! Tree Ensembles: Bagging and Gradient Boosting

use crate::tree::{RegressionTree, TreeParams};
use crate::TrainingError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bootstrap-aggregated trees (random forest) settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaggingParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub seed: u64,
}

impl Default for BaggingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

/// Squared-loss gradient boosting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            learning_rate: 0.05,
            tree: TreeParams {
                max_depth: Some(6),
                ..Default::default()
            },
            seed: 42,
        }
    }
}

/// Model family and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    BaggedTrees(BaggingParams),
    GradientBoostedTrees(BoostingParams),
}

/// A named model to train
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub kind: ModelKind,
}

impl ModelSpec {
    /// Random forest with 100 fully grown trees
    pub fn random_forest() -> Self {
        Self {
            name: "random_forest".to_string(),
            kind: ModelKind::BaggedTrees(BaggingParams::default()),
        }
    }

    /// 300 depth-6 boosting rounds at learning rate 0.05
    pub fn gradient_boosting() -> Self {
        Self {
            name: "gradient_boosting".to_string(),
            kind: ModelKind::GradientBoostedTrees(BoostingParams::default()),
        }
    }

    /// Fit this model on the listed rows
    pub fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample: &[usize],
    ) -> Result<FleetModel, TrainingError> {
        match &self.kind {
            ModelKind::BaggedTrees(params) => BaggedTrees::fit(x, y, sample, params).map(FleetModel::BaggedTrees),
            ModelKind::GradientBoostedTrees(params) => {
                GradientBoostedTrees::fit(x, y, sample, params).map(FleetModel::GradientBoosted)
            }
        }
    }
}

/// Random forest regressor: mean of trees fitted on bootstrap samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaggedTrees {
    trees: Vec<RegressionTree>,
}

impl BaggedTrees {
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample: &[usize],
        params: &BaggingParams,
    ) -> Result<Self, TrainingError> {
        if params.n_estimators == 0 {
            return Err(TrainingError::InvalidParams("n_estimators must be >= 1".to_string()));
        }
        if sample.is_empty() {
            return Err(TrainingError::EmptyData);
        }

        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for t in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let bootstrap: Vec<usize> = (0..sample.len())
                .map(|_| sample[rng.gen_range(0..sample.len())])
                .collect();
            let tree = RegressionTree::fit(x, y, &bootstrap, &params.tree, &mut rng)?;
            debug!("Bagged tree {} grown with {} nodes", t, tree.node_count());
            trees.push(tree);
        }

        Ok(Self { trees })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn n_features(&self) -> usize {
        self.trees.first().map_or(0, RegressionTree::n_features)
    }
}

/// Gradient-boosted regressor: mean baseline plus shrunken residual trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostedTrees {
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample: &[usize],
        params: &BoostingParams,
    ) -> Result<Self, TrainingError> {
        if params.n_estimators == 0 {
            return Err(TrainingError::InvalidParams("n_estimators must be >= 1".to_string()));
        }
        if !(params.learning_rate > 0.0 && params.learning_rate.is_finite()) {
            return Err(TrainingError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                params.learning_rate
            )));
        }
        if sample.is_empty() || x.ncols() == 0 {
            return Err(TrainingError::EmptyData);
        }

        let base = sample.iter().map(|&i| y[i]).sum::<f64>() / sample.len() as f64;
        let mut current = Array1::from_elem(y.len(), base);
        let mut residual: Array1<f64> = Array1::zeros(y.len());
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for &i in sample {
                residual[i] = y[i] - current[i];
            }
            let tree = RegressionTree::fit(x, residual.view(), sample, &params.tree, &mut rng)?;
            for &i in sample {
                current[i] += params.learning_rate * tree.predict_row(x.row(i));
            }
            if round % 50 == 0 {
                debug!("Boosting round {}: {} nodes", round, tree.node_count());
            }
            trees.push(tree);
        }

        Ok(Self {
            base,
            learning_rate: params.learning_rate,
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.base
            + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Trained fleet regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FleetModel {
    BaggedTrees(BaggedTrees),
    GradientBoosted(GradientBoostedTrees),
}

impl FleetModel {
    /// Number of input features the model expects
    pub fn n_features(&self) -> usize {
        match self {
            FleetModel::BaggedTrees(m) => m.n_features(),
            FleetModel::GradientBoosted(m) => m.n_features,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FleetModel::BaggedTrees(_) => "bagged_trees",
            FleetModel::GradientBoosted(_) => "gradient_boosted_trees",
        }
    }

    /// Predict RUL for one feature vector
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, TrainingError> {
        self.check_width(row.len())?;
        let row = ArrayView1::from(row);
        Ok(match self {
            FleetModel::BaggedTrees(m) => m.predict_row(row),
            FleetModel::GradientBoosted(m) => m.predict_row(row),
        })
    }

    /// Predict RUL for every row of a feature matrix
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, TrainingError> {
        self.check_width(x.ncols())?;
        Ok(x.rows()
            .into_iter()
            .map(|row| match self {
                FleetModel::BaggedTrees(m) => m.predict_row(row),
                FleetModel::GradientBoosted(m) => m.predict_row(row),
            })
            .collect())
    }

    fn check_width(&self, actual: usize) -> Result<(), TrainingError> {
        let expected = self.n_features();
        if actual != expected {
            return Err(TrainingError::FeatureCountMismatch { expected, actual });
        }
        Ok(())
    }
}
