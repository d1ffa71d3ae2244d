//! CART Regression Tree

use crate::TrainingError;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Maximum depth (None = grow until leaves are pure or too small)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.min_samples_split < 2 {
            return Err(TrainingError::InvalidParams(format!(
                "min_samples_split must be >= 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(TrainingError::InvalidParams(
                "min_samples_leaf must be >= 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(TrainingError::InvalidParams(
                "max_features must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary regression tree minimizing squared error, stored as a node arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl RegressionTree {
    /// Fit on the rows of `x` listed in `sample` (repeats allowed).
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        if sample.is_empty() || x.ncols() == 0 {
            return Err(TrainingError::EmptyData);
        }
        if x.nrows() != y.len() {
            return Err(TrainingError::InvalidParams(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let n_features = x.ncols();
        let mut indices = sample.to_vec();
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        // (node, start, end, depth) over `indices`
        let mut stack = vec![(0usize, 0usize, indices.len(), 0usize)];
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(indices.len());

        while let Some((node, start, end, depth)) = stack.pop() {
            let slice = &mut indices[start..end];
            let n = slice.len();
            let value = slice.iter().map(|&i| y[i]).sum::<f64>() / n as f64;

            let too_deep = params.max_depth.map_or(false, |d| depth >= d);
            let pure = slice.iter().all(|&i| y[i] == y[slice[0]]);
            if too_deep || pure || n < params.min_samples_split {
                nodes[node] = Node::Leaf { value };
                continue;
            }

            let features = candidate_features(n_features, params.max_features, rng);
            let split = best_split(x, y, slice, &features, params.min_samples_leaf, &mut pairs);

            let Some((feature, threshold)) = split else {
                nodes[node] = Node::Leaf { value };
                continue;
            };

            let mid = partition(slice, |i| x[[i, feature]] <= threshold);
            if mid == 0 || mid == n {
                nodes[node] = Node::Leaf { value };
                continue;
            }

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[node] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            stack.push((right, start + mid, end, depth + 1));
            stack.push((left, start, start + mid, depth + 1));
        }

        Ok(Self { nodes, n_features })
    }

    /// Predict one row; the row must have `n_features` values
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (root only = 0)
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }
}

fn candidate_features(n_features: usize, max_features: Option<usize>, rng: &mut StdRng) -> Vec<usize> {
    match max_features {
        Some(k) if k < n_features => rand::seq::index::sample(rng, n_features, k).into_vec(),
        _ => (0..n_features).collect(),
    }
}

/// Best `(feature, threshold)` by squared-error reduction, if any split helps
fn best_split(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    slice: &[usize],
    features: &[usize],
    min_leaf: usize,
    pairs: &mut Vec<(f64, f64)>,
) -> Option<(usize, f64)> {
    let n = slice.len();
    let total: f64 = slice.iter().map(|&i| y[i]).sum();
    let parent_score = total * total / n as f64;
    let mut best_gain = 1e-12;
    let mut best = None;

    for &feature in features {
        pairs.clear();
        pairs.extend(slice.iter().map(|&i| (x[[i, feature]], y[i])));
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += pairs[k].1;
            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
            if lo == hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            let gain = score - parent_score;
            if gain > best_gain {
                best_gain = gain;
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some((feature, threshold));
            }
        }
    }

    best
}

/// Move entries matching `pred` to the front; returns how many matched
fn partition<F>(slice: &mut [usize], pred: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let mut mid = 0;
    for j in 0..slice.len() {
        if pred(slice[j]) {
            slice.swap(mid, j);
            mid += 1;
        }
    }
    mid
}
