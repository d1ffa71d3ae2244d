//! Engine-Grouped K-Fold Cross-Validation

use crate::TrainingError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One train/test split as row indices
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter that keeps every group (engine) inside a single fold.
///
/// Groups are placed largest first into whichever fold currently holds the
/// fewest rows, which keeps test folds close in size without splitting an
/// engine's history.
#[derive(Debug, Clone, Copy)]
pub struct GroupKFold {
    n_splits: usize,
}

impl GroupKFold {
    pub fn new(n_splits: usize) -> Result<Self, TrainingError> {
        if n_splits < 2 {
            return Err(TrainingError::InvalidParams(format!(
                "n_splits must be >= 2, got {}",
                n_splits
            )));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Split rows given each row's group label
    pub fn split(&self, groups: &[u32]) -> Result<Vec<Fold>, TrainingError> {
        let mut sizes: BTreeMap<u32, usize> = BTreeMap::new();
        for &g in groups {
            *sizes.entry(g).or_default() += 1;
        }
        if sizes.len() < self.n_splits {
            return Err(TrainingError::NotEnoughGroups {
                groups: sizes.len(),
                splits: self.n_splits,
            });
        }

        // Largest first; ties broken by group id for determinism
        let mut ordered: Vec<(u32, usize)> = sizes.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut fold_rows = vec![0usize; self.n_splits];
        let mut fold_of: BTreeMap<u32, usize> = BTreeMap::new();
        for (group, size) in ordered {
            let lightest = (0..self.n_splits)
                .min_by_key(|&f| fold_rows[f])
                .unwrap_or(0);
            fold_rows[lightest] += size;
            fold_of.insert(group, lightest);
        }

        let folds = (0..self.n_splits)
            .map(|k| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..groups.len()).partition(|&i| fold_of[&groups[i]] == k);
                debug!("Fold {}: {} train rows, {} test rows", k, train.len(), test.len());
                Fold { train, test }
            })
            .collect();

        Ok(folds)
    }
}

/// Distinct groups touched by a set of rows
pub(crate) fn groups_of(rows: &[usize], groups: &[u32]) -> BTreeSet<u32> {
    rows.iter().map(|&i| groups[i]).collect()
}
