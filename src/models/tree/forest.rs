//! Bagged regression trees.

use super::cart::{normalize_importances, validate_matrix, RegressionTree, TreeConfig};
use crate::error::{AnalyticsError, Result};
use crate::models::Regressor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Configuration for [`RandomForest`].
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Settings shared by every tree.
    pub tree: TreeConfig,
    /// Random seed for bootstrap sampling.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeConfig::default(),
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.tree = self.tree.max_depth(depth);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Ensemble of fully grown trees, each fitted on a bootstrap resample.
///
/// Prediction is the mean over trees; importances are the mean of each
/// tree's normalized impurity decrease.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    importances: Option<Vec<f64>>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            importances: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        validate_matrix(x, y)?;
        if self.config.n_estimators == 0 {
            return Err(AnalyticsError::InvalidArgument(
                "n_estimators must be at least 1".into(),
            ));
        }

        let n = y.len();
        let width = x[0].len();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut importances = vec![0.0; width];

        for _ in 0..self.config.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut tree = RegressionTree::new(self.config.tree.clone());
            tree.fit_indices(x, y, sample)?;
            for (acc, imp) in importances
                .iter_mut()
                .zip(normalize_importances(tree.feature_gains()))
            {
                *acc += imp;
            }
            trees.push(tree);
        }

        debug!(
            trees = trees.len(),
            rows = n,
            features = width,
            "random forest fitted"
        );
        self.importances = Some(normalize_importances(&importances));
        self.trees = trees;
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::FitRequired);
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}
