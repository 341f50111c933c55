//! Gradient-boosted regression trees with squared-error loss.

use super::cart::{normalize_importances, validate_matrix, RegressionTree, TreeConfig};
use crate::error::{AnalyticsError, Result};
use crate::models::Regressor;
use tracing::debug;

/// Configuration for [`GradientBoosting`].
#[derive(Debug, Clone)]
pub struct BoostingConfig {
    /// Number of boosting rounds.
    pub n_rounds: usize,
    /// Shrinkage applied to every tree.
    pub learning_rate: f64,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// L2 penalty on leaf weights.
    pub l2_regularization: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 7,
            l2_regularization: 1.0,
        }
    }
}

impl BoostingConfig {
    pub fn n_rounds(mut self, n: usize) -> Self {
        self.n_rounds = n;
        self
    }

    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Additive tree model: `base + lr · Σ tree_m(x)`.
///
/// Each round fits a regularized tree to the current residuals. Importances
/// are the total split gain per feature, normalized.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: BoostingConfig,
    base_score: f64,
    trees: Vec<RegressionTree>,
    importances: Option<Vec<f64>>,
    training_loss: Vec<f64>,
}

impl GradientBoosting {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            base_score: 0.0,
            trees: Vec::new(),
            importances: None,
            training_loss: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Training MSE after each round.
    pub fn training_loss(&self) -> &[f64] {
        &self.training_loss
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new(BoostingConfig::default())
    }
}

impl Regressor for GradientBoosting {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        validate_matrix(x, y)?;
        if self.config.n_rounds == 0 || !(self.config.learning_rate > 0.0) {
            return Err(AnalyticsError::InvalidArgument(
                "boosting needs at least one round and a positive learning rate".into(),
            ));
        }

        let n = y.len();
        let width = x[0].len();
        let tree_config = TreeConfig::default()
            .max_depth(self.config.max_depth)
            .l2_regularization(self.config.l2_regularization);

        self.base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![self.base_score; n];
        let mut gains = vec![0.0; width];
        self.trees.clear();
        self.training_loss.clear();

        for _ in 0..self.config.n_rounds {
            let residuals: Vec<f64> = y.iter().zip(&predictions).map(|(t, p)| t - p).collect();
            let mut tree = RegressionTree::new(tree_config.clone());
            tree.fit(x, &residuals)?;

            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += self.config.learning_rate * tree.predict_row(row)?;
            }
            for (acc, g) in gains.iter_mut().zip(tree.feature_gains()) {
                *acc += g;
            }
            let loss = y
                .iter()
                .zip(&predictions)
                .map(|(t, p)| (t - p).powi(2))
                .sum::<f64>()
                / n as f64;
            self.training_loss.push(loss);
            self.trees.push(tree);
        }

        debug!(
            rounds = self.trees.len(),
            final_mse = self.training_loss.last().copied().unwrap_or(f64::NAN),
            "gradient boosting fitted"
        );
        self.importances = Some(normalize_importances(&gains));
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::FitRequired);
        }
        let mut value = self.base_score;
        for tree in &self.trees {
            value += self.config.learning_rate * tree.predict_row(row)?;
        }
        Ok(value)
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }

    fn name(&self) -> &str {
        "GradientBoosting"
    }
}
