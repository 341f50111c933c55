//! Binary regression tree grown by greedy squared-error splits.
//!
//! With `l2_regularization = 0` this is a plain CART regressor (leaf value is
//! the mean, split gain is the reduction in squared error). A positive value
//! shrinks leaf values toward zero the way second-order boosting does:
//! leaf = Σr / (n + λ), gain = S_L²/(n_L+λ) + S_R²/(n_R+λ) − S²/(n+λ).

use crate::error::{AnalyticsError, Result};
use std::cmp::Ordering;

/// Tree growth settings.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it can be split.
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split.
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values.
    pub l2_regularization: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            l2_regularization: 0.0,
        }
    }
}

impl TreeConfig {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n.max(1);
        self
    }

    pub fn l2_regularization(mut self, lambda: f64) -> Self {
        self.l2_regularization = lambda.max(0.0);
        self
    }
}

#[derive(Debug, Clone)]
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

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A fitted regression tree stored as a node arena.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    config: TreeConfig,
    nodes: Vec<Node>,
    n_features: usize,
    /// Unnormalized gain accumulated per feature.
    gains: Vec<f64>,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            n_features: 0,
            gains: Vec::new(),
        }
    }

    /// Grow the tree on the rows listed in `indices` (duplicates allowed).
    pub fn fit_indices(&mut self, x: &[Vec<f64>], y: &[f64], indices: Vec<usize>) -> Result<()> {
        validate_matrix(x, y)?;
        if indices.is_empty() {
            return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
        }
        self.n_features = x[0].len();
        self.nodes.clear();
        self.gains = vec![0.0; self.n_features];
        self.grow(x, y, indices, 0);
        Ok(())
    }

    /// Grow the tree on all rows.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        self.fit_indices(x, y, (0..y.len()).collect())
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Split gain accumulated per feature, unnormalized.
    pub fn feature_gains(&self) -> &[f64] {
        &self.gains
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.nodes.is_empty() {
            return Err(AnalyticsError::FitRequired);
        }
        if row.len() != self.n_features {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[*feature] <= *threshold { *left } else { *right },
            }
        }
    }

    fn leaf_value(&self, sum: f64, n: usize) -> f64 {
        sum / (n as f64 + self.config.l2_regularization)
    }

    fn grow(&mut self, x: &[Vec<f64>], y: &[f64], indices: Vec<usize>, depth: usize) -> usize {
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let value = self.leaf_value(sum, indices.len());
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < self.config.min_samples_split.max(2) {
            return id;
        }

        let Some(split) = self.best_split(x, y, &indices, sum) else {
            return id;
        };
        self.gains[split.feature] += split.gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);
        let left = self.grow(x, y, left_idx, depth + 1);
        let right = self.grow(x, y, right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        total: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let lambda = self.config.l2_regularization;
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = total * total / (n as f64 + lambda);

        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();
        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| {
                x[a][feature]
                    .partial_cmp(&x[b][feature])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += y[order[k]];
                let (lo, hi) = (x[order[k]][feature], x[order[k + 1]][feature]);
                let n_left = k + 1;
                let n_right = n - n_left;
                if lo >= hi || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / (n_left as f64 + lambda)
                    + right_sum * right_sum / (n_right as f64 + lambda)
                    - parent_score;
                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: 0.5 * (lo + hi),
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// Normalize accumulated gains so they sum to 1.
pub(crate) fn normalize_importances(gains: &[f64]) -> Vec<f64> {
    let total: f64 = gains.iter().sum();
    if total > 0.0 {
        gains.iter().map(|g| g / total).collect()
    } else {
        vec![0.0; gains.len()]
    }
}

/// Check that `x` is a non-empty rectangular matrix of finite values
/// matching `y`.
pub(crate) fn validate_matrix(x: &[Vec<f64>], y: &[f64]) -> Result<()> {
    if x.is_empty() {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }
    if x.len() != y.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let width = x[0].len();
    for row in x {
        if row.len() != width {
            return Err(AnalyticsError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }
    }
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidArgument(
            "features and targets must be finite".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y jumps from 1 to 5 at x0 = 5; x1 is noise-free but uninformative
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, (i % 2) as f64]).collect();
        let y = (0..10).map(|i| if i < 5 { 1.0 } else { 5.0 }).collect();
        (x, y)
    }

    #[test]
    fn tree_finds_step() {
        let (x, y) = step_data();
        let mut tree = RegressionTree::new(TreeConfig::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_relative_eq!(tree.predict_row(&[2.0, 0.0]).unwrap(), 1.0);
        assert_relative_eq!(tree.predict_row(&[7.0, 1.0]).unwrap(), 5.0);
        assert!(tree.feature_gains()[0] > 0.0);
        assert_relative_eq!(tree.feature_gains()[1], 0.0);
    }

    #[test]
    fn tree_depth_limit() {
        let x: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let mut tree = RegressionTree::new(TreeConfig::default().max_depth(2));
        tree.fit(&x, &y).unwrap();

        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn tree_unlimited_depth_interpolates_training_data() {
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..16).map(|i| (i * i) as f64).collect();
        let mut tree = RegressionTree::new(TreeConfig::default());
        tree.fit(&x, &y).unwrap();

        for (row, target) in x.iter().zip(&y) {
            assert_relative_eq!(tree.predict_row(row).unwrap(), *target, epsilon = 1e-10);
        }
    }

    #[test]
    fn l2_regularization_shrinks_leaves() {
        let x = vec![vec![0.0], vec![0.0]];
        let y = vec![4.0, 4.0];
        let mut tree = RegressionTree::new(TreeConfig::default().l2_regularization(2.0));
        tree.fit(&x, &y).unwrap();

        // 8 / (2 + 2)
        assert_relative_eq!(tree.predict_row(&[0.0]).unwrap(), 2.0);
    }

    #[test]
    fn tree_requires_fit_and_width() {
        let tree = RegressionTree::new(TreeConfig::default());
        assert!(matches!(tree.predict_row(&[1.0]), Err(AnalyticsError::FitRequired)));

        let (x, y) = step_data();
        let mut tree = RegressionTree::new(TreeConfig::default());
        tree.fit(&x, &y).unwrap();
        assert!(tree.predict_row(&[1.0]).is_err());
    }

    #[test]
    fn validate_matrix_rejects_bad_input() {
        assert!(validate_matrix(&[], &[]).is_err());
        assert!(validate_matrix(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(validate_matrix(&[vec![f64::NAN]], &[1.0]).is_err());
    }

    #[test]
    fn importances_normalize() {
        let imp = normalize_importances(&[1.0, 3.0]);
        assert_relative_eq!(imp[0], 0.25);
        assert_relative_eq!(imp[1], 0.75);
        assert_eq!(normalize_importances(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
