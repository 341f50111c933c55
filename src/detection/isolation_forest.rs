//! Isolation Forest.
//!
//! Random partition trees isolate points; anomalies need fewer splits.
//! The raw anomaly score is `s(x) = 2^(-E[h(x)] / c(ψ))` with `ψ` the
//! subsample size, so `s` near 1 is anomalous and well below 0.5 is normal.

use super::traits::OutlierModel;
use crate::error::{AnalyticsError, Result};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Isolation Forest configuration.
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    pub n_trees: usize,
    /// Upper bound on rows drawn (without replacement) per tree.
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl IsolationForestConfig {
    pub fn n_trees(mut self, n: usize) -> Self {
        self.n_trees = n.max(1);
        self
    }

    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(2);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { feature: usize, value: f64, left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(rows: &[Vec<f64>], indices: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(rows, indices, 0, max_depth, rng);
        tree
    }

    fn build(
        &mut self,
        rows: &[Vec<f64>],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: indices.len() });
        if depth >= max_depth || indices.len() <= 1 {
            return id;
        }

        let dims = rows[indices[0]].len();
        let ranges: Vec<(usize, f64, f64)> = (0..dims)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(rows[i][f]), hi.max(rows[i][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if ranges.is_empty() {
            return id;
        }

        let (feature, lo, hi) = ranges[rng.gen_range(0..ranges.len())];
        let value = rng.gen_range(lo..hi);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| rows[i][feature] < value);

        let left = self.build(rows, left_idx, depth + 1, max_depth, rng);
        let right = self.build(rows, right_idx, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            value,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *value { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest outlier model.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    dims: usize,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            dims: 0,
        }
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Rows drawn per tree in the last fit.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Mean path length of `row` over all trees.
    pub fn expected_path_length(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        Ok(self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / self.trees.len() as f64)
    }

    /// `s(x)` in (0, 1]; higher is more anomalous.
    pub fn anomaly_score(&self, row: &[f64]) -> Result<f64> {
        let h = self.expected_path_length(row)?;
        Ok(2f64.powf(-h / average_path_length(self.sample_size)))
    }

    fn check_row(&self, row: &[f64]) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::FitRequired);
        }
        if row.len() != self.dims {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dims,
                got: row.len(),
            });
        }
        Ok(())
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(IsolationForestConfig::default())
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let n = rows.len();
        if n < 2 {
            return Err(AnalyticsError::InsufficientData { needed: 2, got: n });
        }
        let dims = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dims) {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dims,
                got: bad.len(),
            });
        }

        let psi = self.config.max_samples.min(n);
        let max_depth = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.trees = (0..self.config.n_trees)
            .map(|_| {
                let indices = sample(&mut rng, n, psi).into_vec();
                IsolationTree::grow(rows, indices, max_depth, &mut rng)
            })
            .collect();
        self.sample_size = psi;
        self.dims = dims;

        debug!(
            trees = self.trees.len(),
            sample_size = psi,
            max_depth,
            "isolation forest fitted"
        );
        Ok(())
    }

    /// Negated `s(x)`, so lower is more anomalous.
    fn score_row(&self, row: &[f64]) -> Result<f64> {
        Ok(-self.anomaly_score(row)?)
    }

    fn name(&self) -> &str {
        "IsolationForest"
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
