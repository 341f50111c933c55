//! Local Outlier Factor.
//!
//! Compares the local reachability density of a point with that of its
//! k nearest neighbours. `LOF ≈ 1` for inliers and grows for points in
//! sparser regions than their neighbours.

use super::traits::OutlierModel;
use crate::clustering::distance::euclidean_distance;
use crate::error::{AnalyticsError, Result};
use tracing::debug;

/// Added to the mean reachability distance so duplicates keep a finite density.
const DENSITY_EPS: f64 = 1e-10;

/// LOF configuration.
#[derive(Debug, Clone)]
pub struct LofConfig {
    /// Neighbourhood size; capped at `n - 1` when fitting.
    pub n_neighbors: usize,
}

impl Default for LofConfig {
    fn default() -> Self {
        Self { n_neighbors: 20 }
    }
}

impl LofConfig {
    pub fn n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k.max(1);
        self
    }
}

/// Local Outlier Factor model.
///
/// Training rows are scored with themselves left out of their own
/// neighbourhood; new rows are scored against all training rows.
#[derive(Debug, Clone)]
pub struct LocalOutlierFactor {
    config: LofConfig,
    rows: Vec<Vec<f64>>,
    k: usize,
    k_distance: Vec<f64>,
    lrd: Vec<f64>,
    training_lof: Vec<f64>,
}

impl LocalOutlierFactor {
    pub fn new(config: LofConfig) -> Self {
        Self {
            config,
            rows: Vec::new(),
            k: 0,
            k_distance: Vec::new(),
            lrd: Vec::new(),
            training_lof: Vec::new(),
        }
    }

    /// Effective neighbourhood size of the last fit.
    pub fn k(&self) -> usize {
        self.k
    }

    /// LOF of each training row.
    pub fn training_factors(&self) -> &[f64] {
        &self.training_lof
    }

    /// LOF of a new observation.
    pub fn local_outlier_factor(&self, row: &[f64]) -> Result<f64> {
        if self.rows.is_empty() {
            return Err(AnalyticsError::FitRequired);
        }
        let dims = self.rows[0].len();
        if row.len() != dims {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dims,
                got: row.len(),
            });
        }
        let neighbors = self.neighbors_of(row, None);
        let lrd = self.density(&neighbors);
        Ok(self.factor(&neighbors, lrd))
    }

    /// `k` nearest training rows as `(index, distance)`, nearest first.
    fn neighbors_of(&self, row: &[f64], skip: Option<usize>) -> Vec<(usize, f64)> {
        let mut dists: Vec<(usize, f64)> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(i, r)| (i, euclidean_distance(row, r)))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1));
        dists.truncate(self.k);
        dists
    }

    fn density(&self, neighbors: &[(usize, f64)]) -> f64 {
        let reach: f64 = neighbors
            .iter()
            .map(|&(o, d)| d.max(self.k_distance[o]))
            .sum::<f64>()
            / neighbors.len() as f64;
        1.0 / (reach + DENSITY_EPS)
    }

    fn factor(&self, neighbors: &[(usize, f64)], lrd: f64) -> f64 {
        let mean_lrd = neighbors.iter().map(|&(o, _)| self.lrd[o]).sum::<f64>() / neighbors.len() as f64;
        mean_lrd / lrd
    }
}

impl Default for LocalOutlierFactor {
    fn default() -> Self {
        Self::new(LofConfig::default())
    }
}

impl OutlierModel for LocalOutlierFactor {
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

        self.rows = rows.to_vec();
        self.k = self.config.n_neighbors.min(n - 1);

        let neighborhoods: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|i| self.neighbors_of(&rows[i], Some(i)))
            .collect();
        self.k_distance = neighborhoods
            .iter()
            .map(|nb| nb.last().map_or(0.0, |&(_, d)| d))
            .collect();
        self.lrd = neighborhoods.iter().map(|nb| self.density(nb)).collect();
        self.training_lof = neighborhoods
            .iter()
            .zip(&self.lrd)
            .map(|(nb, &lrd)| self.factor(nb, lrd))
            .collect();

        debug!(rows = n, k = self.k, "local outlier factor fitted");
        Ok(())
    }

    /// Negated LOF, so lower is more anomalous.
    fn score_row(&self, row: &[f64]) -> Result<f64> {
        Ok(-self.local_outlier_factor(row)?)
    }

    fn fit_score(&mut self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.fit(rows)?;
        Ok(self.training_lof.iter().map(|l| -l).collect())
    }

    fn name(&self) -> &str {
        "LocalOutlierFactor"
    }

    fn is_fitted(&self) -> bool {
        !self.rows.is_empty()
    }
}
