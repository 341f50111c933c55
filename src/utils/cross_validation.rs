//! Splitting utilities for model evaluation.
//!
//! - [`TimeSeriesSplit`]: expanding-window folds where training rows always
//!   precede test rows.
//! - [`train_test_split`]: seeded shuffled holdout split.

use crate::error::{AnalyticsError, Result};
use crate::utils::metrics::AccuracyMetrics;
use crate::utils::stats::std_dev;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One train/test partition of row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Expanding-window splitter for time-ordered rows.
///
/// With `n` rows the test block has `n / (n_splits + 1)` rows; fold `k`
/// tests the `k`-th of the last `n_splits` blocks and trains on everything
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeriesSplit {
    pub n_splits: usize,
}

impl Default for TimeSeriesSplit {
    fn default() -> Self {
        Self { n_splits: 5 }
    }
}

impl TimeSeriesSplit {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Folds for `n` rows, oldest first.
    ///
    /// # Example
    /// ```
    /// use mursis_analytics::utils::TimeSeriesSplit;
    ///
    /// let folds = TimeSeriesSplit::new(3).split(12).unwrap();
    /// assert_eq!(folds.len(), 3);
    /// assert_eq!(folds[0].train, 0..3);
    /// assert_eq!(folds[0].test, 3..6);
    /// assert_eq!(folds[2].test, 9..12);
    /// ```
    pub fn split(&self, n: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        let n_folds = self.n_splits + 1;
        if n < n_folds {
            return Err(AnalyticsError::InsufficientData {
                needed: n_folds,
                got: n,
            });
        }

        let test_size = n / n_folds;
        let first_test = n - self.n_splits * test_size;
        Ok((0..self.n_splits)
            .map(|k| {
                let start = first_test + k * test_size;
                Fold {
                    train: 0..start,
                    test: start..start + test_size,
                }
            })
            .collect())
    }
}

/// Shuffle `0..n` with `seed` and hold out `ceil(test_fraction · n)` rows.
///
/// Returns `(train, test)` index lists.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AnalyticsError::InvalidArgument(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n < 2 || n_test >= n {
        return Err(AnalyticsError::InsufficientData { needed: 2, got: n });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = order.split_off(n_test);
    Ok((train, order))
}

/// Mean and spread of fold metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Mean MAE across folds.
    pub mae: f64,
    /// Mean RMSE across folds.
    pub rmse: f64,
    /// Standard deviation of MAE across folds.
    pub mae_std: f64,
    /// Standard deviation of RMSE across folds.
    pub rmse_std: f64,
}

impl AggregatedMetrics {
    pub fn from_folds(folds: &[AccuracyMetrics]) -> Self {
        let mae: Vec<f64> = folds.iter().map(|m| m.mae).collect();
        let rmse: Vec<f64> = folds.iter().map(|m| m.rmse).collect();
        let mean = |v: &[f64]| {
            if v.is_empty() {
                f64::NAN
            } else {
                v.iter().sum::<f64>() / v.len() as f64
            }
        };
        let spread = |v: &[f64]| if v.len() < 2 { 0.0 } else { std_dev(v) };
        Self {
            mae: mean(&mae),
            rmse: mean(&rmse),
            mae_std: spread(&mae),
            rmse_std: spread(&rmse),
        }
    }
}
