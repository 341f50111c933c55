//! Feature standardization.
//!
//! Provides column-wise z-score scaling with the fitted parameters kept so
//! that new observations can be mapped into the same space.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Population mean and standard deviation; a constant column keeps scale 1
/// so it maps to all zeros.
fn mean_and_scale(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    let scale = if std < 1e-10 { 1.0 } else { std };
    (mean, scale)
}

/// Column-wise z-score scaler for row-major feature matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(AnalyticsError::InsufficientData {
            needed: 1,
            got: 0,
        })?;
        let dims = first.len();
        check_width(rows, dims)?;

        let (mean, scale) = (0..dims)
            .map(|d| mean_and_scale(rows.iter().map(move |r| r[d])))
            .unzip();

        Ok(Self { mean, scale })
    }

    /// Fit and transform in one step.
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }

    /// Number of columns the scaler was fitted on.
    pub fn dims(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Scale a single observation.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.dims() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dims(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Scale every row.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Map a scaled observation back to the original units.
    pub fn inverse_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.dims() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dims(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (m, s))| z * s + m)
            .collect())
    }
}

fn check_width(rows: &[Vec<f64>], dims: usize) -> Result<()> {
    for row in rows {
        if row.len() != dims {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dims,
                got: row.len(),
            });
        }
    }
    Ok(())
}
