//! Ordinary least squares on a dense design matrix.

use crate::error::{AnalyticsError, Result};

/// Fitted linear model `y = intercept + X @ coefficients`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Fit OLS with an intercept on row-major regressors.
///
/// Uses Cholesky decomposition to solve the normal equations, with a tiny
/// ridge on the diagonal.
pub fn ols_fit(rows: &[Vec<f64>], y: &[f64]) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }
    if rows.len() != n {
        return Err(AnalyticsError::DimensionMismatch {
            expected: n,
            got: rows.len(),
        });
    }

    let k = rows[0].len();
    let p = k + 1;
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for (row, &target) in rows.iter().zip(y) {
        if row.len() != k {
            return Err(AnalyticsError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
        let full: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
        for i in 0..p {
            xty[i] += full[i] * target;
            for j in 0..=i {
                xtx[i][j] += full[i] * full[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        AnalyticsError::ModelFitFailure("least squares system is not positive definite".into())
    })?;

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve `A x = b` for symmetric positive definite `A` via Cholesky.
pub(crate) fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        z[i] = (b[i] - (0..i).map(|j| l[i][j] * z[j]).sum::<f64>()) / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (z[i] - (i + 1..n).map(|j| l[j][i] * x[j]).sum::<f64>()) / l[i][i];
    }

    Some(x)
}
