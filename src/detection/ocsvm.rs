//! One-Class SVM (ν formulation).
//!
//! Solves
//!
//! ```text
//! min ½ αᵀKα   s.t.  0 ≤ αᵢ ≤ 1,  Σαᵢ = ν·n
//! ```
//!
//! with SMO using second-order working-set selection. The decision value
//! `f(x) = Σ αᵢ K(xᵢ, x) − ρ` is negative outside the learned boundary.

use super::traits::OutlierModel;
use crate::error::{AnalyticsError, Result};
use tracing::{debug, warn};

const TAU: f64 = 1e-12;

/// Kernel function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// `exp(-γ‖x − y‖²)`; `None` uses `1 / (d · var(X))`.
    Rbf { gamma: Option<f64> },
    /// `⟨x, y⟩`
    Linear,
    /// `(γ⟨x, y⟩ + coef0)^degree`; `None` gamma as for RBF.
    Poly {
        degree: u32,
        gamma: Option<f64>,
        coef0: f64,
    },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Rbf { gamma: None }
    }
}

/// Kernel with gamma resolved against the training data.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FittedKernel {
    Rbf { gamma: f64 },
    Linear,
    Poly { degree: u32, gamma: f64, coef0: f64 },
}

impl FittedKernel {
    fn resolve(kernel: Kernel, rows: &[Vec<f64>]) -> Self {
        match kernel {
            Kernel::Rbf { gamma } => FittedKernel::Rbf {
                gamma: gamma.unwrap_or_else(|| scale_gamma(rows)),
            },
            Kernel::Linear => FittedKernel::Linear,
            Kernel::Poly {
                degree,
                gamma,
                coef0,
            } => FittedKernel::Poly {
                degree,
                gamma: gamma.unwrap_or_else(|| scale_gamma(rows)),
                coef0,
            },
        }
    }

    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            FittedKernel::Rbf { gamma } => {
                let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * d2).exp()
            }
            FittedKernel::Linear => dot(a, b),
            FittedKernel::Poly {
                degree,
                gamma,
                coef0,
            } => (gamma * dot(a, b) + coef0).powi(degree as i32),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `1 / (d · var(X))` over all entries; 1.0 for constant data.
fn scale_gamma(rows: &[Vec<f64>]) -> f64 {
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    let d = rows.first().map_or(1, Vec::len).max(1) as f64;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if var > 0.0 {
        1.0 / (d * var)
    } else {
        1.0
    }
}

/// One-Class SVM configuration.
#[derive(Debug, Clone)]
pub struct OneClassSvmConfig {
    /// Upper bound on the training outlier fraction, lower bound on the
    /// support-vector fraction; in (0, 1].
    pub nu: f64,
    pub kernel: Kernel,
    /// KKT violation tolerance.
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for OneClassSvmConfig {
    fn default() -> Self {
        Self {
            nu: 0.5,
            kernel: Kernel::default(),
            tolerance: 1e-3,
            max_iter: 1_000_000,
        }
    }
}

impl OneClassSvmConfig {
    pub fn nu(mut self, nu: f64) -> Self {
        self.nu = nu;
        self
    }

    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// One-Class SVM outlier model.
#[derive(Debug, Clone)]
pub struct OneClassSvm {
    config: OneClassSvmConfig,
    kernel: Option<FittedKernel>,
    support_vectors: Vec<Vec<f64>>,
    dual_coef: Vec<f64>,
    rho: f64,
    iterations: usize,
}

impl OneClassSvm {
    pub fn new(config: OneClassSvmConfig) -> Self {
        Self {
            config,
            kernel: None,
            support_vectors: Vec::new(),
            dual_coef: Vec::new(),
            rho: 0.0,
            iterations: 0,
        }
    }

    pub fn config(&self) -> &OneClassSvmConfig {
        &self.config
    }

    /// Gamma actually used, for kernels that have one.
    pub fn gamma(&self) -> Option<f64> {
        match self.kernel? {
            FittedKernel::Rbf { gamma } | FittedKernel::Poly { gamma, .. } => Some(gamma),
            FittedKernel::Linear => None,
        }
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Signed distance to the boundary; negative outside.
    pub fn decision_function(&self, row: &[f64]) -> Result<f64> {
        let kernel = self.kernel.ok_or(AnalyticsError::FitRequired)?;
        let dims = self.support_vectors.first().map_or(0, Vec::len);
        if row.len() != dims {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dims,
                got: row.len(),
            });
        }
        let sum: f64 = self
            .support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, a)| a * kernel.eval(sv, row))
            .sum();
        Ok(sum - self.rho)
    }
}

impl Default for OneClassSvm {
    fn default() -> Self {
        Self::new(OneClassSvmConfig::default())
    }
}

impl OutlierModel for OneClassSvm {
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let nu = self.config.nu;
        if !(nu > 0.0 && nu <= 1.0) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "nu must be in (0, 1], got {}",
                nu
            )));
        }
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

        let kernel = FittedKernel::resolve(self.config.kernel, rows);
        let q: Vec<Vec<f64>> = rows
            .iter()
            .map(|a| rows.iter().map(|b| kernel.eval(a, b)).collect())
            .collect();

        let solution = solve(&q, nu, self.config.tolerance, self.config.max_iter)?;

        let (support_vectors, dual_coef) = rows
            .iter()
            .zip(&solution.alpha)
            .filter(|(_, &a)| a > 0.0)
            .map(|(r, &a)| (r.clone(), a))
            .unzip();
        self.kernel = Some(kernel);
        self.support_vectors = support_vectors;
        self.dual_coef = dual_coef;
        self.rho = solution.rho;
        self.iterations = solution.iterations;

        debug!(
            rows = n,
            support_vectors = self.support_vectors.len(),
            iterations = self.iterations,
            rho = self.rho,
            "one-class SVM fitted"
        );
        Ok(())
    }

    /// Decision value; lower is more anomalous.
    fn score_row(&self, row: &[f64]) -> Result<f64> {
        self.decision_function(row)
    }

    fn name(&self) -> &str {
        "OneClassSVM"
    }

    fn is_fitted(&self) -> bool {
        self.kernel.is_some()
    }
}

struct Solution {
    alpha: Vec<f64>,
    rho: f64,
    iterations: usize,
}

/// SMO for the one-class dual with upper bound 1 on every αᵢ.
fn solve(q: &[Vec<f64>], nu: f64, eps: f64, max_iter: usize) -> Result<Solution> {
    let n = q.len();
    let total = nu * n as f64;

    // Feasible start: the first ⌊ν·n⌋ coefficients at the bound, the
    // remainder on the next one.
    let mut alpha = vec![0.0; n];
    let full = (total.floor() as usize).min(n);
    alpha[..full].iter_mut().for_each(|a| *a = 1.0);
    if full < n {
        alpha[full] = total - full as f64;
    }

    let mut grad: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| q[i][j] * alpha[j]).sum())
        .collect();

    let mut iterations = 0;
    loop {
        let Some((i, j)) = select_working_set(q, &alpha, &grad, eps) else {
            break;
        };
        if iterations >= max_iter {
            warn!(max_iter, "one-class SVM did not converge");
            return Err(AnalyticsError::ModelFitFailure(format!(
                "SMO did not converge in {} iterations",
                max_iter
            )));
        }
        iterations += 1;

        let (old_i, old_j) = (alpha[i], alpha[j]);
        let quad = (q[i][i] + q[j][j] - 2.0 * q[i][j]).max(TAU);
        let delta = (grad[i] - grad[j]) / quad;
        let sum = old_i + old_j;
        let mut ai = old_i - delta;
        let mut aj = old_j + delta;

        if sum > 1.0 {
            if ai > 1.0 {
                ai = 1.0;
                aj = sum - 1.0;
            }
            if aj > 1.0 {
                aj = 1.0;
                ai = sum - 1.0;
            }
        } else {
            if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }
        alpha[i] = ai;
        alpha[j] = aj;

        let (di, dj) = (ai - old_i, aj - old_j);
        for (t, g) in grad.iter_mut().enumerate() {
            *g += q[t][i] * di + q[t][j] * dj;
        }
    }

    Ok(Solution {
        rho: compute_rho(&alpha, &grad),
        alpha,
        iterations,
    })
}

/// Maximal-violating pair with second-order selection of `j`; `None` once
/// the KKT gap is below `eps`.
fn select_working_set(q: &[Vec<f64>], alpha: &[f64], grad: &[f64], eps: f64) -> Option<(usize, usize)> {
    let mut gmax = f64::NEG_INFINITY;
    let mut i = None;
    for (t, (&a, &g)) in alpha.iter().zip(grad).enumerate() {
        if a < 1.0 && -g >= gmax {
            gmax = -g;
            i = Some(t);
        }
    }
    let i = i?;

    let mut gmax2 = f64::NEG_INFINITY;
    let mut best = f64::INFINITY;
    let mut j = None;
    for (t, (&a, &g)) in alpha.iter().zip(grad).enumerate() {
        if a <= 0.0 {
            continue;
        }
        gmax2 = gmax2.max(g);
        let diff = gmax + g;
        if diff > 0.0 {
            let quad = (q[i][i] + q[t][t] - 2.0 * q[i][t]).max(TAU);
            let obj = -(diff * diff) / quad;
            if obj <= best {
                best = obj;
                j = Some(t);
            }
        }
    }

    if gmax + gmax2 < eps {
        return None;
    }
    j.map(|j| (i, j))
}

fn compute_rho(alpha: &[f64], grad: &[f64]) -> f64 {
    let mut ub = f64::INFINITY;
    let mut lb = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free = 0usize;
    for (&a, &g) in alpha.iter().zip(grad) {
        if a >= 1.0 {
            lb = lb.max(g);
        } else if a <= 0.0 {
            ub = ub.min(g);
        } else {
            free += 1;
            free_sum += g;
        }
    }
    if free > 0 {
        free_sum / free as f64
    } else {
        (ub + lb) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Distribution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;

    fn gaussian_cloud(n: usize, dims: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n)
            .map(|_| (0..dims).map(|_| normal.sample(&mut rng)).collect())
            .collect()
    }

    #[test]
    fn scale_gamma_of_standard_data() {
        let rows = vec![vec![1.0, -1.0], vec![-1.0, 1.0]];
        // variance of all entries is 1, d = 2
        assert!((scale_gamma(&rows) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn dual_constraints_hold() {
        let rows = gaussian_cloud(80, 2, 1);
        let mut svm = OneClassSvm::new(OneClassSvmConfig::default().nu(0.2));
        svm.fit(&rows).unwrap();

        let total: f64 = svm.dual_coef.iter().sum();
        assert!((total - 0.2 * 80.0).abs() < 1e-8);
        assert!(svm.dual_coef.iter().all(|&a| a > 0.0 && a <= 1.0 + 1e-12));
        // ν lower-bounds the support-vector fraction
        assert!(svm.n_support() as f64 >= 0.2 * 80.0 - 1.0);
    }

    #[test]
    fn training_outlier_fraction_is_bounded_by_nu() {
        let rows = gaussian_cloud(150, 3, 2);
        let mut svm = OneClassSvm::new(OneClassSvmConfig::default().nu(0.1));
        let scores = svm.fit_score(&rows).unwrap();
        let outside = scores.iter().filter(|&&s| s < -1e-6).count();
        assert!(outside as f64 <= 0.1 * 150.0 + 2.0);
    }

    #[test]
    fn far_point_scores_below_centre() {
        let rows = gaussian_cloud(100, 2, 3);
        let mut svm = OneClassSvm::default();
        svm.fit(&rows).unwrap();
        let centre = svm.score_row(&[0.0, 0.0]).unwrap();
        let far = svm.score_row(&[6.0, 6.0]).unwrap();
        assert!(far < 0.0);
        assert!(far < centre);
    }

    #[test]
    fn linear_and_poly_kernels_fit() {
        let rows = gaussian_cloud(60, 2, 4);
        for kernel in [
            Kernel::Linear,
            Kernel::Poly {
                degree: 2,
                gamma: None,
                coef0: 1.0,
            },
        ] {
            let mut svm = OneClassSvm::new(OneClassSvmConfig::default().kernel(kernel));
            svm.fit(&rows).unwrap();
            assert!(svm.score_row(&[0.5, 0.5]).unwrap().is_finite());
        }
    }

    #[test]
    fn invalid_nu_is_rejected() {
        let rows = gaussian_cloud(10, 2, 5);
        for nu in [0.0, 1.5, f64::NAN] {
            let mut svm = OneClassSvm::new(OneClassSvmConfig::default().nu(nu));
            assert!(matches!(svm.fit(&rows), Err(AnalyticsError::InvalidArgument(_))));
        }
    }

    #[test]
    fn iteration_cap_reports_fit_failure() {
        let rows = gaussian_cloud(50, 2, 6);
        let mut svm = OneClassSvm::new(OneClassSvmConfig::default().max_iter(1));
        assert!(matches!(svm.fit(&rows), Err(AnalyticsError::ModelFitFailure(_))));
    }

    #[test]
    fn unfitted_model_errors() {
        assert!(matches!(
            OneClassSvm::default().score_row(&[0.0]),
            Err(AnalyticsError::FitRequired)
        ));
    }
}
