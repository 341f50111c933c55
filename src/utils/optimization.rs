//! Nelder-Mead simplex minimization used for ARIMA estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed (summed over restarts).
    pub iterations: usize,
    /// Whether the final run converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations per run.
    pub max_iter: usize,
    /// Convergence tolerance on the simplex value spread, relative to the
    /// magnitude of the best value.
    pub tolerance: f64,
    /// Convergence tolerance on the simplex diameter, relative to the
    /// magnitude of the best vertex.
    pub x_tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
    /// Number of times the search is restarted from the last best point.
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            x_tolerance: 1e-6,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            restarts: 0,
        }
    }
}

impl NelderMeadConfig {
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn x_tolerance(mut self, tolerance: f64) -> Self {
        self.x_tolerance = tolerance;
        self
    }

    pub fn initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }
}

/// Minimize `objective` starting from `initial`.
///
/// Points are clamped to `bounds` when given. A run converges once both the
/// value spread and the diameter of the simplex fall within tolerance.
///
/// With `restarts > 0` a fresh simplex is built around the best point after
/// every run. A restart that fails to improve a finite optimum ends the
/// search and marks the result converged.
///
/// # Example
/// ```
/// use mursis_analytics::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut best = run_simplex(&objective, &clamp(initial, bounds), bounds, config);
    for _ in 0..config.restarts {
        let next = run_simplex(&objective, &best.optimal_point, bounds, config);
        let improved = next.optimal_value < best.optimal_value - spread_floor(best.optimal_value, config);
        let iterations = best.iterations + next.iterations;
        if improved {
            best = NelderMeadResult { iterations, ..next };
            continue;
        }
        if next.optimal_value < best.optimal_value {
            best.optimal_point = next.optimal_point;
            best.optimal_value = next.optimal_value;
        }
        best.iterations = iterations;
        best.converged = best.converged || next.converged || best.optimal_value < f64::MAX;
        break;
    }
    best
}

fn spread_floor(value: f64, config: &NelderMeadConfig) -> f64 {
    config.tolerance * value.abs().max(1.0)
}

fn run_simplex<F>(
    objective: &F,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        vertex[i] += if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(clamp(&vertex, bounds));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| finite_or_max(objective(v))).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let (best, worst, second_worst) = (order[0], order[n], order[n - 1]);

        let diameter = simplex
            .iter()
            .map(|v| distance(v, &simplex[best]))
            .fold(0.0, f64::max);
        let scale = simplex[best].iter().fold(1.0_f64, |m, x| m.max(x.abs()));
        let flat = values[worst] - values[best] <= spread_floor(values[best], config);
        if (flat && diameter <= config.x_tolerance * scale) || diameter <= f64::EPSILON * scale {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let reflected = clamp(&towards(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = finite_or_max(objective(&reflected));

        if reflected_value < values[best] {
            let expanded = clamp(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = finite_or_max(objective(&expanded));
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (target, target_value) = if reflected_value < values[worst] {
            (reflected.clone(), reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let contracted = clamp(&towards(&centroid, &target, config.rho), bounds);
        let contracted_value = finite_or_max(objective(&contracted));
        if contracted_value < target_value {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in (0..=n).filter(|&i| i != best) {
            let shrunk = towards(&anchor, &simplex[i], config.sigma);
            simplex[i] = clamp(&shrunk, bounds);
            values[i] = finite_or_max(objective(&simplex[i]));
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

fn finite_or_max(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::MAX
    }
}

fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dims];
    for vertex in simplex.iter().enumerate().filter(|(i, _)| *i != exclude).map(|(_, v)| v) {
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v / count;
        }
    }
    centroid
}

/// `origin + coef * (point - origin)`; a negative coefficient reflects.
fn towards(origin: &[f64], point: &[f64], coef: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + coef * (p - o))
        .collect()
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| b.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
            .collect(),
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn nelder_mead_rosenbrock_with_restarts() {
        let config = NelderMeadConfig::default()
            .max_iter(5000)
            .tolerance(1e-12)
            .restarts(3);

        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            &config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_with_bounds() {
        // Unconstrained optimum x=5 lies outside [0, 3]
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            &NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_treats_nan_as_worst() {
        // Objective undefined for x < 0
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.5],
            None,
            &NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_one_dimension_does_not_stop_while_straddling() {
        // The first simplex lands on 0.5 and 1.5, which share the same value
        let result = nelder_mead(
            |x| (x[0] - 1.0).powi(2),
            &[0.5],
            None,
            &NelderMeadConfig::default().initial_step(2.0),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
        assert!(result.optimal_value < 1e-8);
    }

    #[test]
    fn nelder_mead_unimproved_restart_counts_as_converged() {
        // A flat objective never lets the simplex improve, only shrink
        let single = nelder_mead(|_| 1.0, &[0.3, 0.7], None, &NelderMeadConfig::default().max_iter(5));
        let restarted = nelder_mead(
            |_| 1.0,
            &[0.3, 0.7],
            None,
            &NelderMeadConfig::default().max_iter(5).restarts(3),
        );

        assert!(!single.converged);
        assert!(restarted.converged);
        assert_eq!(restarted.iterations, 10);
        assert_relative_eq!(restarted.optimal_value, 1.0);
    }

    #[test]
    fn nelder_mead_empty_initial() {
        let result = nelder_mead(|_| 0.0, &[], None, &NelderMeadConfig::default());

        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }

    #[test]
    fn nelder_mead_restarts_accumulate_iterations() {
        let single = nelder_mead(
            |x| x[0].powi(2) + x[1].powi(2),
            &[1.0, 2.0],
            None,
            &NelderMeadConfig::default(),
        );
        let restarted = nelder_mead(
            |x| x[0].powi(2) + x[1].powi(2),
            &[1.0, 2.0],
            None,
            &NelderMeadConfig::default().restarts(2),
        );

        assert!(restarted.iterations >= single.iterations);
        assert!(restarted.optimal_value <= single.optimal_value);
    }
}
