//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{Forecast, SalesSeries};
use crate::error::{AnalyticsError, Result};
use crate::models::arima::diff::{cumulate, difference, integrate};
use crate::models::Forecaster;
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, std_dev};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1 // AR + MA + intercept
    }
}

/// The daily-sales order, ARIMA(5,1,2).
impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(5, 1, 2)
    }
}

/// ARIMA forecasting model fitted by conditional sum of squares.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// The differenced series is standardized before optimization; the stored
/// coefficients and intercept are on the differenced scale.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    optimizer: NelderMeadConfig,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    series: Option<SalesSeries>,
    differenced: Option<Vec<f64>>,
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    iterations: usize,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_spec(ARIMASpec::new(p, d, q))
    }

    pub fn with_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            optimizer: NelderMeadConfig::default()
                .max_iter(20_000)
                .tolerance(1e-6)
                .x_tolerance(1e-4)
                .restarts(3),
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            series: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            iterations: 0,
        }
    }

    /// Replace the optimizer settings used by `fit`.
    pub fn optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimated from the CSS residuals.
    pub fn residual_variance(&self) -> Option<f64> {
        self.residual_variance
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Optimizer iterations used by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn min_length(&self) -> usize {
        self.spec.d + self.spec.p.max(self.spec.q) + self.spec.num_params() + 1
    }

    /// One-step residuals of the recursion; zero before `max(p, q)`.
    fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64], mu: f64) -> Vec<f64> {
        let start = ar.len().max(ma.len());
        let mut residuals = vec![0.0; w.len()];
        for t in start..w.len() {
            let mut pred = mu;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (w[t - 1 - i] - mu);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * residuals[t - 1 - i];
            }
            residuals[t] = w[t] - pred;
        }
        residuals
    }

    fn css(w: &[f64], p: usize, params: &[f64]) -> f64 {
        let (mu, rest) = (params[0], &params[1..]);
        let (ar, ma) = rest.split_at(p);
        let start = p.max(ma.len());
        Self::css_residuals(w, ar, ma, mu)[start..]
            .iter()
            .map(|e| e * e)
            .sum()
    }

    /// AR starting values from a least-squares regression on lags.
    fn initial_ar(z: &[f64], p: usize) -> Vec<f64> {
        if p == 0 || z.len() <= 2 * p {
            return vec![0.0; p];
        }
        let rows: Vec<Vec<f64>> = (p..z.len())
            .map(|t| (1..=p).map(|lag| z[t - lag]).collect())
            .collect();
        match ols_fit(&rows, &z[p..]) {
            Ok(fit) => fit
                .coefficients
                .iter()
                .map(|c| c.clamp(-0.9, 0.9))
                .collect(),
            Err(_) => vec![0.0; p],
        }
    }

    fn estimate_parameters(&mut self, w: &[f64]) -> Result<()> {
        let (p, q) = (self.spec.p, self.spec.q);
        let center = mean(w);
        let sd = std_dev(w);
        if !sd.is_finite() || sd < 1e-12 {
            return Err(AnalyticsError::ModelFitFailure(
                "differenced series has zero variance".into(),
            ));
        }
        let z: Vec<f64> = w.iter().map(|x| (x - center) / sd).collect();

        let mut initial = vec![0.0];
        initial.extend(Self::initial_ar(&z, p));
        initial.extend(std::iter::repeat(0.0).take(q));

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let result = nelder_mead(
            |params| Self::css(&z, p, params),
            &initial,
            Some(&bounds),
            &self.optimizer,
        );
        self.iterations = result.iterations;

        if !result.optimal_value.is_finite() || result.optimal_value >= f64::MAX {
            warn!(iterations = result.iterations, "ARIMA objective has no finite optimum");
            return Err(AnalyticsError::ModelFitFailure(format!(
                "conditional sum of squares is not finite after {} iterations",
                result.iterations
            )));
        }
        if !result.converged {
            warn!(
                iterations = result.iterations,
                css = result.optimal_value,
                "ARIMA optimizer stopped at its iteration budget"
            );
        }

        self.intercept = center + sd * result.optimal_point[0];
        self.ar_coefficients = result.optimal_point[1..1 + p].to_vec();
        self.ma_coefficients = result.optimal_point[1 + p..].to_vec();
        Ok(())
    }

    fn calculate_fitted(&mut self, w: &[f64]) {
        let start = self.spec.p.max(self.spec.q);
        let residuals = Self::css_residuals(
            w,
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.intercept,
        );
        let fitted = w
            .iter()
            .zip(&residuals)
            .enumerate()
            .map(|(t, (x, e))| if t < start { f64::NAN } else { x - e })
            .collect();

        let valid = &residuals[start..];
        if !valid.is_empty() {
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            let n_eff = valid.len() as f64;
            let k = self.spec.num_params() as f64;
            let ll = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());

            self.residual_variance = Some(variance);
            self.aic = Some(-2.0 * ll + 2.0 * k);
            self.bic = Some(-2.0 * ll + k * n_eff.ln());
        }

        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }

    /// ψ-weights of the integrated process for the first `horizon` steps.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut psi = vec![0.0; horizon];
        if horizon == 0 {
            return psi;
        }
        psi[0] = 1.0;
        for j in 1..horizon {
            let mut value = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for (i, phi) in self.ar_coefficients.iter().enumerate().take(j) {
                value += phi * psi[j - 1 - i];
            }
            psi[j] = value;
        }
        cumulate(&psi, self.spec.d)
    }

    fn point_forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let series = self.series.as_ref().ok_or(AnalyticsError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(AnalyticsError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(AnalyticsError::FitRequired)?;

        let mut extended = w.clone();
        let mut shocks = residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * shocks[t - 1 - i];
                }
            }
            extended.push(pred);
            shocks.push(0.0);
        }

        Ok(integrate(&extended[w.len()..], series.values(), self.spec.d))
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::with_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ModelFitFailure(
                "series contains non-finite values".into(),
            ));
        }

        let min_len = self.min_length();
        if values.len() < min_len {
            return Err(AnalyticsError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let ARIMASpec { p, d, q } = self.spec;
        debug!(p, d, q, n = values.len(), "fitting ARIMA");

        let w = difference(values, d);
        self.estimate_parameters(&w)?;
        self.calculate_fitted(&w);
        self.differenced = Some(w);
        self.series = Some(series.clone());

        debug!(
            iterations = self.iterations,
            sigma2 = self.residual_variance.unwrap_or(f64::NAN),
            "ARIMA fitted"
        );
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let series = self.series.as_ref().ok_or(AnalyticsError::FitRequired)?;
        let values = self.point_forecast(horizon)?;
        Forecast::from_values(series.future_dates(horizon)?, values)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "interval level must be in (0, 1), got {}",
                level
            )));
        }
        let series = self.series.as_ref().ok_or(AnalyticsError::FitRequired)?;
        let preds = self.point_forecast(horizon)?;
        let sigma2 = self.residual_variance.unwrap_or(0.0);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AnalyticsError::ModelFitFailure(e.to_string()))?;
        let z = normal.inverse_cdf((1.0 + level) / 2.0);

        let mut cumulative = 0.0;
        let (lower, upper): (Vec<f64>, Vec<f64>) = self
            .psi_weights(horizon)
            .iter()
            .zip(&preds)
            .map(|(psi, pred)| {
                cumulative += psi * psi;
                let se = (sigma2 * cumulative).sqrt();
                (pred - z * se, pred + z * se)
            })
            .unzip();

        Forecast::from_values_with_intervals(series.future_dates(horizon)?, preds, lower, upper)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn noisy_trend(n: usize, seed: u64) -> SalesSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..n)
            .map(|i| 100.0 + 0.5 * i as f64 + 10.0 * (i as f64 * 0.3).sin() + rng.gen_range(-2.0..2.0))
            .collect();
        SalesSeries::from_values(start(), values)
    }

    fn ar1(n: usize, phi: f64, seed: u64) -> SalesSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut values = vec![0.0];
        for i in 1..n {
            values.push(phi * values[i - 1] + rng.sample(noise));
        }
        SalesSeries::from_values(start(), values)
    }

    #[test]
    fn arima_basic_fit() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&noisy_trend(120, 1)).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn arima_forecast_dates_follow_last_observation() {
        let series = noisy_trend(120, 2);
        let mut model = ARIMA::new(2, 1, 1);
        model.fit(&series).unwrap();

        let forecast = model.predict(10).unwrap();
        let last = series.last_date().unwrap();
        assert_eq!(forecast.dates()[0], last + chrono::Duration::days(1));
        assert_eq!(forecast.dates()[9], last + chrono::Duration::days(10));
    }

    #[test]
    fn arima_recovers_ar1_coefficient() {
        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&ar1(500, 0.7, 7)).unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.7, epsilon = 0.1);
        let sigma2 = model.residual_variance().unwrap();
        assert!(sigma2 > 0.7 && sigma2 < 1.3);
    }

    #[test]
    fn arima_differencing_follows_trend() {
        let series = noisy_trend(150, 3);
        let last = *series.values().last().unwrap();
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&series).unwrap();

        let forecast = model.predict(5).unwrap();
        assert!((forecast.values()[0] - last).abs() < 20.0);
    }

    #[test]
    fn arima_intervals_widen_with_horizon() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&noisy_trend(120, 4)).unwrap();

        let forecast = model.predict_with_intervals(8, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        let preds = forecast.values();

        for i in 0..8 {
            assert!(lower[i] <= preds[i] && preds[i] <= upper[i]);
        }
        for i in 1..8 {
            assert!(upper[i] - lower[i] >= upper[i - 1] - lower[i - 1] - 1e-9);
        }
    }

    #[test]
    fn arima_interval_level_validated() {
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&noisy_trend(60, 5)).unwrap();
        assert!(matches!(
            model.predict_with_intervals(3, 1.5),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn psi_weights_random_walk_are_ones() {
        // ARIMA(0,1,0): every ψ-weight of the integrated process is 1
        let model = ARIMA::new(0, 1, 0);
        assert_eq!(model.psi_weights(4), vec![1.0; 4]);
    }

    #[test]
    fn arima_information_criteria() {
        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&ar1(200, 0.5, 9)).unwrap();

        assert!(model.aic().is_some());
        assert!(model.bic().unwrap() >= model.aic().unwrap());
    }

    #[test]
    fn arima_linear_series_is_degenerate() {
        let values: Vec<f64> = (0..60).map(|i| 10.0 + 2.0 * i as f64).collect();
        let mut model = ARIMA::new(1, 1, 0);
        assert!(matches!(
            model.fit(&SalesSeries::from_values(start(), values)),
            Err(AnalyticsError::ModelFitFailure(_))
        ));
    }

    #[test]
    fn arima_non_finite_input_fails() {
        let mut values: Vec<f64> = (0..60).map(|i| (i as f64).sin()).collect();
        values[10] = f64::NAN;
        let mut model = ARIMA::default();
        assert!(matches!(
            model.fit(&SalesSeries::from_values(start(), values)),
            Err(AnalyticsError::ModelFitFailure(_))
        ));
    }

    #[test]
    fn arima_insufficient_data() {
        let mut model = ARIMA::new(2, 1, 1);
        let series = SalesSeries::from_values(start(), vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            model.fit(&series),
            Err(AnalyticsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::default();
        assert!(matches!(model.predict(5), Err(AnalyticsError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_default_is_512() {
        let spec = ARIMA::default().spec();
        assert_eq!((spec.p, spec.d, spec.q), (5, 1, 2));
        assert_eq!(spec.num_params(), 8);
    }

    #[test]
    fn arima_getters_after_fit() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&noisy_trend(80, 6)).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.fitted_values().unwrap().len(), 79);
        assert_eq!(model.residuals().unwrap().len(), 79);
        assert!(model.iterations() > 0);
        assert_eq!(model.name(), "ARIMA");
    }
}
