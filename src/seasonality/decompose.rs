//! Classical additive decomposition.
//!
//! observed = trend + seasonal + residual, where
//! - trend is a centered moving average over one period,
//! - seasonal is the mean detrended value per phase, centered to mean 0,
//! - residual is what remains.
//!
//! The first and last `period / 2` points have no trend or residual (NaN).

use crate::core::{SalesRecord, SalesSeries};
use crate::error::{AnalyticsError, Result};
use crate::transform::centered_moving_average;
use crate::utils::stats::{nan_mean, variance};
use chrono::NaiveDate;
use tracing::debug;

/// Period used for daily sales when none is given.
pub const DEFAULT_PERIOD: usize = 30;

/// Result of an additive decomposition, aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionResult {
    pub observed: Vec<f64>,
    /// NaN at the edges.
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    /// NaN at the edges.
    pub residual: Vec<f64>,
    pub period: usize,
    /// Dates of the observations when decomposed from dated input.
    pub dates: Option<Vec<NaiveDate>>,
}

impl DecompositionResult {
    /// Indices where trend and residual are defined.
    pub fn defined_range(&self) -> std::ops::Range<usize> {
        let half = self.period / 2;
        half..self.observed.len().saturating_sub(half)
    }

    /// Seasonal strength (0 to 1) over the defined region.
    /// Values close to 1 indicate strong seasonality.
    pub fn seasonal_strength(&self) -> f64 {
        let range = self.defined_range();
        let residual = &self.residual[range.clone()];
        let seasonal_plus_residual: Vec<f64> = self.seasonal[range]
            .iter()
            .zip(residual)
            .map(|(s, r)| s + r)
            .collect();
        strength(residual, &seasonal_plus_residual)
    }

    /// Trend strength (0 to 1) over the defined region.
    /// Values close to 1 indicate strong trend.
    pub fn trend_strength(&self) -> f64 {
        let range = self.defined_range();
        let residual = &self.residual[range.clone()];
        let trend_plus_residual: Vec<f64> = self.trend[range]
            .iter()
            .zip(residual)
            .map(|(t, r)| t + r)
            .collect();
        strength(residual, &trend_plus_residual)
    }

    /// One seasonal cycle, starting at phase 0.
    pub fn seasonal_pattern(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }
}

fn strength(residual: &[f64], combined: &[f64]) -> f64 {
    let var_combined = variance(combined);
    if !(var_combined > 1e-10) {
        return 0.0;
    }
    (1.0 - variance(residual) / var_combined).max(0.0)
}

/// Classical additive decomposition with a fixed period.
#[derive(Debug, Clone)]
pub struct ClassicalDecomposition {
    period: usize,
}

impl Default for ClassicalDecomposition {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl ClassicalDecomposition {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose raw values.
    pub fn decompose(&self, values: &[f64]) -> Result<DecompositionResult> {
        let period = self.period;
        if period < 2 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "period must be at least 2, got {}",
                period
            )));
        }
        let needed = 2 * period;
        if values.len() < needed {
            return Err(AnalyticsError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::InvalidArgument(
                "values must be finite".into(),
            ));
        }

        let trend = centered_moving_average(values, period);
        let detrended: Vec<f64> = values.iter().zip(&trend).map(|(y, t)| y - t).collect();

        let mut phase_means: Vec<f64> = (0..period)
            .map(|phase| nan_mean(detrended.iter().skip(phase).step_by(period).copied()))
            .collect();
        let offset = phase_means.iter().sum::<f64>() / period as f64;
        for m in &mut phase_means {
            *m -= offset;
        }

        let seasonal: Vec<f64> = (0..values.len()).map(|i| phase_means[i % period]).collect();
        let residual = values
            .iter()
            .zip(trend.iter().zip(&seasonal))
            .map(|(y, (t, s))| y - t - s)
            .collect();

        debug!(n = values.len(), period, "classical decomposition");
        Ok(DecompositionResult {
            observed: values.to_vec(),
            trend,
            seasonal,
            residual,
            period,
            dates: None,
        })
    }

    /// Decompose a dated daily series.
    pub fn decompose_series(&self, series: &SalesSeries) -> Result<DecompositionResult> {
        let mut result = self.decompose(series.values())?;
        result.dates = Some(series.dates().to_vec());
        Ok(result)
    }

    /// Decompose the `sales` column of date-ordered records.
    pub fn decompose_records(&self, records: &[SalesRecord]) -> Result<DecompositionResult> {
        self.decompose_series(&SalesSeries::from_records(records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize, period: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 0.2 * i as f64 + 5.0 * (2.0 * PI * i as f64 / period as f64).sin())
            .collect()
    }

    #[test]
    fn decomposition_reconstructs_observed() {
        let values = seasonal_series(120, 12);
        let result = ClassicalDecomposition::new(12).decompose(&values).unwrap();

        for i in result.defined_range() {
            let rebuilt = result.trend[i] + result.seasonal[i] + result.residual[i];
            assert_relative_eq!(rebuilt, values[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn decomposition_edges_are_nan() {
        let values = seasonal_series(90, 30);
        let result = ClassicalDecomposition::default().decompose(&values).unwrap();

        for i in 0..15 {
            assert!(result.trend[i].is_nan());
            assert!(result.residual[i].is_nan());
            assert!(result.trend[89 - i].is_nan());
        }
        assert!(result.trend[15].is_finite());
        assert!(result.trend[74].is_finite());
        assert!(result.seasonal.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn odd_period_edges() {
        let values = seasonal_series(35, 7);
        let result = ClassicalDecomposition::new(7).decompose(&values).unwrap();
        assert!(result.trend[2].is_nan());
        assert!(result.trend[3].is_finite());
        assert!(result.trend[31].is_finite());
        assert!(result.trend[32].is_nan());
    }

    #[test]
    fn seasonal_component_is_centered_and_periodic() {
        let values = seasonal_series(120, 12);
        let result = ClassicalDecomposition::new(12).decompose(&values).unwrap();

        let cycle_sum: f64 = result.seasonal_pattern().iter().sum();
        assert_relative_eq!(cycle_sum, 0.0, epsilon = 1e-9);
        for i in 12..120 {
            assert_relative_eq!(result.seasonal[i], result.seasonal[i - 12]);
        }
        // Recovers the injected sine amplitude
        let peak = result.seasonal_pattern().iter().cloned().fold(f64::MIN, f64::max);
        assert_relative_eq!(peak, 5.0, epsilon = 0.3);
    }

    #[test]
    fn strengths_on_clean_series() {
        let values = seasonal_series(240, 12);
        let result = ClassicalDecomposition::new(12).decompose(&values).unwrap();
        assert!(result.seasonal_strength() > 0.9);
        assert!(result.trend_strength() > 0.9);
    }

    #[test]
    fn too_short_series_fails() {
        let values = seasonal_series(59, 30);
        assert_eq!(
            ClassicalDecomposition::default().decompose(&values).unwrap_err(),
            AnalyticsError::InsufficientData { needed: 60, got: 59 }
        );
    }

    #[test]
    fn decompose_series_keeps_dates() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let series = SalesSeries::from_values(start, seasonal_series(60, 30));
        let result = ClassicalDecomposition::default()
            .decompose_series(&series)
            .unwrap();
        assert_eq!(result.dates.as_ref().unwrap()[0], start);
        assert_eq!(result.observed.len(), 60);
    }

    #[test]
    fn invalid_period() {
        assert!(ClassicalDecomposition::new(1).decompose(&[1.0; 10]).is_err());
    }
}
