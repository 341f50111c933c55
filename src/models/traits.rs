//! Forecaster trait defining the common interface for time-series models.

use crate::core::{Forecast, SalesSeries};
use crate::error::Result;

/// Common interface for models fitted on a regular daily series.
///
/// Forecasts are dated: step `h` is `h` days after the last fitted date.
pub trait Forecaster {
    /// Fit the model to the series.
    fn fit(&mut self, series: &SalesSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals at the given coverage level.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample one-step predictions.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// In-sample residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Common interface for supervised regressors on row-major feature matrices.
pub trait Regressor {
    /// Fit the model to features `x` and targets `y`.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one observation.
    fn predict_row(&self, row: &[f64]) -> Result<f64>;

    /// Predict every row.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Normalized per-feature importances, summing to 1 when any split was made.
    fn feature_importances(&self) -> Option<&[f64]>;

    fn name(&self) -> &str;
}
