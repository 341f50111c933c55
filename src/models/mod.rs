//! Forecasting and regression models.

mod traits;

pub mod arima;
pub mod sales_regression;
pub mod tree;

pub use arima::{ARIMASpec, ARIMA};
pub use sales_regression::{
    cross_validate_sales_models, train_sales_models, CrossValidationReport, ModelReport,
    RegressionModel, SalesModelBundle, SalesRegressionConfig, REGRESSION_FEATURES,
};
pub use traits::{Forecaster, Regressor};

use crate::core::{Forecast, SalesRecord, SalesSeries};
use crate::error::Result;
use tracing::info;

/// Coverage of the intervals returned by [`arima_forecast`].
pub const FORECAST_INTERVAL_LEVEL: f64 = 0.95;

/// Fit ARIMA(5,1,2) to daily sales and forecast `horizon` days with 95%
/// intervals.
pub fn arima_forecast(records: &[SalesRecord], horizon: usize) -> Result<Forecast> {
    let series = SalesSeries::from_records(records)?;
    let mut model = ARIMA::default();
    model.fit(&series)?;
    let forecast = model.predict_with_intervals(horizon, FORECAST_INTERVAL_LEVEL)?;
    info!(
        observations = series.len(),
        horizon,
        aic = model.aic(),
        "ARIMA forecast produced"
    );
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::create_sample_sales_data;
    use chrono::Duration;

    #[test]
    fn arima_forecast_is_dated_after_history() {
        let records = create_sample_sales_data(365, 42).unwrap();
        let forecast = arima_forecast(&records, 30).unwrap();
        let last = records.last().unwrap().date;

        assert_eq!(forecast.horizon(), 30);
        assert_eq!(forecast.dates()[0], last + Duration::days(1));
        assert_eq!(forecast.dates()[29], last + Duration::days(30));
        assert!(forecast.has_intervals());
        assert!(forecast.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn arima_forecast_fits_generated_sales_across_seeds_and_lengths() {
        for days in [120, 200, 365, 400, 730, 1095] {
            for seed in [1, 3, 7, 42, 99] {
                let records = create_sample_sales_data(days, seed).unwrap();
                let forecast = arima_forecast(&records, 14)
                    .unwrap_or_else(|e| panic!("days={days} seed={seed}: {e}"));

                assert_eq!(forecast.horizon(), 14);
                assert!(forecast.values().iter().all(|v| v.is_finite()));
                let (lower, upper) = (forecast.lower().unwrap(), forecast.upper().unwrap());
                assert!(lower.iter().zip(upper).all(|(l, u)| l.is_finite() && u.is_finite() && l <= u));
            }
        }
    }

    #[test]
    fn arima_forecast_rejects_short_history() {
        let records = create_sample_sales_data(5, 42).unwrap();
        assert!(arima_forecast(&records, 7).is_err());
    }
}
