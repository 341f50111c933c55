//! Supervised sales forecast from calendar features.
//!
//! Features per day: weekday, month, year and day-of-year (standardized with
//! statistics of the training rows only) followed by the 0/1 flags
//! is_weekend, is_holiday and is_promotion (passed through unscaled).

use crate::core::{Forecast, SalesRecord};
use crate::error::{AnalyticsError, Result};
use crate::models::tree::{BoostingConfig, ForestConfig, GradientBoosting, RandomForest};
use crate::models::Regressor;
use crate::transform::StandardScaler;
use crate::utils::cross_validation::{train_test_split, AggregatedMetrics, TimeSeriesSplit};
use crate::utils::metrics::{calculate_metrics, AccuracyMetrics};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Feature names in model column order.
pub const REGRESSION_FEATURES: [&str; 7] = [
    "weekday",
    "month",
    "year",
    "day_of_year",
    "is_weekend",
    "is_holiday",
    "is_promotion",
];

/// Number of leading columns that are standardized.
const SCALED_FEATURES: usize = 4;

/// Which fitted regressor to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionModel {
    RandomForest,
    GradientBoosting,
}

/// Settings for training and evaluating the regression models.
#[derive(Debug, Clone)]
pub struct SalesRegressionConfig {
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the holdout shuffle.
    pub seed: u64,
    pub forest: ForestConfig,
    pub boosting: BoostingConfig,
    /// Folds for time-ordered cross-validation.
    pub cv_splits: usize,
}

impl Default for SalesRegressionConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
            cv_splits: 5,
        }
    }
}

impl SalesRegressionConfig {
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Seed shared by the split and the forest's bootstrap.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.forest = self.forest.seed(seed);
        self
    }

    pub fn forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn boosting(mut self, boosting: BoostingConfig) -> Self {
        self.boosting = boosting;
        self
    }

    pub fn cv_splits(mut self, n: usize) -> Self {
        self.cv_splits = n;
        self
    }
}

/// Holdout evaluation of one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: RegressionModel,
    pub holdout: AccuracyMetrics,
    /// Aligned with [`REGRESSION_FEATURES`].
    pub feature_importances: Vec<f64>,
}

/// Both fitted regressors with the scaler their inputs require.
#[derive(Debug, Clone)]
pub struct SalesModelBundle {
    scaler: StandardScaler,
    forest: RandomForest,
    boosting: GradientBoosting,
    reports: [ModelReport; 2],
    n_train: usize,
    n_test: usize,
}

impl SalesModelBundle {
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn report(&self, model: RegressionModel) -> &ModelReport {
        match model {
            RegressionModel::RandomForest => &self.reports[0],
            RegressionModel::GradientBoosting => &self.reports[1],
        }
    }

    pub fn reports(&self) -> &[ModelReport] {
        &self.reports
    }

    /// Rows used for training and for the holdout.
    pub fn split_sizes(&self) -> (usize, usize) {
        (self.n_train, self.n_test)
    }

    fn regressor(&self, model: RegressionModel) -> &dyn Regressor {
        match model {
            RegressionModel::RandomForest => &self.forest,
            RegressionModel::GradientBoosting => &self.boosting,
        }
    }

    /// Predict sales for existing records.
    pub fn predict_records(&self, records: &[SalesRecord], model: RegressionModel) -> Result<Vec<f64>> {
        let x = scaled_features(&self.scaler, records)?;
        self.regressor(model).predict(&x)
    }

    /// Forecast the `horizon` days after `last_date` with holiday and
    /// promotion flags set to false.
    pub fn forecast(&self, last_date: NaiveDate, horizon: usize, model: RegressionModel) -> Result<Forecast> {
        self.forecast_with_flags(last_date, horizon, model, |_| (false, false))
    }

    /// Forecast the `horizon` days after `last_date`; `flags` returns
    /// `(is_holiday, is_promotion)` for each future date.
    pub fn forecast_with_flags<F>(
        &self,
        last_date: NaiveDate,
        horizon: usize,
        model: RegressionModel,
        flags: F,
    ) -> Result<Forecast>
    where
        F: Fn(NaiveDate) -> (bool, bool),
    {
        let records: Vec<SalesRecord> = (1..=horizon)
            .map(|h| {
                let date = last_date + Duration::days(h as i64);
                let (holiday, promotion) = flags(date);
                SalesRecord::new(date, 0.0, holiday, promotion)
            })
            .collect();
        let values = self.predict_records(&records, model)?;
        Forecast::from_values(records.iter().map(|r| r.date).collect(), values)
    }
}

/// Unscaled feature row in [`REGRESSION_FEATURES`] order.
pub fn raw_features(record: &SalesRecord) -> Vec<f64> {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    vec![
        record.weekday as f64,
        record.month as f64,
        record.year as f64,
        record.day_of_year as f64,
        flag(record.is_weekend),
        flag(record.is_holiday),
        flag(record.is_promotion),
    ]
}

fn fit_scaler(records: &[&SalesRecord]) -> Result<StandardScaler> {
    let calendar: Vec<Vec<f64>> = records
        .iter()
        .map(|r| raw_features(r)[..SCALED_FEATURES].to_vec())
        .collect();
    StandardScaler::fit(&calendar)
}

fn scale_row(scaler: &StandardScaler, record: &SalesRecord) -> Result<Vec<f64>> {
    let raw = raw_features(record);
    let mut row = scaler.transform_row(&raw[..SCALED_FEATURES])?;
    row.extend_from_slice(&raw[SCALED_FEATURES..]);
    Ok(row)
}

fn scaled_features(scaler: &StandardScaler, records: &[SalesRecord]) -> Result<Vec<Vec<f64>>> {
    records.iter().map(|r| scale_row(scaler, r)).collect()
}

fn fit_pair(
    config: &SalesRegressionConfig,
    train: &[&SalesRecord],
) -> Result<(StandardScaler, RandomForest, GradientBoosting)> {
    let scaler = fit_scaler(train)?;
    let x: Vec<Vec<f64>> = train
        .iter()
        .map(|r| scale_row(&scaler, r))
        .collect::<Result<_>>()?;
    let y: Vec<f64> = train.iter().map(|r| r.sales).collect();

    let mut forest = RandomForest::new(config.forest.clone());
    forest.fit(&x, &y)?;
    let mut boosting = GradientBoosting::new(config.boosting.clone());
    boosting.fit(&x, &y)?;
    Ok((scaler, forest, boosting))
}

fn evaluate(
    scaler: &StandardScaler,
    model: &dyn Regressor,
    rows: &[&SalesRecord],
) -> Result<AccuracyMetrics> {
    let predictions = rows
        .iter()
        .map(|r| model.predict_row(&scale_row(scaler, r)?))
        .collect::<Result<Vec<f64>>>()?;
    let actual: Vec<f64> = rows.iter().map(|r| r.sales).collect();
    calculate_metrics(&actual, &predictions)
}

/// Train both regressors on a seeded shuffled holdout split.
pub fn train_sales_models(
    records: &[SalesRecord],
    config: &SalesRegressionConfig,
) -> Result<SalesModelBundle> {
    let (train_idx, test_idx) = train_test_split(records.len(), config.test_fraction, config.seed)?;
    let train: Vec<&SalesRecord> = train_idx.iter().map(|&i| &records[i]).collect();
    let test: Vec<&SalesRecord> = test_idx.iter().map(|&i| &records[i]).collect();

    let (scaler, forest, boosting) = fit_pair(config, &train)?;

    let report = |model: RegressionModel, regressor: &dyn Regressor| -> Result<ModelReport> {
        Ok(ModelReport {
            model,
            holdout: evaluate(&scaler, regressor, &test)?,
            feature_importances: regressor
                .feature_importances()
                .map(<[f64]>::to_vec)
                .unwrap_or_else(|| vec![0.0; REGRESSION_FEATURES.len()]),
        })
    };
    let reports = [
        report(RegressionModel::RandomForest, &forest)?,
        report(RegressionModel::GradientBoosting, &boosting)?,
    ];

    info!(
        train = train.len(),
        test = test.len(),
        forest_rmse = reports[0].holdout.rmse,
        boosting_rmse = reports[1].holdout.rmse,
        "sales regression models trained"
    );

    Ok(SalesModelBundle {
        scaler,
        forest,
        boosting,
        reports,
        n_train: train.len(),
        n_test: test.len(),
    })
}

/// Errors of both models on one time-ordered fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub forest: AccuracyMetrics,
    pub boosting: AccuracyMetrics,
}

/// Per-fold and aggregated errors from time-ordered cross-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldReport>,
    pub forest: AggregatedMetrics,
    pub boosting: AggregatedMetrics,
}

/// Evaluate both models with an expanding window over date-ordered records.
///
/// The scaler and models are refitted on every fold's training rows.
pub fn cross_validate_sales_models(
    records: &[SalesRecord],
    config: &SalesRegressionConfig,
) -> Result<CrossValidationReport> {
    if records.windows(2).any(|w| w[1].date <= w[0].date) {
        return Err(AnalyticsError::InvalidArgument(
            "records must be strictly ordered by date".into(),
        ));
    }

    let rows: Vec<&SalesRecord> = records.iter().collect();
    let mut folds = Vec::new();
    for (k, fold) in TimeSeriesSplit::new(config.cv_splits)
        .split(records.len())?
        .into_iter()
        .enumerate()
    {
        let train = &rows[fold.train.clone()];
        let test = &rows[fold.test.clone()];
        let (scaler, forest, boosting) = fit_pair(config, train)?;
        let report = FoldReport {
            fold: k,
            train_size: train.len(),
            test_size: test.len(),
            forest: evaluate(&scaler, &forest, test)?,
            boosting: evaluate(&scaler, &boosting, test)?,
        };
        debug!(
            fold = k,
            forest_rmse = report.forest.rmse,
            boosting_rmse = report.boosting.rmse,
            "cross-validation fold"
        );
        folds.push(report);
    }

    let forest_metrics: Vec<AccuracyMetrics> = folds.iter().map(|f| f.forest).collect();
    let boosting_metrics: Vec<AccuracyMetrics> = folds.iter().map(|f| f.boosting).collect();
    Ok(CrossValidationReport {
        forest: AggregatedMetrics::from_folds(&forest_metrics),
        boosting: AggregatedMetrics::from_folds(&boosting_metrics),
        folds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::create_sample_sales_data;
    use approx::assert_relative_eq;

    fn small_config() -> SalesRegressionConfig {
        SalesRegressionConfig::default()
            .forest(ForestConfig::default().n_estimators(10))
            .boosting(BoostingConfig::default().n_rounds(20).max_depth(4))
    }

    #[test]
    fn raw_features_layout() {
        // 2022-01-01 was a Saturday
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let row = raw_features(&SalesRecord::new(date, 10.0, true, false));
        assert_eq!(row, vec![5.0, 1.0, 2022.0, 1.0, 1.0, 1.0, 0.0]);
        assert_eq!(row.len(), REGRESSION_FEATURES.len());
    }

    #[test]
    fn bundle_trains_on_eighty_percent() {
        let records = create_sample_sales_data(200, 42).unwrap();
        let bundle = train_sales_models(&records, &small_config()).unwrap();

        assert_eq!(bundle.split_sizes(), (160, 40));
        assert_eq!(bundle.scaler().dims(), SCALED_FEATURES);
        for report in bundle.reports() {
            assert!(report.holdout.rmse.is_finite());
            assert_eq!(report.feature_importances.len(), REGRESSION_FEATURES.len());
            assert_relative_eq!(report.feature_importances.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn bundle_beats_mean_baseline_on_holdout() {
        let records = create_sample_sales_data(365, 42).unwrap();
        let bundle = train_sales_models(&records, &small_config()).unwrap();

        let sales: Vec<f64> = records.iter().map(|r| r.sales).collect();
        let mean = sales.iter().sum::<f64>() / sales.len() as f64;
        let std = (sales.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / sales.len() as f64).sqrt();

        let report = bundle.report(RegressionModel::RandomForest);
        assert!(report.holdout.rmse < std);
    }

    #[test]
    fn bundle_forecasts_future_dates() {
        let records = create_sample_sales_data(200, 1).unwrap();
        let bundle = train_sales_models(&records, &small_config()).unwrap();
        let last = records.last().unwrap().date;

        let forecast = bundle
            .forecast(last, 14, RegressionModel::GradientBoosting)
            .unwrap();
        assert_eq!(forecast.horizon(), 14);
        assert_eq!(forecast.dates()[0], last + Duration::days(1));
        assert_eq!(forecast.dates()[13], last + Duration::days(14));
        assert!(forecast.values().iter().all(|v| v.is_finite()));

        let flagged = bundle
            .forecast_with_flags(last, 3, RegressionModel::RandomForest, |_| (true, true))
            .unwrap();
        assert_eq!(flagged.horizon(), 3);
    }

    #[test]
    fn cross_validation_folds_respect_time_order() {
        let records = create_sample_sales_data(120, 3).unwrap();
        let report = cross_validate_sales_models(&records, &small_config()).unwrap();

        assert_eq!(report.folds.len(), 5);
        // test_size = 120 / 6 = 20
        assert_eq!(report.folds[0].train_size, 20);
        assert_eq!(report.folds[4].train_size, 100);
        for fold in &report.folds {
            assert_eq!(fold.test_size, 20);
            assert!(fold.forest.rmse >= fold.forest.mae);
            assert!(fold.boosting.rmse >= fold.boosting.mae);
        }
        assert!(report.forest.rmse.is_finite());
    }

    #[test]
    fn cross_validation_rejects_unordered_records() {
        let mut records = create_sample_sales_data(60, 3).unwrap();
        records.swap(0, 1);
        assert!(cross_validate_sales_models(&records, &small_config()).is_err());
    }

    #[test]
    fn training_needs_enough_rows() {
        let records = create_sample_sales_data(1, 3).unwrap();
        assert!(train_sales_models(&records, &small_config()).is_err());
    }
}
