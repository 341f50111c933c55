//! Dated forecast result.

use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Point predictions for consecutive future days, with optional intervals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    dates: Vec<NaiveDate>,
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from dates and point predictions.
    pub fn from_values(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            dates,
            point: values,
            lower: None,
            upper: None,
        })
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        let n = dates.len();
        for len in [values.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(AnalyticsError::DimensionMismatch {
                    expected: n,
                    got: len,
                });
            }
        }
        Ok(Self {
            dates,
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Iterate over the forecast as dated points.
    pub fn points(&self) -> impl Iterator<Item = ForecastPoint> + '_ {
        (0..self.point.len()).map(move |i| ForecastPoint {
            date: self.dates[i],
            predicted_sales: self.point[i],
            lower: self.lower.as_ref().map(|l| l[i]),
            upper: self.upper.as_ref().map(|u| u[i]),
        })
    }
}
