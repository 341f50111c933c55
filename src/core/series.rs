//! Daily sales series used by decomposition and ARIMA.

use crate::core::SalesRecord;
use crate::error::{AnalyticsError, Result};
use chrono::{Duration, NaiveDate};

/// A regular daily series of sales values.
///
/// Dates are strictly consecutive; decomposition and ARIMA both rely on a
/// regular frequency, so gaps are rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl SalesSeries {
    /// Create a series from parallel date and value vectors.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        for (i, pair) in dates.windows(2).enumerate() {
            if pair[1] - pair[0] != Duration::days(1) {
                return Err(AnalyticsError::InvalidArgument(format!(
                    "dates must be consecutive days: {} is followed by {} at position {}",
                    pair[0],
                    pair[1],
                    i + 1
                )));
            }
        }
        Ok(Self { dates, values })
    }

    /// Create a series starting at `start` with one value per day.
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Self {
        let dates = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self { dates, values }
    }

    /// Extract the `sales` column of date-ordered records.
    pub fn from_records(records: &[SalesRecord]) -> Result<Self> {
        Self::new(
            records.iter().map(|r| r.date).collect(),
            records.iter().map(|r| r.sales).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The `horizon` dates following the last observation.
    pub fn future_dates(&self, horizon: usize) -> Result<Vec<NaiveDate>> {
        let last = self
            .last_date()
            .ok_or(AnalyticsError::InsufficientData { needed: 1, got: 0 })?;
        Ok((1..=horizon)
            .map(|h| last + Duration::days(h as i64))
            .collect())
    }

    /// Sub-series over `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "slice {}..{} out of bounds for series of length {}",
                start,
                end,
                self.len()
            )));
        }
        Ok(Self {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_gaps() {
        let dates = vec![day(2022, 1, 1), day(2022, 1, 2), day(2022, 1, 4)];
        let err = SalesSeries::new(dates, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = SalesSeries::new(vec![day(2022, 1, 1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::DimensionMismatch { .. }));
    }

    #[test]
    fn future_dates_follow_last_observation() {
        let series = SalesSeries::from_values(day(2022, 12, 30), vec![1.0, 2.0]);
        let future = series.future_dates(3).unwrap();
        assert_eq!(future, vec![day(2023, 1, 1), day(2023, 1, 2), day(2023, 1, 3)]);
    }

    #[test]
    fn slice_keeps_alignment() {
        let series = SalesSeries::from_values(day(2022, 1, 1), vec![1.0, 2.0, 3.0, 4.0]);
        let sub = series.slice(1, 3).unwrap();
        assert_eq!(sub.values(), &[2.0, 3.0]);
        assert_eq!(sub.first_date(), Some(day(2022, 1, 2)));
        assert!(series.slice(3, 5).is_err());
    }
}
