//! Descriptive sales aggregates and per-cluster customer profiles.

use crate::clustering::ClusterAssignment;
use crate::core::{CustomerRecord, SalesRecord};
use crate::error::{AnalyticsError, Result};
use crate::transform::rolling_mean;
use crate::utils::stats::{mean, SummaryStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default trailing window for the rolling mean, in days.
pub const DEFAULT_ROLLING_WINDOW: usize = 30;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Calendar aggregates of a daily sales history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesProfile {
    /// Mean sales per weekday, Monday first; 0 for weekdays with no data.
    pub weekday_means: [f64; 7],
    /// Mean sales per calendar month, January first; 0 for absent months.
    pub monthly_means: [f64; 12],
    /// Total sales per year, ascending.
    pub yearly_totals: Vec<(i32, f64)>,
    /// Trailing rolling mean aligned with the input; NaN until the window fills.
    pub rolling_mean: Vec<f64>,
    pub rolling_window: usize,
    pub summary: SummaryStats,
}

impl SalesProfile {
    /// Profile with the default 30-day rolling window.
    pub fn from_records(records: &[SalesRecord]) -> Result<Self> {
        Self::with_window(records, DEFAULT_ROLLING_WINDOW)
    }

    pub fn with_window(records: &[SalesRecord], window: usize) -> Result<Self> {
        if records.is_empty() {
            return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
        }
        if window == 0 {
            return Err(AnalyticsError::InvalidArgument("rolling window must be positive".into()));
        }

        let mut weekday = [(0.0, 0usize); 7];
        let mut monthly = [(0.0, 0usize); 12];
        let mut yearly: BTreeMap<i32, f64> = BTreeMap::new();
        for r in records {
            let w = &mut weekday[r.weekday as usize];
            w.0 += r.sales;
            w.1 += 1;
            let m = &mut monthly[(r.month - 1) as usize];
            m.0 += r.sales;
            m.1 += 1;
            *yearly.entry(r.year).or_insert(0.0) += r.sales;
        }
        let group_mean = |(sum, count): (f64, usize)| if count == 0 { 0.0 } else { sum / count as f64 };

        let sales: Vec<f64> = records.iter().map(|r| r.sales).collect();
        Ok(Self {
            weekday_means: weekday.map(group_mean),
            monthly_means: monthly.map(group_mean),
            yearly_totals: yearly.into_iter().collect(),
            rolling_mean: rolling_mean(&sales, window),
            rolling_window: window,
            summary: SummaryStats::from_values(&sales),
        })
    }

    /// Weekday with the highest mean sales.
    pub fn busiest_weekday(&self) -> &'static str {
        let (idx, _) = self
            .weekday_means
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        WEEKDAY_NAMES[idx]
    }
}

/// Behavioural averages of one customer segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub count: usize,
    pub avg_purchase_value: f64,
    pub purchase_frequency: f64,
    pub return_rate: f64,
    pub customer_value: f64,
}

/// Profile every cluster of `assignment`; clusters without members have
/// NaN means.
///
/// `customers` must be in the order the assignment was produced from.
pub fn cluster_profiles(
    customers: &[CustomerRecord],
    assignment: &ClusterAssignment,
) -> Result<Vec<ClusterProfile>> {
    if customers.len() != assignment.labels.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: assignment.labels.len(),
            got: customers.len(),
        });
    }

    let mut members: Vec<Vec<&CustomerRecord>> = vec![Vec::new(); assignment.k];
    for (c, &label) in customers.iter().zip(&assignment.labels) {
        members[label].push(c);
    }

    Ok(members
        .iter()
        .enumerate()
        .map(|(cluster, group)| {
            let avg = |f: fn(&CustomerRecord) -> f64| mean(&group.iter().map(|c| f(c)).collect::<Vec<_>>());
            ClusterProfile {
                cluster,
                count: group.len(),
                avg_purchase_value: avg(|c| c.avg_purchase_value),
                purchase_frequency: avg(|c| c.purchase_frequency),
                return_rate: avg(|c| c.return_rate),
                customer_value: avg(|c| c.customer_value),
            }
        })
        .collect())
}
