//! Record types for sales, customer and product data.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One day of sales with its calendar covariates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub sales: f64,
    /// Day of week, Monday = 0.
    pub weekday: u32,
    pub month: u32,
    pub year: i32,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub is_promotion: bool,
    pub day_of_year: u32,
}

impl SalesRecord {
    /// Build a record, deriving all calendar fields from `date`.
    pub fn new(date: NaiveDate, sales: f64, is_holiday: bool, is_promotion: bool) -> Self {
        let weekday = date.weekday().num_days_from_monday();
        Self {
            date,
            sales,
            weekday,
            month: date.month(),
            year: date.year(),
            is_weekend: weekday >= 5,
            is_holiday,
            is_promotion,
            day_of_year: date.ordinal(),
        }
    }
}

/// Behavioural summary of a single customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub avg_purchase_value: f64,
    pub purchase_frequency: f64,
    pub return_rate: f64,
    pub loyalty_years: f64,
    pub avg_basket_size: f64,
    pub pct_discount_used: f64,
    pub customer_value: f64,
}

impl CustomerRecord {
    /// Build a record and compute `customer_value` from the other fields.
    pub fn new(
        customer_id: impl Into<String>,
        avg_purchase_value: f64,
        purchase_frequency: f64,
        return_rate: f64,
        loyalty_years: f64,
        avg_basket_size: f64,
        pct_discount_used: f64,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            avg_purchase_value,
            purchase_frequency,
            return_rate,
            loyalty_years,
            avg_basket_size,
            pct_discount_used,
            customer_value: customer_value(
                avg_purchase_value,
                purchase_frequency,
                return_rate,
                loyalty_years,
            ),
        }
    }

    /// Features used by the segmenter, in fixed order.
    pub fn segmentation_features(&self) -> Vec<f64> {
        vec![
            self.avg_purchase_value,
            self.purchase_frequency,
            self.return_rate,
            self.loyalty_years,
            self.customer_value,
        ]
    }

    /// Features used by the anomaly detectors, in fixed order.
    pub fn anomaly_features(&self) -> Vec<f64> {
        vec![
            self.avg_purchase_value,
            self.purchase_frequency,
            self.return_rate,
            self.loyalty_years,
            self.avg_basket_size,
            self.pct_discount_used,
        ]
    }
}

/// Names matching [`CustomerRecord::segmentation_features`].
pub const SEGMENTATION_FEATURES: [&str; 5] = [
    "avg_purchase_value",
    "purchase_frequency",
    "return_rate",
    "loyalty_years",
    "customer_value",
];

/// Names matching [`CustomerRecord::anomaly_features`].
pub const ANOMALY_FEATURES: [&str; 6] = [
    "avg_purchase_value",
    "purchase_frequency",
    "return_rate",
    "loyalty_years",
    "avg_basket_size",
    "pct_discount_used",
];

/// Lifetime value heuristic:
/// `apv × frequency × (1 − return_rate) × (1 + 0.1 × loyalty_years)`.
pub fn customer_value(
    avg_purchase_value: f64,
    purchase_frequency: f64,
    return_rate: f64,
    loyalty_years: f64,
) -> f64 {
    avg_purchase_value * purchase_frequency * (1.0 - return_rate) * (1.0 + loyalty_years * 0.1)
}

/// A catalog entry for the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u32,
    pub product_name: String,
    pub description: String,
}

impl Product {
    pub fn new(product_id: u32, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            product_id,
            product_name: name.into(),
            description: description.into(),
        }
    }
}
