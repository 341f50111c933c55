//! Core data structures shared by all analytical components.

mod forecast;
mod records;
mod series;

pub use forecast::{Forecast, ForecastPoint};
pub use records::{
    customer_value, CustomerRecord, Product, SalesRecord, ANOMALY_FEATURES, SEGMENTATION_FEATURES,
};
pub use series::SalesSeries;
