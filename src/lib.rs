//! # mursis-analytics
//!
//! Sales and customer analytics engine.
//!
//! Generates or loads daily sales and customer tables, decomposes sales
//! into trend and seasonality, forecasts with ARIMA and tree ensembles,
//! segments customers with k-means, flags anomalous customers, scores
//! RFM segments and recommends products by description similarity.
//! Results can be persisted through a small table store.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod clustering;
pub mod core;
pub mod data;
pub mod detection;
pub mod error;
pub mod models;
pub mod recommend;
pub mod seasonality;
pub mod store;
pub mod transform;
pub mod utils;

pub use error::{AnalyticsError, Result};

pub mod prelude {
    pub use crate::analysis::{rfm_scores, RfmConfig, SalesProfile};
    pub use crate::clustering::{CustomerSegmenter, SegmenterConfig};
    pub use crate::core::{CustomerRecord, Forecast, Product, SalesRecord, SalesSeries};
    pub use crate::data::{create_customer_data, create_sample_sales_data, create_tech_product_data};
    pub use crate::detection::{AnomalyConfig, AnomalyDetector, AnomalyMethod};
    pub use crate::error::{AnalyticsError, Result};
    pub use crate::models::{arima_forecast, train_sales_models, Forecaster, SalesRegressionConfig};
    pub use crate::recommend::ProductRecommender;
    pub use crate::seasonality::ClassicalDecomposition;
    pub use crate::store::{MemoryStore, TableStore};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
