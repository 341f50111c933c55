//! Shared numerical utilities.

pub mod cross_validation;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use cross_validation::{train_test_split, AggregatedMetrics, Fold, TimeSeriesSplit};
pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::SummaryStats;
