//! Tree-based regressors used by the supervised sales forecast.

mod boosting;
mod cart;
mod forest;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use cart::{RegressionTree, TreeConfig};
pub use forest::{ForestConfig, RandomForest};
