//! Unsupervised anomaly detection.
//!
//! Three interchangeable scorers share the [`OutlierModel`] trait:
//! Isolation Forest, Local Outlier Factor and a ν One-Class SVM. The
//! [`AnomalyDetector`] standardizes customer features, runs one of them and
//! flags the worst `contamination` fraction.

mod traits;

pub mod customer;
pub mod isolation_forest;
pub mod lof;
pub mod ocsvm;

pub use customer::{
    flag_lowest, AnomalyConfig, AnomalyDetector, AnomalyMethod, AnomalyModel, AnomalyReport,
    AnomalyResult,
};
pub use isolation_forest::{average_path_length, IsolationForest, IsolationForestConfig};
pub use lof::{LocalOutlierFactor, LofConfig};
pub use ocsvm::{Kernel, OneClassSvm, OneClassSvmConfig};
pub use traits::OutlierModel;
