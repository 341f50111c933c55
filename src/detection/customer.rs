//! Customer anomaly detection with a uniform flagging contract.
//!
//! Whatever the algorithm, every customer gets a score oriented so that
//! lower is more anomalous, and the `round(contamination · n)` lowest
//! scores are flagged (ties broken by input order).

use super::isolation_forest::{IsolationForest, IsolationForestConfig};
use super::lof::{LocalOutlierFactor, LofConfig};
use super::ocsvm::{OneClassSvm, OneClassSvmConfig};
use super::traits::OutlierModel;
use crate::core::CustomerRecord;
use crate::error::{AnalyticsError, Result};
use crate::transform::StandardScaler;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scoring algorithm with its settings.
#[derive(Debug, Clone)]
pub enum AnomalyMethod {
    IsolationForest(IsolationForestConfig),
    LocalOutlierFactor(LofConfig),
    OneClassSvm(OneClassSvmConfig),
}

impl Default for AnomalyMethod {
    fn default() -> Self {
        AnomalyMethod::IsolationForest(IsolationForestConfig::default())
    }
}

impl AnomalyMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AnomalyMethod::IsolationForest(_) => "IsolationForest",
            AnomalyMethod::LocalOutlierFactor(_) => "LocalOutlierFactor",
            AnomalyMethod::OneClassSvm(_) => "OneClassSVM",
        }
    }

    fn build(&self) -> Detector {
        match self {
            AnomalyMethod::IsolationForest(c) => Detector::IsolationForest(IsolationForest::new(c.clone())),
            AnomalyMethod::LocalOutlierFactor(c) => Detector::Lof(LocalOutlierFactor::new(c.clone())),
            AnomalyMethod::OneClassSvm(c) => Detector::Svm(OneClassSvm::new(c.clone())),
        }
    }
}

/// Detector settings.
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    pub method: AnomalyMethod,
    /// Fraction of customers to flag, in [0, 1].
    pub contamination: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            method: AnomalyMethod::default(),
            contamination: 0.05,
        }
    }
}

impl AnomalyConfig {
    pub fn method(mut self, method: AnomalyMethod) -> Self {
        self.method = method;
        self
    }

    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }
}

/// Fitted algorithm behind an [`AnomalyModel`].
#[derive(Debug, Clone)]
enum Detector {
    IsolationForest(IsolationForest),
    Lof(LocalOutlierFactor),
    Svm(OneClassSvm),
}

impl Detector {
    fn model(&self) -> &dyn OutlierModel {
        match self {
            Detector::IsolationForest(m) => m,
            Detector::Lof(m) => m,
            Detector::Svm(m) => m,
        }
    }

    fn model_mut(&mut self) -> &mut dyn OutlierModel {
        match self {
            Detector::IsolationForest(m) => m,
            Detector::Lof(m) => m,
            Detector::Svm(m) => m,
        }
    }
}

/// Per-customer outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub customer_id: String,
    pub is_anomaly: bool,
    /// Lower is more anomalous.
    pub anomaly_score: f64,
}

/// Scores and flags for every customer, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub method: String,
    pub contamination: f64,
    pub results: Vec<AnomalyResult>,
}

impl AnomalyReport {
    pub fn anomaly_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_anomaly).count()
    }

    pub fn anomaly_fraction(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.anomaly_count() as f64 / self.results.len() as f64
        }
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AnomalyResult> {
        self.results.iter().filter(|r| r.is_anomaly)
    }

    pub fn get(&self, customer_id: &str) -> Option<&AnomalyResult> {
        self.results.iter().find(|r| r.customer_id == customer_id)
    }
}

/// Fitted scaler, algorithm and score threshold for new customers.
#[derive(Debug, Clone)]
pub struct AnomalyModel {
    scaler: StandardScaler,
    detector: Detector,
    threshold: f64,
}

impl AnomalyModel {
    pub fn name(&self) -> &str {
        self.detector.model().name()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Highest score that was flagged; `-inf` when nothing was.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score(&self, customer: &CustomerRecord) -> Result<f64> {
        let z = self.scaler.transform_row(&customer.anomaly_features())?;
        self.detector.model().score_row(&z)
    }

    pub fn classify(&self, customer: &CustomerRecord) -> Result<AnomalyResult> {
        let anomaly_score = self.score(customer)?;
        Ok(AnomalyResult {
            customer_id: customer.customer_id.clone(),
            is_anomaly: anomaly_score <= self.threshold,
            anomaly_score,
        })
    }
}

/// Anomaly detector over the six behavioural customer features.
///
/// # Example
///
/// ```
/// use mursis_analytics::data::create_customer_data;
/// use mursis_analytics::detection::{AnomalyConfig, AnomalyDetector};
///
/// let data = create_customer_data(200, 42).unwrap();
/// let detector = AnomalyDetector::new(AnomalyConfig::default().contamination(0.1));
/// let (report, _model) = detector.detect(&data.customers).unwrap();
/// assert_eq!(report.anomaly_count(), 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Standardize, fit, score and flag.
    ///
    /// # Errors
    /// `InvalidArgument` if contamination is outside [0, 1]; errors from
    /// the chosen algorithm otherwise.
    pub fn detect(&self, customers: &[CustomerRecord]) -> Result<(AnomalyReport, AnomalyModel)> {
        let contamination = self.config.contamination;
        if !(0.0..=1.0).contains(&contamination) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "contamination must be in [0, 1], got {}",
                contamination
            )));
        }
        if customers.is_empty() {
            return Err(AnalyticsError::InsufficientData { needed: 2, got: 0 });
        }

        let raw: Vec<Vec<f64>> = customers
            .iter()
            .map(CustomerRecord::anomaly_features)
            .collect();
        let (scaler, rows) = StandardScaler::fit_transform(&raw)?;

        let mut detector = self.config.method.build();
        let scores = detector.model_mut().fit_score(&rows)?;
        let flags = flag_lowest(&scores, contamination);
        let threshold = scores
            .iter()
            .zip(&flags)
            .filter(|(_, &f)| f)
            .map(|(&s, _)| s)
            .fold(f64::NEG_INFINITY, f64::max);

        let results: Vec<AnomalyResult> = customers
            .iter()
            .zip(scores)
            .zip(flags)
            .map(|((c, anomaly_score), is_anomaly)| AnomalyResult {
                customer_id: c.customer_id.clone(),
                is_anomaly,
                anomaly_score,
            })
            .collect();

        let report = AnomalyReport {
            method: self.config.method.name().to_string(),
            contamination,
            results,
        };
        info!(
            method = %report.method,
            customers = customers.len(),
            flagged = report.anomaly_count(),
            "anomaly detection finished"
        );

        Ok((
            report,
            AnomalyModel {
                scaler,
                detector,
                threshold,
            },
        ))
    }
}

/// Flag the `round(fraction · n)` lowest scores; equal scores keep input order.
pub fn flag_lowest(scores: &[f64], fraction: f64) -> Vec<bool> {
    let n = scores.len();
    let m = ((fraction * n as f64).round() as usize).min(n);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut flags = vec![false; n];
    for &i in &order[..m] {
        flags[i] = true;
    }
    flags
}
