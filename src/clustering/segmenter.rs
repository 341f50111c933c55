//! Customer segmentation on standardized behavioural features.

use super::distance::nearest_centroid;
use super::kmeans::{kmeans, KMeansConfig};
use super::silhouette::{silhouette_scan, SilhouetteScan};
use crate::core::{CustomerRecord, SEGMENTATION_FEATURES};
use crate::error::{AnalyticsError, Result};
use crate::transform::StandardScaler;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::info;

/// Segmenter settings.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// k-means settings; `k` is overridden per call.
    pub kmeans: KMeansConfig,
    /// Candidate cluster counts for the silhouette scan.
    pub k_range: RangeInclusive<usize>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            kmeans: KMeansConfig::default(),
            k_range: 2..=8,
        }
    }
}

impl SegmenterConfig {
    pub fn kmeans(mut self, kmeans: KMeansConfig) -> Self {
        self.kmeans = kmeans;
        self
    }

    pub fn k_range(mut self, range: RangeInclusive<usize>) -> Self {
        self.k_range = range;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.kmeans = self.kmeans.seed(seed);
        self
    }
}

/// Cluster label of every customer, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub customer_ids: Vec<String>,
    pub labels: Vec<usize>,
    pub k: usize,
}

impl ClusterAssignment {
    /// Label of a customer by id.
    pub fn label_of(&self, customer_id: &str) -> Option<usize> {
        self.customer_ids
            .iter()
            .position(|id| id == customer_id)
            .map(|i| self.labels[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.customer_ids
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().copied())
    }

    /// Customers per cluster.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    pub fn as_map(&self) -> HashMap<String, usize> {
        self.iter().map(|(id, l)| (id.to_string(), l)).collect()
    }
}

/// Fitted scaler and centroids; assigns new customers without refitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationModel {
    scaler: StandardScaler,
    centroids: Vec<Vec<f64>>,
}

impl SegmentationModel {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Centroids in standardized feature space.
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Centroids mapped back to original units, ordered as
    /// [`SEGMENTATION_FEATURES`].
    pub fn centroids_original_units(&self) -> Result<Vec<Vec<f64>>> {
        self.centroids
            .iter()
            .map(|c| self.scaler.inverse_row(c))
            .collect()
    }

    /// Nearest centroid for one customer.
    pub fn predict(&self, customer: &CustomerRecord) -> Result<usize> {
        let z = self.scaler.transform_row(&customer.segmentation_features())?;
        Ok(nearest_centroid(&z, &self.centroids).0)
    }

    pub fn predict_many(&self, customers: &[CustomerRecord]) -> Result<Vec<usize>> {
        customers.iter().map(|c| self.predict(c)).collect()
    }
}

/// Output of one segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub assignment: ClusterAssignment,
    pub model: SegmentationModel,
    /// Within-cluster sum of squares in standardized space.
    pub inertia: f64,
}

/// K-means segmentation of customers.
///
/// # Example
///
/// ```
/// use mursis_analytics::clustering::{CustomerSegmenter, SegmenterConfig};
/// use mursis_analytics::data::create_customer_data;
///
/// let data = create_customer_data(200, 42).unwrap();
/// let segmenter = CustomerSegmenter::new(SegmenterConfig::default());
/// let segmentation = segmenter.segment(&data.customers, 5).unwrap();
/// assert_eq!(segmentation.assignment.labels.len(), 200);
/// assert_eq!(segmentation.model.k(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CustomerSegmenter {
    config: SegmenterConfig,
}

impl CustomerSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Cluster customers into `k` segments.
    ///
    /// # Errors
    /// `InvalidArgument` if `k` is 0 or larger than the number of customers.
    pub fn segment(&self, customers: &[CustomerRecord], k: usize) -> Result<Segmentation> {
        if k == 0 || k > customers.len() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "k must be in [1, {}], got {}",
                customers.len(),
                k
            )));
        }
        let (scaler, rows) = standardized(customers)?;
        let result = kmeans(&rows, &self.config.kmeans.clone().k(k))?;

        info!(
            customers = customers.len(),
            k,
            inertia = result.inertia,
            "customers segmented"
        );

        Ok(Segmentation {
            assignment: ClusterAssignment {
                customer_ids: customers.iter().map(|c| c.customer_id.clone()).collect(),
                labels: result.labels,
                k,
            },
            model: SegmentationModel {
                scaler,
                centroids: result.centroids,
            },
            inertia: result.inertia,
        })
    }

    /// Mean silhouette for every k in the configured range.
    pub fn silhouette_scan(&self, customers: &[CustomerRecord]) -> Result<SilhouetteScan> {
        let (_, rows) = standardized(customers)?;
        silhouette_scan(&rows, self.config.k_range.clone(), &self.config.kmeans)
    }

    /// Scan the k range, then segment with the best k.
    pub fn segment_best(&self, customers: &[CustomerRecord]) -> Result<(Segmentation, SilhouetteScan)> {
        let scan = self.silhouette_scan(customers)?;
        let segmentation = self.segment(customers, scan.best_k)?;
        Ok((segmentation, scan))
    }
}

fn standardized(customers: &[CustomerRecord]) -> Result<(StandardScaler, Vec<Vec<f64>>)> {
    let raw: Vec<Vec<f64>> = customers
        .iter()
        .map(CustomerRecord::segmentation_features)
        .collect();
    debug_assert!(raw.iter().all(|r| r.len() == SEGMENTATION_FEATURES.len()));
    StandardScaler::fit_transform(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::create_customer_data;

    fn customer(id: &str, apv: f64, freq: f64) -> CustomerRecord {
        CustomerRecord::new(id, apv, freq, 0.1, 2.0, 5.0, 0.2)
    }

    #[test]
    fn segment_assigns_every_customer() {
        let data = create_customer_data(300, 42).unwrap();
        let seg = CustomerSegmenter::default()
            .segment(&data.customers, 5)
            .unwrap();

        assert_eq!(seg.assignment.labels.len(), 300);
        assert_eq!(seg.assignment.sizes().iter().sum::<usize>(), 300);
        assert!(seg.assignment.labels.iter().all(|&l| l < 5));
        assert_eq!(seg.model.centroids().len(), 5);
    }

    #[test]
    fn segmentation_is_deterministic_under_seed() {
        let data = create_customer_data(150, 7).unwrap();
        let segmenter = CustomerSegmenter::new(SegmenterConfig::default().seed(11));
        let a = segmenter.segment(&data.customers, 4).unwrap();
        let b = segmenter.segment(&data.customers, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn model_reproduces_training_labels() {
        let data = create_customer_data(200, 3).unwrap();
        let seg = CustomerSegmenter::default()
            .segment(&data.customers, 3)
            .unwrap();
        let predicted = seg.model.predict_many(&data.customers).unwrap();
        assert_eq!(predicted, seg.assignment.labels);
    }

    #[test]
    fn separated_groups_land_in_different_segments() {
        let mut customers: Vec<CustomerRecord> = (0..5)
            .map(|i| customer(&format!("L{i}"), 100.0 + i as f64, 1.0))
            .collect();
        customers.extend((0..5).map(|i| customer(&format!("H{i}"), 9000.0 + i as f64, 40.0)));

        let seg = CustomerSegmenter::default().segment(&customers, 2).unwrap();
        let low = seg.assignment.label_of("L0").unwrap();
        let high = seg.assignment.label_of("H0").unwrap();
        assert_ne!(low, high);
        assert_eq!(seg.assignment.label_of("L4"), Some(low));
        assert_eq!(seg.assignment.label_of("missing"), None);

        let centroids = seg.model.centroids_original_units().unwrap();
        assert!(centroids[high][0] > centroids[low][0]);
    }

    #[test]
    fn segment_rejects_bad_k() {
        let data = create_customer_data(10, 1).unwrap();
        let segmenter = CustomerSegmenter::default();
        assert!(matches!(
            segmenter.segment(&data.customers, 0),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(matches!(
            segmenter.segment(&data.customers, 11),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn scan_picks_k_within_range() {
        let data = create_customer_data(120, 42).unwrap();
        let segmenter = CustomerSegmenter::new(SegmenterConfig::default().k_range(2..=5));
        let (seg, scan) = segmenter.segment_best(&data.customers).unwrap();
        assert!((2..=5).contains(&scan.best_k));
        assert_eq!(seg.model.k(), scan.best_k);
        assert_eq!(scan.scores.len(), 4);
    }

    #[test]
    fn scan_rejects_range_beyond_data() {
        let data = create_customer_data(6, 42).unwrap();
        let segmenter = CustomerSegmenter::default();
        assert!(matches!(
            segmenter.silhouette_scan(&data.customers),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }
}
