//! K-means clustering on feature vectors.
//!
//! Lloyd iterations from seeded k-means++ starts; the run with the lowest
//! inertia across `n_init` starts is kept.

use super::distance::{nearest_centroid, squared_euclidean};
use crate::error::{AnalyticsError, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Independent k-means++ starts
    pub n_init: usize,
    /// Maximum Lloyd iterations per start
    pub max_iter: usize,
    /// Stop when the total squared centroid shift falls below this
    pub tolerance: f64,
    /// Random seed for initialization
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    /// Set number of clusters.
    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set maximum iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// K-means clustering result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    /// Cluster label of each row (0-indexed)
    pub labels: Vec<usize>,
    /// Cluster centroids
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Iterations of the kept run
    pub n_iter: usize,
}

impl KMeansResult {
    /// Indices of rows in a specific cluster.
    pub fn cluster_members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Size of each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Cluster `rows` into `config.k` groups.
///
/// # Errors
/// `InvalidArgument` when `k` is 0 or exceeds the number of rows,
/// `DimensionMismatch` for ragged rows.
pub fn kmeans(rows: &[Vec<f64>], config: &KMeansConfig) -> Result<KMeansResult> {
    let n = rows.len();
    if config.k == 0 || config.k > n {
        return Err(AnalyticsError::InvalidArgument(format!(
            "k must be in [1, {}], got {}",
            n, config.k
        )));
    }
    let dims = rows[0].len();
    if let Some(bad) = rows.iter().find(|r| r.len() != dims) {
        return Err(AnalyticsError::DimensionMismatch {
            expected: dims,
            got: bad.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<KMeansResult> = None;
    for _ in 0..config.n_init.max(1) {
        let centroids = kmeans_plus_plus(rows, config.k, &mut rng);
        let run = lloyd(rows, centroids, config);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    let best = best.ok_or_else(|| AnalyticsError::ModelFitFailure("no k-means run".into()))?;
    debug!(
        k = config.k,
        inertia = best.inertia,
        n_iter = best.n_iter,
        "k-means finished"
    );
    Ok(best)
}

/// D² seeding: each next centroid is drawn with probability proportional
/// to its squared distance from the nearest chosen centroid.
fn kmeans_plus_plus(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..n)].clone());

    let mut closest: Vec<f64> = rows
        .iter()
        .map(|r| squared_euclidean(r, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let next = match WeightedIndex::new(&closest) {
            Ok(dist) => dist.sample(rng),
            // every row already coincides with a centroid
            Err(_) => rng.gen_range(0..n),
        };
        let chosen = rows[next].clone();
        for (c, r) in closest.iter_mut().zip(rows) {
            *c = c.min(squared_euclidean(r, &chosen));
        }
        centroids.push(chosen);
    }

    centroids
}

fn lloyd(rows: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, config: &KMeansConfig) -> KMeansResult {
    let k = centroids.len();
    let mut labels = vec![0; rows.len()];
    let mut n_iter = 0;

    for iter in 0..config.max_iter {
        n_iter = iter + 1;
        let mut distances = vec![0.0; rows.len()];
        for (i, row) in rows.iter().enumerate() {
            let (label, dist) = nearest_centroid(row, &centroids);
            labels[i] = label;
            distances[i] = dist;
        }
        fill_empty_clusters(&mut labels, &mut distances, k);

        let updated = cluster_means(rows, &labels, k);
        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_euclidean(a, b))
            .sum();
        centroids = updated;
        if shift < config.tolerance {
            break;
        }
    }

    for (i, row) in rows.iter().enumerate() {
        labels[i] = nearest_centroid(row, &centroids).0;
    }
    let inertia = inertia(rows, &labels, &centroids);

    KMeansResult {
        labels,
        centroids,
        inertia,
        n_iter,
    }
}

/// Move the row farthest from its centroid into each empty cluster.
fn fill_empty_clusters(labels: &mut [usize], distances: &mut [f64], k: usize) {
    let mut sizes = vec![0usize; k];
    for &l in labels.iter() {
        sizes[l] += 1;
    }
    for cluster in 0..k {
        if sizes[cluster] > 0 {
            continue;
        }
        let donor = (0..labels.len())
            .filter(|&i| sizes[labels[i]] > 1)
            .max_by(|&a, &b| distances[a].total_cmp(&distances[b]));
        if let Some(i) = donor {
            sizes[labels[i]] -= 1;
            sizes[cluster] = 1;
            labels[i] = cluster;
            distances[i] = 0.0;
        }
    }
}

fn cluster_means(rows: &[Vec<f64>], labels: &[usize], k: usize) -> Vec<Vec<f64>> {
    let dims = rows[0].len();
    let mut sums = vec![vec![0.0; dims]; k];
    let mut counts = vec![0usize; k];
    for (row, &l) in rows.iter().zip(labels) {
        counts[l] += 1;
        for (s, x) in sums[l].iter_mut().zip(row) {
            *s += x;
        }
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            sum.iter_mut().for_each(|s| *s /= count as f64);
        }
    }
    sums
}

/// Within-cluster sum of squared distances.
pub fn inertia(rows: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
    rows.iter()
        .zip(labels)
        .map(|(r, &l)| squared_euclidean(r, &centroids[l]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_groups() -> Vec<Vec<f64>> {
        vec![
            // low
            vec![1.0, 2.0],
            vec![1.5, 2.5],
            vec![1.2, 2.2],
            // high
            vec![10.0, 11.0],
            vec![10.5, 11.5],
            vec![10.2, 11.2],
        ]
    }

    // ==================== kmeans ====================

    #[test]
    fn kmeans_finds_clusters() {
        let result = kmeans(&two_groups(), &KMeansConfig::default().k(2)).unwrap();

        assert_eq!(result.labels.len(), 6);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[1], result.labels[2]);
        assert_eq!(result.labels[3], result.labels[4]);
        assert_eq!(result.labels[4], result.labels[5]);
        assert_ne!(result.labels[0], result.labels[3]);
        assert_eq!(result.cluster_sizes(), vec![3, 3]);
    }

    #[test]
    fn kmeans_is_deterministic_under_seed() {
        let config = KMeansConfig::default().k(3).seed(7);
        let a = kmeans(&two_groups(), &config).unwrap();
        let b = kmeans(&two_groups(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn kmeans_single_cluster_centroid_is_mean() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let result = kmeans(&data, &KMeansConfig::default().k(1)).unwrap();

        assert!(result.labels.iter().all(|&l| l == 0));
        assert_relative_eq!(result.centroids[0][0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(result.centroids[0][1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(result.inertia, 16.0, epsilon = 1e-10);
    }

    #[test]
    fn kmeans_k_equals_n() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let result = kmeans(&data, &KMeansConfig::default().k(3)).unwrap();

        assert_relative_eq!(result.inertia, 0.0, epsilon = 1e-10);
        let mut sizes = result.cluster_sizes();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn kmeans_handles_duplicate_points() {
        let data = vec![vec![1.0]; 5];
        let result = kmeans(&data, &KMeansConfig::default().k(3)).unwrap();
        assert_eq!(result.centroids.len(), 3);
        assert_eq!(result.cluster_sizes().iter().sum::<usize>(), 5);
        assert_relative_eq!(result.inertia, 0.0);
    }

    #[test]
    fn kmeans_rejects_bad_k() {
        let data = two_groups();
        assert!(matches!(
            kmeans(&data, &KMeansConfig::default().k(0)),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(matches!(
            kmeans(&data, &KMeansConfig::default().k(7)),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn kmeans_rejects_ragged_rows() {
        let data = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            kmeans(&data, &KMeansConfig::default().k(1)),
            Err(AnalyticsError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn more_starts_never_increase_inertia() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64, (i % 5) as f64 * 1.5])
            .collect();
        let one = kmeans(&data, &KMeansConfig::default().k(4).n_init(1)).unwrap();
        let ten = kmeans(&data, &KMeansConfig::default().k(4).n_init(10)).unwrap();
        assert!(ten.inertia <= one.inertia + 1e-12);
    }

    // ==================== config builder ====================

    #[test]
    fn config_builder() {
        let config = KMeansConfig::default().k(5).max_iter(50).seed(123).n_init(0);

        assert_eq!(config.k, 5);
        assert_eq!(config.max_iter, 50);
        assert_eq!(config.seed, 123);
        assert_eq!(config.n_init, 1);
    }
}
