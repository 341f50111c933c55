//! Silhouette coefficient and model selection over k.

use super::distance::pairwise_distances;
use super::kmeans::{kmeans, KMeansConfig};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::info;

/// Mean silhouette coefficient of a labelling.
///
/// For each row, `a` is the mean distance to the other members of its
/// cluster and `b` the smallest mean distance to another cluster;
/// `s = (b - a) / max(a, b)`. Rows alone in their cluster score 0.
///
/// # Errors
/// `InvalidArgument` unless the number of distinct labels is in `[2, n-1]`.
pub fn silhouette_score(rows: &[Vec<f64>], labels: &[usize]) -> Result<f64> {
    if rows.len() != labels.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: rows.len(),
            got: labels.len(),
        });
    }
    let distances = pairwise_distances(rows);
    silhouette_from_distances(&distances, labels)
}

fn silhouette_from_distances(distances: &[Vec<f64>], labels: &[usize]) -> Result<f64> {
    let n = labels.len();
    let k = labels.iter().max().map_or(0, |&m| m + 1);
    let mut sizes = vec![0usize; k];
    for &l in labels {
        sizes[l] += 1;
    }
    let present = sizes.iter().filter(|&&s| s > 0).count();
    if present < 2 || present > n.saturating_sub(1) {
        return Err(AnalyticsError::InvalidArgument(format!(
            "silhouette needs between 2 and {} clusters, got {}",
            n.saturating_sub(1),
            present
        )));
    }

    let mut total = 0.0;
    let mut sums = vec![0.0; k];
    for i in 0..n {
        let own = labels[i];
        if sizes[own] == 1 {
            continue;
        }

        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            sums[labels[j]] += distances[i][j];
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}

/// Silhouette of every candidate k and the best one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteScan {
    /// `(k, mean silhouette)` in ascending k.
    pub scores: Vec<(usize, f64)>,
    /// k with the highest score; the smallest such k on ties.
    pub best_k: usize,
}

impl SilhouetteScan {
    pub fn best_score(&self) -> f64 {
        self.scores
            .iter()
            .find(|(k, _)| *k == self.best_k)
            .map_or(f64::NAN, |(_, s)| *s)
    }
}

/// Run k-means for each k in `ks` and pick the k with the highest mean
/// silhouette.
///
/// `base` supplies every setting except `k`.
///
/// # Errors
/// `InvalidArgument` if the range is empty or any k is outside `[2, n-1]`.
pub fn silhouette_scan(
    rows: &[Vec<f64>],
    ks: RangeInclusive<usize>,
    base: &KMeansConfig,
) -> Result<SilhouetteScan> {
    let n = rows.len();
    if ks.is_empty() {
        return Err(AnalyticsError::InvalidArgument("empty k range".into()));
    }
    if *ks.start() < 2 || *ks.end() + 1 > n {
        return Err(AnalyticsError::InvalidArgument(format!(
            "k range {}..={} must lie within [2, {}]",
            ks.start(),
            ks.end(),
            n.saturating_sub(1)
        )));
    }

    let distances = pairwise_distances(rows);
    let mut scores = Vec::with_capacity(ks.clone().count());
    for k in ks {
        let result = kmeans(rows, &base.clone().k(k))?;
        let score = silhouette_from_distances(&distances, &result.labels)?;
        scores.push((k, score));
    }

    let best_k = scores
        .iter()
        .fold(None::<(usize, f64)>, |best, &(k, s)| match best {
            Some((_, bs)) if bs >= s => best,
            _ => Some((k, s)),
        })
        .map(|(k, _)| k)
        .ok_or_else(|| AnalyticsError::InvalidArgument("empty k range".into()))?;

    info!(best_k, candidates = scores.len(), "silhouette scan complete");
    Ok(SilhouetteScan { scores, best_k })
}
