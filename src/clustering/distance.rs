//! Distances between feature vectors.

/// Squared Euclidean distance. Mismatched lengths give infinity.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance. Mismatched lengths give infinity.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Full symmetric matrix of Euclidean distances between rows.
pub fn pairwise_distances(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&rows[i], &rows[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

/// Index and squared distance of the nearest centroid.
pub(crate) fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut nearest = 0;
    let mut min_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(point, c);
        if d < min_dist {
            min_dist = d;
            nearest = i;
        }
    }
    (nearest, min_dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn euclidean_three_four_five() {
        assert_relative_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_relative_eq!(squared_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn mismatched_lengths_are_infinite() {
        assert!(euclidean_distance(&[1.0], &[1.0, 2.0]).is_infinite());
    }

    #[test]
    fn pairwise_is_symmetric_with_zero_diagonal() {
        let rows = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 2.0]];
        let m = pairwise_distances(&rows);
        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..3 {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
        assert_relative_eq!(m[1][2], 5.0_f64.sqrt());
    }

    #[test]
    fn nearest_centroid_picks_first_on_tie() {
        let centroids = vec![vec![-1.0], vec![1.0]];
        assert_eq!(nearest_centroid(&[0.0], &centroids).0, 0);
        let (idx, dist) = nearest_centroid(&[0.9], &centroids);
        assert_eq!(idx, 1);
        assert_relative_eq!(dist, 0.01, epsilon = 1e-12);
    }
}
