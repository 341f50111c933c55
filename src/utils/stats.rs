//! Statistical utility functions.

use serde::{Deserialize, Serialize};

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean over the finite entries, NaN if there are none.
pub fn nan_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Count, mean, sample std, min and max of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Summarize a column. Empty input yields NaN statistics.
    pub fn from_values(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let empty = values.is_empty();
        Self {
            count: values.len(),
            mean: mean(values),
            std: std_dev(values),
            min: if empty { f64::NAN } else { min },
            max: if empty { f64::NAN } else { max },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn nan_mean_skips_missing() {
        assert_relative_eq!(nan_mean([1.0, f64::NAN, 3.0]), 2.0, epsilon = 1e-10);
        assert!(nan_mean([f64::NAN]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        // Sample variance of [1, 2, 3, 4, 5] = 2.5
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert!(variance(&[]).is_nan());
    }

    #[test]
    fn summary_stats_basic() {
        let s = SummaryStats::from_values(&[2.0, 4.0, 6.0]);
        assert_eq!(s.count, 3);
        assert_relative_eq!(s.mean, 4.0, epsilon = 1e-10);
        assert_relative_eq!(s.std, 2.0, epsilon = 1e-10);
        assert_relative_eq!(s.min, 2.0);
        assert_relative_eq!(s.max, 6.0);

        let empty = SummaryStats::from_values(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.min.is_nan() && empty.mean.is_nan());
    }
}
