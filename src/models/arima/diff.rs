//! Differencing and integration for ARIMA.

/// Difference a series `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    (0..d).fold(series.to_vec(), |acc, _| {
        acc.windows(2).map(|w| w[1] - w[0]).collect()
    })
}

/// Undo `d` rounds of differencing for values that continue `original`.
///
/// `differenced` holds future values on the `d`-times differenced scale;
/// the last observation at each intermediate level of `original` anchors
/// the cumulative sums.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let anchors: Vec<f64> = (0..d)
        .map(|level| difference(original, level).last().copied().unwrap_or(0.0))
        .collect();

    anchors.iter().rev().fold(differenced.to_vec(), |acc, &anchor| {
        acc.iter()
            .scan(anchor, |level, &x| {
                *level += x;
                Some(*level)
            })
            .collect()
    })
}

/// Cumulative sums applied `d` times, turning ARMA ψ-weights into
/// ARIMA ψ-weights.
pub(crate) fn cumulate(weights: &[f64], d: usize) -> Vec<f64> {
    (0..d).fold(weights.to_vec(), |acc, _| {
        acc.iter()
            .scan(0.0, |sum, &w| {
                *sum += w;
                Some(*sum)
            })
            .collect()
    })
}
