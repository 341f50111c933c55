//! Rolling window functions.

/// Compute a trailing rolling mean.
///
/// Positions before the window fills are NaN.
///
/// # Arguments
/// * `series` - Input series
/// * `window` - Window size
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    let mut sum: f64 = series[..window].iter().sum();
    result[window - 1] = sum / window as f64;
    for i in window..n {
        sum += series[i] - series[i - window];
        result[i] = sum / window as f64;
    }

    result
}

/// Centered moving average for classical decomposition.
///
/// An odd `period` uses equal weights over `period` points. An even period
/// uses the 2×`period` filter: `period + 1` points with half weight on both
/// ends. The first and last `period / 2` positions are NaN because the
/// window does not fit there.
pub fn centered_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let weights = centered_weights(period);
    let half = weights.len() / 2;
    if n < weights.len() {
        return result;
    }

    for i in half..n - half {
        result[i] = weights
            .iter()
            .enumerate()
            .map(|(j, w)| w * series[i + j - half])
            .sum();
    }

    result
}

fn centered_weights(period: usize) -> Vec<f64> {
    let p = period as f64;
    if period % 2 == 1 {
        vec![1.0 / p; period]
    } else {
        let mut w = vec![1.0 / p; period + 1];
        w[0] = 0.5 / p;
        w[period] = 0.5 / p;
        w
    }
}
