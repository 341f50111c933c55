//! Common interface for unsupervised outlier scorers.

use crate::error::Result;

/// An outlier scorer fitted on standardized feature rows.
///
/// Scores are oriented so that lower means more anomalous.
pub trait OutlierModel {
    /// Fit the model to `rows`.
    fn fit(&mut self, rows: &[Vec<f64>]) -> Result<()>;

    /// Score one observation against the fitted model.
    fn score_row(&self, row: &[f64]) -> Result<f64>;

    /// Score every row.
    fn score(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.score_row(row)).collect()
    }

    /// Fit on `rows` and return the scores of those same rows.
    ///
    /// Neighbour-based models override this to leave each row out of its
    /// own neighbourhood.
    fn fit_score(&mut self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.fit(rows)?;
        self.score(rows)
    }

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool;
}

