//! Error types for the analytics engine.

use thiserror::Error;

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while generating, loading or analysing data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A parameter is outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Not enough observations for the requested operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A model could not be fitted to the supplied data.
    #[error("model fit failed: {0}")]
    ModelFitFailure(String),

    /// A requested key (product id, table name, ...) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required input column is missing or a table layout does not match.
    #[error("schema mismatch at column '{column}'")]
    SchemaMismatch { column: String },

    /// A cell could not be parsed.
    #[error("parse error at row {row}, column '{column}': {detail}")]
    Parse {
        row: usize,
        column: String,
        detail: String,
    },

    /// Filesystem or CSV transport failure.
    #[error("i/o error on '{path}': {detail}")]
    Io { path: String, detail: String },

    /// Row lengths or feature counts disagree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model must be fitted before use.
    #[error("model must be fitted before prediction")]
    FitRequired,
}

impl AnalyticsError {
    /// Shorthand for a schema error naming the missing column.
    pub fn missing_column(column: impl Into<String>) -> Self {
        AnalyticsError::SchemaMismatch {
            column: column.into(),
        }
    }

    pub(crate) fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        AnalyticsError::Io {
            path: path.to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnalyticsError::InsufficientData { needed: 60, got: 10 };
        assert_eq!(err.to_string(), "insufficient data: need at least 60, got 10");

        let err = AnalyticsError::InvalidArgument("k must be positive".to_string());
        assert_eq!(err.to_string(), "invalid argument: k must be positive");

        let err = AnalyticsError::missing_column("sales");
        assert_eq!(err.to_string(), "schema mismatch at column 'sales'");

        let err = AnalyticsError::Parse {
            row: 3,
            column: "date".to_string(),
            detail: "bad date".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at row 3, column 'date': bad date"
        );

        let err = AnalyticsError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = AnalyticsError::NotFound("product 999".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
