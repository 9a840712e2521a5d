//! Error types for the forecasting harness.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, splitting, fitting or deploying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Fewer observations than the operation requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A requested window falls outside the series or the windows overlap.
    #[error("range error: {0}")]
    Range(String),

    /// A transform or model was applied to values outside its domain.
    #[error("domain error: {0}")]
    Domain(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// The input file could not be read.
    #[error("load error: {0}")]
    Load(String),

    /// A field of the input could not be interpreted.
    #[error("parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Numerical failure (singular system, non-finite likelihood, ...).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Load(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Load(err.to_string())
    }
}
