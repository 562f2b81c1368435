//! Error types for the forecast_pipeline crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_pipeline crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to loading or reading the input table
    #[error("Data error: {0}")]
    DataError(String),

    /// A control value is outside its declared bounds, or the request is empty
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The in-sample window is too short for the requested order
    #[error("Fit error: insufficient data for {order}, need at least {needed} observations, got {got}")]
    InsufficientData {
        order: String,
        needed: usize,
        got: usize,
    },

    /// The estimation routine failed
    #[error("Fit error: {0}")]
    FitError(String),

    /// A date or number in the input could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Error from a numerical routine
    #[error("Math error: {0}")]
    MathError(#[from] series_math::MathError),
}

impl ForecastError {
    /// Whether this error rejects the inputs before any computation
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ForecastError::ValidationError(_))
    }

    /// Whether this error comes from fitting the model
    pub fn is_fit_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. }
                | ForecastError::FitError(_)
                | ForecastError::MathError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::JsonError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}
