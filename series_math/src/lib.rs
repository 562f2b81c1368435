//! # Series Math
//!
//! Numerical building blocks for fitting linear time series models.
//! This crate provides the pieces an ARIMA-family estimator is assembled
//! from:
//!
//! - Differencing and integration of a series
//! - Bounded Nelder-Mead simplex minimisation
//! - Descriptive statistics
//! - Numerical Hessians and small dense matrix inversion

use thiserror::Error;

pub mod differencing;
pub mod linalg;
pub mod optimization;
pub mod stats;

pub use differencing::{difference, integrate};
pub use linalg::{invert_matrix, numerical_hessian};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, std_dev, variance, DescriptiveStats};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::InsufficientData("need 3 values, have 1".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 values, have 1"
        );
    }
}
