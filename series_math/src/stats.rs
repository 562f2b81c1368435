//! Descriptive statistics over plain `f64` slices, backed by `statrs`.
//! Empty input is an error here rather than a NaN.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

fn non_empty<'a>(values: &'a [f64], what: &str) -> Result<&'a [f64]> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(format!(
            "{} of an empty series is undefined",
            what
        )));
    }
    Ok(values)
}

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    Ok(non_empty(values, "Mean")?.iter().mean())
}

/// Population variance (divides by `n`)
pub fn variance(values: &[f64]) -> Result<f64> {
    Ok(non_empty(values, "Variance")?.iter().population_variance())
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(non_empty(values, "Standard deviation")?.iter().population_std_dev())
}

/// Summary statistics of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Compute summary statistics for a non-empty slice
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let values = non_empty(values, "Summary")?;
        let mean = values.iter().mean();
        let std_dev = values.iter().population_std_dev();
        let min = Statistics::min(values.iter());
        let max = Statistics::max(values.iter());

        Ok(Self {
            count: values.len(),
            min,
            max,
            mean,
            std_dev,
        })
    }
}
