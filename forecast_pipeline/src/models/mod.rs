//! Forecasting models for time series data

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Point forecast with optional prediction intervals
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Lower and upper interval bounds (optional)
    intervals: Option<Vec<(f64, f64)>>,
}

impl ModelForecast {
    /// Create a new forecast
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
        })
    }

    /// Create a new forecast with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut forecast = Self::new(values, horizons)?;
        forecast.intervals = Some(intervals);
        Ok(forecast)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Split into values and intervals
    pub fn into_parts(self) -> (Vec<f64>, Option<Vec<(f64, f64)>>) {
        (self.values, self.intervals)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ModelForecast>;

    /// One-step-ahead predictions over the training rows
    fn fitted_values(&self) -> Vec<f64>;

    /// Human-readable fit report
    fn summary(&self) -> String;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on time series data
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on ascending rows
    fn train(&self, rows: &[TimeSeriesRow]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod arima;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_length_checks() {
        assert!(ModelForecast::new(vec![1.0, 2.0], 3).is_err());
        assert!(ModelForecast::new_with_intervals(vec![1.0], 1, vec![]).is_err());

        let forecast =
            ModelForecast::new_with_intervals(vec![1.0], 1, vec![(0.5, 1.5)]).unwrap();
        assert_eq!(forecast.horizons(), 1);
        assert_eq!(forecast.intervals(), Some(&[(0.5, 1.5)][..]));
    }

    #[test]
    fn test_empty_forecast() {
        let forecast = ModelForecast::new(Vec::new(), 0).unwrap();
        assert!(forecast.values().is_empty());
        assert_eq!(forecast.intervals(), None);
    }
}
