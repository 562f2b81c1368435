//! Validated forecast requests

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use crate::order::ModelOrderSpec;

/// Largest accepted forecast horizon, in days
pub const MAX_HORIZON: i64 = 30;

/// Everything one submission needs: the in-sample rows, the order and the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    in_sample: Vec<TimeSeriesRow>,
    order: ModelOrderSpec,
    horizon: usize,
}

impl ForecastRequest {
    /// Validate the horizon and the in-sample window.
    ///
    /// Fails with a validation error when `horizon` is outside
    /// `[0, MAX_HORIZON]` or the window holds no rows.
    pub fn new(in_sample: &[TimeSeriesRow], order: ModelOrderSpec, horizon: i64) -> Result<Self> {
        if !(0..=MAX_HORIZON).contains(&horizon) {
            return Err(ForecastError::ValidationError(format!(
                "number of steps to forecast must be between 0 and {}, got {}",
                MAX_HORIZON, horizon
            )));
        }
        if in_sample.is_empty() {
            return Err(ForecastError::ValidationError(
                "The in-sample window contains no rows".to_string(),
            ));
        }

        Ok(Self {
            in_sample: in_sample.to_vec(),
            order,
            horizon: horizon as usize,
        })
    }

    pub fn in_sample(&self) -> &[TimeSeriesRow] {
        &self.in_sample
    }

    pub fn order(&self) -> ModelOrderSpec {
        self.order
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}
