//! Fit a model on the in-sample window and forecast past its end

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, EstimatorConfig};
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::order::ModelOrderSpec;
use crate::packager::forecast_dates;
use crate::request::ForecastRequest;
use chrono::NaiveDate;
use serde::Serialize;

/// Output of one successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    forecast_values: Vec<f64>,
    forecast_timestamps: Vec<NaiveDate>,
    /// Estimator report, passed through unparsed
    diagnostics: String,
    /// 95% prediction intervals, one per forecast value
    intervals: Vec<(f64, f64)>,
}

impl ForecastResult {
    /// Assemble a result, checking that values, dates and intervals line up
    pub fn new(
        forecast_values: Vec<f64>,
        forecast_timestamps: Vec<NaiveDate>,
        diagnostics: String,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if forecast_values.len() != forecast_timestamps.len() {
            return Err(ForecastError::ValidationError(format!(
                "{} forecast values but {} forecast dates",
                forecast_values.len(),
                forecast_timestamps.len()
            )));
        }
        if !intervals.is_empty() && intervals.len() != forecast_values.len() {
            return Err(ForecastError::ValidationError(format!(
                "{} forecast values but {} intervals",
                forecast_values.len(),
                intervals.len()
            )));
        }

        Ok(Self {
            forecast_values,
            forecast_timestamps,
            diagnostics,
            intervals,
        })
    }

    pub fn forecast_values(&self) -> &[f64] {
        &self.forecast_values
    }

    pub fn forecast_timestamps(&self) -> &[NaiveDate] {
        &self.forecast_timestamps
    }

    pub fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    pub fn horizon(&self) -> usize {
        self.forecast_values.len()
    }
}

/// Fit ARIMA(p, d, q) on `in_sample` and forecast `horizon` days ahead.
///
/// `in_sample` must be non-empty and ascending by date. A horizon of zero
/// still fits the model and returns its diagnostics with an empty forecast.
pub fn fit_and_forecast(
    in_sample: &[TimeSeriesRow],
    order: &ModelOrderSpec,
    horizon: usize,
) -> Result<ForecastResult> {
    fit_and_forecast_with(in_sample, order, horizon, EstimatorConfig::default())
}

/// [`fit_and_forecast`] with explicit estimator settings
pub fn fit_and_forecast_with(
    in_sample: &[TimeSeriesRow],
    order: &ModelOrderSpec,
    horizon: usize,
    config: EstimatorConfig,
) -> Result<ForecastResult> {
    let span = tracing::info_span!(
        "fit_and_forecast",
        %order,
        rows = in_sample.len(),
        horizon
    );
    let _enter = span.enter();

    let last_date = in_sample
        .last()
        .map(|row| row.date)
        .ok_or_else(|| ForecastError::ValidationError("The in-sample window contains no rows".to_string()))?;

    let outcome = ArimaModel::with_config(*order, config)
        .train(in_sample)
        .and_then(|trained| {
            let forecast = trained.forecast(horizon)?;
            let diagnostics = trained.summary();
            let (values, intervals) = forecast.into_parts();
            ForecastResult::new(
                values,
                forecast_dates(last_date, horizon),
                diagnostics,
                intervals.unwrap_or_default(),
            )
        });

    match &outcome {
        Ok(result) => tracing::info!(forecast = result.horizon(), "model fitted"),
        Err(err) => tracing::warn!(error = %err, "model fit failed"),
    }
    outcome
}

/// Run a validated request
pub fn execute(request: &ForecastRequest, config: EstimatorConfig) -> Result<ForecastResult> {
    fit_and_forecast_with(request.in_sample(), &request.order(), request.horizon(), config)
}
