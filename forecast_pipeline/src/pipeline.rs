//! One dashboard session as an explicit state machine
//!
//! ```text
//! Idle -> RangeSelected -> OrderConfigured -> Submitted -> Fitting -> Fitted | Failed
//! ```
//!
//! The first action after `Fitted` or `Failed` drops the previous request
//! and result and starts again from `Idle`. Nothing is retried.

use crate::data::{TimeSeriesData, TimeSeriesRow};
use crate::error::{ForecastError, Result};
use crate::executor::{self, ForecastResult};
use crate::models::arima::EstimatorConfig;
use crate::order::{build_order, ModelFamily, ModelOrderSpec};
use crate::packager::{self, ForecastOverlay};
use crate::range::{in_sample_window, visualization_window, DateRange};
use crate::request::ForecastRequest;
use std::collections::BTreeMap;
use std::fmt;

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    RangeSelected,
    OrderConfigured,
    Submitted,
    Fitting,
    Fitted,
    Failed,
}

impl PipelineState {
    /// Whether the last submission has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Fitted | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::RangeSelected => "range selected",
            PipelineState::OrderConfigured => "order configured",
            PipelineState::Submitted => "submitted",
            PipelineState::Fitting => "fitting",
            PipelineState::Fitted => "fitted",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Loaded data plus the current control values and the last outcome
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    data: TimeSeriesData,
    visualization_range: DateRange,
    in_sample_range: DateRange,
    order: ModelOrderSpec,
    request: Option<ForecastRequest>,
    result: Option<ForecastResult>,
    estimator: EstimatorConfig,
    state: PipelineState,
}

impl ForecastPipeline {
    /// Start a session on `data` with the control defaults: both ranges
    /// cover the full span and the order is AR with p = 0.
    pub fn new(data: TimeSeriesData) -> Result<Self> {
        let full = DateRange::full(data.rows())
            .ok_or_else(|| ForecastError::DataError("The dataset contains no rows".to_string()))?;
        let order = build_order(ModelFamily::AR, &BTreeMap::new())?;

        Ok(Self {
            data,
            visualization_range: full,
            in_sample_range: full,
            order,
            request: None,
            result: None,
            estimator: EstimatorConfig::default(),
            state: PipelineState::Idle,
        })
    }

    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn data(&self) -> &TimeSeriesData {
        &self.data
    }

    /// Full span of the data, which bounds both range controls
    pub fn bounds(&self) -> DateRange {
        // The constructor guarantees at least one row.
        DateRange::full(self.data.rows()).unwrap_or(self.in_sample_range)
    }

    pub fn visualization_range(&self) -> DateRange {
        self.visualization_range
    }

    pub fn in_sample_range(&self) -> DateRange {
        self.in_sample_range
    }

    pub fn order(&self) -> ModelOrderSpec {
        self.order
    }

    pub fn request(&self) -> Option<&ForecastRequest> {
        self.request.as_ref()
    }

    pub fn result(&self) -> Option<&ForecastResult> {
        self.result.as_ref()
    }

    /// Rows strictly inside the visualization range
    pub fn visualization(&self) -> &[TimeSeriesRow] {
        visualization_window(self.data.rows(), self.visualization_range)
    }

    /// Rows of the in-sample range, boundaries included
    pub fn in_sample(&self) -> &[TimeSeriesRow] {
        in_sample_window(self.data.rows(), self.in_sample_range)
    }

    fn begin_action(&mut self) {
        if self.state.is_terminal() {
            tracing::debug!(previous = %self.state, "resetting session");
            self.request = None;
            self.result = None;
            self.state = PipelineState::Idle;
        }
    }

    /// Move both range controls. Ranges reaching past the data are clamped
    /// to its span.
    pub fn select_range(&mut self, visualization: DateRange, in_sample: DateRange) {
        self.begin_action();
        let bounds = self.bounds();
        self.visualization_range = visualization.clamp_to(bounds);
        self.in_sample_range = in_sample.clamp_to(bounds);
        self.state = PipelineState::RangeSelected;
    }

    /// Pick a family and its raw p, d and q values
    pub fn configure_order(
        &mut self,
        family: ModelFamily,
        raw_inputs: &BTreeMap<String, i64>,
    ) -> Result<ModelOrderSpec> {
        self.begin_action();
        match build_order(family, raw_inputs) {
            Ok(order) => {
                self.order = order;
                self.state = PipelineState::OrderConfigured;
                Ok(order)
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    /// Validate the request, fit and forecast.
    ///
    /// On success the session is `Fitted` and holds the result; on any error
    /// it is `Failed` and holds no result.
    pub fn submit(&mut self, horizon: i64) -> Result<&ForecastResult> {
        self.begin_action();

        let request = match ForecastRequest::new(self.in_sample(), self.order, horizon) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "request rejected");
                self.state = PipelineState::Failed;
                return Err(err);
            }
        };
        self.state = PipelineState::Submitted;
        tracing::debug!(horizon, rows = request.in_sample().len(), "request accepted");

        self.state = PipelineState::Fitting;
        let outcome = executor::execute(&request, self.estimator);
        self.request = Some(request);

        match outcome {
            Ok(result) => {
                self.state = PipelineState::Fitted;
                Ok(&*self.result.insert(result))
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    /// Overlay of the last successful fit
    pub fn overlay(&self) -> Result<ForecastOverlay> {
        match (&self.request, &self.result) {
            (Some(request), Some(result)) => packager::package(result, request.in_sample()),
            _ => Err(ForecastError::ValidationError(format!(
                "No forecast to show, the session is {}",
                self.state
            ))),
        }
    }
}
