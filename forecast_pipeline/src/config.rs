//! Raw control values for one dashboard cycle
//!
//! Everything here is unvalidated input, as a user would type it into the
//! controls. [`DashboardConfig::build_pipeline`] turns it into a session
//! ready to submit.

use crate::data::{DataLoader, DataSource};
use crate::error::{ForecastError, Result};
use crate::models::arima::EstimatorConfig;
use crate::order::ModelFamily;
use crate::pipeline::ForecastPipeline;
use crate::range::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Boundary dates as entered, not yet checked for `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInput {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RangeInput {
    pub fn to_range(self) -> Result<DateRange> {
        DateRange::new(self.start, self.end)
    }
}

/// Control values of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV to load when the example toggle is off
    pub data_path: Option<PathBuf>,
    /// Use the bundled dataset instead of `data_path`
    pub use_example: bool,
    /// Defaults to the full data span
    pub visualization_range: Option<RangeInput>,
    /// Defaults to the full data span
    pub in_sample_range: Option<RangeInput>,
    pub family: ModelFamily,
    /// Raw p, d and q keyed by field name
    pub order: BTreeMap<String, i64>,
    /// Days to forecast
    pub horizon: i64,
    pub estimator: EstimatorConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            use_example: false,
            visualization_range: None,
            in_sample_range: None,
            family: ModelFamily::AR,
            order: BTreeMap::new(),
            horizon: 1,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded controls file");
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The example toggle wins over an upload path
    pub fn data_source(&self) -> Result<DataSource> {
        if self.use_example {
            return Ok(DataSource::Example);
        }
        self.data_path
            .clone()
            .map(DataSource::Upload)
            .ok_or_else(|| {
                ForecastError::DataError(
                    "No data source: upload a CSV file or select the example dataset".to_string(),
                )
            })
    }

    /// Load the data and apply the ranges and the order.
    ///
    /// The returned session is ready for
    /// [`ForecastPipeline::submit`] with [`DashboardConfig::horizon`].
    pub fn build_pipeline(&self) -> Result<ForecastPipeline> {
        let data = DataLoader::load(&self.data_source()?)?;
        let mut pipeline = ForecastPipeline::new(data)?.with_estimator(self.estimator);

        let bounds = pipeline.bounds();
        let visualization = self
            .visualization_range
            .map(RangeInput::to_range)
            .transpose()?
            .unwrap_or(bounds);
        let in_sample = self
            .in_sample_range
            .map(RangeInput::to_range)
            .transpose()?
            .unwrap_or(bounds);

        pipeline.select_range(visualization, in_sample);
        pipeline.configure_order(self.family, &self.order)?;
        Ok(pipeline)
    }
}
