//! # Forecast Pipeline
//!
//! A Rust library that turns dashboard controls into a fitted ARIMA-family
//! forecast of a daily price series.
//!
//! ## Features
//!
//! - CSV loading (uploaded file or the bundled `Binance_ETHUSDT_d.csv`),
//!   normalized to ascending dates
//! - Date window selection for the overview chart and the fit
//! - AR, MA, ARMA and ARIMA orders built from one family table
//! - Conditional sum of squares estimation with prediction intervals
//! - Overlay packaging with JSON and CSV export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forecast_pipeline::data::DataLoader;
//! use forecast_pipeline::order::{ModelFamily, ModelOrderSpec};
//! use forecast_pipeline::range::{in_sample_window, DateRange};
//! use forecast_pipeline::{executor, packager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = DataLoader::example()?;
//! let range = DateRange::full(data.rows()).ok_or("empty dataset")?;
//! let in_sample = in_sample_window(data.rows(), range);
//!
//! let order = ModelOrderSpec::new(ModelFamily::ARIMA, 1, 1, 1)?;
//! let result = executor::fit_and_forecast(in_sample, &order, 7)?;
//! let overlay = packager::package(&result, in_sample)?;
//!
//! println!("{}", result.diagnostics());
//! println!("{}", overlay.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod executor;
pub mod models;
pub mod order;
pub mod packager;
pub mod pipeline;
pub mod range;
pub mod request;

// Re-export commonly used types
pub use crate::config::DashboardConfig;
pub use crate::data::{DataLoader, DataSource, TimeSeriesData, TimeSeriesRow};
pub use crate::error::{ForecastError, Result};
pub use crate::executor::{fit_and_forecast, ForecastResult};
pub use crate::models::arima::EstimatorConfig;
pub use crate::order::{build_order, ModelFamily, ModelOrderSpec, OrderField};
pub use crate::packager::{package, ForecastOverlay};
pub use crate::pipeline::{ForecastPipeline, PipelineState};
pub use crate::range::{select, DateRange};
pub use crate::request::ForecastRequest;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
