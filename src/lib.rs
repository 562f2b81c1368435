//! # Forecast Dashboard
//!
//! Workspace facade for the forecasting dashboard. The work is split across
//! three crates:
//!
//! - [`series_math`]: differencing, simplex minimisation and the small
//!   numerical helpers the estimator needs
//! - [`forecast_pipeline`]: data loading, window selection, model orders,
//!   fitting and overlay packaging
//! - [`forecast_dash`]: the command-line front end
//!
//! ## Example
//!
//! ```
//! use forecast_dashboard_workspace::forecast_pipeline::{build_order, ModelFamily};
//! use std::collections::BTreeMap;
//!
//! let mut raw = BTreeMap::new();
//! raw.insert("p".to_string(), 2);
//! raw.insert("d".to_string(), 1);
//!
//! // AR keeps p and forces d to zero.
//! let order = build_order(ModelFamily::AR, &raw).unwrap();
//! assert_eq!(order.as_tuple(), (2, 0, 0));
//! ```

pub use forecast_dash;
pub use forecast_pipeline;
pub use series_math;
