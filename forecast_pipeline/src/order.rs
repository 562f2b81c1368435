//! Model family and order construction
//!
//! [`ModelFamily::free_fields`] is the one table deciding which of p, d and
//! q a family lets the user edit. The controls use it to decide which
//! inputs to show; [`build_order`] uses it to force the others to zero.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Largest accepted value for p, d and q
pub const MAX_ORDER: i64 = 5;

/// The linear model families offered by the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelFamily {
    AR,
    MA,
    ARMA,
    ARIMA,
}

/// One of the three order components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderField {
    P,
    D,
    Q,
}

impl OrderField {
    pub const ALL: [OrderField; 3] = [OrderField::P, OrderField::D, OrderField::Q];

    /// Key used in raw control mappings
    pub fn name(&self) -> &'static str {
        match self {
            OrderField::P => "p",
            OrderField::D => "d",
            OrderField::Q => "q",
        }
    }

    /// Label shown next to the input control
    pub fn label(&self) -> &'static str {
        match self {
            OrderField::P => "autoregressive component (p)",
            OrderField::D => "difference (d)",
            OrderField::Q => "moving component (q)",
        }
    }
}

impl FromStr for OrderField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" => Ok(OrderField::P),
            "d" => Ok(OrderField::D),
            "q" => Ok(OrderField::Q),
            other => Err(ForecastError::ValidationError(format!(
                "Unknown order field '{}', expected p, d or q",
                other
            ))),
        }
    }
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::AR,
        ModelFamily::MA,
        ModelFamily::ARMA,
        ModelFamily::ARIMA,
    ];

    /// Order components the user may edit for this family
    pub fn free_fields(&self) -> &'static [OrderField] {
        match self {
            ModelFamily::AR => &[OrderField::P],
            ModelFamily::MA => &[OrderField::Q],
            ModelFamily::ARMA => &[OrderField::P, OrderField::Q],
            ModelFamily::ARIMA => &[OrderField::P, OrderField::Q, OrderField::D],
        }
    }

    pub fn is_free(&self, field: OrderField) -> bool {
        self.free_fields().contains(&field)
    }

    /// Label shown by the family selector
    pub fn label(&self) -> &'static str {
        match self {
            ModelFamily::AR => "Autoregressive (AR)",
            ModelFamily::MA => "Moving Average (MA)",
            ModelFamily::ARMA => "Mixed Autoregressive Moving Average (ARMA)",
            ModelFamily::ARIMA => "Integration (ARIMA)",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ModelFamily::AR => "AR",
            ModelFamily::MA => "MA",
            ModelFamily::ARMA => "ARMA",
            ModelFamily::ARIMA => "ARIMA",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ModelFamily {
    type Err = ForecastError;

    /// Accepts the short code in any case or the full selector label
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        ModelFamily::ALL
            .into_iter()
            .find(|family| {
                family.code().eq_ignore_ascii_case(trimmed)
                    || family.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Unknown model family '{}', expected one of AR, MA, ARMA, ARIMA",
                    trimmed
                ))
            })
    }
}

/// Validated model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModelOrderSpec {
    family: ModelFamily,
    p: usize,
    d: usize,
    q: usize,
}

impl ModelOrderSpec {
    /// Shorthand for [`build_order`] with all three fields supplied
    pub fn new(family: ModelFamily, p: i64, d: i64, q: i64) -> Result<Self> {
        let raw = OrderField::ALL
            .iter()
            .zip([p, d, q])
            .map(|(field, value)| (field.name().to_string(), value))
            .collect();
        build_order(family, &raw)
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn p(&self) -> usize {
        self.p
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn q(&self) -> usize {
        self.q
    }

    /// `(p, d, q)` in the conventional order
    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    pub fn get(&self, field: OrderField) -> usize {
        match field {
            OrderField::P => self.p,
            OrderField::D => self.d,
            OrderField::Q => self.q,
        }
    }
}

impl fmt::Display for ModelOrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Build a validated order from raw control values.
///
/// Every provided value is range-checked against `[0, MAX_ORDER]`, even for
/// fields the family forces to zero. Missing free fields default to zero.
pub fn build_order(family: ModelFamily, raw_inputs: &BTreeMap<String, i64>) -> Result<ModelOrderSpec> {
    let mut values = BTreeMap::new();
    for (name, &value) in raw_inputs {
        let field: OrderField = name.parse()?;
        if !(0..=MAX_ORDER).contains(&value) {
            return Err(ForecastError::ValidationError(format!(
                "{} must be between 0 and {}, got {}",
                field.label(),
                MAX_ORDER,
                value
            )));
        }
        values.insert(field, value as usize);
    }

    let pick = |field: OrderField| {
        if family.is_free(field) {
            values.get(&field).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let order = ModelOrderSpec {
        family,
        p: pick(OrderField::P),
        d: pick(OrderField::D),
        q: pick(OrderField::Q),
    };
    tracing::debug!(%family, %order, "configured model order");
    Ok(order)
}
