//! Date range selection
//!
//! Both range controls map two boundary dates onto a contiguous run of rows.
//! The visualization window excludes both boundaries, the in-sample window
//! includes them.

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed pair of boundary dates with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ForecastError::ValidationError(format!(
                "Range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The full span of the rows, which is also the default slider value
    pub fn full(rows: &[TimeSeriesRow]) -> Option<Self> {
        Some(Self {
            start: rows.first()?.date,
            end: rows.last()?.date,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Clamp both boundaries into `bounds`, as a slider limited to the data span would
    pub fn clamp_to(&self, bounds: DateRange) -> Self {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        Self { start, end }
    }

    /// Whether `date` satisfies this range under the given boundary rule
    pub fn contains(&self, date: NaiveDate, inclusive: bool) -> bool {
        if inclusive {
            self.start <= date && date <= self.end
        } else {
            self.start < date && date < self.end
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Select the rows that fall in `range`.
///
/// `rows` must be sorted ascending by date. With `inclusive_upper` the
/// boundaries are included (in-sample window); without it both are
/// excluded (visualization window). The result is a contiguous sub-slice.
pub fn select(rows: &[TimeSeriesRow], range: DateRange, inclusive_upper: bool) -> &[TimeSeriesRow] {
    let (lo, hi) = if inclusive_upper {
        (
            rows.partition_point(|row| row.date < range.start),
            rows.partition_point(|row| row.date <= range.end),
        )
    } else {
        (
            rows.partition_point(|row| row.date <= range.start),
            rows.partition_point(|row| row.date < range.end),
        )
    };

    let selected = if lo < hi { &rows[lo..hi] } else { &rows[0..0] };
    tracing::debug!(
        %range,
        inclusive_upper,
        selected = selected.len(),
        "selected date window"
    );
    selected
}

/// Rows strictly inside `range`, for the overview chart
pub fn visualization_window(rows: &[TimeSeriesRow], range: DateRange) -> &[TimeSeriesRow] {
    select(rows, range, false)
}

/// Rows within `range` including its boundaries, for fitting
pub fn in_sample_window(rows: &[TimeSeriesRow], range: DateRange) -> &[TimeSeriesRow] {
    select(rows, range, true)
}
