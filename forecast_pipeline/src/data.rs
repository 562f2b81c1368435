//! Time series data handling for forecasting
//!
//! The loader reads a CSV with a `date` and a `close` column into an
//! ascending sequence of [`TimeSeriesRow`]s. Files exported by exchanges
//! list the newest row first; loading always normalizes to ascending order.

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use series_math::DescriptiveStats;
use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// File name of the dataset shipped with the crate
pub const EXAMPLE_DATASET: &str = "Binance_ETHUSDT_d.csv";

const EXAMPLE_CSV: &[u8] = include_bytes!("../data/Binance_ETHUSDT_d.csv");

/// Number of rows shown by the data preview
pub const PREVIEW_ROWS: usize = 5;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// A single observation: the closing value on a date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimeSeriesRow {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ascending sequence of observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesData {
    rows: Vec<TimeSeriesRow>,
}

/// Where the price series comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// A CSV file chosen by the user
    Upload(PathBuf),
    /// The dataset shipped with the crate
    Example,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Upload(path) => write!(f, "{}", path.display()),
            DataSource::Example => write!(f, "{} (example)", EXAMPLE_DATASET),
        }
    }
}

/// Data loader for time series data
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load from whichever source the controls selected
    pub fn load(source: &DataSource) -> Result<TimeSeriesData> {
        let data = match source {
            DataSource::Upload(path) => Self::from_csv(path)?,
            DataSource::Example => Self::example()?,
        };
        tracing::debug!(rows = data.len(), %source, "loaded price series");
        Ok(data)
    }

    /// Load time series data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeriesData> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Load time series data from CSV bytes already in memory
    pub fn from_reader<T>(bytes: T) -> Result<TimeSeriesData>
    where
        T: AsRef<[u8]> + Send + Sync,
    {
        let df = CsvReader::new(Cursor::new(bytes))
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Load the dataset shipped with the crate
    pub fn example() -> Result<TimeSeriesData> {
        Self::from_reader(EXAMPLE_CSV)
    }

    /// Create time series data from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<TimeSeriesData> {
        let date_column = Self::detect_column(&df, "date", &["date", "time"])?;
        let close_column = Self::detect_column(&df, "close", &["close", "price"])?;

        let dates = df.column(&date_column)?.cast(&DataType::Utf8)?;
        let closes = df.column(&close_column)?.cast(&DataType::Float64)?;

        let rows = dates
            .utf8()?
            .into_iter()
            .zip(closes.f64()?.into_iter())
            .enumerate()
            .map(|(i, (date, close))| {
                let date = date.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing date in row {}", i + 1))
                })?;
                Ok(TimeSeriesRow::new(parse_date(date)?, close.unwrap_or(f64::NAN)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TimeSeriesData::from_rows(rows))
    }

    /// Find a column by exact (case-insensitive) name, then by keyword
    fn detect_column(df: &DataFrame, exact: &str, keywords: &[&str]) -> Result<String> {
        let column_names = df.get_column_names();

        if let Some(name) = column_names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(exact))
        {
            return Ok(name.to_string());
        }

        for keyword in keywords {
            if let Some(name) = column_names
                .iter()
                .find(|name| name.to_lowercase().contains(keyword))
            {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::DataError(format!(
            "No '{}' column found in data (columns: {})",
            exact,
            column_names.join(", ")
        )))
    }
}

/// Parse a date or datetime string into its calendar date
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(datetime.date());
        }
    }

    Err(ForecastError::ParseError(format!(
        "Unrecognised date '{}'",
        raw
    )))
}

/// Data overview shown next to the preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataOverview {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub close: DescriptiveStats,
}

impl TimeSeriesData {
    /// Create a new TimeSeriesData from dates and values
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        let rows = dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| TimeSeriesRow::new(date, value))
            .collect();

        Ok(Self::from_rows(rows))
    }

    /// Create from rows in any order; rows are sorted ascending by date.
    ///
    /// The sort is stable, so rows sharing a date keep their relative order.
    pub fn from_rows(mut rows: Vec<TimeSeriesRow>) -> Self {
        rows.sort_by_key(|row| row.date);
        Self { rows }
    }

    /// All rows, ascending by date
    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|row| row.date).collect()
    }

    /// Get the close prices as a vector
    pub fn close_prices(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.value).collect()
    }

    /// First and last date, which bound both range controls
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    /// Leading rows for the data preview
    pub fn preview(&self, n: usize) -> &[TimeSeriesRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Date span and close price statistics
    pub fn overview(&self) -> Result<DataOverview> {
        let (first_date, last_date) = self
            .bounds()
            .ok_or_else(|| ForecastError::DataError("No rows loaded".to_string()))?;

        Ok(DataOverview {
            first_date,
            last_date,
            close: DescriptiveStats::from_values(&self.close_prices())?,
        })
    }
}
