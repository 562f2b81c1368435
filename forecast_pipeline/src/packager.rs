//! Align a forecast with its dates and shape it for the overlay chart

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use crate::executor::ForecastResult;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Legend shown under the overlay chart
pub const OVERLAY_LEGEND: &str = "blue line: sampled data / red line: predicted data";

/// Line colour of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Red,
}

/// One line of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: SeriesColor,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(label: &str, color: SeriesColor, dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self {
            label: label.to_string(),
            color,
            dates,
            values,
        }
    }

    /// Build a series straight from rows
    pub fn from_rows(label: &str, color: SeriesColor, rows: &[TimeSeriesRow]) -> Self {
        Self::new(
            label,
            color,
            rows.iter().map(|row| row.date).collect(),
            rows.iter().map(|row| row.value).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Actual and predicted series ready to draw on one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOverlay {
    pub actual: ChartSeries,
    pub predicted: ChartSeries,
    /// Prediction interval per predicted point, empty when unavailable
    pub intervals: Vec<(f64, f64)>,
    pub legend: String,
}

/// `horizon` consecutive daily dates starting the day after `last`
pub fn forecast_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|offset| last + Duration::days(offset))
        .collect()
}

/// Pair the in-sample rows (blue) with the forecast (red).
///
/// The forecast dates must be exactly the `horizon` days after the last
/// in-sample date; anything else is a validation error.
pub fn package(result: &ForecastResult, in_sample: &[TimeSeriesRow]) -> Result<ForecastOverlay> {
    let last = in_sample
        .last()
        .map(|row| row.date)
        .ok_or_else(|| ForecastError::ValidationError("Cannot package a forecast without in-sample rows".to_string()))?;

    if result.forecast_values().len() != result.forecast_timestamps().len() {
        return Err(ForecastError::ValidationError(format!(
            "{} forecast values but {} forecast dates",
            result.forecast_values().len(),
            result.forecast_timestamps().len()
        )));
    }

    let expected = forecast_dates(last, result.forecast_values().len());
    if result.forecast_timestamps() != expected.as_slice() {
        return Err(ForecastError::ValidationError(format!(
            "Forecast dates do not continue the in-sample window ending {}",
            last
        )));
    }

    let actual = ChartSeries::from_rows("sampled data", SeriesColor::Blue, in_sample);
    let predicted = ChartSeries::new(
        "predicted data",
        SeriesColor::Red,
        expected,
        result.forecast_values().to_vec(),
    );

    Ok(ForecastOverlay {
        actual,
        predicted,
        intervals: result.intervals().to_vec(),
        legend: OVERLAY_LEGEND.to_string(),
    })
}

#[derive(Debug, Serialize)]
struct OverlayRecord<'a> {
    series: &'a str,
    date: NaiveDate,
    value: f64,
    lower: Option<f64>,
    upper: Option<f64>,
}

impl ForecastOverlay {
    /// Pretty-printed JSON of the whole overlay
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Long-format CSV: one row per point with columns
    /// `series,date,value,lower,upper`
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (date, value) in self.actual.dates.iter().zip(&self.actual.values) {
            csv_writer.serialize(OverlayRecord {
                series: "actual",
                date: *date,
                value: *value,
                lower: None,
                upper: None,
            })?;
        }
        for (i, (date, value)) in self.predicted.dates.iter().zip(&self.predicted.values).enumerate() {
            let interval = self.intervals.get(i);
            csv_writer.serialize(OverlayRecord {
                series: "predicted",
                date: *date,
                value: *value,
                lower: interval.map(|(lo, _)| *lo),
                upper: interval.map(|(_, hi)| *hi),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, m, d).unwrap()
    }

    fn in_sample() -> Vec<TimeSeriesRow> {
        vec![
            TimeSeriesRow::new(date(2, 26), 10.0),
            TimeSeriesRow::new(date(2, 27), 11.0),
            TimeSeriesRow::new(date(2, 28), 12.0),
        ]
    }

    fn result(values: Vec<f64>) -> ForecastResult {
        let dates = forecast_dates(date(2, 28), values.len());
        let intervals = values.iter().map(|v| (v - 1.0, v + 1.0)).collect();
        ForecastResult::new(values, dates, "summary".to_string(), intervals).unwrap()
    }

    #[test]
    fn test_forecast_dates_cross_month_end() {
        assert_eq!(
            forecast_dates(date(2, 27), 3),
            vec![date(2, 28), date(3, 1), date(3, 2)]
        );
        assert!(forecast_dates(date(2, 27), 0).is_empty());
    }

    #[test]
    fn test_package_colors_and_lengths() {
        let overlay = package(&result(vec![13.0, 14.0]), &in_sample()).unwrap();

        assert_eq!(overlay.actual.color, SeriesColor::Blue);
        assert_eq!(overlay.predicted.color, SeriesColor::Red);
        assert_eq!(overlay.actual.values, vec![10.0, 11.0, 12.0]);
        assert_eq!(overlay.predicted.dates, vec![date(3, 1), date(3, 2)]);
        assert_eq!(overlay.legend, OVERLAY_LEGEND);
    }

    #[test]
    fn test_zero_horizon_leaves_actual_untouched() {
        let overlay = package(&result(vec![]), &in_sample()).unwrap();

        assert!(overlay.predicted.is_empty());
        assert_eq!(overlay.actual, ChartSeries::from_rows("sampled data", SeriesColor::Blue, &in_sample()));
    }

    #[test]
    fn test_misaligned_dates_rejected() {
        let shifted = ForecastResult::new(
            vec![13.0],
            vec![date(3, 5)],
            String::new(),
            vec![],
        )
        .unwrap();

        assert!(package(&shifted, &in_sample()).unwrap_err().is_validation_error());
        assert!(package(&result(vec![1.0]), &[]).unwrap_err().is_validation_error());
    }

    #[test]
    fn test_csv_export() {
        let overlay = package(&result(vec![13.0]), &in_sample()).unwrap();
        let mut buffer = Vec::new();
        overlay.write_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "series,date,value,lower,upper");
        assert_eq!(lines[1], "actual,2022-02-26,10.0,,");
        assert_eq!(lines[4], "predicted,2022-03-01,13.0,12.0,14.0");
    }

    #[test]
    fn test_json_export() {
        let overlay = package(&result(vec![13.0]), &in_sample()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&overlay.to_json().unwrap()).unwrap();

        assert_eq!(json["predicted"]["color"], "red");
        assert_eq!(json["actual"]["dates"][0], "2022-02-26");
        assert_eq!(json["legend"], OVERLAY_LEGEND);
    }
}
