//! # Forecast Dash
//!
//! Command-line front end for `forecast_pipeline`. Each invocation is one
//! dashboard cycle: read the controls (a JSON file, flags, or both), load
//! the data, show the preview and the visualization window, submit, and
//! print the overlay with the fit report. Failures print their message and
//! show no partial forecast.

pub mod chart;

use chrono::NaiveDate;
use clap::Parser;
use forecast_pipeline::config::DashboardConfig;
use forecast_pipeline::data::{DataOverview, PREVIEW_ROWS};
use forecast_pipeline::order::{ModelFamily, ModelOrderSpec, OrderField};
use forecast_pipeline::packager::ForecastOverlay;
use forecast_pipeline::range::DateRange;
use forecast_pipeline::{ForecastPipeline, Result, TimeSeriesRow};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forecast_dash")]
#[command(about = "Fit an AR, MA, ARMA or ARIMA model to daily closes and forecast ahead", long_about = None)]
pub struct Cli {
    /// JSON controls file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CSV with `date` and `close` columns
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Use the bundled Binance ETH/USDT daily dataset
    #[arg(long)]
    pub example: bool,

    /// First date of the visualization window
    #[arg(long)]
    pub view_start: Option<NaiveDate>,

    /// Last date of the visualization window
    #[arg(long)]
    pub view_end: Option<NaiveDate>,

    /// First in-sample date
    #[arg(long)]
    pub fit_start: Option<NaiveDate>,

    /// Last in-sample date
    #[arg(long)]
    pub fit_end: Option<NaiveDate>,

    /// Model family: AR, MA, ARMA, ARIMA or a full selector label
    #[arg(short, long)]
    pub family: Option<ModelFamily>,

    /// Autoregressive component (p)
    #[arg(short = 'p', long = "ar", allow_negative_numbers = true)]
    pub p: Option<i64>,

    /// Difference (d)
    #[arg(short = 'd', long = "diff", allow_negative_numbers = true)]
    pub d: Option<i64>,

    /// Moving component (q)
    #[arg(short = 'q', long = "ma", allow_negative_numbers = true)]
    pub q: Option<i64>,

    /// Number of days to forecast (0-30)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub horizon: Option<i64>,

    /// Simplex iteration budget for the fit
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Write the overlay as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Write the overlay as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Print charts without ANSI colours
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Controls file (or defaults) with the flags applied on top
    pub fn to_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_json_file(path)?,
            None => DashboardConfig::default(),
        };

        if let Some(path) = &self.input {
            config.data_path = Some(path.clone());
            config.use_example = false;
        }
        if self.example {
            config.use_example = true;
        }
        if let Some(family) = self.family {
            config.family = family;
        }
        for (field, value) in OrderField::ALL.iter().zip([self.p, self.d, self.q]) {
            if let Some(value) = value {
                config.order.insert(field.name().to_string(), value);
            }
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(max_iter) = self.max_iter {
            config.estimator.max_iter = max_iter;
        }
        Ok(config)
    }

    /// Move the windows named by the date flags. A missing side keeps its
    /// current value.
    pub fn apply_ranges(&self, pipeline: &mut ForecastPipeline) -> Result<()> {
        let no_flags = [self.view_start, self.view_end, self.fit_start, self.fit_end]
            .iter()
            .all(Option::is_none);
        if no_flags {
            return Ok(());
        }

        let view = pipeline.visualization_range();
        let fit = pipeline.in_sample_range();
        let view = DateRange::new(
            self.view_start.unwrap_or(view.start()),
            self.view_end.unwrap_or(view.end()),
        )?;
        let fit = DateRange::new(
            self.fit_start.unwrap_or(fit.start()),
            self.fit_end.unwrap_or(fit.end()),
        )?;
        pipeline.select_range(view, fit);
        Ok(())
    }
}

/// Run one cycle and write everything the dashboard would show to `out`
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let prepared = cli.to_config().and_then(|config| {
        tracing::info!(source = ?config.data_source().ok(), family = %config.family, "starting dashboard cycle");
        let mut pipeline = config.build_pipeline()?;
        cli.apply_ranges(&mut pipeline)?;
        Ok((config, pipeline))
    });
    let (config, mut pipeline) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            writeln!(out, "Forecast failed: {}", err)?;
            return Err(err);
        }
    };
    let color = !cli.no_color;

    render_data(&pipeline, out)?;
    render_visualization(&pipeline, color, out)?;
    render_controls(config.family, pipeline.order(), out)?;

    let diagnostics = match pipeline.submit(config.horizon) {
        Ok(result) => result.diagnostics().to_string(),
        Err(err) => {
            writeln!(out, "Forecast failed: {}", err)?;
            return Err(err);
        }
    };

    let overlay = pipeline.overlay()?;
    render_overlay(&overlay, color, out)?;
    writeln!(out, "\n{}", diagnostics)?;

    if let Some(path) = &cli.json {
        overlay.write_json(path)?;
        tracing::info!(path = %path.display(), "wrote overlay JSON");
    }
    if let Some(path) = &cli.csv {
        overlay.write_csv_file(path)?;
        tracing::info!(path = %path.display(), "wrote overlay CSV");
    }
    Ok(())
}

fn render_data<W: Write>(pipeline: &ForecastPipeline, out: &mut W) -> Result<()> {
    let data = pipeline.data();
    writeln!(out, "Data preview")?;
    write_rows(data.preview(PREVIEW_ROWS), out)?;
    writeln!(out)?;
    render_overview(&data.overview()?, data.len(), out)?;
    Ok(())
}

/// Row count, date span and close price statistics
pub fn render_overview<W: Write>(overview: &DataOverview, rows: usize, out: &mut W) -> Result<()> {
    writeln!(out, "Data overview")?;
    writeln!(out, "  rows:  {}", rows)?;
    writeln!(out, "  span:  {} .. {}", overview.first_date, overview.last_date)?;
    writeln!(
        out,
        "  close: min {:.2}  max {:.2}  mean {:.2}  std {:.2}",
        overview.close.min, overview.close.max, overview.close.mean, overview.close.std_dev
    )?;
    Ok(())
}

fn render_visualization<W: Write>(pipeline: &ForecastPipeline, color: bool, out: &mut W) -> Result<()> {
    let window = pipeline.visualization();
    let range = pipeline.visualization_range();
    writeln!(out, "\nClose price between {} ({} rows)", range, window.len())?;
    if window.is_empty() {
        writeln!(out, "  (no rows in window)")?;
        return Ok(());
    }
    write_chart(&chart::window_chart_buffer(window), color, out)
}

/// The inputs the family shows, with their values
pub fn render_controls<W: Write>(family: ModelFamily, order: ModelOrderSpec, out: &mut W) -> Result<()> {
    writeln!(out, "\nModel: {}", family.label())?;
    for field in family.free_fields() {
        writeln!(out, "  {}: {}", field.label(), order.get(*field))?;
    }
    Ok(())
}

/// Forecast table with intervals, then the overlay chart and its legend
pub fn render_overlay<W: Write>(overlay: &ForecastOverlay, color: bool, out: &mut W) -> Result<()> {
    writeln!(out, "\nForecast ({} days)", overlay.predicted.len())?;
    for (i, (date, value)) in overlay.predicted.dates.iter().zip(&overlay.predicted.values).enumerate() {
        match overlay.intervals.get(i) {
            Some((lower, upper)) => {
                writeln!(out, "  {}  {:>12.4}  [{:.4}, {:.4}]", date, value, lower, upper)?
            }
            None => writeln!(out, "  {}  {:>12.4}", date, value)?,
        }
    }

    writeln!(out)?;
    write_chart(&chart::overlay_chart_buffer(overlay), color, out)?;
    writeln!(out, "  {}", overlay.legend)?;
    Ok(())
}

fn write_chart<W: Write>(buffer: &ratatui::buffer::Buffer, color: bool, out: &mut W) -> Result<()> {
    for line in chart::buffer_lines(buffer, color) {
        writeln!(out, "  {}", line)?;
    }
    Ok(())
}

fn write_rows<W: Write>(rows: &[TimeSeriesRow], out: &mut W) -> Result<()> {
    writeln!(out, "  {:<12}{:>12}", "date", "close")?;
    for row in rows {
        writeln!(out, "  {:<12}{:>12.2}", row.date.to_string(), row.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "forecast_dash",
            "--example",
            "--family",
            "arima",
            "-p",
            "2",
            "-d",
            "1",
            "--horizon",
            "12",
            "--max-iter",
            "500",
            "--no-color",
        ]);
        let config = cli.to_config().unwrap();

        assert!(config.use_example);
        assert_eq!(config.family, ModelFamily::ARIMA);
        assert_eq!(config.order.get("p"), Some(&2));
        assert_eq!(config.order.get("q"), None);
        assert_eq!(config.horizon, 12);
        assert_eq!(config.estimator.max_iter, 500);
        assert!(cli.no_color);
    }

    #[test]
    fn test_family_label_flag() {
        let cli = Cli::parse_from(["forecast_dash", "--family", "Moving Average (MA)"]);
        assert_eq!(cli.family, Some(ModelFamily::MA));
    }

    #[test]
    fn test_controls_show_free_fields_only() {
        let order = ModelOrderSpec::new(ModelFamily::ARMA, 2, 0, 1).unwrap();
        let mut out = Vec::new();
        render_controls(ModelFamily::ARMA, order, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("autoregressive component (p): 2"));
        assert!(text.contains("moving component (q): 1"));
        assert!(!text.contains("difference (d)"));
    }
}
