//! Line charts for the dashboard.
//!
//! Charts are ratatui `Chart` widgets rendered into an off-screen `Buffer`,
//! then printed row by row. Cell colours survive as ANSI sequences when
//! colour is on.

use chrono::{Duration, NaiveDate};
use crossterm::style::{Color as TermColor, Stylize};
use forecast_pipeline::packager::{ChartSeries, ForecastOverlay, SeriesColor};
use forecast_pipeline::TimeSeriesRow;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Widget};

pub const CHART_WIDTH: u16 = 80;
pub const CHART_HEIGHT: u16 = 24;

pub fn series_color(color: SeriesColor) -> Color {
    match color {
        SeriesColor::Blue => Color::Blue,
        SeriesColor::Red => Color::Red,
    }
}

/// Close prices of the visualization window as a single blue line
pub fn window_chart_buffer(rows: &[TimeSeriesRow]) -> Buffer {
    let close = ChartSeries::from_rows("close", SeriesColor::Blue, rows);
    chart_buffer(&[&close], CHART_WIDTH, CHART_HEIGHT)
}

/// Sampled data in blue continued by the forecast in red
pub fn overlay_chart_buffer(overlay: &ForecastOverlay) -> Buffer {
    chart_buffer(&[&overlay.actual, &overlay.predicted], CHART_WIDTH, CHART_HEIGHT)
}

/// Draw `series` against a shared date axis. Nothing is drawn when every
/// series is empty.
pub fn chart_buffer(series: &[&ChartSeries], width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);

    let Some(first) = series.iter().filter_map(|s| s.dates.first()).min().copied() else {
        return buffer;
    };
    let last = series
        .iter()
        .filter_map(|s| s.dates.last())
        .max()
        .copied()
        .unwrap_or(first);
    let days = (last - first).num_days();
    let middle = first + Duration::days(days / 2);

    let points: Vec<Vec<(f64, f64)>> = series.iter().map(|s| day_points(s, first)).collect();
    let (low, high) = value_bounds(points.iter().flatten().map(|&(_, y)| y));

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(&points)
        .map(|(s, data)| {
            Dataset::default()
                .name(s.label.as_str())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(s.color)))
                .data(data)
        })
        .collect();

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, days.max(1) as f64])
                .labels(vec![
                    Span::raw(first.to_string()),
                    Span::raw(middle.to_string()),
                    Span::raw(last.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([low, high])
                .labels(vec![
                    Span::raw(format!("{:.2}", low)),
                    Span::raw(format!("{:.2}", (low + high) / 2.0)),
                    Span::raw(format!("{:.2}", high)),
                ]),
        )
        .render(area, &mut buffer);

    buffer
}

// x is days since `origin`; non-finite values are skipped
fn day_points(series: &ChartSeries, origin: NaiveDate) -> Vec<(f64, f64)> {
    series
        .dates
        .iter()
        .zip(&series.values)
        .filter(|(_, value)| value.is_finite())
        .map(|(date, &value)| ((*date - origin).num_days() as f64, value))
        .collect()
}

/// Y range padded by 5% of the spread, or by 1 for a flat line
pub fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

/// Buffer rows as text with trailing blanks removed
pub fn buffer_lines(buffer: &Buffer, color: bool) -> Vec<String> {
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            let end = (area.left()..area.right())
                .rev()
                .find(|&x| !buffer[(x, y)].symbol().trim().is_empty())
                .map_or(area.left(), |x| x + 1);

            let mut line = String::new();
            let mut run = String::new();
            let mut run_fg = Color::Reset;
            for x in area.left()..end {
                let cell = &buffer[(x, y)];
                if cell.fg != run_fg {
                    push_run(&mut line, &run, run_fg, color);
                    run.clear();
                    run_fg = cell.fg;
                }
                run.push_str(cell.symbol());
            }
            push_run(&mut line, &run, run_fg, color);
            line
        })
        .collect()
}

fn push_run(line: &mut String, run: &str, fg: Color, color: bool) {
    match terminal_color(fg).filter(|_| color && !run.is_empty()) {
        Some(term) => line.push_str(&run.with(term).to_string()),
        None => line.push_str(run),
    }
}

fn terminal_color(color: Color) -> Option<TermColor> {
    match color {
        Color::Blue => Some(TermColor::Blue),
        Color::Red => Some(TermColor::Red),
        Color::Gray => Some(TermColor::Grey),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_pipeline::packager::OVERLAY_LEGEND;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, day).unwrap()
    }

    fn overlay() -> ForecastOverlay {
        let actual_dates: Vec<NaiveDate> = (1..=20).map(date).collect();
        let actual_values: Vec<f64> = (0..20).map(|i| 2800.0 + 15.0 * (i as f64 * 0.6).sin()).collect();
        let predicted_dates: Vec<NaiveDate> = (21..=25).map(date).collect();
        ForecastOverlay {
            actual: ChartSeries::new("sampled data", SeriesColor::Blue, actual_dates, actual_values),
            predicted: ChartSeries::new(
                "predicted data",
                SeriesColor::Red,
                predicted_dates,
                vec![2805.0, 2808.0, 2810.0, 2811.0, 2812.0],
            ),
            intervals: Vec::new(),
            legend: OVERLAY_LEGEND.to_string(),
        }
    }

    fn has_fg(buffer: &Buffer, color: Color) -> bool {
        buffer.content.iter().any(|cell| cell.fg == color && !cell.symbol().trim().is_empty())
    }

    #[test]
    fn test_overlay_draws_blue_and_red() {
        let buffer = overlay_chart_buffer(&overlay());

        assert_eq!(buffer.area, Rect::new(0, 0, CHART_WIDTH, CHART_HEIGHT));
        assert!(has_fg(&buffer, Color::Blue));
        assert!(has_fg(&buffer, Color::Red));
    }

    #[test]
    fn test_window_chart_is_blue_only() {
        let rows: Vec<TimeSeriesRow> = (1..=10)
            .map(|day| TimeSeriesRow::new(date(day), 100.0 + day as f64))
            .collect();
        let buffer = window_chart_buffer(&rows);

        assert!(has_fg(&buffer, Color::Blue));
        assert!(!has_fg(&buffer, Color::Red));
    }

    #[test]
    fn test_plain_lines_carry_axis_labels_and_legend() {
        let text = buffer_lines(&overlay_chart_buffer(&overlay()), false).join("\n");

        assert!(text.contains("2022-03-01"));
        assert!(text.contains("2022-03-25"));
        assert!(text.contains("sampled data"));
        assert!(text.contains("predicted data"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_colored_lines_use_ansi_sequences() {
        let lines = buffer_lines(&overlay_chart_buffer(&overlay()), true);
        assert!(lines.iter().any(|line| line.contains('\u{1b}')));
    }

    #[test]
    fn test_empty_series_draws_nothing() {
        let empty = ChartSeries::new("close", SeriesColor::Blue, Vec::new(), Vec::new());
        let buffer = chart_buffer(&[&empty], 40, 10);

        assert!(buffer_lines(&buffer, false).iter().all(String::is_empty));
    }

    #[rstest]
    #[case(vec![10.0, 20.0], (9.5, 20.5))]
    #[case(vec![5.0, 5.0], (4.0, 6.0))]
    #[case(vec![3.0, f64::NAN], (2.0, 4.0))]
    #[case(vec![], (0.0, 1.0))]
    fn test_value_bounds(#[case] values: Vec<f64>, #[case] expected: (f64, f64)) {
        assert_eq!(value_bounds(values.into_iter().filter(|v| v.is_finite())), expected);
    }
}
