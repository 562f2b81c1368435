use chrono::{Duration, NaiveDate};
use forecast_pipeline::data::DataLoader;
use forecast_pipeline::order::{build_order, ModelFamily, ModelOrderSpec};
use forecast_pipeline::packager::{package, SeriesColor};
use forecast_pipeline::range::{in_sample_window, visualization_window, DateRange};
use forecast_pipeline::{fit_and_forecast, ForecastError, ForecastPipeline, PipelineState, TimeSeriesRow};
use rstest::rstest;
use std::collections::BTreeMap;

// 30 daily closes starting 2023-01-01
fn thirty_days() -> Vec<TimeSeriesRow> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..30)
        .map(|i| {
            let x = i as f64;
            TimeSeriesRow::new(
                base + Duration::days(i),
                1500.0 + 40.0 * (x * 0.7).sin() + 15.0 * (x * 1.9).cos(),
            )
        })
        .collect()
}

#[test]
fn test_ar1_forecast_dates_follow_sample() {
    let rows = thirty_days();
    let order = ModelOrderSpec::new(ModelFamily::AR, 1, 0, 0).unwrap();

    let result = fit_and_forecast(&rows, &order, 5).unwrap();

    assert_eq!(result.forecast_values().len(), 5);
    assert_eq!(result.forecast_timestamps().len(), 5);
    assert_eq!(
        result.forecast_timestamps()[0],
        NaiveDate::from_ymd_opt(2023, 1, 31).unwrap()
    );
    assert!(result.forecast_values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_white_noise_order_forecasts_the_mean() {
    let rows = thirty_days();
    let order = ModelOrderSpec::new(ModelFamily::ARIMA, 0, 0, 0).unwrap();
    let mean = rows.iter().map(|row| row.value).sum::<f64>() / rows.len() as f64;

    let result = fit_and_forecast(&rows, &order, 4).unwrap();

    for value in result.forecast_values() {
        assert!((value - mean).abs() < 1e-6);
    }
}

#[test]
fn test_large_order_on_short_window_is_fit_error() {
    let rows = thirty_days();
    let order = ModelOrderSpec::new(ModelFamily::ARIMA, 5, 2, 5).unwrap();

    let err = fit_and_forecast(&rows[..10], &order, 5).unwrap_err();

    assert!(err.is_fit_error());
    match err {
        ForecastError::InsufficientData { needed, got, .. } => {
            assert_eq!(needed, 18);
            assert_eq!(got, 10);
        }
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_zero_horizon_still_reports_diagnostics() {
    let rows = thirty_days();
    let order = ModelOrderSpec::new(ModelFamily::AR, 1, 0, 0).unwrap();

    let result = fit_and_forecast(&rows, &order, 0).unwrap();
    let overlay = package(&result, &rows).unwrap();

    assert!(result.forecast_values().is_empty());
    assert!(result.diagnostics().contains("ar.L1"));
    assert!(overlay.predicted.is_empty());
    assert_eq!(overlay.actual.len(), 30);
}

#[test]
fn test_example_dataset_end_to_end() {
    let data = DataLoader::example().unwrap();
    let full = DateRange::full(data.rows()).unwrap();
    assert_eq!(full.start(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());

    let window = DateRange::new(
        NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 3, 31).unwrap(),
    )
    .unwrap();
    let in_sample = in_sample_window(data.rows(), window);
    assert_eq!(in_sample.first().unwrap().date, window.start());
    assert_eq!(in_sample.last().unwrap().date, window.end());
    assert_eq!(visualization_window(data.rows(), window).len(), in_sample.len() - 2);

    let mut raw = BTreeMap::new();
    raw.insert("p".to_string(), 1);
    raw.insert("d".to_string(), 1);
    raw.insert("q".to_string(), 1);
    let order = build_order(ModelFamily::ARIMA, &raw).unwrap();

    let result = fit_and_forecast(in_sample, &order, 30).unwrap();
    let overlay = package(&result, in_sample).unwrap();

    assert_eq!(overlay.actual.color, SeriesColor::Blue);
    assert_eq!(overlay.predicted.color, SeriesColor::Red);
    assert_eq!(
        overlay.predicted.dates.first().copied(),
        Some(NaiveDate::from_ymd_opt(2022, 4, 1).unwrap())
    );
    assert_eq!(overlay.intervals.len(), 30);
}

#[test]
fn test_pipeline_session_on_example() {
    let data = DataLoader::example().unwrap();
    let mut pipeline = ForecastPipeline::new(data).unwrap();

    let mut raw = BTreeMap::new();
    raw.insert("p".to_string(), 2);
    pipeline.configure_order(ModelFamily::AR, &raw).unwrap();
    pipeline.submit(10).unwrap();

    assert_eq!(pipeline.state(), PipelineState::Fitted);
    let overlay = pipeline.overlay().unwrap();
    assert_eq!(overlay.predicted.len(), 10);

    // A rejected submission leaves nothing behind.
    assert!(pipeline.submit(-1).is_err());
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(pipeline.overlay().is_err());
}

#[test]
fn test_fit_is_deterministic() {
    let rows = thirty_days();
    let order = ModelOrderSpec::new(ModelFamily::ARMA, 1, 0, 1).unwrap();

    let first = fit_and_forecast(&rows, &order, 6).unwrap();
    let second = fit_and_forecast(&rows, &order, 6).unwrap();

    assert_eq!(first, second);
}

#[rstest]
#[case(3, 1, 2)]
#[case(3, 2, 2)]
#[case(4, 2, 4)]
#[case(5, 0, 2)]
fn test_higher_orders_converge_on_example_month(#[case] p: i64, #[case] d: i64, #[case] q: i64) {
    let data = DataLoader::example().unwrap();
    let rows = &data.rows()[..30];
    let order = ModelOrderSpec::new(ModelFamily::ARIMA, p, d, q).unwrap();

    let result = fit_and_forecast(rows, &order, 7).unwrap();

    assert_eq!(result.forecast_values().len(), 7);
    assert!(result.forecast_values().iter().all(|v| v.is_finite()));
}
