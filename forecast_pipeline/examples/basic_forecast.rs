use chrono::NaiveDate;
use forecast_pipeline::data::{DataLoader, PREVIEW_ROWS};
use forecast_pipeline::order::{ModelFamily, ModelOrderSpec};
use forecast_pipeline::range::{in_sample_window, DateRange};
use forecast_pipeline::{executor, packager};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Pipeline: Basic Forecast Example");
    println!("=========================================\n");

    let data = DataLoader::example()?;
    println!("Loaded {} daily closes", data.len());
    for row in data.preview(PREVIEW_ROWS) {
        println!("  {}  {:>10.2}", row.date, row.value);
    }

    let start = NaiveDate::from_ymd_opt(2021, 12, 1).ok_or("invalid date")?;
    let end = NaiveDate::from_ymd_opt(2022, 3, 31).ok_or("invalid date")?;
    let window = DateRange::new(start, end)?;
    let in_sample = in_sample_window(data.rows(), window);
    println!("\nFitting on {} rows ({})", in_sample.len(), window);

    for (family, p, d, q) in [
        (ModelFamily::AR, 2, 0, 0),
        (ModelFamily::ARMA, 1, 0, 1),
        (ModelFamily::ARIMA, 1, 1, 1),
    ] {
        let order = ModelOrderSpec::new(family, p, d, q)?;
        let result = executor::fit_and_forecast(in_sample, &order, 7)?;
        let overlay = packager::package(&result, in_sample)?;

        println!("\n{} ({})", order, family.label());
        for ((date, value), (lower, upper)) in overlay
            .predicted
            .dates
            .iter()
            .zip(&overlay.predicted.values)
            .zip(&overlay.intervals)
        {
            println!("  {}  {:>10.2}  [{:.2}, {:.2}]", date, value, lower, upper);
        }
    }

    let order = ModelOrderSpec::new(ModelFamily::ARIMA, 1, 1, 0)?;
    let result = executor::fit_and_forecast(in_sample, &order, 0)?;
    println!("\n{}", result.diagnostics());

    Ok(())
}
