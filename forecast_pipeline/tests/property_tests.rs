//! Property-based tests for window selection, order construction and fitting.

use chrono::{Duration, NaiveDate};
use forecast_pipeline::order::{build_order, ModelFamily, OrderField, MAX_ORDER};
use forecast_pipeline::packager::{forecast_dates, package};
use forecast_pipeline::range::{select, DateRange};
use forecast_pipeline::{fit_and_forecast, ForecastResult, ModelOrderSpec, TimeSeriesRow};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

/// Ascending rows built from day gaps, so duplicate dates occur
fn rows_strategy(max_len: usize) -> impl Strategy<Value = Vec<TimeSeriesRow>> {
    prop::collection::vec((0i64..3, 1.0..1000.0_f64), 0..max_len).prop_map(|steps| {
        let mut day = 0;
        steps
            .into_iter()
            .map(|(gap, value)| {
                day += gap;
                TimeSeriesRow::new(base() + Duration::days(day), value)
            })
            .collect()
    })
}

fn family_strategy() -> impl Strategy<Value = ModelFamily> {
    prop::sample::select(ModelFamily::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn select_returns_contiguous_rows_within_bounds(
        rows in rows_strategy(60),
        a in 0i64..80,
        b in 0i64..80,
        inclusive in any::<bool>()
    ) {
        let range = DateRange::new(base() + Duration::days(a.min(b)), base() + Duration::days(a.max(b))).unwrap();
        let selected = select(&rows, range, inclusive);

        for row in selected {
            prop_assert!(range.contains(row.date, inclusive));
        }
        let expected: Vec<TimeSeriesRow> = rows
            .iter()
            .copied()
            .filter(|row| range.contains(row.date, inclusive))
            .collect();
        prop_assert_eq!(selected.to_vec(), expected);

        // A sub-slice of the input, not a copy
        if !selected.is_empty() {
            let offset = (selected.as_ptr() as usize - rows.as_ptr() as usize)
                / std::mem::size_of::<TimeSeriesRow>();
            prop_assert_eq!(&rows[offset..offset + selected.len()], selected);
        }
    }

    #[test]
    fn build_order_respects_zeroing_table(
        family in family_strategy(),
        p in 0i64..=MAX_ORDER,
        d in 0i64..=MAX_ORDER,
        q in 0i64..=MAX_ORDER
    ) {
        let raw: BTreeMap<String, i64> = [("p", p), ("d", d), ("q", q)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let order = build_order(family, &raw).unwrap();

        for field in OrderField::ALL {
            if family.is_free(field) {
                prop_assert_eq!(order.get(field) as i64, raw[field.name()]);
            } else {
                prop_assert_eq!(order.get(field), 0);
            }
        }
    }

    #[test]
    fn build_order_rejects_out_of_range(
        family in family_strategy(),
        value in prop_oneof![-100i64..0, (MAX_ORDER + 1)..100],
        field in prop::sample::select(OrderField::ALL.to_vec())
    ) {
        let mut raw = BTreeMap::new();
        raw.insert(field.name().to_string(), value);

        prop_assert!(build_order(family, &raw).unwrap_err().is_validation_error());
    }

    #[test]
    fn zero_horizon_packaging_keeps_actual(rows in rows_strategy(40).prop_filter("non-empty", |r| !r.is_empty())) {
        let last = rows[rows.len() - 1].date;
        let result = ForecastResult::new(Vec::new(), forecast_dates(last, 0), String::new(), Vec::new()).unwrap();
        let overlay = package(&result, &rows).unwrap();

        prop_assert!(overlay.predicted.is_empty());
        prop_assert_eq!(overlay.actual.values, rows.iter().map(|r| r.value).collect::<Vec<_>>());
        prop_assert_eq!(overlay.actual.dates, rows.iter().map(|r| r.date).collect::<Vec<_>>());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    #[test]
    fn fit_and_forecast_is_idempotent(
        values in prop::collection::vec(1.0..1000.0_f64, 20..60),
        horizon in 0usize..=30,
        family in family_strategy()
    ) {
        let rows: Vec<TimeSeriesRow> = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesRow::new(base() + Duration::days(i as i64), *v))
            .collect();
        let order = ModelOrderSpec::new(family, 1, 1, 0).unwrap();

        let first = fit_and_forecast(&rows, &order, horizon);
        let second = fit_and_forecast(&rows, &order, horizon);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.horizon(), horizon);
                prop_assert_eq!(a, b);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "outcomes differ between identical runs"),
        }
    }
}
