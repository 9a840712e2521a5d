//! Property-based tests for the transforms, metrics and splitting.
//!
//! These check invariants over randomly generated monthly series.

use proptest::prelude::*;
use shopping_forecast::core::{PeriodRange, TimeSeries, YearMonth};
use shopping_forecast::harness::{growth_rate, split};
use shopping_forecast::models::baseline::SeasonalNaive;
use shopping_forecast::models::Forecaster;
use shopping_forecast::transform::{boxcox, difference, inv_boxcox, seasonal_difference};
use shopping_forecast::utils::rmse;

fn make_ts(values: &[f64]) -> TimeSeries {
    TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values.to_vec()).unwrap()
}

/// Strictly positive values in the range of monthly sales.
fn positive_values(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..100_000.0_f64, min_len..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn boxcox_inverse_recovers_input(
        values in positive_values(2, 60),
        lambda in -1.0..2.0_f64,
    ) {
        let back = inv_boxcox(&boxcox(&values, lambda).unwrap(), lambda);
        for (a, b) in values.iter().zip(&back) {
            prop_assert!((a - b).abs() <= 1e-6 * a.abs().max(1.0));
        }
    }

    #[test]
    fn differencing_shortens_by_order(values in positive_values(30, 80), d in 0usize..3) {
        prop_assert_eq!(difference(&values, d).len(), values.len() - d);
        prop_assert_eq!(seasonal_difference(&values, 1, 12).len(), values.len() - 12);
    }

    #[test]
    fn second_difference_of_a_line_vanishes(
        intercept in -1000.0..1000.0_f64,
        slope in -50.0..50.0_f64,
        len in 3usize..50,
    ) {
        let line: Vec<f64> = (0..len).map(|t| intercept + slope * t as f64).collect();
        for v in difference(&line, 2) {
            prop_assert!(v.abs() < 1e-8);
        }
    }

    #[test]
    fn shifted_forecast_rmse_equals_shift(
        actual in positive_values(1, 24),
        bias in -500.0..500.0_f64,
    ) {
        let predicted: Vec<f64> = actual.iter().map(|a| a + bias).collect();
        let score = rmse(&actual, &predicted).unwrap();
        prop_assert!((score - bias.abs()).abs() < 1e-6);
    }

    #[test]
    fn growth_inverts_scaling(prior in 1.0..1e7_f64, rate in -0.9..3.0_f64) {
        let g = growth_rate(prior * (1.0 + rate), prior).unwrap();
        prop_assert!((g - rate).abs() < 1e-9);
    }

    #[test]
    fn seasonal_naive_forecast_is_periodic(values in positive_values(12, 60)) {
        let mut model = SeasonalNaive::new(12);
        model.fit(&make_ts(&values)).unwrap();
        let forecast = model.predict(36).unwrap();
        let p = forecast.point();
        let last = &values[values.len() - 12..];
        for h in 0..36 {
            prop_assert_eq!(p[h], last[h % 12]);
        }
    }

    #[test]
    fn adjacent_split_partitions_series(values in positive_values(24, 72), cut in 1usize..23) {
        let ts = make_ts(&values);
        let start = ts.start();
        let train = PeriodRange::starting_at(start, cut).unwrap();
        let test = PeriodRange::new(start.offset(cut as i64), ts.end()).unwrap();
        let (a, b) = split(&ts, &train, &test).unwrap();
        prop_assert_eq!(a.len() + b.len(), values.len());
        prop_assert_eq!(a.values(), &values[..cut]);
        prop_assert_eq!(b.values(), &values[cut..]);
    }
}
