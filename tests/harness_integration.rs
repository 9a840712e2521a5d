//! End-to-end checks of the model-comparison harness.

use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use shopping_forecast::core::{PeriodRange, TimeSeries, YearMonth};
use shopping_forecast::harness::{
    growth_rate, run_report, run_with_roster, split, ArimaVariant, CandidateKind, Evaluator,
    FailureStage, ReportConfig, Roster, SelectionPolicy,
};
use shopping_forecast::io::{load_csv, LoaderConfig};
use shopping_forecast::models::baseline::SeasonalNaive;
use shopping_forecast::models::exponential::{ETSSpec, EtsSelection};
use shopping_forecast::models::Forecaster;
use shopping_forecast::transform::{boxcox, difference, inv_boxcox};
use shopping_forecast::utils::rmse;
use shopping_forecast::ForecastError;

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn monthly(values: Vec<f64>) -> TimeSeries {
    TimeSeries::new(ym(2017, 1), values).unwrap()
}

/// `100 + 2t + 10 sin(2 pi t / 12)` with no noise.
fn trend_seasonal(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let t = t as f64;
            100.0 + 2.0 * t + 10.0 * (2.0 * PI * t / 12.0).sin()
        })
        .collect()
}

#[test]
fn split_returns_exact_spans() {
    let series = monthly((0..72).map(|i| 1000.0 + i as f64).collect());
    let config = ReportConfig::default();
    let (train, test) = split(&series, &config.train, &config.test).unwrap();

    assert_eq!(train.len(), 60);
    assert_eq!(test.len(), 12);
    assert_eq!(train.start(), ym(2017, 1));
    assert_eq!(train.end(), ym(2021, 12));
    assert_eq!(test.start(), ym(2022, 1));
    assert_eq!(test.end(), ym(2022, 12));
}

#[test]
fn split_outside_series_is_range_error() {
    let series = monthly(vec![1.0; 48]);
    let config = ReportConfig::default();
    assert!(matches!(
        split(&series, &config.train, &config.test),
        Err(ForecastError::Range(_))
    ));
}

#[test]
fn boxcox_round_trips_positive_data() {
    let y: Vec<f64> = (1..=40).map(|i| 50.0 + 3.5 * i as f64).collect();
    for lambda in [-1.0, -0.3, 0.0, 0.5, 1.0, 2.0] {
        let back = inv_boxcox(&boxcox(&y, lambda).unwrap(), lambda);
        for (a, b) in y.iter().zip(&back) {
            assert_relative_eq!(a, b, max_relative = 1e-9);
        }
    }
}

#[test]
fn seasonal_naive_repeats_last_year() {
    let pattern = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0, 8.0];
    let values: Vec<f64> = (0..36).map(|t| pattern[t % 12] + (t / 12) as f64).collect();
    let mut model = SeasonalNaive::new(12);
    model.fit(&monthly(values.clone())).unwrap();

    let forecast = model.predict(12).unwrap();
    assert_eq!(forecast.point(), &values[24..36]);
}

#[test]
fn seasonal_naive_needs_a_full_season() {
    let mut model = SeasonalNaive::new(12);
    assert!(matches!(
        model.fit(&monthly(vec![1.0; 11])),
        Err(ForecastError::InsufficientData { needed: 12, got: 11 })
    ));
}

#[test]
fn differencing_is_linear_and_flattens_lines() {
    let a: Vec<f64> = (0..20).map(|t| (t * t) as f64).collect();
    let b: Vec<f64> = (0..20).map(|t| (t as f64).sqrt()).collect();
    let (alpha, beta) = (2.5, -0.75);
    let combined: Vec<f64> = a.iter().zip(&b).map(|(x, y)| alpha * x + beta * y).collect();

    let lhs = difference(&combined, 1);
    let (da, db) = (difference(&a, 1), difference(&b, 1));
    for i in 0..lhs.len() {
        assert_abs_diff_eq!(lhs[i], alpha * da[i] + beta * db[i], epsilon = 1e-9);
    }

    let line: Vec<f64> = (0..15).map(|t| 7.0 - 3.0 * t as f64).collect();
    assert!(difference(&line, 2).iter().all(|v| v.abs() < 1e-12));
}

#[test]
fn constant_bias_gives_rmse_of_bias() {
    let actual: Vec<f64> = (0..12).map(|t| 200.0 + 13.0 * t as f64).collect();
    for bias in [-4.5, 0.0, 17.25] {
        let predicted: Vec<f64> = actual.iter().map(|a| a + bias).collect();
        assert_relative_eq!(rmse(&actual, &predicted).unwrap(), f64::abs(bias), epsilon = 1e-12);
    }
}

#[test]
fn growth_of_reported_totals() {
    assert_abs_diff_eq!(growth_rate(296608.2, 264851.0).unwrap(), 0.1199, epsilon = 1e-4);
}

#[test]
fn seasonal_arima_recovers_noiseless_trend_and_season() {
    let series = monthly(trend_seasonal(72));
    let train_range = PeriodRange::parse("2017-01", "2021-12").unwrap();
    let test_range = PeriodRange::parse("2022-01", "2022-12").unwrap();
    let (train, test) = split(&series, &train_range, &test_range).unwrap();

    let kind = CandidateKind::Arima(ArimaVariant {
        box_cox: false,
        seasonal: true,
    });
    let roster = Roster::of(vec![kind], 12);
    let table = Evaluator::new(12, 0.95).evaluate(roster.fit_all(&train), &train, &test);

    assert!(table.failures().is_empty(), "{:?}", table.failures());
    let row = table.get(&kind).unwrap();
    assert!(
        row.out_of_sample_rmse < 1.0,
        "{} test RMSE {}",
        row.model_name,
        row.out_of_sample_rmse
    );
}

#[test]
fn multiplicative_ets_on_zero_fails_alone() {
    let mut values = trend_seasonal(72);
    values[30] = 0.0;
    let series = monthly(values);
    let config = ReportConfig::default();
    let (train, test) = split(&series, &config.train, &config.test).unwrap();

    let mam = CandidateKind::Ets(EtsSelection::Fixed(ETSSpec::mam()));
    let roster = Roster::of(
        vec![
            CandidateKind::SeasonalNaive,
            mam,
            CandidateKind::Ets(EtsSelection::Auto),
        ],
        12,
    );
    let table = Evaluator::new(12, 0.95).evaluate(roster.fit_all(&train), &train, &test);

    assert_eq!(table.failures().len(), 1);
    let failure = &table.failures()[0];
    assert_eq!(failure.kind, mam);
    assert_eq!(failure.stage, FailureStage::Fit);
    assert!(matches!(failure.error, ForecastError::Domain(_)));

    assert_eq!(table.rows().len(), 2);
    for row in table.rows() {
        assert!(row.out_of_sample_rmse.is_finite());
        assert!(row.forecast.point().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn named_policy_deploys_requested_candidate() {
    let series = monthly(trend_seasonal(72));
    let config = ReportConfig::default()
        .with_selection(SelectionPolicy::Named(CandidateKind::SeasonalNaive));
    let roster = Roster::of(
        vec![CandidateKind::SeasonalNaive, CandidateKind::Ets(EtsSelection::Auto)],
        12,
    );
    let report = run_with_roster(&series, &config, roster).unwrap();

    assert_eq!(report.deployment.kind, CandidateKind::SeasonalNaive);
    assert_eq!(report.deployment.periods[0], ym(2023, 1));
    assert_relative_eq!(
        report.deployment.total,
        series.year_total(2022).unwrap(),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(report.year_over_year.forecast_growth, 0.0, epsilon = 1e-12);
}

#[test]
fn full_report_over_bundled_data() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/online_shopping_synthetic.csv");
    let series = load_csv(path, &LoaderConfig::default()).unwrap();
    assert_eq!(series.len(), 72);

    let report = run_report(&series, &ReportConfig::default()).unwrap();
    let table = &report.evaluation;
    assert_eq!(table.rows().len() + table.failures().len(), 7);

    let best = table.select(&SelectionPolicy::LowestTestRmse).unwrap();
    assert!(table
        .rows()
        .iter()
        .all(|r| r.out_of_sample_rmse >= best.out_of_sample_rmse));
    assert_eq!(report.deployment.kind, best.kind);
    assert_eq!(report.deployment.periods.len(), 12);
    assert_eq!(report.deployment.periods[11], ym(2023, 12));
    assert!(report.deployment.total > 0.0);
    assert_eq!(report.year_over_year.last_year, 2022);
    assert!(report.year_over_year.forecast_growth.is_finite());

    let text = report.to_string();
    assert!(text.contains("Box-Cox lambda"));
    assert!(text.contains("Seasonal naive"));
}
