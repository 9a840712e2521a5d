//! Benchmarks for fitting the candidate roster.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shopping_forecast::core::{TimeSeries, YearMonth};
use shopping_forecast::harness::{ArimaVariant, CandidateKind, Roster};
use shopping_forecast::models::exponential::EtsSelection;

fn generate_sales(n: usize) -> TimeSeries {
    let values = (0..n)
        .map(|t| {
            let t = t as f64;
            (8000.0 + 120.0 * t) * (1.0 + 0.06 * (2.0 * std::f64::consts::PI * t / 12.0).sin())
        })
        .collect();
    TimeSeries::new(YearMonth::january(2017), values).unwrap()
}

fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_candidates");
    group.sample_size(10);
    let series = generate_sales(60);
    let roster = Roster::standard(12);

    let kinds = [
        CandidateKind::SeasonalNaive,
        CandidateKind::Ets(EtsSelection::Auto),
        CandidateKind::Arima(ArimaVariant::ALL[1]),
        CandidateKind::Arima(ArimaVariant::ALL[3]),
        CandidateKind::Tbats,
    ];
    for kind in kinds {
        group.bench_with_input(BenchmarkId::new("fit", kind.to_string()), &kind, |b, kind| {
            b.iter(|| roster.fit_one(black_box(kind), black_box(&series)))
        });
    }
    group.finish();
}

fn bench_full_roster(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster");
    group.sample_size(10);
    for n in [48, 72] {
        let series = generate_sales(n);
        let roster = Roster::standard(12);
        group.bench_with_input(BenchmarkId::new("fit_all", n), &series, |b, s| {
            b.iter(|| roster.fit_all(black_box(s)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_candidates, bench_full_roster);
criterion_main!(benches);
