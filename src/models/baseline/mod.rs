//! Benchmark models with no estimated parameters.

mod seasonal_naive;

pub use seasonal_naive::SeasonalNaive;
