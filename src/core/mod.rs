//! Core data structures for monthly time series and forecasts.

mod forecast;
mod period;
mod time_series;

pub use forecast::Forecast;
pub use period::{PeriodRange, YearMonth};
pub use time_series::{AnnualTotal, TimeSeries, MONTHLY};
