//! Forecasting models.

mod boxcox_wrapper;
mod traits;

pub mod arima;
pub mod baseline;
pub mod exponential;
pub mod tbats;

pub use boxcox_wrapper::{BoxCoxForecaster, LambdaChoice};
pub use traits::{BoxedForecaster, Forecaster, InformationCriteria};
