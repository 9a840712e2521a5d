//! ARIMA and seasonal ARIMA models.
//!
//! - [`SARIMA`] for a fixed (p,d,q)(P,D,Q)\[m\] order
//! - [`AutoARIMA`] for unit-root driven differencing plus an AICc order search

mod auto_arima;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig};
pub use model::{ArimaOrder, ModelOrder, SeasonalOrder, SARIMA};
