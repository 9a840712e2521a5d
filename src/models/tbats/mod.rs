//! TBATS (Trigonometric seasonality, Box-Cox transformation, ARMA errors, Trend, Seasonal).
//!
//! Reference: De Livera, Hyndman & Snyder (2011) "Forecasting time series with
//! complex seasonal patterns using exponential smoothing"

mod auto;
mod model;

pub use auto::{AutoTBATS, TbatsConfig};
pub use model::{BoxCoxMode, TBATS};
