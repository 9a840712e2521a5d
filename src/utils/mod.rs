//! Numerical helpers shared by the models and diagnostics.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, residual_rmse, rmse, seasonal_naive_scale, AccuracyMetrics};
pub use ols::{ols_fit, solve_linear, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{interval_z, quantile_normal};
