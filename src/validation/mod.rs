//! Statistical tests for stationarity and for model residuals.
//!
//! # Example
//!
//! ```
//! use shopping_forecast::validation::{adf_test, kpss_test, Deterministic};
//!
//! let series: Vec<f64> = (0..60).map(|t| ((t * 7919) % 17) as f64).collect();
//! let adf = adf_test(&series, None, Deterministic::Constant).unwrap();
//! let kpss = kpss_test(&series, None, Deterministic::Constant).unwrap();
//! println!("ADF p = {:.3}, KPSS p = {:.3}", adf.p_value, kpss.p_value);
//! ```

pub mod stationarity;

pub use residual_tests::{ljung_box, LjungBoxResult};
pub use stationarity::{
    adf_test, kpss_test, seasonal_strength, suggest_differencing, suggest_seasonal_differencing,
    test_stationarity, CriticalValues, Deterministic, NullHypothesis, StationarityResult,
    DEFAULT_SIGNIFICANCE,
};
