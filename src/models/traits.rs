//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// Models are created empty, fitted once with [`Forecaster::fit`], and are
/// read-only afterwards. The trait is object-safe and can be used with
/// `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the next `horizon` periods.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals of nominal coverage `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// In-sample one-step predictions; NaN where the model has no history yet.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted) on the scale of the fitted series.
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Small-sample corrected AIC where the model defines a likelihood
    /// (plain AIC for models that only report that).
    fn information_criterion(&self) -> Option<f64> {
        None
    }

    /// Number of estimated parameters, used to adjust residual tests.
    fn parameter_count(&self) -> usize {
        0
    }

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use shopping_forecast::models::{BoxedForecaster, Forecaster};
/// use shopping_forecast::models::baseline::SeasonalNaive;
///
/// let model: BoxedForecaster = Box::new(SeasonalNaive::new(12));
/// assert_eq!(model.name(), "SeasonalNaive");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Information criteria computed from a Gaussian log-likelihood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InformationCriteria {
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
}

impl InformationCriteria {
    /// Criteria for `k` parameters estimated from `n` observations.
    pub fn new(log_likelihood: f64, k: usize, n: usize) -> Self {
        let (k, nf) = (k as f64, n as f64);
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let aicc = if nf - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (nf - k - 1.0)
        } else {
            f64::INFINITY
        };
        Self {
            log_likelihood,
            aic,
            aicc,
            bic: -2.0 * log_likelihood + k * nf.ln(),
        }
    }
}
