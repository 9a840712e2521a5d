//! Box-Cox wrapper that lets any forecaster work on a variance-stabilised scale.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::transform::{boxcox, boxcox_lambda, inv_boxcox_value, LambdaSearch};

/// How the wrapper picks lambda.
#[derive(Debug, Clone)]
pub enum LambdaChoice {
    Fixed(f64),
    Search(LambdaSearch),
}

impl Default for LambdaChoice {
    fn default() -> Self {
        Self::Search(LambdaSearch::default())
    }
}

/// Fits `inner` on the Box-Cox transformed series and back-transforms
/// forecasts, fitted values and interval bounds.
///
/// Point forecasts come back as the median on the original scale.
#[derive(Debug, Clone)]
pub struct BoxCoxForecaster<F> {
    inner: F,
    choice: LambdaChoice,
    lambda: Option<f64>,
    log_sum: f64,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    label: String,
}

impl<F: Forecaster> BoxCoxForecaster<F> {
    pub fn new(inner: F, choice: LambdaChoice) -> Self {
        let label = format!("BoxCox[{}]", inner.name());
        Self {
            inner,
            choice,
            lambda: None,
            log_sum: 0.0,
            fitted: None,
            residuals: None,
            label,
        }
    }

    /// Lambda used by the last fit.
    pub fn lambda(&self) -> Option<f64> {
        self.lambda
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Forecaster> Forecaster for BoxCoxForecaster<F> {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        let lambda = match &self.choice {
            LambdaChoice::Fixed(l) => *l,
            LambdaChoice::Search(search) => boxcox_lambda(y, search)?,
        };
        let transformed = series.with_values(boxcox(y, lambda)?)?;
        self.inner.fit(&transformed)?;

        let fitted: Vec<f64> = self
            .inner
            .fitted_values()
            .ok_or(ForecastError::FitRequired)?
            .iter()
            .map(|&z| inv_boxcox_value(z, lambda))
            .collect();
        self.residuals = Some(y.iter().zip(&fitted).map(|(a, f)| a - f).collect());
        self.fitted = Some(fitted);
        self.log_sum = y.iter().map(|v| v.ln()).sum();
        self.lambda = Some(lambda);
        self.label = format!("BoxCox[{}, lambda={:.3}]", self.inner.name(), lambda);
        tracing::debug!(model = %self.label, "box-cox fit complete");
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let lambda = self.lambda.ok_or(ForecastError::FitRequired)?;
        Ok(self
            .inner
            .predict(horizon)?
            .map(|z| inv_boxcox_value(z, lambda)))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let lambda = self.lambda.ok_or(ForecastError::FitRequired)?;
        Ok(self
            .inner
            .predict_with_intervals(horizon, level)?
            .map(|z| inv_boxcox_value(z, lambda)))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        &self.label
    }

    /// Inner criterion moved to the original scale with the transform's Jacobian.
    fn information_criterion(&self) -> Option<f64> {
        let lambda = self.lambda?;
        let ic = self.inner.information_criterion()?;
        Some(ic - 2.0 * (lambda - 1.0) * self.log_sum)
    }

    fn parameter_count(&self) -> usize {
        self.inner.parameter_count() + usize::from(matches!(self.choice, LambdaChoice::Search(_)))
    }
}
