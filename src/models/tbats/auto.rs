//! AutoTBATS: search over TBATS structures by AIC.

use crate::core::{Forecast, TimeSeries};
use crate::detection::detect_seasonal_periods;
use crate::error::{ForecastError, Result};
use crate::models::tbats::model::{BoxCoxMode, TBATS};
use crate::models::Forecaster;
use crate::transform::LambdaSearch;

/// Which TBATS structures AutoTBATS may try. `None` tries both options.
#[derive(Debug, Clone)]
pub struct TbatsConfig {
    /// Seasonal periods; empty means detect them from the periodogram.
    pub seasonal_periods: Vec<usize>,
    pub use_box_cox: Option<bool>,
    pub use_trend: Option<bool>,
    pub use_damped_trend: Option<bool>,
    /// Try ARMA(1,0), (0,1) and (1,1) errors next to white noise.
    pub use_arma_errors: bool,
    pub lambda_search: LambdaSearch,
}

impl Default for TbatsConfig {
    fn default() -> Self {
        Self {
            seasonal_periods: vec![12],
            use_box_cox: None,
            use_trend: None,
            use_damped_trend: None,
            use_arma_errors: true,
            lambda_search: LambdaSearch::default(),
        }
    }
}

impl TbatsConfig {
    pub fn with_periods(mut self, periods: Vec<usize>) -> Self {
        self.seasonal_periods = periods;
        self
    }

    pub fn with_box_cox(mut self, use_box_cox: Option<bool>) -> Self {
        self.use_box_cox = use_box_cox;
        self
    }

    pub fn with_trend(mut self, use_trend: Option<bool>) -> Self {
        self.use_trend = use_trend;
        self
    }

    pub fn with_damped_trend(mut self, damped: Option<bool>) -> Self {
        self.use_damped_trend = damped;
        self
    }

    pub fn with_lambda_search(mut self, search: LambdaSearch) -> Self {
        self.lambda_search = search;
        self
    }

    pub fn without_arma_errors(mut self) -> Self {
        self.use_arma_errors = false;
        self
    }
}

fn options(choice: Option<bool>) -> Vec<bool> {
    match choice {
        Some(v) => vec![v],
        None => vec![false, true],
    }
}

/// Automatic TBATS selection.
///
/// # Example
/// ```
/// use shopping_forecast::core::{TimeSeries, YearMonth};
/// use shopping_forecast::models::tbats::{AutoTBATS, TbatsConfig};
/// use shopping_forecast::models::Forecaster;
///
/// let values: Vec<f64> = (0..48)
///     .map(|t| 80.0 + 6.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).cos())
///     .collect();
/// let ts = TimeSeries::new(YearMonth::new(2019, 1).unwrap(), values).unwrap();
///
/// let config = TbatsConfig::default().without_arma_errors().with_box_cox(Some(false));
/// let mut model = AutoTBATS::with_config(config);
/// model.fit(&ts).unwrap();
/// assert!(model.name().starts_with("TBATS("));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoTBATS {
    config: TbatsConfig,
    best: Option<TBATS>,
    candidates_tried: usize,
}

impl AutoTBATS {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TbatsConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn best_model(&self) -> Option<&TBATS> {
        self.best.as_ref()
    }

    /// Number of structures that fitted successfully in the last search.
    pub fn candidates_tried(&self) -> usize {
        self.candidates_tried
    }

    fn periods_for(&self, series: &TimeSeries) -> Vec<usize> {
        if !self.config.seasonal_periods.is_empty() {
            return self.config.seasonal_periods.clone();
        }
        let values = series.values();
        let max = values.len() / 2;
        let mut detected = detect_seasonal_periods(values, 2, max.max(2), 5.0, 2);
        if detected.is_empty() && series.frequency() > 1 {
            detected.push(series.frequency());
        }
        tracing::debug!(periods = ?detected, "TBATS periods detected");
        detected
    }
}

impl Forecaster for AutoTBATS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.best = None;
        self.candidates_tried = 0;

        let periods = self.periods_for(series);

        let box_cox = if series.is_strictly_positive() {
            options(self.config.use_box_cox)
        } else if self.config.use_box_cox == Some(true) {
            return Err(ForecastError::Domain(
                "TBATS with Box-Cox requires strictly positive data".to_string(),
            ));
        } else {
            vec![false]
        };
        let arma: &[(usize, usize)] = if self.config.use_arma_errors {
            &[(0, 0), (1, 0), (0, 1), (1, 1)]
        } else {
            &[(0, 0)]
        };

        let mut best_aic = f64::INFINITY;
        let mut last_error = None;
        for &bc in &box_cox {
            for trend in options(self.config.use_trend) {
                let damped_choices = if trend {
                    options(self.config.use_damped_trend)
                } else {
                    vec![false]
                };
                for damped in damped_choices {
                    for &(p, q) in arma {
                        let mode = if bc { BoxCoxMode::Auto } else { BoxCoxMode::Off };
                        let mut model = TBATS::new(periods.clone())
                            .with_box_cox(mode)
                            .with_lambda_search(self.config.lambda_search.clone())
                            .with_trend(trend)
                            .with_damped_trend(damped)
                            .with_arma(p, q);
                        if let Err(e) = model.fit(series) {
                            tracing::debug!(error = %e, "TBATS candidate skipped");
                            last_error = Some(e);
                            continue;
                        }
                        self.candidates_tried += 1;
                        if let Some(aic) = model.aic().filter(|a| a.is_finite()) {
                            if aic < best_aic {
                                best_aic = aic;
                                self.best = Some(model);
                            }
                        }
                    }
                }
            }
        }

        match &self.best {
            Some(model) => {
                tracing::debug!(model = %model.name(), aic = best_aic, "TBATS selected");
                Ok(())
            }
            None => Err(last_error.unwrap_or_else(|| {
                ForecastError::ComputationError("no TBATS candidate could be fitted".to_string())
            })),
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.best
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.best
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.best.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.best.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        self.best.as_ref().map_or("AutoTBATS", |m| m.name())
    }

    fn information_criterion(&self) -> Option<f64> {
        self.best.as_ref()?.aic()
    }

    fn parameter_count(&self) -> usize {
        self.best.as_ref().map_or(0, |m| m.parameter_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use std::f64::consts::PI;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values).unwrap()
    }

    fn seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 150.0 + t as f64 + 20.0 * (2.0 * PI * t as f64 / 12.0).sin())
            .collect()
    }

    #[test]
    fn searches_all_structures() {
        let mut model = AutoTBATS::new();
        model.fit(&monthly(seasonal(60))).unwrap();
        // At most 2 box-cox x (no trend + trend x 2 damping) x 4 arma.
        assert!(model.candidates_tried() > 12 && model.candidates_tried() <= 24);
        assert!(model.best_model().is_some());
        assert_eq!(model.predict(12).unwrap().horizon(), 12);
    }

    #[test]
    fn box_cox_skipped_for_non_positive_data() {
        let mut values = seasonal(48);
        values[0] = 0.0;
        let mut model = AutoTBATS::with_config(TbatsConfig::default().without_arma_errors());
        model.fit(&monthly(values)).unwrap();
        assert_eq!(model.best_model().unwrap().lambda(), None);
    }

    #[test]
    fn forced_box_cox_on_non_positive_data_fails() {
        let mut values = seasonal(48);
        values[0] = -5.0;
        let config = TbatsConfig::default().with_box_cox(Some(true));
        let mut model = AutoTBATS::with_config(config);
        assert!(matches!(
            model.fit(&monthly(values)),
            Err(ForecastError::Domain(_))
        ));
    }

    #[test]
    fn detects_period_when_not_given() {
        let config = TbatsConfig::default()
            .with_periods(Vec::new())
            .with_box_cox(Some(false))
            .without_arma_errors();
        let mut model = AutoTBATS::with_config(config);
        model.fit(&monthly(seasonal(72))).unwrap();
        assert_eq!(model.best_model().unwrap().periods(), &[12]);
    }

    #[test]
    fn requires_fit() {
        assert!(matches!(
            AutoTBATS::new().predict(1),
            Err(ForecastError::FitRequired)
        ));
    }
}
