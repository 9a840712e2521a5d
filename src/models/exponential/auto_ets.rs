//! Automatic ETS model selection.
//!
//! AutoETS fits every admissible ETS specification and keeps the one with
//! the lowest information criterion. A fixed specification can be forced
//! instead, in which case its errors are reported as-is.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::exponential::ets::{ETSSpec, ErrorType, SeasonalType, TrendType, ETS};
use crate::models::Forecaster;

/// Selection criterion for AutoETS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionCriterion {
    AIC,
    #[default]
    AICc,
    BIC,
}

/// Whether to search the model space or fit one specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EtsSelection {
    #[default]
    Auto,
    Fixed(ETSSpec),
}

/// Configuration for AutoETS.
#[derive(Debug, Clone)]
pub struct AutoETSConfig {
    pub criterion: SelectionCriterion,
    /// Seasonal period; 1 disables seasonal candidates.
    pub seasonal_period: usize,
    pub allow_multiplicative_error: bool,
    pub allow_multiplicative_seasonal: bool,
    pub allow_damped: bool,
    pub selection: EtsSelection,
}

impl Default for AutoETSConfig {
    fn default() -> Self {
        Self {
            criterion: SelectionCriterion::AICc,
            seasonal_period: 12,
            allow_multiplicative_error: true,
            allow_multiplicative_seasonal: true,
            allow_damped: true,
            selection: EtsSelection::Auto,
        }
    }
}

impl AutoETSConfig {
    pub fn non_seasonal() -> Self {
        Self {
            seasonal_period: 1,
            ..Default::default()
        }
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.seasonal_period = period.max(1);
        self
    }

    /// Restrict the search to additive components.
    pub fn additive_only(mut self) -> Self {
        self.allow_multiplicative_error = false;
        self.allow_multiplicative_seasonal = false;
        self
    }

    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Force a single specification instead of searching.
    pub fn fixed(mut self, spec: ETSSpec) -> Self {
        self.selection = EtsSelection::Fixed(spec);
        self
    }
}

/// Automatic ETS model selection.
#[derive(Debug, Clone, Default)]
pub struct AutoETS {
    config: AutoETSConfig,
    selected_model: Option<ETS>,
    model_scores: Vec<(ETSSpec, f64)>,
    label: Option<String>,
}

impl AutoETS {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AutoETSConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AutoETSConfig {
        &self.config
    }

    pub fn selected_spec(&self) -> Option<ETSSpec> {
        self.selected_model.as_ref().map(ETS::spec)
    }

    /// Criterion value of every candidate that fitted, best first.
    pub fn model_scores(&self) -> &[(ETSSpec, f64)] {
        &self.model_scores
    }

    fn candidates(&self, seasonal: bool, positive: bool) -> Vec<ETSSpec> {
        let mut errors = vec![ErrorType::Additive];
        if self.config.allow_multiplicative_error && positive {
            errors.push(ErrorType::Multiplicative);
        }

        let mut trends = vec![TrendType::None, TrendType::Additive];
        if self.config.allow_damped {
            trends.push(TrendType::AdditiveDamped);
        }

        let mut seasonals = vec![SeasonalType::None];
        if seasonal {
            seasonals.push(SeasonalType::Additive);
            if self.config.allow_multiplicative_seasonal && positive {
                seasonals.push(SeasonalType::Multiplicative);
            }
        }

        let mut out = Vec::new();
        for &error in &errors {
            for &trend in &trends {
                for &seasonal in &seasonals {
                    // M error with additive season is numerically unstable.
                    if error == ErrorType::Multiplicative && seasonal == SeasonalType::Additive {
                        continue;
                    }
                    out.push(ETSSpec::new(error, trend, seasonal));
                }
            }
        }
        out
    }

    fn score(&self, model: &ETS) -> Option<f64> {
        match self.config.criterion {
            SelectionCriterion::AIC => model.aic(),
            SelectionCriterion::AICc => model.aicc(),
            SelectionCriterion::BIC => model.bic(),
        }
        .filter(|s| s.is_finite())
    }

    fn fit_fixed(&mut self, spec: ETSSpec, series: &TimeSeries) -> Result<()> {
        let period = if spec.has_seasonal() {
            self.config.seasonal_period
        } else {
            1
        };
        let mut model = ETS::new(spec, period);
        model.fit(series)?;
        self.model_scores = self.score(&model).map(|s| vec![(spec, s)]).unwrap_or_default();
        self.label = Some(spec.short_name());
        self.selected_model = Some(model);
        Ok(())
    }
}

impl Forecaster for AutoETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.selected_model = None;
        self.model_scores.clear();
        self.label = None;

        if let EtsSelection::Fixed(spec) = self.config.selection {
            return self.fit_fixed(spec, series);
        }

        let n = series.len();
        if n < 4 {
            return Err(ForecastError::InsufficientData { needed: 4, got: n });
        }
        let m = self.config.seasonal_period;
        let seasonal = m > 1 && n >= 2 * m;
        let positive = series.is_strictly_positive();

        let mut best: Option<(ETS, f64)> = None;
        for spec in self.candidates(seasonal, positive) {
            let period = if spec.has_seasonal() { m } else { 1 };
            let mut model = ETS::new(spec, period);
            if let Err(e) = model.fit(series) {
                tracing::debug!(model = %spec.short_name(), error = %e, "ETS candidate skipped");
                continue;
            }
            let Some(score) = self.score(&model) else {
                continue;
            };
            self.model_scores.push((spec, score));
            if best.as_ref().map_or(true, |(_, b)| score < *b) {
                best = Some((model, score));
            }
        }

        self.model_scores.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (model, score) = best.ok_or_else(|| {
            ForecastError::ComputationError("no ETS candidate could be fitted".to_string())
        })?;
        tracing::debug!(model = %model.spec().short_name(), score, "ETS selected");
        self.label = Some(format!("AutoETS[{}]", model.spec().short_name()));
        self.selected_model = Some(model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("AutoETS")
    }

    fn information_criterion(&self) -> Option<f64> {
        self.selected_model.as_ref()?.aicc()
    }

    fn parameter_count(&self) -> usize {
        self.selected_model
            .as_ref()
            .map_or(0, |m| m.parameter_count())
    }
}
