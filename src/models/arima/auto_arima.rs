//! Automatic ARIMA and SARIMA order selection.

use std::collections::HashSet;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{ArimaOrder, ModelOrder, SeasonalOrder, SARIMA};
use crate::models::Forecaster;
use crate::validation::{suggest_differencing, suggest_seasonal_differencing, DEFAULT_SIGNIFICANCE};

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Consider seasonal terms and seasonal differencing.
    pub seasonal: bool,
    pub seasonal_period: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    pub max_cap_p: usize,
    pub max_cap_q: usize,
    pub max_cap_d: usize,
    /// Fix `d` instead of testing for it.
    pub d: Option<usize>,
    /// Fix `D` instead of testing for it.
    pub cap_d: Option<usize>,
    /// Significance level of the KPSS unit-root search.
    pub significance: f64,
    /// Seasonal strength above which `D = 1` is used.
    pub seasonal_strength_threshold: f64,
    /// Neighbourhood search instead of the full grid.
    pub stepwise: bool,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            seasonal: true,
            seasonal_period: 12,
            max_p: 2,
            max_q: 2,
            max_d: 2,
            max_cap_p: 1,
            max_cap_q: 1,
            max_cap_d: 1,
            d: None,
            cap_d: None,
            significance: DEFAULT_SIGNIFICANCE,
            seasonal_strength_threshold: 0.64,
            stepwise: true,
        }
    }
}

impl AutoARIMAConfig {
    pub fn non_seasonal() -> Self {
        Self {
            seasonal: false,
            ..Default::default()
        }
    }

    pub fn with_seasonal(mut self, seasonal: bool) -> Self {
        self.seasonal = seasonal;
        self
    }

    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    pub fn with_differencing(mut self, d: usize, cap_d: usize) -> Self {
        self.d = Some(d);
        self.cap_d = Some(cap_d);
        self
    }

    /// Search the full grid instead of stepping between neighbours.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    fn seasonal_active(&self) -> bool {
        self.seasonal && self.seasonal_period > 1
    }
}

/// Automatic ARIMA/SARIMA model selection by AICc.
#[derive(Debug, Clone, Default)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected: Option<SARIMA>,
    model_scores: Vec<(ModelOrder, f64)>,
    label: Option<String>,
}

impl AutoARIMA {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    pub fn selected_order(&self) -> Option<ModelOrder> {
        self.selected.as_ref().map(SARIMA::model_order)
    }

    /// Criterion of every order that fitted, best first.
    pub fn model_scores(&self) -> &[(ModelOrder, f64)] {
        &self.model_scores
    }

    fn differencing(&self, values: &[f64]) -> (usize, usize) {
        let c = &self.config;
        let m = c.seasonal_period;
        let cap_d = if c.seasonal_active() {
            c.cap_d.unwrap_or_else(|| {
                suggest_seasonal_differencing(values, m, c.seasonal_strength_threshold)
            })
            .min(c.max_cap_d)
        } else {
            0
        };
        let d = c.d.unwrap_or_else(|| {
            let base: Vec<f64> = if cap_d > 0 {
                crate::transform::seasonal_difference(values, cap_d, m)
            } else {
                values.to_vec()
            };
            suggest_differencing(&base, c.significance, c.max_d)
        });
        (d.min(c.max_d), cap_d)
    }

    fn make_order(&self, p: usize, d: usize, q: usize, sp: usize, sd: usize, sq: usize) -> ModelOrder {
        let seasonal = if self.config.seasonal_active() {
            SeasonalOrder::new(sp, sd, sq, self.config.seasonal_period)
        } else {
            SeasonalOrder::none()
        };
        ModelOrder {
            order: ArimaOrder::new(p, d, q),
            seasonal,
        }
    }

    fn within_limits(&self, o: &ModelOrder) -> bool {
        let c = &self.config;
        o.order.p <= c.max_p
            && o.order.q <= c.max_q
            && o.seasonal.p <= c.max_cap_p
            && o.seasonal.q <= c.max_cap_q
    }

    fn grid(&self, d: usize, sd: usize) -> Vec<ModelOrder> {
        let c = &self.config;
        let (max_sp, max_sq) = if c.seasonal_active() {
            (c.max_cap_p, c.max_cap_q)
        } else {
            (0, 0)
        };
        let mut out = Vec::new();
        for p in 0..=c.max_p {
            for q in 0..=c.max_q {
                for sp in 0..=max_sp {
                    for sq in 0..=max_sq {
                        out.push(self.make_order(p, d, q, sp, sd, sq));
                    }
                }
            }
        }
        out
    }

    fn evaluate(&self, series: &TimeSeries, order: ModelOrder) -> Option<(SARIMA, f64)> {
        let mut model = SARIMA::new(order.order, order.seasonal);
        match model.fit(series) {
            Ok(()) => {
                let score = model.information_criterion().filter(|s| s.is_finite())?;
                Some((model, score))
            }
            Err(e) => {
                tracing::debug!(order = %order, error = %e, "ARIMA candidate skipped");
                None
            }
        }
    }

    fn consider(
        &mut self,
        series: &TimeSeries,
        order: ModelOrder,
        seen: &mut HashSet<ModelOrder>,
        best: &mut Option<(SARIMA, f64)>,
    ) -> bool {
        if !self.within_limits(&order) || !seen.insert(order) {
            return false;
        }
        let Some((model, score)) = self.evaluate(series, order) else {
            return false;
        };
        self.model_scores.push((order, score));
        if best.as_ref().map_or(true, |(_, b)| score < *b) {
            *best = Some((model, score));
            return true;
        }
        false
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.selected = None;
        self.label = None;
        self.model_scores.clear();

        let values = series.values();
        let m = self.config.seasonal_period;
        let needed = if self.config.seasonal_active() { 2 * m + 4 } else { 10 };
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (d, sd) = self.differencing(values);
        tracing::debug!(d, seasonal_d = sd, "ARIMA differencing chosen");

        let mut seen = HashSet::new();
        let mut best: Option<(SARIMA, f64)> = None;

        if self.config.stepwise {
            let seasonal = self.config.seasonal_active();
            let s1 = usize::from(seasonal);
            let starts = [
                self.make_order(2, d, 2, s1, sd, s1),
                self.make_order(0, d, 0, 0, sd, 0),
                self.make_order(1, d, 0, s1, sd, 0),
                self.make_order(0, d, 1, 0, sd, s1),
            ];
            for order in starts {
                self.consider(series, order, &mut seen, &mut best);
            }

            // Move to the best neighbour until no neighbour improves.
            loop {
                let Some(centre) = best.as_ref().map(|(m, _)| m.model_order()) else {
                    break;
                };
                let o = centre.order;
                let s = centre.seasonal;
                let mut neighbours = Vec::new();
                for (dp, dq) in [(1i64, 0i64), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1)] {
                    let (p, q) = (o.p as i64 + dp, o.q as i64 + dq);
                    if p >= 0 && q >= 0 {
                        neighbours.push(self.make_order(p as usize, d, q as usize, s.p, sd, s.q));
                    }
                }
                if seasonal {
                    for (dp, dq) in [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)] {
                        let (sp, sq) = (s.p as i64 + dp, s.q as i64 + dq);
                        if sp >= 0 && sq >= 0 {
                            neighbours.push(self.make_order(o.p, d, o.q, sp as usize, sd, sq as usize));
                        }
                    }
                }

                let mut improved = false;
                for order in neighbours {
                    improved |= self.consider(series, order, &mut seen, &mut best);
                }
                if !improved {
                    break;
                }
            }
        } else {
            for order in self.grid(d, sd) {
                self.consider(series, order, &mut seen, &mut best);
            }
        }

        self.model_scores.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (model, score) = best.ok_or_else(|| {
            ForecastError::ComputationError("no ARIMA candidate could be fitted".to_string())
        })?;
        tracing::debug!(model = %model.name(), aicc = score, "ARIMA selected");
        self.label = Some(format!("AutoARIMA[{}]", model.name()));
        self.selected = Some(model);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("AutoARIMA")
    }

    fn information_criterion(&self) -> Option<f64> {
        self.selected.as_ref()?.information_criterion()
    }

    fn parameter_count(&self) -> usize {
        self.selected.as_ref().map_or(0, |m| m.parameter_count())
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

    fn trend_season(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| 100.0 + 2.0 * t as f64 + 10.0 * (2.0 * PI * t as f64 / 12.0).sin())
            .collect()
    }

    #[test]
    fn seasonal_search_uses_seasonal_differencing() {
        let mut model = AutoARIMA::new();
        model.fit(&monthly(trend_season(60))).unwrap();

        let order = model.selected_order().unwrap();
        assert_eq!(order.seasonal.d, 1);
        assert!(model.name().starts_with("AutoARIMA[ARIMA("));
    }

    #[test]
    fn non_seasonal_search_has_no_seasonal_terms() {
        let mut model = AutoARIMA::with_config(AutoARIMAConfig::non_seasonal());
        model.fit(&monthly(trend_season(60))).unwrap();
        assert!(!model.selected_order().unwrap().seasonal.is_active());
    }

    #[test]
    fn scores_sorted_and_within_limits() {
        let config = AutoARIMAConfig::default().exhaustive();
        let mut model = AutoARIMA::with_config(config);
        model.fit(&monthly(trend_season(72))).unwrap();

        let scores = model.model_scores();
        assert!(scores.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(scores
            .iter()
            .all(|(o, _)| o.order.p <= 2 && o.order.q <= 2 && o.seasonal.p <= 1));
    }

    #[test]
    fn fixed_differencing_is_respected() {
        let config = AutoARIMAConfig::non_seasonal().with_differencing(1, 0);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&monthly(trend_season(48))).unwrap();
        assert_eq!(model.selected_order().unwrap().order.d, 1);
    }

    #[test]
    fn short_series_is_rejected() {
        let mut model = AutoARIMA::new();
        assert!(matches!(
            model.fit(&monthly(trend_season(20))),
            Err(ForecastError::InsufficientData { needed: 28, got: 20 })
        ));
    }
}
