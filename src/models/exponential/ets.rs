//! ETS (Error-Trend-Seasonal) state-space forecasting model.
//!
//! Point recursions are shared by the additive- and multiplicative-error
//! forms; the error type only changes the likelihood and the interval
//! scaling.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, InformationCriteria};
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::interval_z;

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorType {
    #[default]
    Additive,
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendType {
    #[default]
    None,
    Additive,
    AdditiveDamped,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalType {
    #[default]
    None,
    Additive,
    Multiplicative,
}

/// ETS model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ETSSpec {
    pub error: ErrorType,
    pub trend: TrendType,
    pub seasonal: SeasonalType,
}

impl ETSSpec {
    pub fn new(error: ErrorType, trend: TrendType, seasonal: SeasonalType) -> Self {
        Self {
            error,
            trend,
            seasonal,
        }
    }

    /// ETS(A,N,N) - simple exponential smoothing.
    pub fn ann() -> Self {
        Self::new(ErrorType::Additive, TrendType::None, SeasonalType::None)
    }

    /// ETS(A,A,A) - additive Holt-Winters.
    pub fn aaa() -> Self {
        Self::new(
            ErrorType::Additive,
            TrendType::Additive,
            SeasonalType::Additive,
        )
    }

    /// ETS(M,A,M) - multiplicative Holt-Winters.
    pub fn mam() -> Self {
        Self::new(
            ErrorType::Multiplicative,
            TrendType::Additive,
            SeasonalType::Multiplicative,
        )
    }

    /// Short name such as `ETS(M,Ad,M)`.
    pub fn short_name(&self) -> String {
        let e = match self.error {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        };
        let t = match self.trend {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
        };
        let s = match self.seasonal {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        format!("ETS({},{},{})", e, t, s)
    }

    pub fn has_trend(&self) -> bool {
        self.trend != TrendType::None
    }

    pub fn has_seasonal(&self) -> bool {
        self.seasonal != SeasonalType::None
    }

    pub fn is_damped(&self) -> bool {
        self.trend == TrendType::AdditiveDamped
    }

    /// True if any component multiplies, which needs positive data.
    pub fn is_multiplicative(&self) -> bool {
        self.error == ErrorType::Multiplicative || self.seasonal == SeasonalType::Multiplicative
    }
}

/// Smoothing parameters in the classical (smoothing) form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtsParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

#[derive(Debug, Clone)]
struct EtsState {
    level: f64,
    trend: f64,
    /// Seasonal indices keyed by `t % period`.
    season: Vec<f64>,
}

const PARAM_BOUNDS: (f64, f64) = (1e-4, 0.9999);
const PHI_BOUNDS: (f64, f64) = (0.8, 0.98);

/// ETS state-space model.
#[derive(Debug, Clone)]
pub struct ETS {
    spec: ETSSpec,
    period: usize,
    label: String,
    params: Option<EtsParams>,
    state: Option<EtsState>,
    n_obs: usize,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    criteria: Option<InformationCriteria>,
}

impl ETS {
    /// Create a new ETS model with the given specification.
    pub fn new(spec: ETSSpec, period: usize) -> Self {
        Self {
            spec,
            period: period.max(1),
            label: spec.short_name(),
            params: None,
            state: None,
            n_obs: 0,
            fitted: None,
            residuals: None,
            sigma2: None,
            criteria: None,
        }
    }

    pub fn spec(&self) -> ETSSpec {
        self.spec
    }

    pub fn params(&self) -> Option<EtsParams> {
        self.params
    }

    pub fn criteria(&self) -> Option<InformationCriteria> {
        self.criteria
    }

    pub fn aic(&self) -> Option<f64> {
        self.criteria.map(|c| c.aic)
    }

    pub fn aicc(&self) -> Option<f64> {
        self.criteria.map(|c| c.aicc)
    }

    pub fn bic(&self) -> Option<f64> {
        self.criteria.map(|c| c.bic)
    }

    fn season_len(&self) -> usize {
        if self.spec.has_seasonal() {
            self.period
        } else {
            0
        }
    }

    /// Free parameters: smoothing weights, two initial states, seasonal
    /// indices less one, and the innovation variance.
    fn n_parameters(&self) -> usize {
        let mut k = 1 + 1 + 1;
        if self.spec.has_trend() {
            k += 2;
        }
        if self.spec.is_damped() {
            k += 1;
        }
        if self.spec.has_seasonal() {
            k += 1 + self.period - 1;
        }
        k
    }

    /// Heuristic starting states from the first seasons of data.
    fn initial_state(&self, values: &[f64]) -> EtsState {
        let m = self.season_len();
        let season = if m > 1 {
            initial_seasonal_indices(values, m, self.spec.seasonal)
        } else {
            Vec::new()
        };

        let span = if m > 1 { (2 * m).min(values.len()) } else { values.len().min(10) };
        let adjusted: Vec<f64> = values[..span]
            .iter()
            .enumerate()
            .map(|(t, &y)| match self.spec.seasonal {
                SeasonalType::None => y,
                SeasonalType::Additive => y - season[t % m],
                SeasonalType::Multiplicative => y / season[t % m],
            })
            .collect();

        let (level, trend) = if self.spec.has_trend() && adjusted.len() >= 3 {
            let rows: Vec<Vec<f64>> = (0..adjusted.len()).map(|t| vec![1.0, t as f64]).collect();
            match ols_fit(&rows, &adjusted) {
                // Level sits one step before the first observation.
                Ok(fit) => (fit.coefficients[0] - fit.coefficients[1], fit.coefficients[1]),
                Err(_) => (adjusted[0], 0.0),
            }
        } else {
            let k = adjusted.len().min(if m > 1 { m } else { 10 }).max(1);
            (adjusted[..k].iter().sum::<f64>() / k as f64, 0.0)
        };

        EtsState {
            level,
            trend,
            season,
        }
    }

    /// One-step prediction from the current state for time index `t`.
    fn one_step(&self, state: &EtsState, params: &EtsParams, t: usize) -> f64 {
        let base = state.level + params.phi * state.trend;
        match self.spec.seasonal {
            SeasonalType::None => base,
            SeasonalType::Additive => base + state.season[t % self.period],
            SeasonalType::Multiplicative => base * state.season[t % self.period],
        }
    }

    /// Advance the state with observation `y` at time `t`.
    fn update(&self, state: &mut EtsState, params: &EtsParams, t: usize, y: f64) {
        let m = self.period;
        let prev_level = state.level;
        let damped_trend = params.phi * state.trend;
        let base = prev_level + damped_trend;

        let deseasonalised = match self.spec.seasonal {
            SeasonalType::None => y,
            SeasonalType::Additive => y - state.season[t % m],
            SeasonalType::Multiplicative => y / state.season[t % m],
        };
        state.level = params.alpha * deseasonalised + (1.0 - params.alpha) * base;

        if self.spec.has_trend() {
            state.trend =
                params.beta * (state.level - prev_level) + (1.0 - params.beta) * damped_trend;
        }

        match self.spec.seasonal {
            SeasonalType::None => {}
            SeasonalType::Additive => {
                let s = state.season[t % m];
                state.season[t % m] = params.gamma * (y - base) + (1.0 - params.gamma) * s;
            }
            SeasonalType::Multiplicative => {
                let s = state.season[t % m];
                state.season[t % m] = params.gamma * (y / base) + (1.0 - params.gamma) * s;
            }
        }
    }

    /// Run the filter; returns one-step predictions and the final state.
    fn filter(&self, values: &[f64], params: &EtsParams, init: EtsState) -> (Vec<f64>, EtsState) {
        let mut state = init;
        let mut preds = Vec::with_capacity(values.len());
        for (t, &y) in values.iter().enumerate() {
            let yhat = self.one_step(&state, params, t);
            preds.push(yhat);
            if !yhat.is_finite() {
                break;
            }
            self.update(&mut state, params, t, y);
        }
        (preds, state)
    }

    /// `n ln(Σ e²) + 2 Σ ln|ŷ|` (the last term only for multiplicative errors).
    fn objective(&self, values: &[f64], preds: &[f64]) -> f64 {
        if preds.len() != values.len() || preds.iter().any(|p| !p.is_finite()) {
            return f64::INFINITY;
        }
        let n = values.len() as f64;
        match self.spec.error {
            ErrorType::Additive => {
                let sse: f64 = values.iter().zip(preds).map(|(y, p)| (y - p).powi(2)).sum();
                n * sse.max(1e-300).ln()
            }
            ErrorType::Multiplicative => {
                if preds.iter().any(|&p| p <= 0.0) {
                    return f64::INFINITY;
                }
                let sse: f64 = values
                    .iter()
                    .zip(preds)
                    .map(|(y, p)| ((y - p) / p).powi(2))
                    .sum();
                n * sse.max(1e-300).ln() + 2.0 * preds.iter().map(|p| p.ln()).sum::<f64>()
            }
        }
    }

    fn unpack(&self, x: &[f64]) -> (EtsParams, f64, f64) {
        let mut i = 0;
        let mut next = || {
            let v = x[i];
            i += 1;
            v
        };
        let alpha = next();
        let beta = if self.spec.has_trend() { next() } else { 0.0 };
        let gamma = if self.spec.has_seasonal() { next() } else { 0.0 };
        let phi = if self.spec.is_damped() {
            next()
        } else if self.spec.has_trend() {
            1.0
        } else {
            0.0
        };
        let level_shift = next();
        let trend_shift = if self.spec.has_trend() { next() } else { 0.0 };
        (
            EtsParams {
                alpha,
                beta,
                gamma,
                phi,
            },
            level_shift,
            trend_shift,
        )
    }
}

impl Forecaster for ETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.season_len();

        if self.spec.is_multiplicative() {
            if let Some(bad) = values.iter().find(|&&v| v <= 0.0) {
                return Err(ForecastError::Domain(format!(
                    "{} requires strictly positive data, found {}",
                    self.label, bad
                )));
            }
        }
        let needed = if m > 1 { 2 * m } else { 3 };
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let init = self.initial_state(values);
        let scale = values.iter().map(|v| v.abs()).fold(0.0, f64::max).max(1.0);

        let mut start = vec![0.3];
        let mut bounds = vec![PARAM_BOUNDS];
        if self.spec.has_trend() {
            start.push(0.1);
            bounds.push(PARAM_BOUNDS);
        }
        if self.spec.has_seasonal() {
            start.push(0.1);
            bounds.push(PARAM_BOUNDS);
        }
        if self.spec.is_damped() {
            start.push(0.95);
            bounds.push(PHI_BOUNDS);
        }
        start.push(0.0);
        bounds.push((-scale, scale));
        if self.spec.has_trend() {
            start.push(0.0);
            bounds.push((-scale, scale));
        }

        let evaluate = |x: &[f64]| {
            let (params, dl, db) = self.unpack(x);
            let mut s = init.clone();
            s.level += dl;
            s.trend += db;
            let (preds, _) = self.filter(values, &params, s);
            self.objective(values, &preds)
        };

        let result = nelder_mead(
            evaluate,
            &start,
            Some(&bounds),
            NelderMeadConfig::default()
                .with_max_iter(2000)
                .with_initial_step(0.1),
        );
        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{} likelihood could not be evaluated",
                self.label
            )));
        }

        let (params, dl, db) = self.unpack(&result.optimal_point);
        let mut s = init;
        s.level += dl;
        s.trend += db;
        let (fitted, state) = self.filter(values, &params, s);

        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();
        let n = values.len();
        let sigma2 = match self.spec.error {
            ErrorType::Additive => residuals.iter().map(|e| e * e).sum::<f64>() / n as f64,
            ErrorType::Multiplicative => {
                residuals
                    .iter()
                    .zip(&fitted)
                    .map(|(e, f)| (e / f).powi(2))
                    .sum::<f64>()
                    / n as f64
            }
        };

        let log_likelihood = -0.5
            * (result.optimal_value
                + n as f64 * (1.0 + (2.0 * std::f64::consts::PI).ln() - (n as f64).ln()));

        self.criteria = Some(InformationCriteria::new(
            log_likelihood,
            self.n_parameters(),
            n,
        ));
        self.params = Some(params);
        self.state = Some(state);
        self.n_obs = n;
        self.sigma2 = Some(sigma2);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let params = self.params.ok_or(ForecastError::FitRequired)?;

        let mut points = Vec::with_capacity(horizon);
        let mut damp_sum = 0.0;
        let mut damp_pow = 1.0;
        for h in 1..=horizon {
            damp_pow *= params.phi;
            damp_sum += if self.spec.has_trend() { damp_pow } else { 0.0 };
            let base = state.level + damp_sum * state.trend;
            let t = self.n_obs + h - 1;
            let p = match self.spec.seasonal {
                SeasonalType::None => base,
                SeasonalType::Additive => base + state.season[t % self.period],
                SeasonalType::Multiplicative => base * state.season[t % self.period],
            };
            points.push(p);
        }
        Ok(Forecast::from_values(points))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        let params = self.params.ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;
        let z = interval_z(level);

        // Error-correction weights of the linear homoscedastic class.
        let alpha = params.alpha;
        let beta = alpha * params.beta;
        let gamma = (1.0 - alpha) * params.gamma;
        let mut acc = 0.0;
        let mut phi_sum = 0.0;
        let mut phi_pow = 1.0;

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, &p) in forecast.point().iter().enumerate() {
            if h > 0 {
                phi_pow *= params.phi;
                phi_sum += phi_pow;
                let j = h;
                let seasonal_hit = self.spec.has_seasonal() && j % self.period == 0;
                let c = alpha
                    + if self.spec.has_trend() { beta * phi_sum } else { 0.0 }
                    + if seasonal_hit { gamma } else { 0.0 };
                acc += c * c;
            }
            let mut var = sigma2 * (1.0 + acc);
            if self.spec.error == ErrorType::Multiplicative {
                var *= p * p;
            }
            let se = var.sqrt();
            lower.push(p - z * se);
            upper.push(p + z * se);
        }
        Forecast::from_values_with_intervals(forecast.point().to_vec(), lower, upper, level)
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

    fn information_criterion(&self) -> Option<f64> {
        self.aicc()
    }

    fn parameter_count(&self) -> usize {
        self.n_parameters()
    }
}

/// Seasonal indices from a centred moving average over the first years.
fn initial_seasonal_indices(values: &[f64], m: usize, kind: SeasonalType) -> Vec<f64> {
    let span = values.len().min(3 * m).max(2 * m).min(values.len());
    let y = &values[..span];
    let half = m / 2;

    let mut sums = vec![0.0; m];
    let mut counts = vec![0usize; m];
    for t in half..span.saturating_sub(half) {
        let trend = if m % 2 == 0 {
            let inner: f64 = y[t + 1 - half..t + half].iter().sum();
            (inner + 0.5 * (y[t - half] + y[t + half])) / m as f64
        } else {
            y[t - half..=t + half].iter().sum::<f64>() / m as f64
        };
        let ratio = match kind {
            SeasonalType::Multiplicative => y[t] / trend,
            _ => y[t] - trend,
        };
        sums[t % m] += ratio;
        counts[t % m] += 1;
    }

    let mut season: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| match (c, kind) {
            (0, SeasonalType::Multiplicative) => 1.0,
            (0, _) => 0.0,
            _ => s / c as f64,
        })
        .collect();

    match kind {
        SeasonalType::Multiplicative => {
            let mean = season.iter().sum::<f64>() / m as f64;
            if mean > 0.0 {
                season.iter_mut().for_each(|s| *s /= mean);
            }
        }
        _ => {
            let mean = season.iter().sum::<f64>() / m as f64;
            season.iter_mut().for_each(|s| *s -= mean);
        }
    }
    season
}
