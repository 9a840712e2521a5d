//! TBATS: trigonometric seasonality, Box-Cox, ARMA errors, trend and seasonal.
//!
//! Each seasonal period `m` with `k` harmonics contributes `k` pairs of
//! states `(s_j, s*_j)` rotating at frequency `2 pi j / m`. Only `s_j`
//! enters the observation:
//!
//! ```text
//! y_t   = l + phi b + sum_j s_j + d_t
//! d_t   = sum ar_i d_{t-i} + sum ma_i e_{t-i} + e_t
//! l'    = l + phi b + alpha d_t
//! b'    = phi b + beta d_t
//! s_j'  =  s_j cos w_j + s*_j sin w_j + gamma1 d_t
//! s*_j' = -s_j sin w_j + s*_j cos w_j + gamma2 d_t
//! ```

use std::f64::consts::PI;
use std::fmt::Write as _;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, InformationCriteria};
use crate::transform::{boxcox, boxcox_lambda, inv_boxcox_value, LambdaSearch};
use crate::utils::ols::ols_fit;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::interval_z;

/// How the model treats Box-Cox.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoxCoxMode {
    #[default]
    Off,
    Fixed(f64),
    /// Estimate lambda from the training data.
    Auto,
}

#[derive(Debug, Clone, Copy)]
struct Harmonic {
    frequency: f64,
    period_index: usize,
}

#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    cos: Vec<f64>,
    sin: Vec<f64>,
    /// Most recent first.
    arma_d: Vec<f64>,
    /// Most recent first.
    arma_e: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Params {
    alpha: f64,
    beta: f64,
    phi: f64,
    gamma_one: Vec<f64>,
    gamma_two: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

/// TBATS forecasting model with fixed structure.
///
/// # Example
/// ```
/// use shopping_forecast::core::{TimeSeries, YearMonth};
/// use shopping_forecast::models::tbats::TBATS;
/// use shopping_forecast::models::Forecaster;
///
/// let values: Vec<f64> = (0..60)
///     .map(|t| 50.0 + 0.2 * t as f64 + 8.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin())
///     .collect();
/// let ts = TimeSeries::new(YearMonth::new(2018, 1).unwrap(), values).unwrap();
///
/// let mut model = TBATS::new(vec![12]);
/// model.fit(&ts).unwrap();
/// assert_eq!(model.predict(12).unwrap().horizon(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct TBATS {
    periods: Vec<usize>,
    box_cox: BoxCoxMode,
    lambda_search: LambdaSearch,
    use_trend: bool,
    use_damped: bool,
    ar_order: usize,
    ma_order: usize,
    harmonics_override: Option<Vec<usize>>,

    harmonics: Vec<usize>,
    lambda: Option<f64>,
    params: Option<Params>,
    state: Option<State>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: f64,
    criteria: Option<InformationCriteria>,
    label: String,
}

impl TBATS {
    /// Trend on, no Box-Cox, no ARMA errors.
    pub fn new(periods: Vec<usize>) -> Self {
        let periods: Vec<usize> = periods.into_iter().filter(|&m| m > 1).collect();
        Self {
            harmonics: vec![0; periods.len()],
            periods,
            box_cox: BoxCoxMode::Off,
            lambda_search: LambdaSearch::default(),
            use_trend: true,
            use_damped: false,
            ar_order: 0,
            ma_order: 0,
            harmonics_override: None,
            lambda: None,
            params: None,
            state: None,
            fitted: None,
            residuals: None,
            sigma2: 0.0,
            criteria: None,
            label: "TBATS".to_string(),
        }
    }

    pub fn with_box_cox(mut self, mode: BoxCoxMode) -> Self {
        self.box_cox = mode;
        self
    }

    pub fn with_lambda_search(mut self, search: LambdaSearch) -> Self {
        self.lambda_search = search;
        self
    }

    pub fn with_trend(mut self, trend: bool) -> Self {
        self.use_trend = trend;
        if !trend {
            self.use_damped = false;
        }
        self
    }

    pub fn with_damped_trend(mut self, damped: bool) -> Self {
        self.use_damped = damped;
        if damped {
            self.use_trend = true;
        }
        self
    }

    pub fn with_arma(mut self, p: usize, q: usize) -> Self {
        self.ar_order = p;
        self.ma_order = q;
        self
    }

    /// Fix the number of harmonics per period instead of choosing by AIC.
    pub fn with_harmonics(mut self, k: Vec<usize>) -> Self {
        self.harmonics_override = Some(k);
        self
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    pub fn harmonics(&self) -> &[usize] {
        &self.harmonics
    }

    pub fn lambda(&self) -> Option<f64> {
        self.lambda
    }

    pub fn aic(&self) -> Option<f64> {
        self.criteria.map(|c| c.aic)
    }

    /// Largest usable harmonic count; the Nyquist pair is degenerate.
    pub fn max_harmonics(period: usize) -> usize {
        (period.saturating_sub(1) / 2).max(1)
    }

    fn harmonic_list(&self) -> Vec<Harmonic> {
        let mut out = Vec::new();
        for (i, (&m, &k)) in self.periods.iter().zip(&self.harmonics).enumerate() {
            for j in 1..=k {
                out.push(Harmonic {
                    frequency: 2.0 * PI * j as f64 / m as f64,
                    period_index: i,
                });
            }
        }
        out
    }

    fn n_parameters(&self) -> usize {
        let seeds = 1 + usize::from(self.use_trend) + 2 * self.harmonics.iter().sum::<usize>();
        let smoothing = 1
            + usize::from(self.use_trend)
            + usize::from(self.use_damped)
            + 2 * self.periods.len();
        seeds
            + smoothing
            + self.ar_order
            + self.ma_order
            + usize::from(self.lambda.is_some())
            + 1
    }

    fn build_label(&mut self) {
        let mut s = String::from("TBATS(");
        match self.lambda {
            Some(l) => {
                let _ = write!(s, "{:.3}", l);
            }
            None => s.push('1'),
        }
        let _ = write!(s, ", {{{},{}}}, ", self.ar_order, self.ma_order);
        match (&self.params, self.use_damped) {
            (Some(p), true) => {
                let _ = write!(s, "{:.3}", p.phi);
            }
            _ => s.push('-'),
        }
        s.push_str(", {");
        let parts: Vec<String> = self
            .periods
            .iter()
            .zip(&self.harmonics)
            .map(|(m, k)| format!("<{},{}>", m, k))
            .collect();
        s.push_str(&parts.join(","));
        s.push_str("})");
        self.label = s;
    }

    /// Seed states from a regression on trend and Fourier terms.
    fn initial_state(&self, z: &[f64], harmonics: &[Harmonic]) -> State {
        let span_len = self
            .periods
            .iter()
            .max()
            .map_or(z.len(), |&m| (3 * m).max(2 * harmonics.len() + 4))
            .min(z.len());
        let span = &z[..span_len];

        let rows: Vec<Vec<f64>> = (0..span.len())
            .map(|t| {
                let tf = t as f64;
                let mut row = vec![1.0];
                if self.use_trend {
                    row.push(tf);
                }
                for h in harmonics {
                    row.push((h.frequency * tf).cos());
                    row.push((h.frequency * tf).sin());
                }
                row
            })
            .collect();

        let mut state = State {
            level: span.iter().sum::<f64>() / span.len() as f64,
            trend: 0.0,
            cos: vec![0.0; harmonics.len()],
            sin: vec![0.0; harmonics.len()],
            arma_d: vec![0.0; self.ar_order],
            arma_e: vec![0.0; self.ma_order],
        };

        if let Ok(fit) = ols_fit(&rows, span) {
            let c = &fit.coefficients;
            let mut i = 1;
            if self.use_trend {
                state.trend = c[1];
                // Level precedes the first observation by one step.
                state.level = c[0] - c[1];
                i = 2;
            } else {
                state.level = c[0];
            }
            for j in 0..harmonics.len() {
                state.cos[j] = c[i + 2 * j];
                state.sin[j] = c[i + 2 * j + 1];
            }
        }
        state
    }

    /// Advance one step; returns the one-step prediction made before it.
    fn step(
        state: &mut State,
        params: &Params,
        harmonics: &[Harmonic],
        observed: Option<f64>,
    ) -> f64 {
        let base = state.level + params.phi * state.trend + state.cos.iter().sum::<f64>();
        let arma: f64 = params
            .ar
            .iter()
            .zip(&state.arma_d)
            .map(|(a, d)| a * d)
            .sum::<f64>()
            + params
                .ma
                .iter()
                .zip(&state.arma_e)
                .map(|(m, e)| m * e)
                .sum::<f64>();
        let prediction = base + arma;

        let (d, e) = match observed {
            Some(y) => (y - base, y - prediction),
            None => (arma, 0.0),
        };

        state.level += params.phi * state.trend + params.alpha * d;
        state.trend = params.phi * state.trend + params.beta * d;
        for (j, h) in harmonics.iter().enumerate() {
            let (c, s) = (state.cos[j], state.sin[j]);
            let (cw, sw) = (h.frequency.cos(), h.frequency.sin());
            state.cos[j] = c * cw + s * sw + params.gamma_one[h.period_index] * d;
            state.sin[j] = -c * sw + s * cw + params.gamma_two[h.period_index] * d;
        }
        if !state.arma_d.is_empty() {
            state.arma_d.rotate_right(1);
            state.arma_d[0] = d;
        }
        if !state.arma_e.is_empty() {
            state.arma_e.rotate_right(1);
            state.arma_e[0] = e;
        }
        prediction
    }

    fn run(
        z: &[f64],
        init: &State,
        params: &Params,
        harmonics: &[Harmonic],
    ) -> (Vec<f64>, State) {
        let mut state = init.clone();
        let fitted = z
            .iter()
            .map(|&y| Self::step(&mut state, params, harmonics, Some(y)))
            .collect();
        (fitted, state)
    }

    fn unpack(&self, x: &[f64]) -> Params {
        let np = self.periods.len();
        let mut it = x.iter().copied();
        let mut next = || it.next().unwrap_or(0.0);
        let alpha = next();
        let beta = if self.use_trend { next() } else { 0.0 };
        let phi = if self.use_damped {
            next()
        } else if self.use_trend {
            1.0
        } else {
            0.0
        };
        let gamma_one = (0..np).map(|_| next()).collect();
        let gamma_two = (0..np).map(|_| next()).collect();
        let ar = (0..self.ar_order).map(|_| next()).collect();
        let ma = (0..self.ma_order).map(|_| next()).collect();
        Params {
            alpha,
            beta,
            phi,
            gamma_one,
            gamma_two,
            ar,
            ma,
        }
    }

    fn choose_harmonics(&self, z: &[f64]) -> Vec<usize> {
        if let Some(k) = &self.harmonics_override {
            return self
                .periods
                .iter()
                .enumerate()
                .map(|(i, &m)| k.get(i).copied().unwrap_or(1).clamp(1, Self::max_harmonics(m)))
                .collect();
        }
        let mut remaining = z.to_vec();
        self.periods
            .iter()
            .map(|&m| {
                let (k, rest) = select_harmonics(&remaining, m);
                remaining = rest;
                k
            })
            .collect()
    }

    /// Impulse response of one unit innovation over `horizon` steps.
    fn impulse_response(&self, params: &Params, horizon: usize) -> Vec<f64> {
        let harmonics = self.harmonic_list();
        let mut state = State {
            level: 0.0,
            trend: 0.0,
            cos: vec![0.0; harmonics.len()],
            sin: vec![0.0; harmonics.len()],
            arma_d: vec![0.0; self.ar_order],
            arma_e: vec![0.0; self.ma_order],
        };
        Self::step(&mut state, params, &harmonics, Some(1.0));
        (1..horizon)
            .map(|_| Self::step(&mut state, params, &harmonics, None))
            .collect()
    }

    fn back_transform(&self, z: f64) -> f64 {
        match self.lambda {
            Some(l) => inv_boxcox_value(z, l),
            None => z,
        }
    }
}

impl Default for TBATS {
    fn default() -> Self {
        Self::new(vec![12])
    }
}

impl Forecaster for TBATS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        let longest = self.periods.iter().copied().max().unwrap_or(1);
        let needed = (2 * longest).max(10);
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        self.lambda = match self.box_cox {
            BoxCoxMode::Off => None,
            BoxCoxMode::Fixed(l) => Some(l),
            BoxCoxMode::Auto => Some(boxcox_lambda(y, &self.lambda_search)?),
        };
        let z = match self.lambda {
            Some(l) => boxcox(y, l)?,
            None => y.to_vec(),
        };

        self.harmonics = self.choose_harmonics(&z);
        let harmonics = self.harmonic_list();
        let init = self.initial_state(&z, &harmonics);

        let np = self.periods.len();
        let mut start = vec![0.09];
        let mut bounds = vec![(1e-3, 0.999)];
        if self.use_trend {
            start.push(0.05);
            bounds.push((-0.5, 0.5));
        }
        if self.use_damped {
            start.push(0.95);
            bounds.push((0.8, 0.98));
        }
        for _ in 0..2 * np {
            start.push(0.0);
            bounds.push((-0.1, 0.1));
        }
        for _ in 0..self.ar_order + self.ma_order {
            start.push(0.0);
            bounds.push((-0.95, 0.95));
        }

        let n = z.len() as f64;
        let objective = |x: &[f64]| {
            let params = self.unpack(x);
            let (fitted, _) = Self::run(&z, &init, &params, &harmonics);
            let sse: f64 = z.iter().zip(&fitted).map(|(a, f)| (a - f).powi(2)).sum();
            n * (sse / n).max(1e-300).ln()
        };
        let result = nelder_mead(
            objective,
            &start,
            Some(&bounds),
            NelderMeadConfig::default().with_max_iter(300 * start.len()),
        );
        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(
                "TBATS likelihood could not be evaluated".to_string(),
            ));
        }

        let params = self.unpack(&result.optimal_point);
        let (fitted_z, state) = Self::run(&z, &init, &params, &harmonics);
        let sse: f64 = z.iter().zip(&fitted_z).map(|(a, f)| (a - f).powi(2)).sum();
        self.sigma2 = (sse / n).max(1e-12);

        // Jacobian of the transform keeps likelihoods comparable across lambda.
        let jacobian = match self.lambda {
            Some(l) => (l - 1.0) * y.iter().map(|v| v.ln()).sum::<f64>(),
            None => 0.0,
        };
        let log_likelihood = -0.5 * n * ((2.0 * PI * self.sigma2).ln() + 1.0) + jacobian;

        let fitted: Vec<f64> = fitted_z.iter().map(|&f| self.back_transform(f)).collect();
        self.residuals = Some(y.iter().zip(&fitted).map(|(a, f)| a - f).collect());
        self.fitted = Some(fitted);
        self.params = Some(params);
        self.state = Some(state);
        self.criteria = Some(InformationCriteria::new(
            log_likelihood,
            self.n_parameters(),
            y.len(),
        ));
        self.build_label();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let params = self.params.as_ref().ok_or(ForecastError::FitRequired)?;
        let mut state = self.state.clone().ok_or(ForecastError::FitRequired)?;
        let harmonics = self.harmonic_list();
        let points = (0..horizon)
            .map(|_| self.back_transform(Self::step(&mut state, params, &harmonics, None)))
            .collect();
        Ok(Forecast::from_values(points))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let params = self.params.as_ref().ok_or(ForecastError::FitRequired)?;
        let mut state = self.state.clone().ok_or(ForecastError::FitRequired)?;
        let harmonics = self.harmonic_list();
        let z = interval_z(level);
        let response = self.impulse_response(params, horizon);

        let mut acc = 0.0;
        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 0..horizon {
            let centre = Self::step(&mut state, params, &harmonics, None);
            if h > 0 {
                acc += response[h - 1].powi(2);
            }
            let se = (self.sigma2 * (1.0 + acc)).sqrt();
            point.push(self.back_transform(centre));
            lower.push(self.back_transform(centre - z * se));
            upper.push(self.back_transform(centre + z * se));
        }
        Forecast::from_values_with_intervals(point, lower, upper, level)
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
        self.aic()
    }

    fn parameter_count(&self) -> usize {
        self.n_parameters()
    }
}

/// Harmonic count for `period` by AIC on a detrended series, plus the
/// residual left for the next period.
fn select_harmonics(values: &[f64], period: usize) -> (usize, Vec<f64>) {
    let n = values.len();
    let half = period;
    let detrended: Vec<f64> = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            values[i] - values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect();

    let max_k = TBATS::max_harmonics(period).min(n.saturating_sub(2) / 4).max(1);
    let mut best = (1, f64::INFINITY, detrended.clone());
    for k in 1..=max_k {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|t| {
                (1..=k)
                    .flat_map(|j| {
                        let w = 2.0 * PI * j as f64 * t as f64 / period as f64;
                        [w.cos(), w.sin()]
                    })
                    .collect()
            })
            .collect();
        let Ok(fit) = ols_fit(&rows, &detrended) else {
            continue;
        };
        let aic = n as f64 * (fit.sse / n as f64).max(1e-300).ln() + 2.0 * (2 * k) as f64;
        if aic < best.1 {
            best = (k, aic, fit.residuals);
        }
    }
    (best.0, best.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use approx::assert_relative_eq;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values).unwrap()
    }

    fn seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let tf = t as f64;
                120.0 + 0.5 * tf + 12.0 * (2.0 * PI * tf / 12.0).sin()
                    + 4.0 * (4.0 * PI * tf / 12.0).cos()
            })
            .collect()
    }

    #[test]
    fn fits_and_forecasts_trigonometric_season() {
        let values = seasonal(84);
        let mut model = TBATS::new(vec![12]);
        model.fit(&monthly(values[..72].to_vec())).unwrap();

        let f = model.predict(12).unwrap();
        let rmse = crate::utils::rmse(&values[72..], f.point()).unwrap();
        assert!(rmse < 5.0, "rmse = {}", rmse);
        assert!(model.harmonics()[0] >= 2);
        assert!(model.aic().unwrap().is_finite());
        assert!(model.name().starts_with("TBATS(1, {0,0}, -, {<12,"));
    }

    #[test]
    fn harmonics_never_exceed_half_period() {
        assert_eq!(TBATS::max_harmonics(12), 5);
        assert_eq!(TBATS::max_harmonics(7), 3);
        let mut model = TBATS::new(vec![12]).with_harmonics(vec![9]);
        model.fit(&monthly(seasonal(48))).unwrap();
        assert_eq!(model.harmonics(), &[5]);
    }

    #[test]
    fn box_cox_requires_positive_values() {
        let mut values = seasonal(48);
        values[3] = -1.0;
        let mut model = TBATS::new(vec![12]).with_box_cox(BoxCoxMode::Auto);
        assert!(matches!(
            model.fit(&monthly(values)),
            Err(ForecastError::Domain(_))
        ));
    }

    #[test]
    fn box_cox_forecasts_stay_on_original_scale() {
        let mut model = TBATS::new(vec![12]).with_box_cox(BoxCoxMode::Fixed(0.0));
        model.fit(&monthly(seasonal(60))).unwrap();
        assert_eq!(model.lambda(), Some(0.0));
        let f = model.predict(6).unwrap();
        assert!(f.point().iter().all(|p| *p > 50.0 && *p < 300.0));
    }

    #[test]
    fn arma_errors_and_damping_fit() {
        let mut model = TBATS::new(vec![12])
            .with_damped_trend(true)
            .with_arma(1, 1);
        model.fit(&monthly(seasonal(60))).unwrap();
        assert!(model.name().contains("{1,1}"));
        assert_eq!(model.predict(3).unwrap().horizon(), 3);
    }

    #[test]
    fn intervals_widen_and_first_step_uses_sigma() {
        let mut model = TBATS::new(vec![12]);
        model.fit(&monthly(seasonal(60))).unwrap();
        let f = model.predict_with_intervals(12, 0.95).unwrap();
        let lower = f.lower().unwrap();
        let upper = f.upper().unwrap();
        let w0 = upper[0] - lower[0];
        assert_relative_eq!(w0, 2.0 * interval_z(0.95) * model.sigma2.sqrt(), epsilon = 1e-9);
        assert!(upper[11] - lower[11] >= w0);
    }

    #[test]
    fn insufficient_data() {
        let mut model = TBATS::new(vec![12]);
        assert!(matches!(
            model.fit(&monthly(seasonal(20))),
            Err(ForecastError::InsufficientData { needed: 24, got: 20 })
        ));
    }

    #[test]
    fn requires_fit() {
        assert!(matches!(
            TBATS::default().predict(3),
            Err(ForecastError::FitRequired)
        ));
    }
}
