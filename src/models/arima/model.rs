//! Seasonal ARIMA(p,d,q)(P,D,Q)\[m\] estimated by conditional sum of squares.

use std::fmt;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, InformationCriteria};
use crate::transform::{difference_orders, differencing_polynomial, integrate, multiply};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::interval_z;

const COEF_BOUNDS: (f64, f64) = (-0.99, 0.99);
const VARIANCE_FLOOR: f64 = 1e-12;

/// Non-seasonal orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal orders at lag `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// No seasonal part.
    pub fn none() -> Self {
        Self::new(0, 0, 0, 1)
    }

    pub fn is_active(&self) -> bool {
        self.period > 1 && (self.p > 0 || self.d > 0 || self.q > 0)
    }
}

impl Default for SeasonalOrder {
    fn default() -> Self {
        Self::none()
    }
}

/// Full model order, used as a search key by AutoARIMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelOrder {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.order;
        write!(f, "ARIMA({},{},{})", o.p, o.d, o.q)?;
        let s = self.seasonal;
        if s.is_active() {
            write!(f, "({},{},{})[{}]", s.p, s.d, s.q, s.period)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Estimate {
    /// `a(B)`, lowest power first with `a[0] = 1`.
    ar_poly: Vec<f64>,
    /// `b(B)`, lowest power first with `b[0] = 1`.
    ma_poly: Vec<f64>,
    mean: f64,
    coefficients: Vec<f64>,
}

/// Seasonal ARIMA forecaster.
///
/// The series is differenced by `(1 - B)^d (1 - B^m)^D`; the differenced
/// series `w` follows `a(B)(w - mu) = b(B) e` with
/// `a(B) = (1 - phi(B))(1 - Phi(B^m))` and `b(B) = (1 + theta(B))(1 + Theta(B^m))`.
/// A mean (drift after one difference) is estimated only when `d + D <= 1`.
#[derive(Debug, Clone)]
pub struct SARIMA {
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    include_mean: Option<bool>,
    label: String,
    estimate: Option<Estimate>,
    history: Option<Vec<f64>>,
    differenced: Vec<f64>,
    innovations: Vec<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    criteria: Option<InformationCriteria>,
}

impl SARIMA {
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Self {
        let seasonal = if seasonal.period > 1 {
            seasonal
        } else {
            SeasonalOrder::none()
        };
        Self {
            order,
            seasonal,
            include_mean: None,
            label: ModelOrder { order, seasonal }.to_string(),
            estimate: None,
            history: None,
            differenced: Vec::new(),
            innovations: Vec::new(),
            fitted: None,
            residuals: None,
            sigma2: None,
            criteria: None,
        }
    }

    /// Non-seasonal ARIMA(p,d,q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(ArimaOrder::new(p, d, q), SeasonalOrder::none())
    }

    /// Force the mean term on or off instead of deciding from `d + D`.
    pub fn with_mean(mut self, include: bool) -> Self {
        self.include_mean = Some(include);
        self
    }

    pub fn model_order(&self) -> ModelOrder {
        ModelOrder {
            order: self.order,
            seasonal: self.seasonal,
        }
    }

    /// Estimated coefficients in the order phi, theta, Phi, Theta.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.estimate.as_ref().map(|e| e.coefficients.as_slice())
    }

    pub fn mean(&self) -> Option<f64> {
        self.estimate.as_ref().map(|e| e.mean)
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn criteria(&self) -> Option<InformationCriteria> {
        self.criteria
    }

    fn uses_mean(&self) -> bool {
        self.include_mean
            .unwrap_or(self.order.d + self.seasonal.d <= 1)
    }

    fn n_coefficients(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    fn warmup(&self) -> usize {
        self.order.p + self.seasonal.p * self.seasonal.period
    }

    /// Expand coefficients `[phi.., theta.., Phi.., Theta..]` into polynomials.
    fn polynomials(&self, coef: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let (p, q, sp, sq) = (
            self.order.p,
            self.order.q,
            self.seasonal.p,
            self.seasonal.q,
        );
        let m = self.seasonal.period;
        let (phi, rest) = coef.split_at(p);
        let (theta, rest) = rest.split_at(q);
        let (sphi, stheta) = rest.split_at(sp);
        let stheta = &stheta[..sq];

        let lag_poly = |c: &[f64], lag: usize, sign: f64| {
            let mut poly = vec![0.0; c.len() * lag + 1];
            poly[0] = 1.0;
            for (i, &v) in c.iter().enumerate() {
                poly[(i + 1) * lag] = sign * v;
            }
            poly
        };
        let ar = multiply(&lag_poly(phi, 1, -1.0), &lag_poly(sphi, m, -1.0));
        let ma = multiply(&lag_poly(theta, 1, 1.0), &lag_poly(stheta, m, 1.0));
        (ar, ma)
    }

    /// Innovations of `w` for given polynomials; zero during warm-up.
    fn innovations(w: &[f64], ar: &[f64], ma: &[f64], mean: f64, start: usize) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in start..w.len() {
            let mut v = w[t] - mean;
            for (k, &a) in ar.iter().enumerate().skip(1) {
                v += a * (w[t - k] - mean);
            }
            for (k, &b) in ma.iter().enumerate().skip(1) {
                if k <= t {
                    v -= b * e[t - k];
                }
            }
            e[t] = v;
        }
        e
    }

    fn css(&self, w: &[f64], coef: &[f64], mean: f64) -> f64 {
        let (ar, ma) = self.polynomials(coef);
        let start = self.warmup();
        let e = Self::innovations(w, &ar, &ma, mean, start);
        let sse: f64 = e[start..].iter().map(|v| v * v).sum();
        if sse.is_finite() {
            sse
        } else {
            f64::INFINITY
        }
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let y = series.values();
        let (d, sd, m) = (self.order.d, self.seasonal.d, self.seasonal.period);
        let w = difference_orders(y, d, sd, m)?;

        let start = self.warmup();
        let with_mean = self.uses_mean();
        let k = self.n_coefficients() + usize::from(with_mean) + 1;
        let needed = start + k + 2;
        if w.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed: needed + d + sd * m,
                got: y.len(),
            });
        }

        let w_mean = w.iter().sum::<f64>() / w.len() as f64;
        let n_coef = self.n_coefficients();
        let mut initial = vec![0.0; n_coef];
        let mut bounds = vec![COEF_BOUNDS; n_coef];
        if with_mean {
            let spread = w.iter().map(|v| (v - w_mean).abs()).fold(0.0, f64::max);
            let width = 10.0 * (w_mean.abs() + spread + 1.0);
            initial.push(w_mean);
            bounds.push((w_mean - width, w_mean + width));
        }

        let n_eff = (w.len() - start) as f64;
        let objective = |x: &[f64]| {
            let mean = if with_mean { x[n_coef] } else { 0.0 };
            let sse = self.css(&w, &x[..n_coef], mean);
            0.5 * n_eff * (sse / n_eff).max(VARIANCE_FLOOR).ln()
        };

        let (coefficients, mean) = if initial.is_empty() {
            (Vec::new(), 0.0)
        } else {
            let result = nelder_mead(
                objective,
                &initial,
                Some(&bounds),
                NelderMeadConfig::default().with_max_iter(500 * initial.len()),
            );
            if !result.optimal_value.is_finite() {
                return Err(ForecastError::ComputationError(format!(
                    "{} conditional sum of squares diverged",
                    self.label
                )));
            }
            let mean = if with_mean {
                result.optimal_point[n_coef]
            } else {
                0.0
            };
            (result.optimal_point[..n_coef].to_vec(), mean)
        };

        let (ar_poly, ma_poly) = self.polynomials(&coefficients);
        let e = Self::innovations(&w, &ar_poly, &ma_poly, mean, start);
        let sse: f64 = e[start..].iter().map(|v| v * v).sum();
        let sigma2 = (sse / n_eff).max(VARIANCE_FLOOR);

        // Innovations on the original index; NaN where no prediction exists.
        let offset = d + sd * m;
        let mut residuals = vec![f64::NAN; y.len()];
        for (t, &err) in e.iter().enumerate().skip(start) {
            residuals[t + offset] = err;
        }
        let fitted: Vec<f64> = y.iter().zip(&residuals).map(|(v, r)| v - r).collect();

        let log_likelihood =
            -0.5 * n_eff * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        self.criteria = Some(InformationCriteria::new(
            log_likelihood,
            k,
            n_eff as usize,
        ));
        self.estimate = Some(Estimate {
            ar_poly,
            ma_poly,
            mean,
            coefficients,
        });
        self.history = Some(y.to_vec());
        self.differenced = w;
        self.innovations = e;
        self.sigma2 = Some(sigma2);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let est = self.estimate.as_ref().ok_or(ForecastError::FitRequired)?;
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;

        let mut w = self.differenced.clone();
        let mut e = self.innovations.clone();
        let mut wf = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = w.len();
            let mut v = est.mean;
            for (k, &a) in est.ar_poly.iter().enumerate().skip(1) {
                if k <= t {
                    v -= a * (w[t - k] - est.mean);
                }
            }
            for (k, &b) in est.ma_poly.iter().enumerate().skip(1) {
                if k <= t {
                    v += b * e[t - k];
                }
            }
            w.push(v);
            e.push(0.0);
            wf.push(v);
        }

        let delta = differencing_polynomial(self.order.d, self.seasonal.d, self.seasonal.period);
        Ok(Forecast::from_values(integrate(history, &wf, &delta)?))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let forecast = self.predict(horizon)?;
        let est = self.estimate.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        let delta = differencing_polynomial(self.order.d, self.seasonal.d, self.seasonal.period);
        let psi = psi_weights(&multiply(&est.ar_poly, &delta), &est.ma_poly, horizon);
        let z = interval_z(level);

        let mut acc = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, &p) in forecast.point().iter().enumerate() {
            acc += psi[h] * psi[h];
            let se = (sigma2 * acc).sqrt();
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
        self.criteria.map(|c| c.aicc)
    }

    fn parameter_count(&self) -> usize {
        self.n_coefficients() + usize::from(self.uses_mean())
    }
}

/// MA(infinity) weights of `b(B) / a(B)`, `a[0] = 1`.
pub(crate) fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = vec![0.0; n];
    for j in 0..n {
        let mut v = if j == 0 {
            1.0
        } else {
            ma.get(j).copied().unwrap_or(0.0)
        };
        for k in 1..=j.min(ar.len().saturating_sub(1)) {
            v -= ar[k] * psi[j - k];
        }
        psi[j] = v;
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values).unwrap()
    }

    fn ar1(n: usize, phi: f64) -> Vec<f64> {
        let mut state = 7u64;
        let mut x = vec![0.0; n];
        for t in 1..n {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            x[t] = phi * x[t - 1] + u;
        }
        x.iter().map(|v| v + 50.0).collect()
    }

    #[test]
    fn names_follow_orders() {
        assert_eq!(SARIMA::arima(1, 1, 0).name(), "ARIMA(1,1,0)");
        let m = SARIMA::new(ArimaOrder::new(0, 1, 1), SeasonalOrder::new(0, 1, 1, 12));
        assert_eq!(m.name(), "ARIMA(0,1,1)(0,1,1)[12]");
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let mut model = SARIMA::arima(1, 0, 0);
        model.fit(&monthly(ar1(400, 0.7))).unwrap();
        let phi = model.coefficients().unwrap()[0];
        assert!((phi - 0.7).abs() < 0.1, "phi = {}", phi);
        assert_relative_eq!(model.mean().unwrap(), 50.0, epsilon = 0.2);
    }

    #[test]
    fn seasonal_differencing_extrapolates_trend_and_season() {
        let y: Vec<f64> = (0..72)
            .map(|t| 100.0 + 2.0 * t as f64 + 10.0 * (2.0 * PI * t as f64 / 12.0).sin())
            .collect();
        let mut model = SARIMA::new(ArimaOrder::new(0, 1, 0), SeasonalOrder::new(0, 1, 0, 12));
        model.fit(&monthly(y[..60].to_vec())).unwrap();

        let f = model.predict(12).unwrap();
        for (p, a) in f.point().iter().zip(&y[60..]) {
            assert_relative_eq!(*p, *a, epsilon = 1e-6);
        }
    }

    #[test]
    fn fitted_values_are_nan_during_warmup() {
        let mut model = SARIMA::new(ArimaOrder::new(1, 0, 0), SeasonalOrder::new(0, 1, 0, 12));
        let y: Vec<f64> = (0..48).map(|t| (t % 12) as f64 + 0.1 * t as f64).collect();
        model.fit(&monthly(y)).unwrap();
        let fitted = model.fitted_values().unwrap();
        assert!(fitted[..13].iter().all(|v| v.is_nan()));
        assert!(fitted[13..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn random_walk_intervals_grow_with_sqrt_h() {
        let mut model = SARIMA::arima(0, 1, 0).with_mean(false);
        model.fit(&monthly(ar1(100, 0.99))).unwrap();
        let f = model.predict_with_intervals(4, 0.95).unwrap();
        let width = |i: usize| f.upper().unwrap()[i] - f.lower().unwrap()[i];
        assert_relative_eq!(width(3) / width(0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn psi_weights_of_ar1() {
        let psi = psi_weights(&[1.0, -0.5], &[1.0], 4);
        assert_eq!(psi, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = SARIMA::new(ArimaOrder::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 12));
        assert!(matches!(
            model.fit(&monthly(vec![1.0; 20])),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn predict_before_fit_fails() {
        assert!(matches!(
            SARIMA::arima(1, 0, 0).predict(3),
            Err(ForecastError::FitRequired)
        ));
    }
}
