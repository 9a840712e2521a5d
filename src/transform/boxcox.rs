//! Box-Cox power transformation.
//!
//! Stabilises variance that grows with the level of the series. Defined
//! only for strictly positive data.

use crate::error::{ForecastError, Result};

/// Transformed data together with the lambda that produced it.
#[derive(Debug, Clone)]
pub struct BoxCoxResult {
    pub data: Vec<f64>,
    pub lambda: f64,
}

impl BoxCoxResult {
    /// Inverse transform to recover original scale.
    pub fn inverse(&self) -> Vec<f64> {
        inv_boxcox(&self.data, self.lambda)
    }
}

/// Criterion used to choose lambda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LambdaMethod {
    /// Maximise the profile log-likelihood of a normal model.
    #[default]
    LogLikelihood,
    /// Guerrero (1993): minimise the coefficient of variation of
    /// `sd / mean^(1 - lambda)` across seasonal subseries.
    Guerrero,
}

/// Bounded search for the Box-Cox parameter.
#[derive(Debug, Clone)]
pub struct LambdaSearch {
    pub lower: f64,
    pub upper: f64,
    pub method: LambdaMethod,
    /// Subseries length for [`LambdaMethod::Guerrero`].
    pub period: usize,
}

impl Default for LambdaSearch {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 2.0,
            method: LambdaMethod::LogLikelihood,
            period: 12,
        }
    }
}

impl LambdaSearch {
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_method(mut self, method: LambdaMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }
}

const LAMBDA_ZERO: f64 = 1e-10;

/// Transform a single positive value.
pub fn boxcox_value(x: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_ZERO {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse of [`boxcox_value`].
///
/// Returns NaN when `lambda * y + 1 <= 0`, which no positive input maps to.
pub fn inv_boxcox_value(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_ZERO {
        return y.exp();
    }
    let base = lambda * y + 1.0;
    if base <= 0.0 {
        f64::NAN
    } else {
        base.powf(1.0 / lambda)
    }
}

/// Apply Box-Cox transformation with a given lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Fails with [`ForecastError::Domain`] if any value is not strictly positive.
pub fn boxcox(series: &[f64], lambda: f64) -> Result<Vec<f64>> {
    ensure_positive(series)?;
    Ok(series.iter().map(|&x| boxcox_value(x, lambda)).collect())
}

/// Inverse Box-Cox transformation.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| inv_boxcox_value(y, lambda))
        .collect()
}

/// Choose lambda within `search.lower..=search.upper`.
pub fn boxcox_lambda(series: &[f64], search: &LambdaSearch) -> Result<f64> {
    ensure_positive(series)?;
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    if !(search.lower < search.upper) {
        return Err(ForecastError::InvalidParameter(format!(
            "lambda bounds [{}, {}] are empty",
            search.lower, search.upper
        )));
    }

    let criterion: Box<dyn Fn(f64) -> f64 + '_> = match search.method {
        LambdaMethod::LogLikelihood => {
            let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
            Box::new(move |l| -profile_log_likelihood(series, log_sum, l))
        }
        LambdaMethod::Guerrero => {
            let groups = subseries_stats(series, search.period.max(2));
            if groups.len() < 2 {
                return Err(ForecastError::InsufficientData {
                    needed: 2 * search.period.max(2),
                    got: series.len(),
                });
            }
            Box::new(move |l| guerrero_cv(&groups, l))
        }
    };

    Ok(minimise_scalar(&*criterion, search.lower, search.upper))
}

/// Transform with a lambda chosen by `search`.
pub fn boxcox_auto(series: &[f64], search: &LambdaSearch) -> Result<BoxCoxResult> {
    let lambda = boxcox_lambda(series, search)?;
    let data = boxcox(series, lambda)?;
    Ok(BoxCoxResult { data, lambda })
}

/// Check if data is suitable for Box-Cox transformation.
pub fn is_boxcox_suitable(series: &[f64]) -> bool {
    !series.is_empty() && series.iter().all(|&x| x > 0.0)
}

fn ensure_positive(series: &[f64]) -> Result<()> {
    match series.iter().position(|&x| !(x > 0.0)) {
        Some(i) => Err(ForecastError::Domain(format!(
            "box-cox requires strictly positive values, found {} at index {}",
            series[i], i
        ))),
        None => Ok(()),
    }
}

fn profile_log_likelihood(series: &[f64], log_sum: f64, lambda: f64) -> f64 {
    let n = series.len() as f64;
    let t: Vec<f64> = series.iter().map(|&x| boxcox_value(x, lambda)).collect();
    let m = t.iter().sum::<f64>() / n;
    let var = t.iter().map(|y| (y - m).powi(2)).sum::<f64>() / n;
    if !(var > 0.0) || !var.is_finite() {
        return f64::NEG_INFINITY;
    }
    -0.5 * n * var.ln() + (lambda - 1.0) * log_sum
}

/// (mean, sd) of each complete non-overlapping subseries.
fn subseries_stats(series: &[f64], period: usize) -> Vec<(f64, f64)> {
    series
        .chunks_exact(period)
        .map(|chunk| {
            let m = chunk.iter().sum::<f64>() / period as f64;
            let v = chunk.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (period - 1) as f64;
            (m, v.sqrt())
        })
        .collect()
}

fn guerrero_cv(groups: &[(f64, f64)], lambda: f64) -> f64 {
    let ratios: Vec<f64> = groups
        .iter()
        .map(|&(m, s)| s / m.powf(1.0 - lambda))
        .collect();
    let k = ratios.len() as f64;
    let mean = ratios.iter().sum::<f64>() / k;
    let sd = (ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (k - 1.0)).sqrt();
    if mean == 0.0 {
        f64::INFINITY
    } else {
        sd / mean
    }
}

/// Grid scan followed by golden-section refinement around the best cell.
fn minimise_scalar(f: &dyn Fn(f64) -> f64, lower: f64, upper: f64) -> f64 {
    const CELLS: usize = 60;
    let step = (upper - lower) / CELLS as f64;
    let score = |x: f64| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let (mut best_x, mut best_v) = (lower, score(lower));
    for i in 1..=CELLS {
        let x = lower + step * i as f64;
        let v = score(x);
        if v < best_v {
            best_x = x;
            best_v = v;
        }
    }

    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = ((best_x - step).max(lower), (best_x + step).min(upper));
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    for _ in 0..60 {
        if score(c) < score(d) {
            b = d;
        } else {
            a = c;
        }
        c = b - inv_phi * (b - a);
        d = a + inv_phi * (b - a);
    }
    let refined = 0.5 * (a + b);
    if score(refined) <= best_v {
        refined
    } else {
        best_x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lambda_one_shifts_by_one() {
        let series = vec![1.0, 2.0, 3.0];
        let t = boxcox(&series, 1.0).unwrap();
        assert_eq!(t, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn lambda_zero_is_log() {
        let series = vec![1.0, std::f64::consts::E, 10.0];
        let t = boxcox(&series, 0.0).unwrap();
        assert_relative_eq!(t[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[2], 10f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn inverse_recovers_input_across_lambdas() {
        let series = vec![0.01, 0.5, 1.0, 7.3, 250.0, 296608.2];
        for i in 0..=30 {
            let lambda = -1.0 + 0.1 * i as f64;
            let t = boxcox(&series, lambda).unwrap();
            let back = inv_boxcox(&t, lambda);
            for (x, y) in series.iter().zip(&back) {
                assert_relative_eq!(x, y, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn non_positive_values_are_domain_errors() {
        assert!(matches!(
            boxcox(&[1.0, 0.0, 2.0], 0.5),
            Err(ForecastError::Domain(_))
        ));
        assert!(matches!(
            boxcox_lambda(&[1.0, -3.0], &LambdaSearch::default()),
            Err(ForecastError::Domain(_))
        ));
    }

    #[test]
    fn lambda_stays_within_bounds() {
        let series: Vec<f64> = (1..=48).map(|i| (i as f64 * 0.2).exp()).collect();
        let lambda = boxcox_lambda(&series, &LambdaSearch::default()).unwrap();
        assert!((-1.0..=2.0).contains(&lambda));

        let narrow = LambdaSearch::default().with_bounds(0.5, 1.5);
        let lambda = boxcox_lambda(&series, &narrow).unwrap();
        assert!((0.5..=1.5).contains(&lambda));
    }

    #[test]
    fn empty_bounds_are_rejected() {
        let search = LambdaSearch::default().with_bounds(1.0, 1.0);
        assert!(matches!(
            boxcox_lambda(&[1.0, 2.0, 3.0], &search),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn guerrero_prefers_log_for_multiplicative_seasonality() {
        let series: Vec<f64> = (0..72)
            .map(|t| {
                let level = 100.0 * 1.03f64.powi(t);
                level * (1.0 + 0.2 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin())
            })
            .collect();
        let search = LambdaSearch::default().with_method(LambdaMethod::Guerrero);
        let lambda = boxcox_lambda(&series, &search).unwrap();
        assert!(lambda.abs() < 0.2, "lambda = {}", lambda);
    }

    #[test]
    fn inverse_outside_range_is_nan() {
        assert!(inv_boxcox_value(-3.0, 0.5).is_nan());
    }
}
