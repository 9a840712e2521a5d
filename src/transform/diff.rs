//! Regular and seasonal differencing, and their inversion for forecasts.

use crate::error::{ForecastError, Result};

/// Lag-`lag` difference: `x[t] - x[t - lag]`.
///
/// The result is `lag` elements shorter than the input; an input no
/// longer than `lag` yields an empty vector.
pub fn lag_difference(series: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 {
        return series.to_vec();
    }
    series
        .iter()
        .skip(lag)
        .zip(series)
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Apply first-order differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    (0..d).fold(series.to_vec(), |acc, _| lag_difference(&acc, 1))
}

/// Apply seasonal differencing at `period` `d` times.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    (0..d).fold(series.to_vec(), |acc, _| lag_difference(&acc, period))
}

/// Combined `(1 - B)^d (1 - B^period)^seasonal_d` differencing.
///
/// Fails with [`ForecastError::InsufficientData`] when fewer than two
/// observations would remain.
pub fn difference_orders(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> Result<Vec<f64>> {
    let consumed = d + seasonal_d * period;
    if series.len() < consumed + 2 {
        return Err(ForecastError::InsufficientData {
            needed: consumed + 2,
            got: series.len(),
        });
    }
    Ok(difference(&seasonal_difference(series, seasonal_d, period), d))
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`, lowest power first.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Polynomial product.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Carry forecasts of the differenced series back to the original scale.
///
/// `history` is the undifferenced series the model was fit on and `delta`
/// the polynomial from [`differencing_polynomial`]. Each step solves
/// `delta(B) y_t = w_t` for `y_t` using history and earlier forecasts.
pub fn integrate(history: &[f64], differenced_forecast: &[f64], delta: &[f64]) -> Result<Vec<f64>> {
    let order = delta.len().saturating_sub(1);
    if history.len() < order {
        return Err(ForecastError::InsufficientData {
            needed: order,
            got: history.len(),
        });
    }
    let mut path = history.to_vec();
    let mut out = Vec::with_capacity(differenced_forecast.len());
    for &w in differenced_forecast {
        let t = path.len();
        let carried: f64 = (1..=order).map(|i| delta[i] * path[t - i]).sum();
        let y = w - carried;
        path.push(y);
        out.push(y);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_difference() {
        assert_eq!(difference(&[1.0, 4.0, 9.0, 16.0], 1), vec![3.0, 5.0, 7.0]);
        assert_eq!(difference(&[1.0, 4.0, 9.0, 16.0], 2), vec![2.0, 2.0]);
        assert_eq!(difference(&[5.0], 1), Vec::<f64>::new());
    }

    #[test]
    fn double_difference_of_line_is_zero() {
        let line: Vec<f64> = (0..30).map(|t| 4.0 - 1.5 * t as f64).collect();
        let dd = difference(&line, 2);
        assert_eq!(dd.len(), 28);
        assert!(dd.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn seasonal_difference_removes_fixed_pattern() {
        let pattern = [3.0, 1.0, 4.0, 1.0];
        let series: Vec<f64> = (0..12).map(|t| pattern[t % 4] + t as f64).collect();
        let sd = seasonal_difference(&series, 1, 4);
        assert_eq!(sd.len(), 8);
        assert!(sd.iter().all(|&v| (v - 4.0).abs() < 1e-12));
    }

    #[test]
    fn polynomial_matches_operator() {
        // (1 - B)(1 - B^3) = 1 - B - B^3 + B^4
        assert_eq!(
            differencing_polynomial(1, 1, 3),
            vec![1.0, -1.0, 0.0, -1.0, 1.0]
        );
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
    }

    #[test]
    fn integrate_inverts_combined_differencing() {
        let series: Vec<f64> = (0..40)
            .map(|t| 10.0 + 0.7 * t as f64 + ((t % 4) as f64).powi(2))
            .collect();
        let (history, future) = series.split_at(30);
        let delta = differencing_polynomial(1, 1, 4);
        let w = difference_orders(&series, 1, 1, 4).unwrap();
        let future_w = &w[w.len() - future.len()..];
        let rebuilt = integrate(history, future_w, &delta).unwrap();
        for (a, b) in rebuilt.iter().zip(future) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn difference_orders_checks_length() {
        assert!(matches!(
            difference_orders(&[1.0; 13], 1, 1, 12),
            Err(ForecastError::InsufficientData { needed: 15, got: 13 })
        ));
    }
}
