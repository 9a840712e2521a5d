//! Stationarity tests for time series.
//!
//! The Augmented Dickey-Fuller test takes a unit root as its null
//! hypothesis while KPSS takes stationarity as its null, so the two are
//! reported side by side and may disagree.

use crate::error::{ForecastError, Result};
use crate::transform::{difference, seasonal_difference};
use crate::utils::ols::ols_fit;
use crate::utils::stats::{normal_cdf, variance};

/// Default significance level for the stationarity conclusions.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Deterministic terms included in a test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deterministic {
    /// Constant only (level stationarity).
    #[default]
    Constant,
    /// Constant and linear trend (trend stationarity).
    ConstantTrend,
}

/// Null hypothesis of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHypothesis {
    UnitRoot,
    Stationary,
}

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (approximate)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// What the test assumes under its null.
    pub null: NullHypothesis,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

impl StationarityResult {
    /// Whether the null hypothesis is rejected at `alpha`.
    pub fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// The stationarity conclusion this test alone supports at `alpha`.
    pub fn suggests_stationary(&self, alpha: f64) -> bool {
        match self.null {
            NullHypothesis::UnitRoot => self.rejects_null(alpha),
            NullHypothesis::Stationary => !self.rejects_null(alpha),
        }
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Augmented Dickey-Fuller test.
///
/// Regresses `Δy_t` on `y_{t-1}`, the deterministic terms and `k` lagged
/// differences. With `max_lags = None` the lag order is chosen by AIC up to
/// `12 (n/100)^(1/4)` on a common sample; a `Some(k)` value fixes it.
pub fn adf_test(
    series: &[f64],
    max_lags: Option<usize>,
    deterministic: Deterministic,
) -> Result<StationarityResult> {
    let n = series.len();
    let extra = match deterministic {
        Deterministic::Constant => 1,
        Deterministic::ConstantTrend => 2,
    };
    if n < 8 + extra {
        return Err(ForecastError::InsufficientData {
            needed: 8 + extra,
            got: n,
        });
    }

    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    // Keep at least a handful of residual degrees of freedom.
    let feasible = (n - 1).saturating_sub(2 * (extra + 1) + 3) / 2;
    let (lags, autolag) = match max_lags {
        Some(k) => (k.min(feasible), false),
        None => (schwert.min(feasible), true),
    };

    let dy = difference(series, 1);
    let chosen = if autolag {
        let mut best = (0, f64::INFINITY);
        for k in 0..=lags {
            if let Ok(fit) = adf_regression(series, &dy, k, lags, deterministic) {
                let nobs = fit.nobs() as f64;
                let params = (1 + extra + k) as f64;
                let aic = nobs * (fit.sse / nobs).ln() + 2.0 * params;
                if aic < best.1 {
                    best = (k, aic);
                }
            }
        }
        best.0
    } else {
        lags
    };

    let fit = adf_regression(series, &dy, chosen, chosen, deterministic)?;
    let statistic = fit.t_stat(0);
    let nobs = fit.nobs();

    Ok(StationarityResult {
        statistic,
        p_value: mackinnon_p_value(statistic, deterministic),
        lags: chosen,
        null: NullHypothesis::UnitRoot,
        critical_values: mackinnon_critical_values(nobs, deterministic),
    })
}

/// OLS for the ADF equation; `start_lag` fixes the first usable observation.
fn adf_regression(
    series: &[f64],
    dy: &[f64],
    k: usize,
    start_lag: usize,
    deterministic: Deterministic,
) -> Result<crate::utils::ols::OLSResult> {
    let mut rows = Vec::new();
    let mut target = Vec::new();
    // dy[t - 1] = y[t] - y[t - 1]
    for t in (start_lag + 1)..series.len() {
        let mut row = vec![series[t - 1], 1.0];
        if deterministic == Deterministic::ConstantTrend {
            row.push(t as f64);
        }
        for j in 1..=k {
            row.push(dy[t - 1 - j]);
        }
        rows.push(row);
        target.push(dy[t - 1]);
    }
    ols_fit(&rows, &target)
}

/// MacKinnon (1994) response-surface p-value for the ADF statistic.
fn mackinnon_p_value(stat: f64, deterministic: Deterministic) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    let (small, large, tau_max, tau_min, tau_star): (&[f64], &[f64], f64, f64, f64) =
        match deterministic {
            Deterministic::Constant => (
                &[2.1659, 1.4412, 0.038269],
                &[1.7339, 0.93202, -0.12745, -0.010368],
                2.74,
                -18.83,
                -1.61,
            ),
            Deterministic::ConstantTrend => (
                &[3.2512, 1.6047, 0.049588],
                &[2.5261, 0.61654, -0.37956, -0.060285],
                0.7,
                -16.18,
                -2.89,
            ),
        };
    if stat > tau_max {
        return 1.0;
    }
    if stat < tau_min {
        return 0.0;
    }
    let coefs = if stat <= tau_star { small } else { large };
    let z: f64 = coefs
        .iter()
        .enumerate()
        .map(|(i, c)| c * stat.powi(i as i32))
        .sum();
    normal_cdf(z)
}

/// MacKinnon (2010) finite-sample critical values.
fn mackinnon_critical_values(nobs: usize, deterministic: Deterministic) -> CriticalValues {
    let table: [[f64; 4]; 3] = match deterministic {
        Deterministic::Constant => [
            [-3.43035, -6.5393, -16.786, -79.433],
            [-2.86154, -2.8903, -4.234, -40.040],
            [-2.56677, -1.5384, -2.809, 0.0],
        ],
        Deterministic::ConstantTrend => [
            [-3.95877, -9.0531, -28.428, -134.155],
            [-3.41049, -4.3904, -9.036, -45.374],
            [-3.12705, -2.5856, -3.925, -22.380],
        ],
    };
    let inv = 1.0 / nobs.max(1) as f64;
    let cv = |c: &[f64; 4]| c[0] + c[1] * inv + c[2] * inv.powi(2) + c[3] * inv.powi(3);
    CriticalValues {
        cv_1pct: cv(&table[0]),
        cv_5pct: cv(&table[1]),
        cv_10pct: cv(&table[2]),
    }
}

/// KPSS test of level or trend stationarity.
///
/// The long-run variance uses a Bartlett kernel with `lags` truncation
/// (default `⌊4 (n/100)^(1/4)⌋`). The p-value is interpolated in the
/// published table and therefore clamped to `[0.01, 0.10]`.
pub fn kpss_test(
    series: &[f64],
    lags: Option<usize>,
    deterministic: Deterministic,
) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(ForecastError::InsufficientData { needed: 4, got: n });
    }

    let residuals: Vec<f64> = match deterministic {
        Deterministic::Constant => {
            let m = series.iter().sum::<f64>() / n as f64;
            series.iter().map(|x| x - m).collect()
        }
        Deterministic::ConstantTrend => {
            let rows: Vec<Vec<f64>> = (0..n).map(|t| vec![1.0, t as f64]).collect();
            ols_fit(&rows, series)?.residuals
        }
    };

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .min(n - 1);

    let nf = n as f64;
    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / nf;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let gamma: f64 = residuals[j..]
            .iter()
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / nf;
        long_run += 2.0 * weight * gamma;
    }

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (nf * nf);

    let statistic = if long_run > 0.0 { eta / long_run } else { 0.0 };

    let table: [f64; 4] = match deterministic {
        Deterministic::Constant => [0.347, 0.463, 0.574, 0.739],
        Deterministic::ConstantTrend => [0.119, 0.146, 0.176, 0.216],
    };

    Ok(StationarityResult {
        statistic,
        p_value: kpss_p_value(statistic, &table),
        lags,
        null: NullHypothesis::Stationary,
        critical_values: CriticalValues {
            cv_1pct: table[3],
            cv_5pct: table[1],
            cv_10pct: table[0],
        },
    })
}

/// Linear interpolation in the KPSS table (critical values for 10%, 5%, 2.5%, 1%).
fn kpss_p_value(stat: f64, crit: &[f64; 4]) -> f64 {
    const PVALS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat <= crit[0] {
        return PVALS[0];
    }
    if stat >= crit[3] {
        return PVALS[3];
    }
    for i in 0..3 {
        if stat <= crit[i + 1] {
            let w = (stat - crit[i]) / (crit[i + 1] - crit[i]);
            return PVALS[i] + w * (PVALS[i + 1] - PVALS[i]);
        }
    }
    PVALS[3]
}

/// Number of first differences needed before KPSS stops rejecting
/// stationarity at `alpha`, capped at `max_d`.
///
/// This is a decision helper for callers; the diagnostics report never
/// applies it on its own.
pub fn suggest_differencing(series: &[f64], alpha: f64, max_d: usize) -> usize {
    let mut d = 0;
    let mut current = series.to_vec();
    while d < max_d {
        if variance(&current) == 0.0 {
            break;
        }
        match kpss_test(&current, None, Deterministic::Constant) {
            Ok(r) if r.rejects_null(alpha) => {
                current = difference(&current, 1);
                d += 1;
            }
            _ => break,
        }
    }
    d
}

/// Strength of seasonality in `[0, 1]` from a classical additive decomposition.
///
/// `max(0, 1 - Var(remainder) / Var(seasonal + remainder))`, with the trend
/// taken from a centred moving average of length `period`.
pub fn seasonal_strength(series: &[f64], period: usize) -> Result<f64> {
    let n = series.len();
    if period < 2 || n < 2 * period + 1 {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period.max(2) + 1,
            got: n,
        });
    }

    let half = period / 2;
    let mut detrended = vec![f64::NAN; n];
    for t in half..(n - half) {
        let trend = if period % 2 == 0 {
            let inner: f64 = series[t + 1 - half..t + half].iter().sum();
            (inner + 0.5 * (series[t - half] + series[t + half])) / period as f64
        } else {
            series[t - half..=t + half].iter().sum::<f64>() / period as f64
        };
        detrended[t] = series[t] - trend;
    }

    let mut index = vec![0.0; period];
    for (s, slot) in index.iter_mut().enumerate() {
        let vals: Vec<f64> = detrended
            .iter()
            .skip(s)
            .step_by(period)
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if !vals.is_empty() {
            *slot = vals.iter().sum::<f64>() / vals.len() as f64;
        }
    }
    let centre = index.iter().sum::<f64>() / period as f64;

    let mut remainder = Vec::new();
    let mut seasonal_plus = Vec::new();
    for (t, &d) in detrended.iter().enumerate() {
        if d.is_finite() {
            seasonal_plus.push(d);
            remainder.push(d - (index[t % period] - centre));
        }
    }

    let total = variance(&seasonal_plus);
    if !(total > 0.0) {
        return Ok(0.0);
    }
    Ok((1.0 - variance(&remainder) / total).clamp(0.0, 1.0))
}

/// Seasonal differences suggested by [`seasonal_strength`] (0 or 1).
pub fn suggest_seasonal_differencing(series: &[f64], period: usize, threshold: f64) -> usize {
    match seasonal_strength(series, period) {
        Ok(strength) if strength > threshold => 1,
        _ => 0,
    }
}

/// Run both tests on a series after `d` regular and `seasonal_d` seasonal differences.
pub fn test_stationarity(
    series: &[f64],
    d: usize,
    seasonal_d: usize,
    period: usize,
) -> Result<(StationarityResult, StationarityResult)> {
    let transformed = difference(&seasonal_difference(series, seasonal_d, period), d);
    let adf = adf_test(&transformed, None, Deterministic::Constant)?;
    let kpss = kpss_test(&transformed, None, Deterministic::Constant)?;
    Ok((adf, kpss))
}
