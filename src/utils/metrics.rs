//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};

/// Accuracy metrics for a forecast against held-out observations.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Mean Absolute Scaled Error (None without a usable scale)
    pub mase: Option<f64>,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// `mase_scale` is the in-sample mean absolute error of a seasonal naive
/// forecast (see [`seasonal_naive_scale`]); MASE is omitted without it.
pub fn calculate_metrics(
    actual: &[f64],
    predicted: &[f64],
    mase_scale: Option<f64>,
) -> Result<AccuracyMetrics> {
    check_aligned(actual, predicted)?;
    let n = actual.len() as f64;

    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;

    let mape = if actual.iter().any(|&a| a == 0.0) {
        None
    } else {
        Some(
            100.0 * errors
                .iter()
                .zip(actual)
                .map(|(e, a)| (e / a).abs())
                .sum::<f64>()
                / n,
        )
    };

    let mase = mase_scale
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| mae / s);

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        mase,
    })
}

/// Root mean squared error of aligned sequences.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_aligned(actual, predicted)?;
    let sse: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((sse / actual.len() as f64).sqrt())
}

/// RMSE of in-sample residuals, skipping NaN warm-up entries.
pub fn residual_rmse(residuals: &[f64]) -> Option<f64> {
    let (sum, count) = residuals
        .iter()
        .filter(|r| r.is_finite())
        .fold((0.0, 0usize), |(s, c), r| (s + r * r, c + 1));
    (count > 0).then(|| (sum / count as f64).sqrt())
}

/// Mean absolute error of the in-sample seasonal naive forecast.
pub fn seasonal_naive_scale(history: &[f64], period: usize) -> Option<f64> {
    let period = period.max(1);
    if history.len() <= period {
        return None;
    }
    let diffs: Vec<f64> = history
        .iter()
        .skip(period)
        .zip(history)
        .map(|(a, b)| (a - b).abs())
        .collect();
    Some(diffs.iter().sum::<f64>() / diffs.len() as f64)
}

fn check_aligned(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(())
}
