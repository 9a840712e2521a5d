//! Raw periodogram and dominant-cycle estimation.

use rustfft::{num_complex::Complex64, FftPlanner};

use crate::error::{ForecastError, Result};

/// Power at one Fourier frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPoint {
    /// Frequency in cycles per observation, in `(0, 0.5]`.
    pub frequency: f64,
    /// Cycle length `1 / frequency`, in observations.
    pub period: f64,
    pub power: f64,
}

/// Periodogram of the demeaned signal at the Fourier frequencies `k / n`.
///
/// Power is `|X_k|^2 / n`. The zero frequency is excluded.
pub fn periodogram(signal: &[f64]) -> Vec<SpectralPoint> {
    let n = signal.len();
    if n < 4 {
        return Vec::new();
    }
    let mean = signal.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex64> = signal
        .iter()
        .map(|&x| Complex64::new(x - mean, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    buffer
        .iter()
        .enumerate()
        .take(n / 2 + 1)
        .skip(1)
        .map(|(k, c)| {
            let frequency = k as f64 / n as f64;
            SpectralPoint {
                frequency,
                period: 1.0 / frequency,
                power: c.norm_sqr() / n as f64,
            }
        })
        .collect()
}

/// The Fourier frequency carrying the most power.
pub fn dominant_period(signal: &[f64]) -> Result<SpectralPoint> {
    if signal.len() < 4 {
        return Err(ForecastError::InsufficientData {
            needed: 4,
            got: signal.len(),
        });
    }
    periodogram(signal)
        .into_iter()
        .filter(|p| p.power.is_finite())
        .max_by(|a, b| {
            a.power
                .partial_cmp(&b.power)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .filter(|p| p.power > 0.0)
        .ok_or_else(|| ForecastError::ComputationError("signal has no spectral power".into()))
}

/// Integer seasonal periods whose periodogram power stands out.
///
/// A linear trend is removed first so low frequencies do not swamp the
/// search. Peaks must exceed `threshold` times the median power and fall in
/// `min_period..=max_period`; at most `max_count` periods are returned,
/// strongest first.
pub fn detect_seasonal_periods(
    signal: &[f64],
    min_period: usize,
    max_period: usize,
    threshold: f64,
    max_count: usize,
) -> Vec<usize> {
    let n = signal.len();
    if n < 8 {
        return Vec::new();
    }
    let detrended = remove_linear_trend(signal);
    let spectrum = periodogram(&detrended);

    let mut powers: Vec<f64> = spectrum.iter().map(|p| p.power).collect();
    powers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = powers[powers.len() / 2];
    if !(median > 0.0) {
        // A pure sinusoid leaves most bins at zero power.
        return strongest(&spectrum, min_period, max_period, max_count);
    }

    let mut peaks: Vec<(usize, f64)> = Vec::new();
    for (i, p) in spectrum.iter().enumerate() {
        let left = if i > 0 { spectrum[i - 1].power } else { 0.0 };
        let right = spectrum.get(i + 1).map(|q| q.power).unwrap_or(0.0);
        if p.power >= left && p.power >= right && p.power > threshold * median {
            let period = p.period.round() as usize;
            if (min_period..=max_period).contains(&period)
                && !peaks.iter().any(|&(q, _)| q == period)
            {
                peaks.push((period, p.power));
            }
        }
    }
    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks.into_iter().take(max_count).map(|(p, _)| p).collect()
}

fn strongest(spectrum: &[SpectralPoint], min: usize, max: usize, count: usize) -> Vec<usize> {
    let mut ranked: Vec<&SpectralPoint> = spectrum
        .iter()
        .filter(|p| p.power > 0.0 && (min..=max).contains(&(p.period.round() as usize)))
        .collect();
    ranked.sort_by(|a, b| b.power.partial_cmp(&a.power).unwrap_or(std::cmp::Ordering::Equal));
    let mut out: Vec<usize> = Vec::new();
    for p in ranked {
        let period = p.period.round() as usize;
        if !out.contains(&period) {
            out.push(period);
        }
        if out.len() == count {
            break;
        }
    }
    out
}

fn remove_linear_trend(signal: &[f64]) -> Vec<f64> {
    let n = signal.len() as f64;
    let t_mean = (n - 1.0) / 2.0;
    let y_mean = signal.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (t, &y) in signal.iter().enumerate() {
        let dt = t as f64 - t_mean;
        sxy += dt * (y - y_mean);
        sxx += dt * dt;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    signal
        .iter()
        .enumerate()
        .map(|(t, &y)| y - y_mean - slope * (t as f64 - t_mean))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn dominant_period_of_sinusoid() {
        let signal: Vec<f64> = (0..72).map(|t| (2.0 * PI * t as f64 / 12.0).sin()).collect();
        let peak = dominant_period(&signal).unwrap();
        assert_relative_eq!(peak.period, 12.0, epsilon = 1e-9);
        assert_relative_eq!(peak.frequency, 1.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn periodogram_excludes_zero_frequency() {
        let signal = vec![5.0; 16];
        let spec = periodogram(&signal);
        assert_eq!(spec.len(), 8);
        assert!(spec.iter().all(|p| p.power.abs() < 1e-20));
        assert!(dominant_period(&signal).is_err());
    }

    #[test]
    fn detects_seasonal_period_under_trend() {
        let signal: Vec<f64> = (0..96)
            .map(|t| 3.0 * t as f64 + 20.0 * (2.0 * PI * t as f64 / 12.0).cos()
                + ((t * 13) % 7) as f64 * 0.3)
            .collect();
        let periods = detect_seasonal_periods(&signal, 2, 48, 5.0, 2);
        assert_eq!(periods.first(), Some(&12));
    }

    #[test]
    fn short_signal_has_no_periods() {
        assert!(detect_seasonal_periods(&[1.0, 2.0, 3.0], 2, 12, 3.0, 1).is_empty());
        assert!(dominant_period(&[1.0, 2.0]).is_err());
    }
}
