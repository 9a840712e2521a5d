//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the previous cycle.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::interval_z;

/// Seasonal Naive forecaster: `ŷ[t] = y[t - period]`.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    last_season: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma: Option<f64>,
}

impl SeasonalNaive {
    /// Create a new SeasonalNaive model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            last_season: None,
            fitted: None,
            residuals: None,
            sigma: None,
        }
    }

    /// Get the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    fn point(&self, season: &[f64], h: usize) -> f64 {
        season[h % self.period]
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.period;
        if values.len() < m {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: values.len(),
            });
        }

        let fitted: Vec<f64> = (0..values.len())
            .map(|t| if t < m { f64::NAN } else { values[t - m] })
            .collect();
        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        let usable: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        self.sigma = (!usable.is_empty())
            .then(|| (usable.iter().map(|r| r * r).sum::<f64>() / usable.len() as f64).sqrt());

        self.last_season = Some(values[values.len() - m..].to_vec());
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let season = self.last_season.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(
            (0..horizon).map(|h| self.point(season, h)).collect(),
        ))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let season = self.last_season.as_ref().ok_or(ForecastError::FitRequired)?;
        let z = interval_z(level);
        let sigma = self.sigma.unwrap_or(0.0);

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 0..horizon {
            let p = self.point(season, h);
            // Error accumulates once per completed season ahead.
            let se = sigma * ((h / self.period + 1) as f64).sqrt();
            point.push(p);
            lower.push(p - z * se);
            upper.push(p + z * se);
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
        "SeasonalNaive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use approx::assert_relative_eq;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        TimeSeries::new(YearMonth::new(2020, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn repeats_last_season_on_36_month_pattern() {
        let pattern = [5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0, 6.0, 10.0, 0.5, 11.0];
        let values: Vec<f64> = (0..36).map(|t| pattern[t % 12]).collect();
        let ts = monthly(values.clone());

        let mut model = SeasonalNaive::new(12);
        model.fit(&ts).unwrap();

        let forecast = model.predict(24).unwrap();
        for (h, &p) in forecast.point().iter().enumerate() {
            let t = 36 + h;
            // y[t - 12], reaching into earlier forecasts past one season.
            let expected = if t - 12 < 36 { values[t - 12] } else { forecast.point()[h - 12] };
            assert_eq!(p, expected);
        }
    }

    #[test]
    fn requires_full_season() {
        let mut model = SeasonalNaive::new(12);
        assert!(matches!(
            model.fit(&monthly(vec![1.0; 11])),
            Err(ForecastError::InsufficientData { needed: 12, got: 11 })
        ));
    }

    #[test]
    fn exactly_one_season_is_enough() {
        let mut model = SeasonalNaive::new(12);
        model.fit(&monthly((1..=12).map(|i| i as f64).collect())).unwrap();
        assert_eq!(model.predict(2).unwrap().point(), &[1.0, 2.0]);
        assert!(model.fitted_values().unwrap().iter().all(|f| f.is_nan()));
    }

    #[test]
    fn fitted_values_lag_one_season() {
        let values: Vec<f64> = (0..24).map(|t| t as f64).collect();
        let mut model = SeasonalNaive::new(12);
        model.fit(&monthly(values)).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert!(fitted[11].is_nan());
        assert_eq!(fitted[12], 0.0);
        let residuals = model.residuals().unwrap();
        assert_relative_eq!(residuals[20], 12.0);
    }

    #[test]
    fn intervals_widen_each_season() {
        let values: Vec<f64> = (0..48).map(|t| (t % 12) as f64 + 0.5 * t as f64).collect();
        let mut model = SeasonalNaive::new(12);
        model.fit(&monthly(values)).unwrap();

        let f = model.predict_with_intervals(24, 0.95).unwrap();
        let width = |i: usize| f.upper().unwrap()[i] - f.lower().unwrap()[i];
        assert!(width(12) > width(0));
        assert_relative_eq!(width(13) / width(1), 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn predict_before_fit_fails() {
        assert!(matches!(
            SeasonalNaive::new(12).predict(3),
            Err(ForecastError::FitRequired)
        ));
    }
}
