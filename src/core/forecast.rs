//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};

/// Point predictions with optional prediction-interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    /// Nominal coverage of the interval bounds, e.g. 0.95.
    level: Option<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forecast from point predictions only.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Forecast with interval bounds of equal length.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }
        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Sum of the point predictions over the horizon.
    pub fn total(&self) -> f64 {
        self.point.iter().sum()
    }

    /// Apply a monotone increasing map to points and bounds alike.
    ///
    /// Used to carry forecasts made on a transformed scale back to the
    /// original one.
    pub fn map<F>(&self, f: F) -> Forecast
    where
        F: Fn(f64) -> f64,
    {
        let apply = |v: &Vec<f64>| v.iter().map(|&x| f(x)).collect::<Vec<f64>>();
        Forecast {
            point: apply(&self.point),
            lower: self.lower.as_ref().map(apply),
            upper: self.upper.as_ref().map(apply),
            level: self.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_only_forecast() {
        let f = Forecast::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(f.horizon(), 3);
        assert!(!f.has_intervals());
        assert_relative_eq!(f.total(), 6.0);
    }

    #[test]
    fn interval_lengths_must_match() {
        let err = Forecast::from_values_with_intervals(vec![1.0, 2.0], vec![0.0], vec![3.0, 4.0], 0.95);
        assert!(matches!(
            err,
            Err(ForecastError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn map_transforms_bounds() {
        let f = Forecast::from_values_with_intervals(vec![0.0], vec![-1.0], vec![1.0], 0.8).unwrap();
        let g = f.map(f64::exp);
        assert_relative_eq!(g.point()[0], 1.0);
        assert_relative_eq!(g.lower().unwrap()[0], (-1.0f64).exp());
        assert_relative_eq!(g.upper().unwrap()[0], 1.0f64.exp());
        assert_eq!(g.level(), Some(0.8));
    }

    #[test]
    fn empty_forecast() {
        let f = Forecast::new();
        assert!(f.is_empty());
        assert_eq!(f.total(), 0.0);
    }
}
