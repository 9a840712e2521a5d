//! Refitting the chosen candidate on the full history and projecting a year.

use std::fmt;

use crate::core::{Forecast, TimeSeries, YearMonth, MONTHLY};
use crate::error::{ForecastError, Result};
use crate::harness::roster::{CandidateKind, Roster};

/// Relative change `current / prior - 1`.
pub fn growth_rate(current: f64, prior: f64) -> Result<f64> {
    if !current.is_finite() || !prior.is_finite() || prior <= 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "growth needs a positive prior total, got {} -> {}",
            prior, current
        )));
    }
    Ok(current / prior - 1.0)
}

/// Forecast of the refitted model over the months after the series.
#[derive(Debug, Clone)]
pub struct DeploymentForecast {
    pub kind: CandidateKind,
    pub model_name: String,
    pub periods: Vec<YearMonth>,
    pub forecast: Forecast,
    /// Sum of the point forecasts.
    pub total: f64,
}

impl DeploymentForecast {
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, f64)> + '_ {
        self.periods.iter().copied().zip(self.forecast.point().iter().copied())
    }

    /// Growth of the forecast total over `prior`.
    pub fn growth_over(&self, prior: f64) -> Result<f64> {
        growth_rate(self.total, prior)
    }
}

impl fmt::Display for DeploymentForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.kind, self.model_name)?;
        let lower = self.forecast.lower();
        let upper = self.forecast.upper();
        for (i, (period, value)) in self.iter().enumerate() {
            match (lower, upper) {
                (Some(lo), Some(hi)) => writeln!(
                    f,
                    "  {}  {:>14.1}  [{:.1}, {:.1}]",
                    period, value, lo[i], hi[i]
                )?,
                _ => writeln!(f, "  {}  {:>14.1}", period, value)?,
            }
        }
        write!(f, "  total    {:>14.1}", self.total)
    }
}

/// Annual totals around the forecast year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearOverYear {
    /// Last complete observed year.
    pub last_year: i32,
    pub last_total: f64,
    pub prior_total: Option<f64>,
    /// Observed growth of `last_year` over the year before it.
    pub last_growth: Option<f64>,
    pub forecast_total: f64,
    /// Forecast growth over `last_year`.
    pub forecast_growth: f64,
}

impl YearOverYear {
    /// Compare the forecast total with the last complete calendar year of
    /// `series`.
    pub fn compute(series: &TimeSeries, deployment: &DeploymentForecast) -> Result<Self> {
        let last = series
            .annual_totals()
            .into_iter()
            .rev()
            .find(|t| t.is_complete())
            .ok_or(ForecastError::InsufficientData {
                needed: MONTHLY,
                got: series.len(),
            })?;
        let prior_total = series.year_total(last.year - 1);
        Ok(Self {
            last_year: last.year,
            last_total: last.total,
            prior_total,
            last_growth: prior_total.and_then(|p| growth_rate(last.total, p).ok()),
            forecast_total: deployment.total,
            forecast_growth: deployment.growth_over(last.total)?,
        })
    }
}

impl fmt::Display for YearOverYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(prior), Some(growth)) = (self.prior_total, self.last_growth) {
            writeln!(
                f,
                "{} total {:.1} ({:+.2}% over {:.1})",
                self.last_year,
                self.last_total,
                growth * 100.0,
                prior
            )?;
        } else {
            writeln!(f, "{} total {:.1}", self.last_year, self.last_total)?;
        }
        write!(
            f,
            "forecast total {:.1} ({:+.2}% over {})",
            self.forecast_total,
            self.forecast_growth * 100.0,
            self.last_year
        )
    }
}

/// Refits a roster entry on all observations and forecasts ahead.
#[derive(Debug, Clone)]
pub struct Deployer {
    roster: Roster,
    horizon: usize,
    interval_level: f64,
}

impl Deployer {
    pub fn new(roster: Roster, horizon: usize, interval_level: f64) -> Self {
        Self {
            roster,
            horizon,
            interval_level,
        }
    }

    pub fn deploy(&self, kind: &CandidateKind, series: &TimeSeries) -> Result<DeploymentForecast> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        let candidate = self.roster.fit_one(kind, series)?;
        let forecast = candidate
            .model
            .predict_with_intervals(self.horizon, self.interval_level)?;
        let periods: Vec<YearMonth> = (1..=self.horizon)
            .map(|h| series.end().offset(h as i64))
            .collect();
        let total = forecast.total();
        tracing::info!(
            candidate = %kind,
            model = candidate.model.name(),
            total,
            "deployed on full series"
        );
        Ok(DeploymentForecast {
            kind: *kind,
            model_name: candidate.model.name().to_string(),
            periods,
            forecast,
            total,
        })
    }
}
