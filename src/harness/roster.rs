//! The fixed set of candidate models and fitting them side by side.

use std::fmt;

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{AutoARIMA, AutoARIMAConfig};
use crate::models::baseline::SeasonalNaive;
use crate::models::exponential::{AutoETS, AutoETSConfig, EtsSelection};
use crate::models::tbats::{AutoTBATS, TbatsConfig};
use crate::models::{BoxCoxForecaster, BoxedForecaster, LambdaChoice};
use crate::transform::LambdaSearch;

/// One of the four automatic ARIMA configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaVariant {
    /// Fit on the Box-Cox scale with lambda searched on the training data.
    pub box_cox: bool,
    /// Allow seasonal AR/MA/differencing terms.
    pub seasonal: bool,
}

impl ArimaVariant {
    pub const ALL: [ArimaVariant; 4] = [
        ArimaVariant {
            box_cox: false,
            seasonal: false,
        },
        ArimaVariant {
            box_cox: false,
            seasonal: true,
        },
        ArimaVariant {
            box_cox: true,
            seasonal: false,
        },
        ArimaVariant {
            box_cox: true,
            seasonal: true,
        },
    ];
}

/// Identity of a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    SeasonalNaive,
    Ets(EtsSelection),
    Arima(ArimaVariant),
    Tbats,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKind::SeasonalNaive => f.write_str("Seasonal naive"),
            CandidateKind::Ets(EtsSelection::Auto) => f.write_str("ETS"),
            CandidateKind::Ets(EtsSelection::Fixed(spec)) => f.write_str(&spec.short_name()),
            CandidateKind::Arima(v) => {
                let seasonal = if v.seasonal { "seasonal" } else { "non-seasonal" };
                if v.box_cox {
                    write!(f, "ARIMA {} + Box-Cox", seasonal)
                } else {
                    write!(f, "ARIMA {}", seasonal)
                }
            }
            CandidateKind::Tbats => f.write_str("TBATS"),
        }
    }
}

/// A successfully fitted roster entry.
pub struct FittedCandidate {
    pub kind: CandidateKind,
    pub model: BoxedForecaster,
}

impl fmt::Debug for FittedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedCandidate")
            .field("kind", &self.kind)
            .field("model", &self.model.name())
            .finish()
    }
}

/// Where in the pipeline a candidate dropped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Fit,
    Forecast,
}

/// A roster entry that could not produce results.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub kind: CandidateKind,
    pub stage: FailureStage,
    pub error: ForecastError,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            FailureStage::Fit => "fit",
            FailureStage::Forecast => "forecast",
        };
        write!(f, "{} failed to {}: {}", self.kind, stage, self.error)
    }
}

/// Outcome of fitting every roster entry on one training window.
#[derive(Debug, Default)]
pub struct RosterFit {
    pub fitted: Vec<FittedCandidate>,
    pub failures: Vec<CandidateFailure>,
}

/// Ordered list of candidates plus the settings they share.
#[derive(Debug, Clone)]
pub struct Roster {
    candidates: Vec<CandidateKind>,
    season_length: usize,
    lambda_search: LambdaSearch,
}

impl Roster {
    /// Seasonal naive, automatic ETS, the four ARIMA variants and TBATS.
    pub fn standard(season_length: usize) -> Self {
        let mut candidates = vec![
            CandidateKind::SeasonalNaive,
            CandidateKind::Ets(EtsSelection::Auto),
        ];
        candidates.extend(ArimaVariant::ALL.iter().copied().map(CandidateKind::Arima));
        candidates.push(CandidateKind::Tbats);
        Self {
            candidates,
            season_length,
            lambda_search: LambdaSearch::default(),
        }
    }

    /// A roster with exactly the given entries.
    pub fn of(candidates: Vec<CandidateKind>, season_length: usize) -> Self {
        Self {
            candidates,
            season_length,
            lambda_search: LambdaSearch::default(),
        }
    }

    pub fn with_candidate(mut self, kind: CandidateKind) -> Self {
        self.candidates.push(kind);
        self
    }

    pub fn with_lambda_search(mut self, search: LambdaSearch) -> Self {
        self.lambda_search = search.with_period(self.season_length);
        self
    }

    pub fn candidates(&self) -> &[CandidateKind] {
        &self.candidates
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    /// A fresh, unfitted model for `kind`.
    pub fn build(&self, kind: &CandidateKind) -> BoxedForecaster {
        let m = self.season_length;
        match *kind {
            CandidateKind::SeasonalNaive => Box::new(SeasonalNaive::new(m)),
            CandidateKind::Ets(selection) => {
                let config = AutoETSConfig::default().with_period(m);
                let config = match selection {
                    EtsSelection::Auto => config,
                    EtsSelection::Fixed(spec) => config.fixed(spec),
                };
                Box::new(AutoETS::with_config(config))
            }
            CandidateKind::Arima(variant) => {
                let config = AutoARIMAConfig::default()
                    .with_seasonal(variant.seasonal)
                    .with_seasonal_period(m);
                let model = AutoARIMA::with_config(config);
                if variant.box_cox {
                    Box::new(BoxCoxForecaster::new(
                        model,
                        LambdaChoice::Search(self.lambda_search.clone()),
                    ))
                } else {
                    Box::new(model)
                }
            }
            CandidateKind::Tbats => {
                let config = TbatsConfig::default()
                    .with_periods(vec![m])
                    .with_lambda_search(self.lambda_search.clone());
                Box::new(AutoTBATS::with_config(config))
            }
        }
    }

    /// Build and fit a single candidate.
    pub fn fit_one(&self, kind: &CandidateKind, series: &TimeSeries) -> Result<FittedCandidate> {
        let mut model = self.build(kind);
        model.fit(series)?;
        Ok(FittedCandidate { kind: *kind, model })
    }

    /// Fit every candidate on `train`; a failing entry is recorded and the
    /// others carry on.
    pub fn fit_all(&self, train: &TimeSeries) -> RosterFit {
        let mut out = RosterFit::default();
        for kind in &self.candidates {
            match self.fit_one(kind, train) {
                Ok(candidate) => {
                    tracing::debug!(candidate = %kind, model = candidate.model.name(), "fitted");
                    out.fitted.push(candidate);
                }
                Err(error) => {
                    tracing::warn!(candidate = %kind, %error, "candidate failed to fit");
                    out.failures.push(CandidateFailure {
                        kind: *kind,
                        stage: FailureStage::Fit,
                        error,
                    });
                }
            }
        }
        tracing::info!(
            fitted = out.fitted.len(),
            failed = out.failures.len(),
            "roster fitted"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use crate::models::exponential::ETSSpec;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize) -> TimeSeries {
        let values = (0..n)
            .map(|t| 200.0 + 3.0 * t as f64 + 25.0 * (2.0 * PI * t as f64 / 12.0).sin())
            .collect();
        TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn standard_roster_has_seven_entries() {
        let roster = Roster::standard(12);
        assert_eq!(roster.candidates().len(), 7);
        let arima = roster
            .candidates()
            .iter()
            .filter(|k| matches!(k, CandidateKind::Arima(_)))
            .count();
        assert_eq!(arima, 4);
    }

    #[test]
    fn labels_name_the_variant() {
        let kind = CandidateKind::Arima(ArimaVariant {
            box_cox: true,
            seasonal: true,
        });
        assert_eq!(kind.to_string(), "ARIMA seasonal + Box-Cox");
        assert_eq!(
            CandidateKind::Ets(EtsSelection::Fixed(ETSSpec::mam())).to_string(),
            "ETS(M,A,M)"
        );
    }

    #[test]
    fn short_series_fails_seasonal_naive_only_where_needed() {
        let roster = Roster::of(vec![CandidateKind::SeasonalNaive], 12);
        let fit = roster.fit_all(&seasonal_series(8));
        assert!(fit.fitted.is_empty());
        assert_eq!(fit.failures.len(), 1);
        assert!(matches!(
            fit.failures[0].error,
            ForecastError::InsufficientData { .. }
        ));
    }

    #[test]
    fn failing_entry_does_not_stop_the_rest() {
        let mut values: Vec<f64> = seasonal_series(48).values().to_vec();
        values[5] = 0.0;
        let series = TimeSeries::new(YearMonth::new(2017, 1).unwrap(), values).unwrap();
        let roster = Roster::of(
            vec![
                CandidateKind::SeasonalNaive,
                CandidateKind::Ets(EtsSelection::Fixed(ETSSpec::mam())),
                CandidateKind::Ets(EtsSelection::Auto),
            ],
            12,
        );
        let fit = roster.fit_all(&series);
        assert_eq!(fit.fitted.len(), 2);
        assert_eq!(fit.failures.len(), 1);
        assert!(matches!(fit.failures[0].error, ForecastError::Domain(_)));
    }
}
