//! Scoring fitted candidates on the held-out window and choosing a winner.

use std::cmp::Ordering;
use std::fmt;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::harness::roster::{
    CandidateFailure, CandidateKind, FailureStage, FittedCandidate, RosterFit,
};
use crate::utils::{calculate_metrics, residual_rmse, rmse, seasonal_naive_scale, AccuracyMetrics};
use crate::validation::{ljung_box, LjungBoxResult};

/// Rule for picking the model to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Smallest RMSE on the held-out window.
    #[default]
    LowestTestRmse,
    LowestTrainRmse,
    /// Smallest AICc (AIC for TBATS). Candidates without one are never chosen.
    LowestInformationCriterion,
    /// Always deploy this candidate if it produced a forecast.
    Named(CandidateKind),
}

impl SelectionPolicy {
    fn score(&self, row: &EvaluationResult) -> Option<f64> {
        let score = match self {
            SelectionPolicy::LowestTestRmse | SelectionPolicy::Named(_) => {
                Some(row.out_of_sample_rmse)
            }
            SelectionPolicy::LowestTrainRmse => row.in_sample_rmse,
            SelectionPolicy::LowestInformationCriterion => row.information_criterion,
        };
        score.filter(|s| s.is_finite())
    }
}

/// Scores of one candidate.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub kind: CandidateKind,
    /// Name of the fitted model, including any automatically chosen order.
    pub model_name: String,
    pub in_sample_rmse: Option<f64>,
    pub out_of_sample_rmse: f64,
    pub information_criterion: Option<f64>,
    pub metrics: AccuracyMetrics,
    pub ljung_box: Option<LjungBoxResult>,
    pub forecast: Forecast,
}

/// Every scored candidate plus those that dropped out.
#[derive(Debug, Clone, Default)]
pub struct EvaluationTable {
    rows: Vec<EvaluationResult>,
    failures: Vec<CandidateFailure>,
}

impl EvaluationTable {
    /// Rows in roster order.
    pub fn rows(&self) -> &[EvaluationResult] {
        &self.rows
    }

    pub fn failures(&self) -> &[CandidateFailure] {
        &self.failures
    }

    pub fn get(&self, kind: &CandidateKind) -> Option<&EvaluationResult> {
        self.rows.iter().find(|r| r.kind == *kind)
    }

    /// Rows ordered best first under `policy`; rows without a score go last.
    pub fn ranked(&self, policy: &SelectionPolicy) -> Vec<&EvaluationResult> {
        let mut rows: Vec<&EvaluationResult> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            if let SelectionPolicy::Named(kind) = policy {
                match (a.kind == *kind, b.kind == *kind) {
                    (true, false) => return Ordering::Less,
                    (false, true) => return Ordering::Greater,
                    _ => {}
                }
            }
            match (policy.score(a), policy.score(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        rows
    }

    /// The row `policy` deploys.
    pub fn select(&self, policy: &SelectionPolicy) -> Result<&EvaluationResult> {
        if let SelectionPolicy::Named(kind) = policy {
            return self.get(kind).ok_or_else(|| {
                ForecastError::InvalidParameter(format!("{} produced no forecast", kind))
            });
        }
        self.ranked(policy)
            .into_iter()
            .find(|row| policy.score(row).is_some())
            .ok_or_else(|| {
                ForecastError::ComputationError(format!(
                    "no candidate can be ranked under {:?}",
                    policy
                ))
            })
    }

    /// Table text ranked under `policy`.
    pub fn display(&self, policy: SelectionPolicy) -> RankedTable<'_> {
        RankedTable {
            table: self,
            policy,
        }
    }
}

/// Display adapter returned by [`EvaluationTable::display`].
pub struct RankedTable<'a> {
    table: &'a EvaluationTable,
    policy: SelectionPolicy,
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

impl fmt::Display for RankedTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>2}  {:<26} {:<34} {:>12} {:>12} {:>10} {:>7} {:>6} {:>6}",
            "#", "candidate", "model", "train RMSE", "test RMSE", "IC", "MAPE%", "MASE", "LB p"
        )?;
        for (i, row) in self.table.ranked(&self.policy).iter().enumerate() {
            writeln!(
                f,
                "{:>2}  {:<26} {:<34} {:>12} {:>12.2} {:>10} {:>7} {:>6} {:>6}",
                i + 1,
                row.kind.to_string(),
                row.model_name,
                opt(row.in_sample_rmse, 2),
                row.out_of_sample_rmse,
                opt(row.information_criterion, 1),
                opt(row.metrics.mape, 2),
                opt(row.metrics.mase, 3),
                opt(row.ljung_box.as_ref().map(|lb| lb.p_value), 3),
            )?;
        }
        for failure in &self.table.failures {
            writeln!(f, "    {}", failure)?;
        }
        Ok(())
    }
}

/// Forecasts each fitted candidate over the test window and scores it.
#[derive(Debug, Clone)]
pub struct Evaluator {
    season_length: usize,
    interval_level: f64,
}

impl Evaluator {
    pub fn new(season_length: usize, interval_level: f64) -> Self {
        Self {
            season_length,
            interval_level,
        }
    }

    /// Score every fitted candidate against `test`. Candidates that cannot
    /// forecast join the fit failures instead of aborting the table.
    pub fn evaluate(&self, fit: RosterFit, train: &TimeSeries, test: &TimeSeries) -> EvaluationTable {
        let scale = seasonal_naive_scale(train.values(), self.season_length);
        let mut table = EvaluationTable {
            rows: Vec::with_capacity(fit.fitted.len()),
            failures: fit.failures,
        };
        for candidate in fit.fitted {
            let kind = candidate.kind;
            match self.score(&candidate, test, scale) {
                Ok(row) => {
                    tracing::debug!(
                        candidate = %kind,
                        test_rmse = row.out_of_sample_rmse,
                        "evaluated"
                    );
                    table.rows.push(row);
                }
                Err(error) => {
                    tracing::warn!(candidate = %kind, %error, "candidate failed to forecast");
                    table.failures.push(CandidateFailure {
                        kind,
                        stage: FailureStage::Forecast,
                        error,
                    });
                }
            }
        }
        table
    }

    fn score(
        &self,
        candidate: &FittedCandidate,
        test: &TimeSeries,
        scale: Option<f64>,
    ) -> Result<EvaluationResult> {
        let model = &candidate.model;
        let forecast = model.predict_with_intervals(test.len(), self.interval_level)?;
        if forecast.point().iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "forecast contains non-finite values".to_string(),
            ));
        }
        let out_of_sample_rmse = rmse(test.values(), forecast.point())?;
        let metrics = calculate_metrics(test.values(), forecast.point(), scale)?;
        let residuals = model.residuals();
        Ok(EvaluationResult {
            kind: candidate.kind,
            model_name: model.name().to_string(),
            in_sample_rmse: residuals.and_then(residual_rmse),
            out_of_sample_rmse,
            information_criterion: model.information_criterion(),
            metrics,
            ljung_box: residuals.and_then(|r| {
                ljung_box(r, None, self.season_length, model.parameter_count())
            }),
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YearMonth;
    use crate::harness::roster::Roster;
    use crate::models::exponential::EtsSelection;
    use approx::assert_relative_eq;

    fn row(kind: CandidateKind, test: f64, train: Option<f64>, ic: Option<f64>) -> EvaluationResult {
        EvaluationResult {
            kind,
            model_name: kind.to_string(),
            in_sample_rmse: train,
            out_of_sample_rmse: test,
            information_criterion: ic,
            metrics: calculate_metrics(&[1.0], &[1.0], None).unwrap(),
            ljung_box: None,
            forecast: Forecast::from_values(vec![1.0]),
        }
    }

    fn table() -> EvaluationTable {
        EvaluationTable {
            rows: vec![
                row(CandidateKind::SeasonalNaive, 30.0, Some(40.0), None),
                row(CandidateKind::Ets(EtsSelection::Auto), 20.0, Some(10.0), Some(500.0)),
                row(CandidateKind::Tbats, 25.0, Some(12.0), Some(450.0)),
            ],
            failures: Vec::new(),
        }
    }

    #[test]
    fn default_policy_picks_lowest_test_rmse() {
        let t = table();
        let best = t.select(&SelectionPolicy::default()).unwrap();
        assert_eq!(best.kind, CandidateKind::Ets(EtsSelection::Auto));
        let order: Vec<_> = t
            .ranked(&SelectionPolicy::LowestTestRmse)
            .iter()
            .map(|r| r.out_of_sample_rmse)
            .collect();
        assert_eq!(order, vec![20.0, 25.0, 30.0]);
    }

    #[test]
    fn alternative_policies() {
        let t = table();
        assert_eq!(
            t.select(&SelectionPolicy::LowestInformationCriterion).unwrap().kind,
            CandidateKind::Tbats
        );
        assert_eq!(
            t.select(&SelectionPolicy::LowestTrainRmse).unwrap().kind,
            CandidateKind::Ets(EtsSelection::Auto)
        );
        let ranked = t.ranked(&SelectionPolicy::LowestInformationCriterion);
        assert_eq!(ranked.last().unwrap().kind, CandidateKind::SeasonalNaive);
    }

    #[test]
    fn named_policy_overrides_scores() {
        let t = table();
        let policy = SelectionPolicy::Named(CandidateKind::SeasonalNaive);
        assert_eq!(t.select(&policy).unwrap().kind, CandidateKind::SeasonalNaive);
        assert_eq!(t.ranked(&policy)[0].kind, CandidateKind::SeasonalNaive);

        let missing = SelectionPolicy::Named(CandidateKind::Arima(
            crate::harness::roster::ArimaVariant::ALL[0],
        ));
        assert!(matches!(
            t.select(&missing),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_table_cannot_select() {
        let t = EvaluationTable::default();
        assert!(t.select(&SelectionPolicy::LowestTestRmse).is_err());
    }

    #[test]
    fn seasonal_naive_scores_against_repeating_test_year() {
        let values: Vec<f64> = (0..36).map(|t| 100.0 + (t % 12) as f64 * 5.0).collect();
        let series = TimeSeries::new(YearMonth::new(2020, 1).unwrap(), values).unwrap();
        let train = series.slice(0, 24).unwrap();
        let test = series.slice(24, 36).unwrap();

        let roster = Roster::of(vec![CandidateKind::SeasonalNaive], 12);
        let table = Evaluator::new(12, 0.95).evaluate(roster.fit_all(&train), &train, &test);
        let row = table.get(&CandidateKind::SeasonalNaive).unwrap();
        assert_relative_eq!(row.out_of_sample_rmse, 0.0, epsilon = 1e-12);
        assert!(row.forecast.has_intervals());
        let text = table.display(SelectionPolicy::default()).to_string();
        assert!(text.contains("Seasonal naive"));
    }
}
