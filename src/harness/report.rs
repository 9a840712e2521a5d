//! End-to-end run: diagnose, split, fit, evaluate, select, deploy.

use std::fmt;

use crate::core::TimeSeries;
use crate::diagnostics::{diagnose, DiagnosticsConfig, StationarityReport};
use crate::error::Result;
use crate::harness::config::ReportConfig;
use crate::harness::deploy::{DeploymentForecast, Deployer, YearOverYear};
use crate::harness::evaluate::{EvaluationTable, Evaluator, SelectionPolicy};
use crate::harness::roster::Roster;
use crate::harness::split::split;

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub label: String,
    pub diagnostics: StationarityReport,
    pub policy: SelectionPolicy,
    pub evaluation: EvaluationTable,
    pub deployment: DeploymentForecast,
    pub year_over_year: YearOverYear,
}

/// Run the whole harness over `series` with the standard roster.
pub fn run_report(series: &TimeSeries, config: &ReportConfig) -> Result<Report> {
    let roster = Roster::standard(config.season_length)
        .with_lambda_search(config.lambda_search.clone());
    run_with_roster(series, config, roster)
}

/// Run the harness with a caller-supplied roster.
pub fn run_with_roster(
    series: &TimeSeries,
    config: &ReportConfig,
    roster: Roster,
) -> Result<Report> {
    let diagnostics_config = DiagnosticsConfig {
        period: config.season_length,
        significance: config.significance,
        lambda_search: config.lambda_search.clone(),
        ..Default::default()
    };
    let diagnostics = diagnose(series, &diagnostics_config);

    let (train, test) = split(series, &config.train, &config.test)?;
    let fit = roster.fit_all(&train);
    let evaluation =
        Evaluator::new(config.season_length, config.interval_level).evaluate(fit, &train, &test);
    let chosen = evaluation.select(&config.selection)?.kind;
    tracing::info!(candidate = %chosen, policy = ?config.selection, "selected");

    let deployer = Deployer::new(roster, config.horizon, config.interval_level);
    let deployment = deployer.deploy(&chosen, series)?;
    let year_over_year = YearOverYear::compute(series, &deployment)?;

    Ok(Report {
        label: series.label().unwrap_or("series").to_string(),
        diagnostics,
        policy: config.selection,
        evaluation,
        deployment,
        year_over_year,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.label)?;
        writeln!(f)?;
        writeln!(f, "{}", self.diagnostics)?;
        writeln!(f)?;
        writeln!(f, "Model comparison ({:?}):", self.policy)?;
        write!(f, "{}", self.evaluation.display(self.policy))?;
        writeln!(f)?;
        writeln!(f, "Deployed: {}", self.deployment)?;
        writeln!(f)?;
        write!(f, "{}", self.year_over_year)
    }
}
