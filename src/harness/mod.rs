//! Model-comparison harness over a monthly sales series.
//!
//! # Example
//!
//! ```
//! use shopping_forecast::core::{TimeSeries, YearMonth};
//! use shopping_forecast::harness::{split_at_horizon, CandidateKind, Evaluator, Roster, SelectionPolicy};
//!
//! let values: Vec<f64> = (0..48).map(|t| 100.0 + (t % 12) as f64).collect();
//! let series = TimeSeries::new(YearMonth::new(2019, 1).unwrap(), values).unwrap();
//! let (train, test) = split_at_horizon(&series, 12).unwrap();
//!
//! let roster = Roster::of(vec![CandidateKind::SeasonalNaive], 12);
//! let table = Evaluator::new(12, 0.95).evaluate(roster.fit_all(&train), &train, &test);
//! let best = table.select(&SelectionPolicy::default()).unwrap();
//! assert!(best.out_of_sample_rmse < 1e-9);
//! ```

mod config;
mod deploy;
mod evaluate;
mod report;
mod roster;
mod split;

pub use config::ReportConfig;
pub use deploy::{growth_rate, DeploymentForecast, Deployer, YearOverYear};
pub use evaluate::{EvaluationResult, EvaluationTable, Evaluator, RankedTable, SelectionPolicy};
pub use report::{run_report, run_with_roster, Report};
pub use roster::{
    ArimaVariant, CandidateFailure, CandidateKind, FailureStage, FittedCandidate, Roster, RosterFit,
};
pub use split::{split, split_at_horizon, split_periods};
