//! # shopping-forecast
//!
//! Model comparison harness for monthly online-shopping sales.
//!
//! Loads a monthly series, runs advisory stationarity diagnostics, fits a
//! roster of candidate models (seasonal naive, ETS, four ARIMA variants and
//! TBATS) on a training window, ranks them on a held-out year, refits the
//! chosen one on all data and reports next year's total and growth.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod detection;
pub mod diagnostics;
pub mod error;
pub mod harness;
pub mod io;
pub mod models;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, PeriodRange, TimeSeries, YearMonth};
    pub use crate::diagnostics::{diagnose, DiagnosticsConfig, StationarityReport};
    pub use crate::error::{ForecastError, Result};
    pub use crate::harness::{
        growth_rate, run_report, split, CandidateKind, Deployer, EvaluationTable, Evaluator,
        ReportConfig, Roster, SelectionPolicy,
    };
    pub use crate::io::{load_csv, LoaderConfig};
    pub use crate::models::Forecaster;
    pub use crate::utils::{calculate_metrics, quantile_normal, AccuracyMetrics};
}
