//! Command-line report over a monthly sales CSV.
//!
//! Usage: `shopping-report [PATH]`
//!
//! Log verbosity follows `RUST_LOG` (default `shopping_forecast=info`).

use std::env;
use std::process::ExitCode;

use shopping_forecast::harness::{run_report, ReportConfig};
use shopping_forecast::io::{load_csv, LoaderConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DATA: &str = "data/online_shopping_synthetic.csv";

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopping_forecast=info".into()),
        )
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA.to_string());

    let series = match load_csv(&path, &LoaderConfig::default()) {
        Ok(series) => series,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "could not load series");
            return ExitCode::FAILURE;
        }
    };

    match run_report(&series, &ReportConfig::default()) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "report failed");
            ExitCode::FAILURE
        }
    }
}
