//! Advisory stationarity report: Box-Cox lambda, ADF/KPSS under each
//! differencing scheme, and the dominant cycle length.
//!
//! Nothing here changes how models are fit. Both test p-values are kept so a
//! reader can see when the tests disagree.

use std::fmt;

use crate::core::TimeSeries;
use crate::detection::{dominant_period, SpectralPoint};
use crate::error::Result;
use crate::transform::{boxcox_lambda, difference_orders, LambdaSearch};
use crate::validation::{
    adf_test, kpss_test, seasonal_strength, Deterministic, StationarityResult,
    DEFAULT_SIGNIFICANCE,
};

/// Settings for [`diagnose`].
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub period: usize,
    pub significance: f64,
    pub lambda_search: LambdaSearch,
    /// Deterministic terms of the ADF and KPSS regressions.
    pub deterministic: Deterministic,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            period: 12,
            significance: DEFAULT_SIGNIFICANCE,
            lambda_search: LambdaSearch::default(),
            deterministic: Deterministic::Constant,
        }
    }
}

impl DiagnosticsConfig {
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    pub fn with_significance(mut self, alpha: f64) -> Self {
        self.significance = alpha;
        self
    }

    pub fn with_lambda_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lambda_search = self.lambda_search.with_bounds(lower, upper);
        self
    }
}

/// Which differencing was applied before testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Differencing {
    None,
    First,
    Seasonal,
    FirstAndSeasonal,
}

impl Differencing {
    pub const ALL: [Differencing; 4] = [
        Differencing::None,
        Differencing::First,
        Differencing::Seasonal,
        Differencing::FirstAndSeasonal,
    ];

    /// `(d, D)` orders.
    pub fn orders(self) -> (usize, usize) {
        match self {
            Differencing::None => (0, 0),
            Differencing::First => (1, 0),
            Differencing::Seasonal => (0, 1),
            Differencing::FirstAndSeasonal => (1, 1),
        }
    }
}

impl fmt::Display for Differencing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Differencing::None => "raw",
            Differencing::First => "diff",
            Differencing::Seasonal => "seasonal diff",
            Differencing::FirstAndSeasonal => "diff + seasonal diff",
        };
        f.write_str(s)
    }
}

/// ADF and KPSS on the same series.
#[derive(Debug, Clone)]
pub struct TestPair {
    pub adf: StationarityResult,
    pub kpss: StationarityResult,
}

impl TestPair {
    /// ADF rejects a unit root.
    pub fn adf_stationary(&self, alpha: f64) -> bool {
        self.adf.suggests_stationary(alpha)
    }

    /// KPSS does not reject stationarity.
    pub fn kpss_stationary(&self, alpha: f64) -> bool {
        self.kpss.suggests_stationary(alpha)
    }

    pub fn agree(&self, alpha: f64) -> bool {
        self.adf_stationary(alpha) == self.kpss_stationary(alpha)
    }
}

/// Test outcome for one differencing scheme.
#[derive(Debug, Clone)]
pub struct DifferencingCheck {
    pub differencing: Differencing,
    /// Observations left after differencing.
    pub len: usize,
    pub tests: Result<TestPair>,
}

/// Full diagnostics of one series.
#[derive(Debug, Clone)]
pub struct StationarityReport {
    pub significance: f64,
    pub lambda: Result<f64>,
    pub checks: Vec<DifferencingCheck>,
    pub dominant_raw: Result<SpectralPoint>,
    pub dominant_differenced: Result<SpectralPoint>,
    pub seasonal_strength: Result<f64>,
}

impl StationarityReport {
    pub fn check(&self, differencing: Differencing) -> Option<&DifferencingCheck> {
        self.checks.iter().find(|c| c.differencing == differencing)
    }
}

/// Run every advisory diagnostic on `series`.
///
/// Individual failures (too little data after differencing, non-positive
/// values for Box-Cox) are kept in the report rather than aborting it.
pub fn diagnose(series: &TimeSeries, config: &DiagnosticsConfig) -> StationarityReport {
    let y = series.values();
    let m = config.period;

    let checks = Differencing::ALL
        .iter()
        .map(|&differencing| {
            let (d, sd) = differencing.orders();
            let transformed = difference_orders(y, d, sd, m);
            let len = transformed.as_ref().map_or(0, Vec::len);
            let tests = transformed.and_then(|w| {
                Ok(TestPair {
                    adf: adf_test(&w, None, config.deterministic)?,
                    kpss: kpss_test(&w, None, config.deterministic)?,
                })
            });
            DifferencingCheck {
                differencing,
                len,
                tests,
            }
        })
        .collect();

    let first_diff = difference_orders(y, 1, 0, m);
    let report = StationarityReport {
        significance: config.significance,
        lambda: boxcox_lambda(y, &config.lambda_search),
        checks,
        dominant_raw: dominant_period(y),
        dominant_differenced: first_diff.and_then(|w| dominant_period(&w)),
        seasonal_strength: seasonal_strength(y, m),
    };
    tracing::info!(
        lambda = ?report.lambda.as_ref().ok(),
        period = ?report.dominant_raw.as_ref().ok().map(|p| p.period),
        "stationarity diagnostics complete"
    );
    report
}

fn describe<T>(r: &Result<T>, show: impl Fn(&T) -> String) -> String {
    match r {
        Ok(v) => show(v),
        Err(e) => format!("n/a ({})", e),
    }
}

fn verdict(stationary: bool) -> &'static str {
    if stationary {
        "stationary"
    } else {
        "non-stationary"
    }
}

impl fmt::Display for StationarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = self.significance;
        writeln!(f, "Box-Cox lambda: {}", describe(&self.lambda, |l| format!("{:.4}", l)))?;
        writeln!(
            f,
            "Seasonal strength: {}",
            describe(&self.seasonal_strength, |s| format!("{:.3}", s))
        )?;
        writeln!(
            f,
            "{:<22} {:>5} {:>9} {:>16} {:>9} {:>16}",
            "series", "n", "ADF p", "ADF says", "KPSS p", "KPSS says"
        )?;
        for check in &self.checks {
            match &check.tests {
                Ok(t) => {
                    let flag = if t.agree(alpha) { "" } else { "  (tests disagree)" };
                    writeln!(
                        f,
                        "{:<22} {:>5} {:>9.4} {:>16} {:>9.4} {:>16}{}",
                        check.differencing.to_string(),
                        check.len,
                        t.adf.p_value,
                        verdict(t.adf_stationary(alpha)),
                        t.kpss.p_value,
                        verdict(t.kpss_stationary(alpha)),
                        flag
                    )?;
                }
                Err(e) => writeln!(
                    f,
                    "{:<22} {:>5} n/a ({})",
                    check.differencing.to_string(),
                    check.len,
                    e
                )?,
            }
        }
        let period = |r: &Result<SpectralPoint>| {
            describe(r, |p| format!("{:.2} months (frequency {:.4})", p.period, p.frequency))
        };
        writeln!(f, "Dominant period (raw): {}", period(&self.dominant_raw))?;
        write!(f, "Dominant period (diff): {}", period(&self.dominant_differenced))
    }
}
