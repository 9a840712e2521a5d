//! Fixed settings of the sales report.

use crate::core::{PeriodRange, YearMonth, MONTHLY};
use crate::harness::evaluate::SelectionPolicy;
use crate::transform::LambdaSearch;
use crate::validation::DEFAULT_SIGNIFICANCE;

/// Settings for one report run.
///
/// The defaults describe the 2017-2022 online-shopping study: five years of
/// training data, 2022 held out, and a 2023 forecast.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub train: PeriodRange,
    pub test: PeriodRange,
    /// Months forecast after refitting on the full series.
    pub horizon: usize,
    pub season_length: usize,
    pub significance: f64,
    /// Nominal coverage of prediction intervals.
    pub interval_level: f64,
    pub lambda_search: LambdaSearch,
    pub selection: SelectionPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            train: PeriodRange::covering(YearMonth::january(2017), 5 * MONTHLY),
            test: PeriodRange::covering(YearMonth::january(2022), MONTHLY),
            horizon: MONTHLY,
            season_length: MONTHLY,
            significance: DEFAULT_SIGNIFICANCE,
            interval_level: 0.95,
            lambda_search: LambdaSearch::default(),
            selection: SelectionPolicy::default(),
        }
    }
}

impl ReportConfig {
    pub fn with_windows(mut self, train: PeriodRange, test: PeriodRange) -> Self {
        self.train = train;
        self.test = test;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_selection(mut self, policy: SelectionPolicy) -> Self {
        self.selection = policy;
        self
    }

    pub fn with_lambda_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lambda_search = self.lambda_search.with_bounds(lower, upper);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_study_windows() {
        let config = ReportConfig::default();
        assert_eq!(config.train.to_string(), "2017-01..2021-12");
        assert_eq!(config.test.to_string(), "2022-01..2022-12");
        assert_eq!(config.horizon, 12);
        assert_eq!(config.lambda_search.lower, -1.0);
        assert_eq!(config.lambda_search.upper, 2.0);
        assert_eq!(config.selection, SelectionPolicy::LowestTestRmse);
    }
}
