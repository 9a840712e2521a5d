//! Train/test window splitting.

use crate::core::{PeriodRange, TimeSeries, YearMonth};
use crate::error::{ForecastError, Result};

/// Cut `series` into adjacent training and evaluation windows.
///
/// Both ranges must lie inside the series span, must not overlap, and the
/// test window must start the month after training ends.
pub fn split(
    series: &TimeSeries,
    train: &PeriodRange,
    test: &PeriodRange,
) -> Result<(TimeSeries, TimeSeries)> {
    if train.overlaps(test) {
        return Err(ForecastError::Range(format!(
            "train {} overlaps test {}",
            train, test
        )));
    }
    if train.end().succ() != test.start() {
        return Err(ForecastError::Range(format!(
            "test {} must start the month after train {} ends",
            test, train
        )));
    }
    let train_series = series.window(train)?;
    let test_series = series.window(test)?;
    tracing::debug!(train = %train, test = %test, "series split");
    Ok((train_series, test_series))
}

/// [`split`] from raw period bounds; inverted bounds are a range error.
pub fn split_periods(
    series: &TimeSeries,
    train: (YearMonth, YearMonth),
    test: (YearMonth, YearMonth),
) -> Result<(TimeSeries, TimeSeries)> {
    let train = PeriodRange::new(train.0, train.1)?;
    let test = PeriodRange::new(test.0, test.1)?;
    split(series, &train, &test)
}

/// Hold out the last `horizon` observations.
pub fn split_at_horizon(series: &TimeSeries, horizon: usize) -> Result<(TimeSeries, TimeSeries)> {
    let n = series.len();
    if horizon == 0 || horizon >= n {
        return Err(ForecastError::Range(format!(
            "holdout of {} months leaves no training data in a series of {}",
            horizon, n
        )));
    }
    Ok((series.slice(0, n - horizon)?, series.slice(n - horizon, n)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn series() -> TimeSeries {
        TimeSeries::new(ym(2017, 1), (0..72).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn windows_cover_requested_spans() {
        let train = PeriodRange::new(ym(2017, 1), ym(2021, 12)).unwrap();
        let test = PeriodRange::new(ym(2022, 1), ym(2022, 12)).unwrap();
        let (a, b) = split(&series(), &train, &test).unwrap();
        assert_eq!(a.span(), train);
        assert_eq!(b.span(), test);
        assert_eq!(a.values()[59], 59.0);
        assert_eq!(b.values()[0], 60.0);
    }

    #[test]
    fn test_outside_series_is_range_error() {
        let train = PeriodRange::new(ym(2018, 1), ym(2022, 12)).unwrap();
        let test = PeriodRange::new(ym(2023, 1), ym(2023, 12)).unwrap();
        assert!(matches!(
            split(&series(), &train, &test),
            Err(ForecastError::Range(_))
        ));
    }

    #[test]
    fn overlap_gap_and_inversion_are_range_errors() {
        let s = series();
        let overlap = split_periods(&s, (ym(2017, 1), ym(2021, 12)), (ym(2021, 6), ym(2022, 6)));
        let gap = split_periods(&s, (ym(2017, 1), ym(2020, 12)), (ym(2022, 1), ym(2022, 12)));
        let inverted = split_periods(&s, (ym(2021, 12), ym(2017, 1)), (ym(2022, 1), ym(2022, 12)));
        for result in [overlap, gap, inverted] {
            assert!(matches!(result, Err(ForecastError::Range(_))));
        }
    }

    #[test]
    fn horizon_split() {
        let (train, test) = split_at_horizon(&series(), 12).unwrap();
        assert_eq!(train.len(), 60);
        assert_eq!(test.start(), ym(2022, 1));
        assert!(split_at_horizon(&series(), 72).is_err());
        assert!(split_at_horizon(&series(), 0).is_err());
    }
}
