//! Monthly time series indexed by calendar period.

use crate::core::period::{PeriodRange, YearMonth};
use crate::error::{ForecastError, Result};

/// Observations per year for monthly data.
pub const MONTHLY: usize = 12;

/// A contiguous, date-indexed series with one observation per period.
///
/// Construction guarantees the series is non-empty and every value is
/// finite. The series is immutable afterwards; windows are new series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    start: YearMonth,
    frequency: usize,
    values: Vec<f64>,
    label: Option<String>,
}

/// Sum of the observations falling in one calendar year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualTotal {
    pub year: i32,
    pub total: f64,
    /// Number of months observed in that year.
    pub months: usize,
}

impl AnnualTotal {
    /// Whether all twelve months contributed.
    pub fn is_complete(&self) -> bool {
        self.months == MONTHLY
    }
}

impl TimeSeries {
    /// Create a monthly series starting at `start`.
    pub fn new(start: YearMonth, values: Vec<f64>) -> Result<Self> {
        Self::with_frequency(start, MONTHLY, values)
    }

    /// Create a series with an explicit seasonal frequency.
    pub fn with_frequency(start: YearMonth, frequency: usize, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if frequency == 0 {
            return Err(ForecastError::InvalidParameter(
                "frequency must be positive".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "non-finite value at {}",
                start.offset(pos as i64)
            )));
        }
        Ok(Self {
            start,
            frequency,
            values,
            label: None,
        })
    }

    /// Attach a descriptive label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn start(&self) -> YearMonth {
        self.start
    }

    /// Last observed period.
    pub fn end(&self) -> YearMonth {
        self.start.offset(self.values.len() as i64 - 1)
    }

    /// Full span of the series.
    pub fn span(&self) -> PeriodRange {
        PeriodRange::covering(self.start, self.values.len())
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Period of the observation at `index`.
    pub fn period_at(&self, index: usize) -> YearMonth {
        self.start.offset(index as i64)
    }

    /// Position of `period` in the series, if observed.
    pub fn index_of(&self, period: YearMonth) -> Option<usize> {
        let offset = self.start.months_until(period);
        (offset >= 0 && (offset as usize) < self.values.len()).then_some(offset as usize)
    }

    /// Value observed at `period`.
    pub fn get(&self, period: YearMonth) -> Option<f64> {
        self.index_of(period).map(|i| self.values[i])
    }

    /// Iterate (period, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.period_at(i), v))
    }

    /// Sub-series by index range `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start >= end || end > self.values.len() {
            return Err(ForecastError::Range(format!(
                "slice [{}, {}) invalid for series of length {}",
                start,
                end,
                self.values.len()
            )));
        }
        Ok(Self {
            start: self.period_at(start),
            frequency: self.frequency,
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Sub-series covering exactly `range`.
    pub fn window(&self, range: &PeriodRange) -> Result<TimeSeries> {
        let span = self.span();
        if !span.contains(range.start()) || !span.contains(range.end()) {
            return Err(ForecastError::Range(format!(
                "window {} is outside series span {}",
                range, span
            )));
        }
        let start = self.start.months_until(range.start()) as usize;
        self.slice(start, start + range.len())
    }

    /// Concatenate a series that begins the month after this one ends.
    pub fn append(&self, next: &TimeSeries) -> Result<TimeSeries> {
        if next.start != self.end().succ() {
            return Err(ForecastError::Range(format!(
                "cannot append series starting {} to series ending {}",
                next.start,
                self.end()
            )));
        }
        if next.frequency != self.frequency {
            return Err(ForecastError::InvalidParameter(format!(
                "frequency mismatch: {} vs {}",
                self.frequency, next.frequency
            )));
        }
        let mut values = self.values.clone();
        values.extend_from_slice(&next.values);
        Ok(Self {
            start: self.start,
            frequency: self.frequency,
            values,
            label: self.label.clone(),
        })
    }

    /// Same periods, new values (e.g. after a transform).
    pub fn with_values(&self, values: Vec<f64>) -> Result<TimeSeries> {
        if values.len() != self.values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.values.len(),
                got: values.len(),
            });
        }
        let mut series = Self::with_frequency(self.start, self.frequency, values)?;
        series.label = self.label.clone();
        Ok(series)
    }

    /// True when every observation is strictly positive.
    pub fn is_strictly_positive(&self) -> bool {
        self.values.iter().all(|&v| v > 0.0)
    }

    /// Totals per calendar year, in chronological order.
    pub fn annual_totals(&self) -> Vec<AnnualTotal> {
        let mut totals: Vec<AnnualTotal> = Vec::new();
        for (period, value) in self.iter() {
            match totals.last_mut() {
                Some(last) if last.year == period.year() => {
                    last.total += value;
                    last.months += 1;
                }
                _ => totals.push(AnnualTotal {
                    year: period.year(),
                    total: value,
                    months: 1,
                }),
            }
        }
        totals
    }

    /// Total for a fully observed calendar year.
    pub fn year_total(&self, year: i32) -> Option<f64> {
        self.annual_totals()
            .into_iter()
            .find(|t| t.year == year && t.is_complete())
            .map(|t| t.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn ramp(n: usize) -> TimeSeries {
        TimeSeries::new(ym(2017, 1), (1..=n).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(matches!(
            TimeSeries::new(ym(2017, 1), vec![]),
            Err(ForecastError::EmptyData)
        ));
        assert!(matches!(
            TimeSeries::new(ym(2017, 1), vec![1.0, f64::NAN]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn end_and_index_lookup() {
        let ts = ramp(72);
        assert_eq!(ts.end(), ym(2022, 12));
        assert_eq!(ts.index_of(ym(2018, 1)), Some(12));
        assert_eq!(ts.index_of(ym(2016, 12)), None);
        assert_eq!(ts.index_of(ym(2023, 1)), None);
        assert_eq!(ts.get(ym(2017, 3)), Some(3.0));
    }

    #[test]
    fn window_selects_requested_periods() {
        let ts = ramp(72);
        let range = PeriodRange::parse("2022-01", "2022-12").unwrap();
        let w = ts.window(&range).unwrap();
        assert_eq!(w.start(), ym(2022, 1));
        assert_eq!(w.len(), 12);
        assert_eq!(w.values()[0], 61.0);
    }

    #[test]
    fn window_outside_span_is_range_error() {
        let ts = ramp(24);
        let range = PeriodRange::parse("2018-06", "2019-03").unwrap();
        assert!(matches!(ts.window(&range), Err(ForecastError::Range(_))));
    }

    #[test]
    fn append_requires_adjacency() {
        let ts = ramp(24);
        let head = ts.slice(0, 12).unwrap();
        let tail = ts.slice(12, 24).unwrap();
        assert_eq!(head.append(&tail).unwrap(), ts);
        assert!(tail.append(&head).is_err());
    }

    #[test]
    fn annual_totals_flag_partial_years() {
        let ts = TimeSeries::new(ym(2017, 7), vec![1.0; 18]).unwrap();
        let totals = ts.annual_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].months, 6);
        assert!(totals[1].is_complete());
        assert_relative_eq!(totals[1].total, 12.0);
        assert_eq!(ts.year_total(2017), None);
        assert_eq!(ts.year_total(2018), Some(12.0));
    }
}
