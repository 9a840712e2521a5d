//! Calendar-month periods and inclusive period ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{ForecastError, Result};

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a period, validating the month number (1-12).
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidParameter(format!(
                "month must be in 1..=12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// January of `year`.
    pub fn january(year: i32) -> Self {
        Self { year, month: 1 }
    }

    /// The month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    /// Shift by a signed number of months.
    pub fn offset(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        self.offset(1)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: YearMonth) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ForecastError;

    /// Accepts `YYYY-MM`, `YYYY-MM-DD`, `YYYY.MM`, `YYYY/MM` and `YYYYMM`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }

        let invalid = || ForecastError::InvalidParameter(format!("unrecognised period '{}'", s));

        let (year, month) = if let Some(pos) = s.find(['-', '.', '/']) {
            (&s[..pos], s[pos + 1..].trim().trim_end_matches('.'))
        } else if s.len() == 6 && s.chars().all(|c| c.is_ascii_digit()) {
            (&s[..4], &s[4..])
        } else {
            return Err(invalid());
        };

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// An inclusive range of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    start: YearMonth,
    end: YearMonth,
}

impl PeriodRange {
    /// Create a range; `start` must not come after `end`.
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self> {
        if start > end {
            return Err(ForecastError::Range(format!(
                "range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering `len` months from `start`.
    pub fn starting_at(start: YearMonth, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(ForecastError::Range("range must cover at least one month".into()));
        }
        Self::new(start, start.offset(len as i64 - 1))
    }

    /// Range of `len.max(1)` months from `start`; never fails.
    pub(crate) fn covering(start: YearMonth, len: usize) -> Self {
        Self {
            start,
            end: start.offset(len.max(1) as i64 - 1),
        }
    }

    /// Parse two period strings into a range.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(start.parse()?, end.parse()?)
    }

    pub fn start(&self) -> YearMonth {
        self.start
    }

    pub fn end(&self) -> YearMonth {
        self.end
    }

    /// Number of months covered.
    pub fn len(&self) -> usize {
        (self.start.months_until(self.end) + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, period: YearMonth) -> bool {
        self.start <= period && period <= self.end
    }

    pub fn overlaps(&self, other: &PeriodRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Iterate the months of the range in order.
    pub fn iter(&self) -> impl Iterator<Item = YearMonth> + '_ {
        (0..self.len()).map(move |i| self.start.offset(i as i64))
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
