//! CSV loading for monthly observation files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::core::{TimeSeries, YearMonth};
use crate::error::{ForecastError, Result};

/// How to read a CSV of monthly observations.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Header of the value column; the last column when `None`.
    pub value_column: Option<String>,
    /// Header of the period column; the first column when `None` and
    /// the file has more than one column.
    pub date_column: Option<String>,
    /// First period for files with no date column.
    pub start: Option<YearMonth>,
    /// Label attached to the loaded series.
    pub label: Option<String>,
}

impl LoaderConfig {
    pub fn with_value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = Some(name.into());
        self
    }

    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = Some(name.into());
        self
    }

    pub fn with_start(mut self, start: YearMonth) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Load a monthly series from a CSV file with a header row.
pub fn load_csv(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Load(format!("{}: {}", path.display(), e)))?;
    let mut config = config.clone();
    if config.label.is_none() {
        config.label = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    load_reader(BufReader::new(file), &config)
}

/// Load a monthly series from any reader producing CSV with a header row.
pub fn load_reader<R: Read>(reader: R, config: &LoaderConfig) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| ForecastError::Load(format!("column '{}' not found", name)))
    };
    let value_idx = match &config.value_column {
        Some(name) => find(name)?,
        None => headers.len() - 1,
    };
    let date_idx = match &config.date_column {
        Some(name) => Some(find(name)?),
        None if headers.len() > 1 && value_idx != 0 => Some(0),
        None => None,
    };

    let mut start: Option<YearMonth> = None;
    let mut previous: Option<YearMonth> = None;
    let mut values = Vec::new();

    for (i, record) in reader.records().enumerate() {
        // Header is row 1.
        let row = i + 2;
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let raw = record.get(value_idx).unwrap_or("");
        values.push(parse_amount(raw, row)?);

        if let Some(idx) = date_idx {
            let text = record.get(idx).unwrap_or("");
            let period: YearMonth = text.parse().map_err(|_| ForecastError::Parse {
                row,
                message: format!("unrecognised period '{}'", text),
            })?;
            if let Some(prev) = previous {
                check_contiguous(prev, period, row)?;
            } else {
                start = Some(period);
            }
            previous = Some(period);
        }
    }

    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let start = match (start, config.start) {
        (Some(s), _) => s,
        (None, Some(s)) => s,
        (None, None) => {
            return Err(ForecastError::Load(
                "no period column and no start period configured".to_string(),
            ))
        }
    };

    let series = TimeSeries::new(start, values)?;
    tracing::debug!(start = %series.start(), end = %series.end(), len = series.len(), "series loaded");
    Ok(match &config.label {
        Some(label) => series.with_label(label.clone()),
        None => series,
    })
}

fn parse_amount(raw: &str, row: usize) -> Result<f64> {
    let cleaned: String = raw.chars().filter(|&c| c != ',' && c != '_').collect();
    let value: f64 = cleaned.trim().parse().map_err(|_| ForecastError::Parse {
        row,
        message: format!("'{}' is not a number", raw),
    })?;
    if !value.is_finite() {
        return Err(ForecastError::Parse {
            row,
            message: format!("'{}' is not finite", raw),
        });
    }
    Ok(value)
}

fn check_contiguous(prev: YearMonth, next: YearMonth, row: usize) -> Result<()> {
    match prev.months_until(next) {
        1 => Ok(()),
        0 => Err(ForecastError::Parse {
            row,
            message: format!("duplicate period {}", next),
        }),
        gap if gap > 1 => Err(ForecastError::Parse {
            row,
            message: format!("gap between {} and {}", prev, next),
        }),
        _ => Err(ForecastError::Parse {
            row,
            message: format!("{} is earlier than {}", next, prev),
        }),
    }
}
