//! Field extraction utilities for snapshot tables
//!
//! Snapshot files arrive as CSV or parquet, so the same logical field can be
//! backed by different physical dtypes (identifiers as strings or integers,
//! timestamps as strings, dates or datetime columns). These helpers extract
//! typed values per row with proper error context and normalize the
//! differences away.

use crate::constants;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;

// =============================================================================
// Column access
// =============================================================================

/// Get a column as a Series, failing with validation context if absent
pub(crate) fn column(df: &DataFrame, name: &str) -> Result<Series> {
    let col = df
        .column(name)
        .map_err(|_| Error::data_validation(format!("Required column '{}' not found", name)))?;
    Ok(col.as_materialized_series().clone())
}

/// Get an optional column as a Series
pub(crate) fn optional_column(df: &DataFrame, name: &str) -> Option<Series> {
    df.column(name)
        .ok()
        .map(|col| col.as_materialized_series().clone())
}

/// Get a temporal column, normalizing Date columns to millisecond datetimes
/// so that per-row access only has to deal with strings and datetimes
pub(crate) fn temporal_column(df: &DataFrame, name: &str) -> Result<Series> {
    normalize_temporal(column(df, name)?, name)
}

/// Get an optional temporal column with the same normalization
pub(crate) fn optional_temporal_column(df: &DataFrame, name: &str) -> Result<Option<Series>> {
    match optional_column(df, name) {
        Some(series) => Ok(Some(normalize_temporal(series, name)?)),
        None => Ok(None),
    }
}

fn normalize_temporal(series: Series, name: &str) -> Result<Series> {
    match series.dtype() {
        DataType::Date => series
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| {
                Error::columnar(format!("Failed to widen date column '{}'", name), e)
            }),
        _ => Ok(series),
    }
}

// =============================================================================
// Cell access
// =============================================================================

/// Extract a string value from a row, accepting integer-typed identifier
/// columns. Empty and whitespace-only values are reported as absent.
pub(crate) fn string_at(series: &Series, idx: usize) -> Result<Option<String>> {
    let value = match series.dtype() {
        DataType::String => series.str()?.get(idx).map(|v| v.trim().to_string()),
        DataType::Int64 => series.i64()?.get(idx).map(|v| v.to_string()),
        DataType::Int32 => series.i32()?.get(idx).map(|v| v.to_string()),
        // A column whose values are all missing carries no dtype to parse
        DataType::Null => None,
        other => {
            return Err(Error::data_validation(format!(
                "Column '{}' has unsupported dtype {} for a text field",
                series.name(),
                other
            )));
        }
    };

    Ok(value.filter(|v| !v.is_empty()))
}

/// Extract a required non-empty string value from a row
pub(crate) fn required_string_at(series: &Series, idx: usize, field: &str) -> Result<String> {
    string_at(series, idx)?.ok_or_else(|| {
        Error::data_validation(format!("Empty value for required column '{}'", field))
    })
}

/// Extract a numeric value from a row, accepting any numeric dtype and
/// numeric strings
pub(crate) fn f64_at(series: &Series, idx: usize, field: &str) -> Result<Option<f64>> {
    match series.dtype() {
        DataType::Float64 => Ok(series.f64()?.get(idx)),
        DataType::Float32 => Ok(series.f32()?.get(idx).map(f64::from)),
        DataType::Int64 => Ok(series.i64()?.get(idx).map(|v| v as f64)),
        DataType::Int32 => Ok(series.i32()?.get(idx).map(f64::from)),
        DataType::Null => Ok(None),
        DataType::String => series
            .str()?
            .get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<f64>().map_err(|e| {
                    Error::data_validation(format!(
                        "Invalid number format for {}: '{}' ({})",
                        field, v, e
                    ))
                })
            })
            .transpose(),
        other => Err(Error::data_validation(format!(
            "Column '{}' has unsupported dtype {} for a numeric field",
            series.name(),
            other
        ))),
    }
}

/// Extract a required numeric value from a row
pub(crate) fn required_f64_at(series: &Series, idx: usize, field: &str) -> Result<f64> {
    f64_at(series, idx, field)?.ok_or_else(|| {
        Error::data_validation(format!("Empty value for required column '{}'", field))
    })
}

/// Extract a timestamp from a row.
///
/// Datetime columns are converted from their physical time unit; string
/// columns are parsed per [`parse_timestamp`].
pub(crate) fn datetime_at(
    series: &Series,
    idx: usize,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match series.dtype() {
        DataType::Datetime(time_unit, _) => {
            let time_unit = *time_unit;
            series
                .datetime()?
                .get(idx)
                .map(|raw| from_time_units(raw, time_unit, field))
                .transpose()
        }
        DataType::String => series
            .str()?
            .get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| parse_timestamp(v, field))
            .transpose(),
        DataType::Null => Ok(None),
        other => Err(Error::data_validation(format!(
            "Column '{}' has unsupported dtype {} for a timestamp field",
            series.name(),
            other
        ))),
    }
}

/// Extract a required timestamp from a row
pub(crate) fn required_datetime_at(
    series: &Series,
    idx: usize,
    field: &str,
) -> Result<DateTime<Utc>> {
    datetime_at(series, idx, field)?.ok_or_else(|| {
        Error::data_validation(format!("Empty value for required column '{}'", field))
    })
}

fn from_time_units(raw: i64, time_unit: TimeUnit, field: &str) -> Result<DateTime<Utc>> {
    let ts = match time_unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(raw),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(raw),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(raw)),
    };

    ts.ok_or_else(|| {
        Error::data_validation(format!(
            "Timestamp {} in column '{}' is out of the representable range",
            raw, field
        ))
    })
}

/// Parse a timestamp string in the accepted formats: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` (treated as UTC) or a bare `YYYY-MM-DD` date
/// (midnight UTC).
pub(crate) fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, constants::DATETIME_FORMAT) {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, constants::DATE_FORMAT) {
        let naive = date.and_time(chrono::NaiveTime::MIN);
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    Err(Error::data_validation(format!(
        "Invalid timestamp format for {}: '{}' (expected RFC 3339, '{}' or '{}')",
        field,
        value,
        constants::DATETIME_FORMAT,
        constants::DATE_FORMAT
    )))
}
