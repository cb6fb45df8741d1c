//! Turning flattened rows into a DataFrame, and the cleaning step.

use crate::error::DdlError;
use crate::measurements::flatten::FlatRow;
use chrono::{DateTime, Utc};
use log::warn;
use polars::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;

/// Raw timestamp text as delivered by the service.
pub const SOURCE_TIME_COLUMN: &str = "Tijdstip";
/// Parsed timestamp (milliseconds, UTC) used as the row key.
pub const TIME_COLUMN: &str = "t";
/// Time zone of [`TIME_COLUMN`].
pub const TIME_ZONE: &str = "UTC";

/// Builds one column per distinct key, with `leading` columns first and the rest sorted.
///
/// Column types are inferred from the non-null values: all integers give `Int64`, all numbers
/// `Float64`, all booleans `Boolean`; anything else is a `String` column with non-string
/// values in their JSON text form.
pub(crate) fn columns_from_rows(rows: &[FlatRow], leading: &[&str]) -> Vec<Column> {
    let keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let ordered = leading
        .iter()
        .copied()
        .filter(|name| keys.contains(name))
        .chain(keys.iter().copied().filter(|name| !leading.contains(name)));

    ordered
        .map(|name| {
            let values: Vec<Option<&Value>> = rows
                .iter()
                .map(|row| row.get(name).filter(|value| !value.is_null()))
                .collect();
            json_column(name, &values)
        })
        .collect()
}

fn json_column(name: &str, values: &[Option<&Value>]) -> Column {
    let present = || values.iter().flatten();
    let series = if present().all(|v| v.is_i64()) && present().next().is_some() {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        Series::new(name.into(), data)
    } else if present().all(|v| v.is_number()) && present().next().is_some() {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        Series::new(name.into(), data)
    } else if present().all(|v| v.is_boolean()) && present().next().is_some() {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        Series::new(name.into(), data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| {
                v.map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        Series::new(name.into(), data)
    };
    series.into()
}

/// Epoch milliseconds of each row's `Tijdstip`, and how many present timestamps failed to parse.
fn parse_timestamps(rows: &[FlatRow]) -> (Vec<Option<i64>>, usize) {
    let mut unparseable = 0;
    let millis = rows
        .iter()
        .map(|row| {
            let text = row.get(SOURCE_TIME_COLUMN)?.as_str();
            let parsed = text
                .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
                .map(|dt| dt.with_timezone(&Utc).timestamp_millis());
            if parsed.is_none() {
                unparseable += 1;
            }
            parsed
        })
        .collect();
    (millis, unparseable)
}

/// Parses `Tijdstip` into the time key column `t`, a UTC-aware millisecond datetime.
///
/// Unparseable timestamps become null and are reported with a warning.
fn time_column(rows: &[FlatRow]) -> Column {
    let (millis, unparseable) = parse_timestamps(rows);
    if unparseable > 0 {
        warn!(
            "{} of {} values of {} could not be parsed, {} is null for those rows",
            unparseable,
            rows.len(),
            SOURCE_TIME_COLUMN,
            TIME_COLUMN
        );
    }
    Int64Chunked::from_iter_options(TIME_COLUMN.into(), millis.into_iter())
        .into_datetime(TimeUnit::Milliseconds, Some(TIME_ZONE.into()))
        .into_series()
        .into()
}

/// Builds the measurement table from flattened rows, with the parsed time key `t` as the
/// first column.
///
/// When no row carries a `Tijdstip` field a warning is logged and the table is returned
/// without a time key.
pub fn measurement_frame(rows: &[FlatRow]) -> Result<DataFrame, DdlError> {
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut columns = Vec::new();
    if rows.iter().any(|row| row.contains_key(SOURCE_TIME_COLUMN)) {
        columns.push(time_column(rows));
    } else {
        warn!(
            "Cannot add time variable {} because variable {} is not found",
            TIME_COLUMN, SOURCE_TIME_COLUMN
        );
    }
    columns.extend(columns_from_rows(rows, &[SOURCE_TIME_COLUMN]));

    Ok(DataFrame::new(columns)?)
}

/// Drops the raw `Tijdstip` column, removes exact duplicate rows and sorts by `t`.
///
/// Duplicates are rows equal in every remaining column, so slices that overlap at their
/// boundaries collapse to one row. The result is independent of input row order and
/// cleaning is idempotent.
pub fn clean_measurements(frame: DataFrame) -> Result<DataFrame, DdlError> {
    let frame = if frame.get_column_index(SOURCE_TIME_COLUMN).is_some() {
        frame.drop(SOURCE_TIME_COLUMN)?
    } else {
        frame
    };
    if frame.width() == 0 {
        return Ok(frame);
    }

    let sort_by: Vec<PlSmallStr> = frame
        .get_column_names()
        .into_iter()
        .cloned()
        .collect();
    let mut sort_keys: Vec<PlSmallStr> = Vec::with_capacity(sort_by.len());
    if frame.get_column_index(TIME_COLUMN).is_some() {
        sort_keys.push(TIME_COLUMN.into());
    }
    // Remaining columns break ties so equal timestamps come out in a fixed order.
    sort_keys.extend(sort_by.into_iter().filter(|name| name.as_str() != TIME_COLUMN));

    let cleaned = frame
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .sort(
            sort_keys,
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;
    Ok(cleaned)
}
