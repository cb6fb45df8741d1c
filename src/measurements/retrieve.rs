//! Slice-by-slice retrieval of observations, and the smaller lookups built on it.

use crate::config::{DdlConfig, EndpointKind};
use crate::error::DdlError;
use crate::measurements::flatten::{flatten_observations, FlatRow};
use crate::measurements::frame::{clean_measurements, measurement_frame};
use crate::request::{
    availability_request, count_request, latest_observations_request, observations_request,
    CountPeriod,
};
use crate::transport::{ServiceResponse, Transport};
use crate::types::granularity::Granularity;
use crate::types::location::Location;
use crate::types::period::Period;
use chrono::TimeDelta;
use log::debug;
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Sends one request per slice of `period`, in ascending order, and returns the bodies of the
/// slices that had data. "No data" slices are skipped; any hard failure aborts.
fn fetch_slices<T, F>(
    transport: &T,
    kind: EndpointKind,
    period: &Period,
    granularity: Granularity,
    build: F,
) -> Result<Vec<Value>, DdlError>
where
    T: Transport + ?Sized,
    F: Fn(&Period) -> Value,
{
    let slices = period.split(granularity);
    let total = slices.len();
    let mut bodies = Vec::with_capacity(total);

    for (index, slice) in slices.iter().enumerate() {
        debug!(
            "Requesting {} slice {}/{}: {} to {}",
            kind,
            index + 1,
            total,
            slice.start,
            slice.end
        );
        match transport.send(kind, &build(slice))? {
            ServiceResponse::Data(body) => bodies.push(body),
            ServiceResponse::NoData => {
                debug!(
                    "No {} for slice {}/{} ({} to {}), skipping",
                    kind,
                    index + 1,
                    total,
                    slice.start,
                    slice.end
                );
            }
        }
    }

    Ok(bodies)
}

/// Retrieves all observations of `location` in `period`, one request per slice.
///
/// Rows of all slices are concatenated in slice order. When every slice reports "no data" the
/// result is an empty frame.
pub(crate) fn retrieve_measurements<T: Transport + ?Sized>(
    transport: &T,
    config: &DdlConfig,
    location: &Location,
    period: &Period,
    granularity: Granularity,
    clean: bool,
) -> Result<DataFrame, DdlError> {
    let bodies = fetch_slices(
        transport,
        EndpointKind::Observations,
        period,
        granularity,
        |slice| observations_request(location, slice),
    )?;

    let mut rows: Vec<FlatRow> = Vec::new();
    for body in &bodies {
        rows.extend(flatten_observations(body, location, config.missing_value())?);
    }
    if rows.is_empty() {
        debug!("No observations for {} in {} to {}", location.code, period.start, period.end);
        return Ok(DataFrame::empty());
    }

    let frame = measurement_frame(&rows)?;
    if clean {
        clean_measurements(frame)
    } else {
        Ok(frame)
    }
}

/// The most recent observation of `location`, as a cleaned frame.
pub(crate) fn retrieve_latest<T: Transport + ?Sized>(
    transport: &T,
    config: &DdlConfig,
    location: &Location,
) -> Result<DataFrame, DdlError> {
    let body = match transport.send(
        EndpointKind::LatestObservations,
        &latest_observations_request(location),
    )? {
        ServiceResponse::Data(body) => body,
        ServiceResponse::NoData => return Ok(DataFrame::empty()),
    };

    let rows = flatten_observations(&body, location, config.missing_value())?;
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }
    clean_measurements(measurement_frame(&rows)?)
}

/// Whether the service holds any observation of `location` in `period`.
pub(crate) fn check_available<T: Transport + ?Sized>(
    transport: &T,
    location: &Location,
    period: &Period,
) -> Result<bool, DdlError> {
    let body = match transport.send(
        EndpointKind::ObservationsAvailable,
        &availability_request(location, period),
    )? {
        ServiceResponse::Data(body) => body,
        ServiceResponse::NoData => return Ok(false),
    };

    match body.get("WaarnemingenAanwezig") {
        Some(Value::Bool(present)) => Ok(*present),
        Some(Value::String(text)) if text.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(text)) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(DdlError::MalformedResponse(format!(
            "unexpected WaarnemingenAanwezig value: {}",
            other.map_or_else(|| "missing".to_string(), Value::to_string)
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(rename = "AantalWaarnemingenPerPeriodeLijst", default)]
    groups: Vec<CountGroup>,
}

#[derive(Debug, Deserialize)]
struct CountGroup {
    #[serde(rename = "AantalMetingenPerPeriodeLijst", default)]
    counts: Vec<PeriodCount>,
}

#[derive(Debug, Deserialize)]
struct PeriodCount {
    #[serde(rename = "Groeperingsperiode")]
    grouping: GroupingKey,
    #[serde(rename = "AantalMetingen")]
    count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
struct GroupingKey {
    #[serde(rename = "Jaarnummer")]
    year: i64,
    #[serde(rename = "Maandnummer", default)]
    month: Option<i64>,
    #[serde(rename = "Dag", default)]
    day: Option<i64>,
}

/// `slice` without its end instant, unless it is the final slice of `whole`.
fn half_open(slice: &Period, whole: &Period) -> Period {
    if slice.end < whole.end {
        Period {
            start: slice.start,
            end: slice.end - TimeDelta::milliseconds(1),
        }
    } else {
        *slice
    }
}

pub const COUNT_YEAR_COLUMN: &str = "Groeperingsperiode.Jaarnummer";
pub const COUNT_MONTH_COLUMN: &str = "Groeperingsperiode.Maandnummer";
pub const COUNT_DAY_COLUMN: &str = "Groeperingsperiode.Dag";
pub const COUNT_COLUMN: &str = "AantalMetingen";

/// Number of observations of `location` per year, month or day of `period`.
///
/// Counts of the same grouping period reported by several slices are summed, so the result
/// does not depend on the granularity used to split the range. Every slice but the last ends
/// one millisecond before the next begins, so an observation on a slice boundary is counted
/// once.
pub(crate) fn retrieve_counts<T: Transport + ?Sized>(
    transport: &T,
    location: &Location,
    period: &Period,
    grouping: CountPeriod,
    granularity: Granularity,
) -> Result<DataFrame, DdlError> {
    let bodies = fetch_slices(
        transport,
        EndpointKind::ObservationCount,
        period,
        granularity,
        |slice| count_request(location, &half_open(slice, period), grouping),
    )?;

    let mut totals: BTreeMap<GroupingKey, i64> = BTreeMap::new();
    for body in bodies {
        let response: CountResponse = serde_json::from_value(body).map_err(|e| {
            DdlError::MalformedResponse(format!("unexpected observation count reply: {e}"))
        })?;
        for count in response.groups.into_iter().flat_map(|group| group.counts) {
            *totals.entry(count.grouping).or_insert(0) += count.count;
        }
    }
    if totals.is_empty() {
        return Ok(DataFrame::empty());
    }

    let keys: Vec<&GroupingKey> = totals.keys().collect();
    let mut columns: Vec<Column> = vec![Series::new(
        COUNT_YEAR_COLUMN.into(),
        keys.iter().map(|key| key.year).collect::<Vec<i64>>(),
    )
    .into()];
    if keys.iter().any(|key| key.month.is_some()) {
        let months: Vec<Option<i64>> = keys.iter().map(|key| key.month).collect();
        columns.push(Series::new(COUNT_MONTH_COLUMN.into(), months).into());
    }
    if keys.iter().any(|key| key.day.is_some()) {
        let days: Vec<Option<i64>> = keys.iter().map(|key| key.day).collect();
        columns.push(Series::new(COUNT_DAY_COLUMN.into(), days).into());
    }
    columns.push(Series::new(COUNT_COLUMN.into(), totals.values().copied().collect::<Vec<i64>>()).into());

    Ok(DataFrame::new(columns)?)
}
