//! Wire-format request bodies for each endpoint kind.
//!
//! Bodies are built from a normalized [`Location`], so every required location field has
//! already been checked by [`crate::IntoLocation`] and building itself cannot fail.

use crate::catalog::CatalogFilter;
use crate::types::location::Location;
use crate::types::period::Period;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::fmt;

/// Bucket size for [`crate::Ddl::measurement_counts`] (`Groeperingsperiode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CountPeriod {
    #[default]
    Year,
    Month,
    Day,
}

impl CountPeriod {
    pub(crate) fn wire_name(&self) -> &'static str {
        match self {
            CountPeriod::Year => "Jaar",
            CountPeriod::Month => "Maand",
            CountPeriod::Day => "Dag",
        }
    }
}

impl fmt::Display for CountPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Serializes an instant the way the service expects: UTC, millisecond precision.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// `{"Grootheid": {"Code": "WATHTE"}, "Eenheid": {"Code": "cm"}, ...}`
fn aquo_metadata(location: &Location) -> Value {
    let mut metadata = Map::new();
    for (field, code) in location.classification_codes() {
        metadata.insert(field.to_string(), json!({ "Code": code }));
    }
    Value::Object(metadata)
}

fn locatie(location: &Location) -> Value {
    json!({
        "X": location.x,
        "Y": location.y,
        "Code": location.code,
    })
}

fn periode(period: &Period) -> Value {
    json!({
        "Begindatumtijd": format_instant(&period.start),
        "Einddatumtijd": format_instant(&period.end),
    })
}

/// Body for [`crate::EndpointKind::Catalog`].
pub fn catalog_request(filter: &CatalogFilter) -> Value {
    json!({ "CatalogusFilter": filter })
}

/// Body for [`crate::EndpointKind::Observations`].
pub fn observations_request(location: &Location, period: &Period) -> Value {
    json!({
        "AquoPlusWaarnemingMetadata": { "AquoMetadata": aquo_metadata(location) },
        "Locatie": locatie(location),
        "Periode": periode(period),
    })
}

/// Body for [`crate::EndpointKind::LatestObservations`].
pub fn latest_observations_request(location: &Location) -> Value {
    json!({
        "AquoPlusWaarnemingMetadataLijst": [{ "AquoMetadata": aquo_metadata(location) }],
        "LocatieLijst": [locatie(location)],
    })
}

/// Body for [`crate::EndpointKind::ObservationsAvailable`].
pub fn availability_request(location: &Location, period: &Period) -> Value {
    json!({
        "AquoMetadataLijst": [aquo_metadata(location)],
        "LocatieLijst": [locatie(location)],
        "Periode": periode(period),
    })
}

/// Body for [`crate::EndpointKind::ObservationCount`].
pub fn count_request(location: &Location, period: &Period, grouping: CountPeriod) -> Value {
    json!({
        "AquoMetadataLijst": [aquo_metadata(location)],
        "Groeperingsperiode": grouping.wire_name(),
        "LocatieLijst": [locatie(location)],
        "Periode": periode(period),
    })
}
