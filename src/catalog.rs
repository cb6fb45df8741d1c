//! The location catalog: which stations exist and what each one measures.

use crate::config::EndpointKind;
use crate::error::DdlError;
use crate::measurements::flatten::{insert_normalized, metadata_fields, FlatRow};
use crate::measurements::frame::columns_from_rows;
use crate::request::catalog_request;
use crate::transport::{ServiceResponse, Transport};
use log::{debug, warn};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Column holding the station code; the first column of the catalog frame.
pub const LOCATION_CODE_COLUMN: &str = "Code";

const LOCATION_ID: &str = "Locatie_MessageID";
// The link list and the metadata list spell this id differently.
const LINK_METADATA_ID: &str = "AquoMetaData_MessageID";
const METADATA_ID: &str = "AquoMetadata_MessageID";

/// Which metadata categories the catalog reply should include.
///
/// The default asks for units, quantities, qualifiers, groupings, parameters, compartments
/// and process types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogFilter {
    pub eenheden: bool,
    pub grootheden: bool,
    pub hoedanigheden: bool,
    pub groeperingen: bool,
    pub parameters: bool,
    pub compartimenten: bool,
    pub proces_types: bool,
    pub bemonsterings_soorten: bool,
    pub typeringen: bool,
    pub waarde_bepalingsmethoden: bool,
    pub meet_apparaten: bool,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            eenheden: true,
            grootheden: true,
            hoedanigheden: true,
            groeperingen: true,
            parameters: true,
            compartimenten: true,
            proces_types: true,
            bemonsterings_soorten: false,
            typeringen: false,
            waarde_bepalingsmethoden: false,
            meet_apparaten: false,
        }
    }
}

/// Fetches the catalog and joins it into one row per (station, metadata) combination.
///
/// Links are inner-joined to locations on `Locatie_MessageID` and then left-joined to the
/// metadata definitions on the metadata message id. Metadata code/description objects are
/// split into `<name>.Code` and `<name>.Omschrijving` columns.
pub(crate) fn retrieve_locations<T: Transport + ?Sized>(
    transport: &T,
    filter: &CatalogFilter,
) -> Result<DataFrame, DdlError> {
    let body = match transport.send(EndpointKind::Catalog, &catalog_request(filter))? {
        ServiceResponse::Data(body) => body,
        ServiceResponse::NoData => return Ok(DataFrame::empty()),
    };

    let rows = join_catalog(&body)?;
    debug!("Catalog lists {} station/metadata combinations", rows.len());
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }
    Ok(DataFrame::new(columns_from_rows(&rows, &[LOCATION_CODE_COLUMN]))?)
}

fn join_catalog(body: &Value) -> Result<Vec<FlatRow>, DdlError> {
    let locations = records(body, "LocatieLijst")?;
    let metadata = records(body, "AquoMetadataLijst")?;
    let links = records(body, "AquoMetadataLocatieLijst")?;

    let locations_by_id: HashMap<String, &Map<String, Value>> = locations
        .into_iter()
        .filter_map(|location| Some((id_of(location, LOCATION_ID)?, location)))
        .collect();

    let mut metadata_by_id: HashMap<String, FlatRow> = HashMap::new();
    for definition in metadata {
        if let Some(id) = id_of(definition, METADATA_ID) {
            metadata_by_id.insert(id, metadata_fields(definition)?);
        }
    }

    let mut rows = Vec::new();
    for link in links {
        let Some(location) = id_of(link, LOCATION_ID).and_then(|id| locations_by_id.get(&id))
        else {
            continue;
        };

        let mut row = FlatRow::new();
        for (key, value) in link.iter().chain(location.iter()) {
            insert_normalized(&mut row, key, value);
        }
        match id_of(link, LINK_METADATA_ID).and_then(|id| metadata_by_id.get(&id)) {
            Some(fields) => {
                for (key, value) in fields {
                    row.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            None => warn!(
                "Catalog link for station {} refers to unknown metadata",
                location
                    .get(LOCATION_CODE_COLUMN)
                    .map_or_else(String::new, Value::to_string)
            ),
        }
        rows.push(row);
    }
    Ok(rows)
}

fn records<'a>(body: &'a Value, list: &str) -> Result<Vec<&'a Map<String, Value>>, DdlError> {
    body.get(list)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .ok_or_else(|| DdlError::MalformedResponse(format!("catalog reply has no {list}")))
}

// Ids arrive as numbers, but compare them as text so "5" and 5 join.
fn id_of(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
