//! Flattens nested observation responses into uniform rows.

use crate::error::DdlError;
use crate::types::location::{Location, CODE_SUFFIX, DESCRIPTION_SUFFIX};
use serde_json::{Map, Number, Value};

/// One observation merged with its group metadata and station fields, keyed by column name.
pub type FlatRow = Map<String, Value>;

const OBSERVATION_METADATA: &str = "WaarnemingMetadata";
pub const NUMERIC_VALUE_COLUMN: &str = "Meetwaarde.Waarde_Numeriek";

/// Flattens one successful observation-style response (`WaarnemingenLijst`).
///
/// For every metadata group and every observation in it:
/// 1. `WaarnemingMetadata.*` fields are copied with singleton lists unwrapped;
/// 2. all other observation fields are copied, nested objects as dotted keys
///    (`Meetwaarde.Waarde_Numeriek`);
/// 3. group metadata code/description objects become `<name>.Code` and
///    `<name>.Omschrijving`, other metadata fields are copied;
/// 4. the station fields of `location` are broadcast onto the row.
///
/// Numeric values equal to `missing_value` become null.
///
/// # Errors
///
/// [`DdlError::MalformedResponse`] when the group or observation lists are missing, and
/// [`DdlError::UnpairedCode`] for a metadata object carrying only a code or only a description.
pub fn flatten_observations(
    response: &Value,
    location: &Location,
    missing_value: f64,
) -> Result<Vec<FlatRow>, DdlError> {
    let groups = response
        .get("WaarnemingenLijst")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("response has no WaarnemingenLijst"))?;

    let station = station_fields(location);
    let mut rows = Vec::new();

    for group in groups {
        let metadata = match group.get("AquoMetadata") {
            Some(Value::Object(metadata)) => metadata_fields(metadata)?,
            _ => FlatRow::new(),
        };
        let entries = group
            .get("MetingenLijst")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("observation group has no MetingenLijst"))?;

        for entry in entries {
            let Value::Object(entry) = entry else {
                return Err(malformed("observation is not an object"));
            };

            let mut row = FlatRow::new();
            if let Some(Value::Object(observation_metadata)) = entry.get(OBSERVATION_METADATA) {
                for (key, value) in observation_metadata {
                    row.insert(
                        format!("{OBSERVATION_METADATA}.{key}"),
                        unwrap_singleton(value),
                    );
                }
            }
            for (key, value) in entry {
                if key != OBSERVATION_METADATA {
                    insert_normalized(&mut row, key, value);
                }
            }
            row.extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
            row.extend(station.iter().map(|(k, v)| (k.clone(), v.clone())));

            null_sentinel(&mut row, missing_value);
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Promotes `{"Code": .., "Omschrijving": ..}` objects to two top-level fields.
pub(crate) fn metadata_fields(metadata: &Map<String, Value>) -> Result<FlatRow, DdlError> {
    let mut fields = FlatRow::new();
    for (name, value) in metadata {
        match value {
            Value::Object(inner) if inner.contains_key("Code") || inner.contains_key("Omschrijving") => {
                let code = inner.get("Code").ok_or_else(|| DdlError::UnpairedCode {
                    field: name.clone(),
                    missing: CODE_SUFFIX,
                })?;
                let description = inner.get("Omschrijving").ok_or_else(|| DdlError::UnpairedCode {
                    field: name.clone(),
                    missing: DESCRIPTION_SUFFIX,
                })?;
                fields.insert(format!("{name}{CODE_SUFFIX}"), code.clone());
                fields.insert(format!("{name}{DESCRIPTION_SUFFIX}"), description.clone());
            }
            _ => insert_normalized(&mut fields, name, value),
        }
    }
    Ok(fields)
}

/// Inserts `value` under `key`, expanding nested objects into dotted keys.
pub(crate) fn insert_normalized(row: &mut FlatRow, key: &str, value: &Value) {
    match value {
        Value::Object(inner) if !inner.is_empty() => {
            for (inner_key, inner_value) in inner {
                insert_normalized(row, &format!("{key}.{inner_key}"), inner_value);
            }
        }
        _ => {
            row.insert(key.to_string(), value.clone());
        }
    }
}

fn unwrap_singleton(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.len() == 1 => items[0].clone(),
        _ => value.clone(),
    }
}

fn station_fields(location: &Location) -> FlatRow {
    let mut fields = FlatRow::new();
    fields.insert("Code".to_string(), Value::String(location.code.clone()));
    fields.insert("X".to_string(), number(location.x));
    fields.insert("Y".to_string(), number(location.y));
    if let Some(name) = &location.name {
        fields.insert("Naam".to_string(), Value::String(name.clone()));
    }
    if let Some(crs) = &location.coordinate_system {
        fields.insert("Coordinatenstelsel".to_string(), Value::String(crs.clone()));
    }
    if let Some(lon) = location.longitude {
        fields.insert("Lon".to_string(), number(lon));
    }
    if let Some(lat) = location.latitude {
        fields.insert("Lat".to_string(), number(lat));
    }
    fields
}

fn null_sentinel(row: &mut FlatRow, missing_value: f64) {
    if let Some(value) = row.get_mut(NUMERIC_VALUE_COLUMN) {
        if value.as_f64() == Some(missing_value) {
            *value = Value::Null;
        }
    }
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn malformed(message: &str) -> DdlError {
    DdlError::MalformedResponse(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{denhelder_location, observation, observations_response};
    use serde_json::json;

    #[test]
    fn test_flattens_one_group() -> Result<(), DdlError> {
        let response = observations_response(vec![
            observation("1953-01-01T00:00:00.000+01:00", -23.0),
            observation("1953-01-01T01:00:00.000+01:00", -11.0),
        ]);
        let rows = flatten_observations(&response, &denhelder_location(), 999999999.0)?;
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row["Tijdstip"], "1953-01-01T00:00:00.000+01:00");
        assert_eq!(row["Meetwaarde.Waarde_Numeriek"], -23.0);
        assert_eq!(row["WaarnemingMetadata.StatuswaardeLijst"], "Gecontroleerd");
        assert_eq!(row["WaarnemingMetadata.KwaliteitswaardecodeLijst"], "00");
        assert_eq!(row["Grootheid.Code"], "WATHTE");
        assert_eq!(row["Grootheid.Omschrijving"], "Waterhoogte");
        assert_eq!(row["Parameter_Wat_Omschrijving"], "Waterhoogte Oppervlaktewater t.o.v. NAP in cm");
        assert_eq!(row["Code"], "DENHDR");
        assert_eq!(row["Naam"], "Den Helder");
        assert_eq!(row["Coordinatenstelsel"], "25831");
        assert!(!row.contains_key("WaarnemingMetadata"));
        assert!(!row.contains_key("Grootheid"));

        // Rows of one request differ only in observation fields.
        let mut first = rows[0].clone();
        let mut second = rows[1].clone();
        for row in [&mut first, &mut second] {
            row.remove("Tijdstip");
            row.remove("Meetwaarde.Waarde_Numeriek");
        }
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_multi_value_metadata_lists_are_kept() -> Result<(), DdlError> {
        let mut entry = observation("1953-01-01T00:00:00.000+01:00", 1.0);
        entry["WaarnemingMetadata"]["StatuswaardeLijst"] = json!(["Gecontroleerd", "Ongecontroleerd"]);
        let rows = flatten_observations(
            &observations_response(vec![entry]),
            &denhelder_location(),
            999999999.0,
        )?;
        assert_eq!(
            rows[0]["WaarnemingMetadata.StatuswaardeLijst"],
            json!(["Gecontroleerd", "Ongecontroleerd"])
        );
        Ok(())
    }

    #[test]
    fn test_sentinel_becomes_null() -> Result<(), DdlError> {
        let response = observations_response(vec![
            observation("1953-01-01T00:00:00.000+01:00", 999999999.0),
            observation("1953-01-01T01:00:00.000+01:00", 999999998.0),
            observation("1953-01-01T02:00:00.000+01:00", 0.1),
        ]);
        let rows = flatten_observations(&response, &denhelder_location(), 999999999.0)?;
        assert_eq!(rows[0]["Meetwaarde.Waarde_Numeriek"], Value::Null);
        assert_eq!(rows[1]["Meetwaarde.Waarde_Numeriek"], 999999998.0);
        assert_eq!(rows[2]["Meetwaarde.Waarde_Numeriek"], 0.1);
        // The rest of the row survives.
        assert_eq!(rows[0]["Tijdstip"], "1953-01-01T00:00:00.000+01:00");
        Ok(())
    }

    #[test]
    fn test_integer_sentinel_becomes_null() -> Result<(), DdlError> {
        let mut entry = observation("1953-01-01T00:00:00.000+01:00", 0.0);
        entry["Meetwaarde"]["Waarde_Numeriek"] = json!(999999999);
        let rows = flatten_observations(
            &observations_response(vec![entry]),
            &denhelder_location(),
            999999999.0,
        )?;
        assert_eq!(rows[0]["Meetwaarde.Waarde_Numeriek"], Value::Null);
        Ok(())
    }

    #[test]
    fn test_unpaired_metadata_code() {
        let mut response = observations_response(vec![observation(
            "1953-01-01T00:00:00.000+01:00",
            1.0,
        )]);
        response["WaarnemingenLijst"][0]["AquoMetadata"]["Eenheid"] = json!({"Code": "cm"});
        assert!(matches!(
            flatten_observations(&response, &denhelder_location(), 999999999.0),
            Err(DdlError::UnpairedCode { field, missing: ".Omschrijving" }) if field == "Eenheid"
        ));
    }

    #[test]
    fn test_missing_lists_are_malformed() {
        let location = denhelder_location();
        assert!(matches!(
            flatten_observations(&json!({"Succesvol": true}), &location, 999999999.0),
            Err(DdlError::MalformedResponse(_))
        ));
        assert!(matches!(
            flatten_observations(
                &json!({"WaarnemingenLijst": [{"AquoMetadata": {}}]}),
                &location,
                999999999.0
            ),
            Err(DdlError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_observation_without_timestamp_is_kept() -> Result<(), DdlError> {
        let response = json!({
            "WaarnemingenLijst": [{
                "AquoMetadata": {},
                "MetingenLijst": [{"Meetwaarde": {"Waarde_Numeriek": 3.0}}]
            }]
        });
        let rows = flatten_observations(&response, &denhelder_location(), 999999999.0)?;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("Tijdstip"));
        Ok(())
    }
}
