//! The location record: one station combined with one observed quantity, and the
//! normalization of the shapes a caller may hand in.

use crate::error::DdlError;
use polars::prelude::{AnyValue, DataFrame};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

pub(crate) const CODE_SUFFIX: &str = ".Code";
pub(crate) const DESCRIPTION_SUFFIX: &str = ".Omschrijving";

/// A controlled-vocabulary value: a code and its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePair {
    pub code: String,
    pub omschrijving: Option<String>,
}

impl CodePair {
    pub fn new(code: impl Into<String>, omschrijving: Option<String>) -> Self {
        Self {
            code: code.into(),
            omschrijving,
        }
    }
}

/// One row of the location catalog: a station plus one quantity/unit/qualifier combination.
///
/// The station code together with the classification codes identifies exactly one
/// retrievable series. Records are usually obtained from [`crate::Ddl::locations`] and
/// converted with [`IntoLocation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Stable station identifier (e.g. `"DENHDR"`).
    pub code: String,
    /// Station name (`Naam`).
    pub name: Option<String>,
    /// Planar X coordinate in the station's coordinate system.
    pub x: f64,
    /// Planar Y coordinate in the station's coordinate system.
    pub y: f64,
    /// EPSG code of the planar coordinates (`Coordinatenstelsel`).
    pub coordinate_system: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Classification dimensions keyed by field name, e.g. `"Grootheid"` -> `WATHTE`.
    pub classifications: BTreeMap<String, CodePair>,
}

impl Location {
    /// Normalizes a flat record (`"Grootheid.Code"`-style keys) into a location.
    ///
    /// The station code is taken from `index` when given (a keyed record), otherwise from
    /// the record's own `Code` field.
    ///
    /// # Errors
    ///
    /// Returns [`DdlError::MissingField`] when the station code or a coordinate is absent and
    /// [`DdlError::UnpairedCode`] when only one half of a `.Code`/`.Omschrijving` pair is set.
    pub fn from_record(index: Option<&str>, record: &Map<String, Value>) -> Result<Self, DdlError> {
        let code = match index {
            Some(code) => code.to_string(),
            None => record
                .get("Code")
                .and_then(scalar_text)
                .ok_or_else(|| DdlError::MissingField("Code".to_string()))?,
        };

        Ok(Self {
            code,
            name: record.get("Naam").and_then(scalar_text),
            x: required_number(record, "X")?,
            y: required_number(record, "Y")?,
            coordinate_system: record.get("Coordinatenstelsel").and_then(scalar_text),
            longitude: record.get("Lon").and_then(number),
            latitude: record.get("Lat").and_then(number),
            classifications: code_pairs(record)?,
        })
    }

    /// The request descriptor for this location's classification codes.
    pub(crate) fn classification_codes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classifications
            .iter()
            .map(|(field, pair)| (field.as_str(), pair.code.as_str()))
    }
}

/// Collects the `<name>.Code` / `<name>.Omschrijving` pairs of a flat record.
///
/// A pair that is entirely absent or null is an optional category and skipped; a pair with
/// only one half present is a data-format error.
fn code_pairs(record: &Map<String, Value>) -> Result<BTreeMap<String, CodePair>, DdlError> {
    let mut pairs = BTreeMap::new();
    for (key, value) in record {
        if let Some(field) = key.strip_suffix(CODE_SUFFIX) {
            let description = record
                .get(&format!("{field}{DESCRIPTION_SUFFIX}"))
                .and_then(scalar_text);
            match (scalar_text(value), description) {
                (Some(code), omschrijving @ Some(_)) => {
                    pairs.insert(field.to_string(), CodePair::new(code, omschrijving));
                }
                (None, None) => {}
                (Some(_), None) => {
                    return Err(DdlError::UnpairedCode {
                        field: field.to_string(),
                        missing: DESCRIPTION_SUFFIX,
                    })
                }
                (None, Some(_)) => {
                    return Err(DdlError::UnpairedCode {
                        field: field.to_string(),
                        missing: CODE_SUFFIX,
                    })
                }
            }
        } else if let Some(field) = key.strip_suffix(DESCRIPTION_SUFFIX) {
            let has_code = record.contains_key(&format!("{field}{CODE_SUFFIX}"));
            if !has_code && scalar_text(value).is_some() {
                return Err(DdlError::UnpairedCode {
                    field: field.to_string(),
                    missing: CODE_SUFFIX,
                });
            }
        }
    }
    Ok(pairs)
}

fn required_number(record: &Map<String, Value>, field: &str) -> Result<f64, DdlError> {
    record
        .get(field)
        .and_then(number)
        .ok_or_else(|| DdlError::MissingField(field.to_string()))
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text of a scalar JSON value; `None` for null, arrays and objects.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts the shapes a location may be supplied in to the canonical [`Location`].
///
/// Implemented for:
/// * [`Location`] and `&Location`;
/// * `(&str, &Map)`: a keyed record whose key is the station code;
/// * `&Map` / `&Value`: a record carrying the station code in its `Code` field, or a JSON
///   array holding exactly one such record;
/// * `&DataFrame`: a single row of the catalog table. A frame with any other number of rows
///   is rejected with [`DdlError::InvalidLocationShape`].
pub trait IntoLocation {
    fn into_location(self) -> Result<Location, DdlError>;
}

impl IntoLocation for Location {
    fn into_location(self) -> Result<Location, DdlError> {
        Ok(self)
    }
}

impl IntoLocation for &Location {
    fn into_location(self) -> Result<Location, DdlError> {
        Ok(self.clone())
    }
}

impl IntoLocation for (&str, &Map<String, Value>) {
    fn into_location(self) -> Result<Location, DdlError> {
        Location::from_record(Some(self.0), self.1)
    }
}

impl IntoLocation for &Map<String, Value> {
    fn into_location(self) -> Result<Location, DdlError> {
        Location::from_record(None, self)
    }
}

impl IntoLocation for &Value {
    fn into_location(self) -> Result<Location, DdlError> {
        match self {
            Value::Object(record) => record.into_location(),
            Value::Array(items) if items.len() == 1 => items[0].into_location(),
            Value::Array(items) => Err(DdlError::InvalidLocationShape { rows: items.len() }),
            _ => Err(DdlError::InvalidLocationShape { rows: 0 }),
        }
    }
}

impl IntoLocation for &DataFrame {
    fn into_location(self) -> Result<Location, DdlError> {
        if self.height() != 1 {
            return Err(DdlError::InvalidLocationShape {
                rows: self.height(),
            });
        }
        let mut record = Map::new();
        for column in self.get_columns() {
            let value = column.as_materialized_series().get(0)?;
            record.insert(column.name().to_string(), any_value_to_json(value));
        }
        Location::from_record(None, &record)
    }
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
