//! Fixtures and a scripted transport shared by the unit tests.

use crate::config::EndpointKind;
use crate::transport::error::TransportError;
use crate::transport::{ServiceResponse, Transport};
use crate::types::into_utc_trait::IntoUtcDateTime;
use crate::types::location::{CodePair, Location};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub(crate) fn denhelder_location() -> Location {
    let mut classifications = BTreeMap::new();
    for (field, code, description) in [
        ("Compartiment", "OW", "Oppervlaktewater"),
        ("Eenheid", "cm", "centimeter"),
        ("Grootheid", "WATHTE", "Waterhoogte"),
        ("Hoedanigheid", "NAP", "t.o.v. Normaal Amsterdams Peil"),
    ] {
        classifications.insert(
            field.to_string(),
            CodePair::new(code, Some(description.to_string())),
        );
    }
    Location {
        code: "DENHDR".to_string(),
        name: Some("Den Helder".to_string()),
        x: 617198.393,
        y: 5869731.48,
        coordinate_system: Some("25831".to_string()),
        longitude: None,
        latitude: None,
        classifications,
    }
}

pub(crate) fn observation(tijdstip: &str, value: f64) -> Value {
    json!({
        "Tijdstip": tijdstip,
        "Meetwaarde": {"Waarde_Numeriek": value},
        "WaarnemingMetadata": {
            "StatuswaardeLijst": ["Gecontroleerd"],
            "BemonsteringshoogteLijst": ["-999999999"],
            "ReferentievlakLijst": ["NVT"],
            "OpdrachtgevendeInstantieLijst": ["RIKZMON_WAT"],
            "KwaliteitswaardecodeLijst": ["00"]
        }
    })
}

pub(crate) fn observations_response(entries: Vec<Value>) -> Value {
    json!({
        "Succesvol": true,
        "WaarnemingenLijst": [{
            "Locatie": {
                "Locatie_MessageID": 84020,
                "Coordinatenstelsel": "25831",
                "X": 617198.393,
                "Y": 5869731.48,
                "Naam": "Den Helder",
                "Code": "DENHDR"
            },
            "MetingenLijst": entries,
            "AquoMetadata": {
                "AquoMetadata_MessageID": 5,
                "Parameter_Wat_Omschrijving": "Waterhoogte Oppervlaktewater t.o.v. NAP in cm",
                "Compartiment": {"Code": "OW", "Omschrijving": "Oppervlaktewater"},
                "Eenheid": {"Code": "cm", "Omschrijving": "centimeter"},
                "Grootheid": {"Code": "WATHTE", "Omschrijving": "Waterhoogte"},
                "Hoedanigheid": {"Code": "NAP", "Omschrijving": "t.o.v. Normaal Amsterdams Peil"}
            }
        }]
    })
}

/// Hourly observations covering `[start, end]` inclusive, stamped in +01:00 like the service.
pub(crate) fn hourly_observations(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Value> {
    let offset = FixedOffset::east_opt(3600).unwrap();
    let mut entries = Vec::new();
    let mut at = start;
    while at <= end {
        let local = at.with_timezone(&offset);
        let value = (at.timestamp() / 3600 % 200 - 100) as f64;
        entries.push(observation(
            &local.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            value,
        ));
        at += Duration::hours(1);
    }
    entries
}

/// Answers observation requests with an hourly series for the requested `Periode`.
pub(crate) fn hourly_series_reply(body: &Value) -> Result<ServiceResponse, TransportError> {
    let start = body["Periode"]["Begindatumtijd"].as_str().and_then(|s| s.into_utc());
    let end = body["Periode"]["Einddatumtijd"].as_str().and_then(|s| s.into_utc());
    match (start, end) {
        (Some(start), Some(end)) => Ok(ServiceResponse::Data(observations_response(
            hourly_observations(start, end),
        ))),
        _ => Err(TransportError::ServiceFailure {
            endpoint: EndpointKind::Observations,
            message: "Periode is ongeldig".to_string(),
        }),
    }
}

type Reply = Box<dyn Fn(EndpointKind, &Value) -> Result<ServiceResponse, TransportError>>;

/// A [`Transport`] that answers from a closure and records every request it receives.
pub(crate) struct StaticTransport {
    reply: Reply,
    pub(crate) requests: RefCell<Vec<(EndpointKind, Value)>>,
}

impl StaticTransport {
    pub(crate) fn new(
        reply: impl Fn(EndpointKind, &Value) -> Result<ServiceResponse, TransportError> + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for StaticTransport {
    fn send(&self, kind: EndpointKind, body: &Value) -> Result<ServiceResponse, TransportError> {
        self.requests.borrow_mut().push((kind, body.clone()));
        (self.reply)(kind, body)
    }
}
