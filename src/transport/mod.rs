//! Sending requests to the service and classifying the replies.

pub mod error;
mod http;

use crate::config::{Endpoint, EndpointKind};
use crate::transport::error::TransportError;
use log::warn;
use serde_json::Value;

pub use http::HttpTransport;

/// A reply that is not a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    /// The decoded response body, unchanged.
    Data(Value),
    /// The service found nothing for the request. Expected and skippable.
    NoData,
}

/// One blocking request per call.
///
/// Implementations return hard failures as `Err` and the service's "no data" reply as
/// [`ServiceResponse::NoData`] (for endpoints configured to treat it as empty).
pub trait Transport {
    fn send(&self, kind: EndpointKind, body: &Value) -> Result<ServiceResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, kind: EndpointKind, body: &Value) -> Result<ServiceResponse, TransportError> {
        (**self).send(kind, body)
    }
}

/// Classifies a decoded response body by its `Succesvol` / `Foutmelding` fields.
///
/// A body without a `Succesvol` flag is treated as data.
pub fn classify(
    kind: EndpointKind,
    endpoint: &Endpoint,
    no_data_message: &str,
    body: Value,
) -> Result<ServiceResponse, TransportError> {
    if body.get("Succesvol").and_then(Value::as_bool) != Some(false) {
        return Ok(ServiceResponse::Data(body));
    }

    let message = body
        .get("Foutmelding")
        .and_then(Value::as_str)
        .unwrap_or("No error returned")
        .to_string();

    if endpoint.no_data_is_empty && message == no_data_message {
        return Ok(ServiceResponse::NoData);
    }

    warn!("Service reported failure for {}: {}", kind, message);
    Err(TransportError::ServiceFailure {
        endpoint: kind,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DdlConfig;
    use serde_json::json;

    fn classify_default(kind: EndpointKind, body: Value) -> Result<ServiceResponse, TransportError> {
        let config = DdlConfig::default();
        classify(kind, config.endpoint(kind), config.no_data_message(), body)
    }

    #[test]
    fn test_success_is_returned_unchanged() {
        let body = json!({"Succesvol": true, "WaarnemingenLijst": []});
        assert_eq!(
            classify_default(EndpointKind::Observations, body.clone()).unwrap(),
            ServiceResponse::Data(body)
        );
    }

    #[test]
    fn test_missing_flag_is_data() {
        let body = json!({"LocatieLijst": []});
        assert!(matches!(
            classify_default(EndpointKind::Catalog, body),
            Ok(ServiceResponse::Data(_))
        ));
    }

    #[test]
    fn test_no_data_message() {
        let body = json!({"Succesvol": false, "Foutmelding": "Geen gegevens gevonden!"});
        assert_eq!(
            classify_default(EndpointKind::Observations, body.clone()).unwrap(),
            ServiceResponse::NoData
        );
        assert_eq!(
            classify_default(EndpointKind::ObservationCount, body.clone()).unwrap(),
            ServiceResponse::NoData
        );
        // Endpoints without the empty-result policy report it as a failure.
        assert!(matches!(
            classify_default(EndpointKind::LatestObservations, body),
            Err(TransportError::ServiceFailure { .. })
        ));
    }

    #[test]
    fn test_other_failure_keeps_message() {
        let body = json!({
            "Succesvol": false,
            "Foutmelding": "Het veld Einddatumtijd is ongeldig"
        });
        match classify_default(EndpointKind::Observations, body) {
            Err(TransportError::ServiceFailure { endpoint, message }) => {
                assert_eq!(endpoint, EndpointKind::Observations);
                assert_eq!(message, "Het veld Einddatumtijd is ongeldig");
            }
            other => panic!("expected a service failure, got {other:?}"),
        }
    }

    #[test]
    fn test_reworded_no_data_is_a_failure() {
        let body = json!({"Succesvol": false, "Foutmelding": "Geen gegevens gevonden"});
        assert!(classify_default(EndpointKind::Observations, body).is_err());
    }

    #[test]
    fn test_failure_without_message() {
        let body = json!({"Succesvol": false});
        match classify_default(EndpointKind::Catalog, body) {
            Err(TransportError::ServiceFailure { message, .. }) => {
                assert_eq!(message, "No error returned")
            }
            other => panic!("expected a service failure, got {other:?}"),
        }
    }
}
