use crate::config::EndpointKind;
use thiserror::Error;

/// A hard failure of one request. Never raised for the service's "no data" reply on
/// endpoints where that reply is an expected empty result.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {endpoint} ({url})")]
    NetworkRequest {
        endpoint: EndpointKind,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed for {endpoint} ({url}) with status {status}: {message}")]
    HttpStatus {
        endpoint: EndpointKind,
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Failed to decode JSON response of {endpoint} ({url})")]
    JsonDecode {
        endpoint: EndpointKind,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Service reported failure for {endpoint}: {message}")]
    ServiceFailure {
        endpoint: EndpointKind,
        message: String,
    },
}
