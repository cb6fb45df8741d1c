//! Endpoint definitions and the immutable client configuration.

use bon::Builder;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://waterwebservices.rijkswaterstaat.nl/";

/// Message the service sets in `Foutmelding` when a query matched no observations.
///
/// Matched exactly. If the service rewords it, "no data" replies surface as
/// [`crate::TransportError::ServiceFailure`] instead of an empty result.
pub const NO_DATA_MESSAGE: &str = "Geen gegevens gevonden!";

/// Value the service uses in `Meetwaarde.Waarde_Numeriek` to mean "no measurement".
pub const MISSING_VALUE: f64 = 999_999_999.0;

const SHORT_TIMEOUT: Duration = Duration::from_secs(5);

/// The service operations this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Station, quantity and link lists (`OphalenCatalogus`).
    Catalog,
    /// Observations within one bounded interval (`OphalenWaarnemingen`).
    Observations,
    /// The most recent observation (`OphalenLaatsteWaarnemingen`).
    LatestObservations,
    /// Whether observations exist within an interval (`CheckWaarnemingenAanwezig`).
    ObservationsAvailable,
    /// Number of observations per year, month or day (`OphalenAantalWaarnemingen`).
    ObservationCount,
}

impl EndpointKind {
    fn label(&self) -> &'static str {
        match self {
            EndpointKind::Catalog => "catalog",
            EndpointKind::Observations => "observations",
            EndpointKind::LatestObservations => "latest observations",
            EndpointKind::ObservationsAvailable => "observations available",
            EndpointKind::ObservationCount => "observation count",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Path, timeout and "no data" policy of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Path relative to the base URL.
    pub path: String,
    /// Request timeout; `None` waits as long as the server takes (bulk downloads).
    pub timeout: Option<Duration>,
    /// Whether the service's "no data" reply is an expected empty result for this endpoint.
    /// When `false` it is reported as a hard failure like any other service error.
    pub no_data_is_empty: bool,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, timeout: Option<Duration>, no_data_is_empty: bool) -> Self {
        Self {
            path: path.into(),
            timeout,
            no_data_is_empty,
        }
    }
}

/// Immutable configuration shared by the transport and the retrieval functions.
///
/// `DdlConfig::default()` points at the public service. Override single values with the
/// builder, e.g. to target a local mock server:
///
/// ```
/// use ddl::DdlConfig;
///
/// let config = DdlConfig::builder().base_url("http://127.0.0.1:1234/").build();
/// assert_eq!(
///     config.url(ddl::EndpointKind::Catalog),
///     "http://127.0.0.1:1234/METADATASERVICES_DBO/OphalenCatalogus"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct DdlConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    base_url: String,
    #[builder(default = Endpoint::new("METADATASERVICES_DBO/OphalenCatalogus", None, false))]
    catalog: Endpoint,
    #[builder(default = Endpoint::new(
        "ONLINEWAARNEMINGENSERVICES_DBO/OphalenWaarnemingen",
        None,
        true
    ))]
    observations: Endpoint,
    #[builder(default = Endpoint::new(
        "ONLINEWAARNEMINGENSERVICES_DBO/OphalenLaatsteWaarnemingen",
        Some(SHORT_TIMEOUT),
        false
    ))]
    latest_observations: Endpoint,
    #[builder(default = Endpoint::new(
        "ONLINEWAARNEMINGENSERVICES_DBO/CheckWaarnemingenAanwezig",
        Some(SHORT_TIMEOUT),
        false
    ))]
    observations_available: Endpoint,
    #[builder(default = Endpoint::new(
        "ONLINEWAARNEMINGENSERVICES_DBO/OphalenAantalWaarnemingen",
        None,
        true
    ))]
    observation_count: Endpoint,
    #[builder(into, default = NO_DATA_MESSAGE.to_string())]
    no_data_message: String,
    #[builder(default = MISSING_VALUE)]
    missing_value: f64,
}

impl Default for DdlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DdlConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, kind: EndpointKind) -> &Endpoint {
        match kind {
            EndpointKind::Catalog => &self.catalog,
            EndpointKind::Observations => &self.observations,
            EndpointKind::LatestObservations => &self.latest_observations,
            EndpointKind::ObservationsAvailable => &self.observations_available,
            EndpointKind::ObservationCount => &self.observation_count,
        }
    }

    /// Full URL of an endpoint.
    pub fn url(&self, kind: EndpointKind) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint(kind).path.trim_start_matches('/')
        )
    }

    pub fn no_data_message(&self) -> &str {
        &self.no_data_message
    }

    pub fn missing_value(&self) -> f64 {
        self.missing_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = DdlConfig::default();
        assert_eq!(
            config.url(EndpointKind::Observations),
            "https://waterwebservices.rijkswaterstaat.nl/ONLINEWAARNEMINGENSERVICES_DBO/OphalenWaarnemingen"
        );
        assert_eq!(config.endpoint(EndpointKind::Catalog).timeout, None);
        assert_eq!(
            config.endpoint(EndpointKind::LatestObservations).timeout,
            Some(Duration::from_secs(5))
        );
        assert!(config.endpoint(EndpointKind::Observations).no_data_is_empty);
        assert!(config.endpoint(EndpointKind::ObservationCount).no_data_is_empty);
        assert!(!config.endpoint(EndpointKind::Catalog).no_data_is_empty);
        assert_eq!(config.no_data_message(), "Geen gegevens gevonden!");
        assert_eq!(config.missing_value(), 999999999.0);
    }

    #[test]
    fn test_override_endpoint() {
        let config = DdlConfig::builder()
            .base_url("http://localhost:8080")
            .observations(Endpoint::new("/obs", Some(Duration::from_secs(60)), true))
            .build();
        assert_eq!(config.url(EndpointKind::Observations), "http://localhost:8080/obs");
        assert_eq!(
            config.endpoint(EndpointKind::Catalog).path,
            "METADATASERVICES_DBO/OphalenCatalogus"
        );
    }
}
