use crate::config::{DdlConfig, EndpointKind};
use crate::transport::error::TransportError;
use crate::transport::{classify, ServiceResponse, Transport};
use log::{info, warn};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// [`Transport`] over HTTPS using a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: DdlConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: DdlConfig) -> Result<Self, TransportError> {
        // Per-endpoint timeouts are set on each request; bulk endpoints wait indefinitely.
        let client = Client::builder()
            .gzip(true)
            .timeout(Option::<Duration>::None)
            .build()
            .map_err(TransportError::ClientBuild)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DdlConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn send(&self, kind: EndpointKind, body: &Value) -> Result<ServiceResponse, TransportError> {
        let endpoint = self.config.endpoint(kind);
        let url = self.config.url(kind);
        info!("Requesting {} from {}", kind, url);

        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = endpoint.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::NetworkRequest {
                endpoint: kind,
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            warn!("HTTP error for {}: {} {}", url, status, message);
            return Err(TransportError::HttpStatus {
                endpoint: kind,
                url,
                status,
                message,
            });
        }

        let decoded: Value = response.json().map_err(|e| TransportError::JsonDecode {
            endpoint: kind,
            url: url.clone(),
            source: e,
        })?;

        classify(kind, endpoint, self.config.no_data_message(), decoded)
    }
}
