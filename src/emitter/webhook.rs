//! Webhook sink: POSTs the bundle as the request body

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::bundle::types::EvidenceBundle;
use crate::emitter::SinkReceipt;
use crate::error::{ConnectorError, Result};

#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
    headers: HeaderMap,
    http_client: Client,
}

impl WebhookSink {
    /// Fails when a configured header name or value is not valid HTTP
    pub fn new(url: impl Into<String>, headers: &HashMap<String, String>) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConnectorError::ConfigError(format!("Invalid webhook header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                ConnectorError::ConfigError(format!("Invalid value for webhook header '{}': {}", name, e))
            })?;
            header_map.insert(header_name, header_value);
        }

        Ok(Self {
            url: url.into(),
            headers: header_map,
            http_client: Client::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn write(&self, bundle: &EvidenceBundle) -> Result<SinkReceipt> {
        debug!(
            "Posting bundle {} to webhook {} with {} extra headers",
            bundle.bundle_id,
            self.url,
            self.headers.len()
        );

        let response = self
            .http_client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(bundle)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::unexpected_status(&self.url, status.as_u16()));
        }

        info!("Bundle {} delivered to webhook ({})", bundle.bundle_id, status);
        Ok(SinkReceipt {
            destination: self.url.clone(),
            file_path: None,
            response: None,
        })
    }
}
