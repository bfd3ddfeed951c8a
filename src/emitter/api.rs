//! Remote API sink: POSTs bundles to `<base_url>/bundles`

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::bundle::types::EvidenceBundle;
use crate::emitter::SinkReceipt;
use crate::error::{ConnectorError, Result};

#[derive(Debug, Clone)]
pub struct ApiSink {
    endpoint: String,
    api_key: Option<String>,
    http_client: Client,
}

impl ApiSink {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: format!("{}/bundles", base_url.trim_end_matches('/')),
            api_key,
            http_client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single POST attempt; any non-2xx status is an error
    pub async fn write(&self, bundle: &EvidenceBundle) -> Result<SinkReceipt> {
        debug!("Posting bundle {} to {}", bundle.bundle_id, self.endpoint);

        let mut request = self.http_client.post(&self.endpoint).json(bundle);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::unexpected_status(&self.endpoint, status.as_u16()));
        }

        let body = response.text().await?;
        let parsed = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                ConnectorError::SinkError(format!("API returned invalid JSON: {}", e))
            })?
        };

        info!("Bundle {} accepted by {} ({})", bundle.bundle_id, self.endpoint, status);
        Ok(SinkReceipt {
            destination: self.endpoint.clone(),
            file_path: None,
            response: Some(parsed),
        })
    }
}
