//! Bundle Emitter
//!
//! Builds evidence bundles and writes each one to exactly one configured
//! sink: a remote API, a local directory, or a webhook. Sink parameters are
//! validated when the emitter is constructed; every write is a single attempt.

pub mod api;
pub mod file;
pub mod webhook;

use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info};

use crate::bundle::assembler::BundleAssembler;
use crate::bundle::types::{EvidenceBundle, RiskTier};
use crate::config::{AppConfig, OutputConfig, OutputMode};
use crate::error::{ConnectorError, Result};
use crate::events::{ArtifactMetadata, ChangeEvent, DiffResult};

pub use api::ApiSink;
pub use file::FileSink;
pub use webhook::WebhookSink;

/// What a sink reports back after a successful write
#[derive(Debug, Clone, PartialEq)]
pub struct SinkReceipt {
    pub destination: String,
    /// Set by the filesystem sink
    pub file_path: Option<PathBuf>,
    /// Parsed response body from the remote API sink
    pub response: Option<Value>,
}

/// A bundle after it has been written to its sink
#[derive(Debug, Clone)]
pub struct Emission {
    pub bundle: EvidenceBundle,
    pub receipt: SinkReceipt,
}

/// The configured emission target
#[derive(Debug, Clone)]
pub enum Sink {
    Api(ApiSink),
    File(FileSink),
    Webhook(WebhookSink),
}

impl Sink {
    /// Validate raw output settings into a sink
    pub fn from_output_config(output: &OutputConfig) -> Result<Self> {
        match output.mode {
            OutputMode::Api => {
                let url = non_empty(&output.api_url)
                    .ok_or_else(|| ConnectorError::missing_sink_parameter("api", "api_url"))?;
                Ok(Sink::Api(ApiSink::new(url, output.api_key.clone())))
            }
            OutputMode::File => {
                let path = non_empty(&output.file_path)
                    .ok_or_else(|| ConnectorError::missing_sink_parameter("file", "file_path"))?;
                Ok(Sink::File(FileSink::new(path)))
            }
            OutputMode::Webhook => {
                let url = non_empty(&output.webhook_url)
                    .ok_or_else(|| ConnectorError::missing_sink_parameter("webhook", "webhook_url"))?;
                Ok(Sink::Webhook(WebhookSink::new(url, &output.headers)?))
            }
        }
    }

    pub fn mode(&self) -> OutputMode {
        match self {
            Sink::Api(_) => OutputMode::Api,
            Sink::File(_) => OutputMode::File,
            Sink::Webhook(_) => OutputMode::Webhook,
        }
    }

    pub async fn write(&self, bundle: &EvidenceBundle) -> Result<SinkReceipt> {
        match self {
            Sink::Api(sink) => sink.write(bundle).await,
            Sink::File(sink) => sink.write(bundle).await,
            Sink::Webhook(sink) => sink.write(bundle).await,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Creates bundles and emits them to the configured sink
#[derive(Debug, Clone)]
pub struct BundleEmitter {
    assembler: BundleAssembler,
    sink: Sink,
}

impl BundleEmitter {
    pub fn new(assembler: BundleAssembler, sink: Sink) -> Self {
        Self { assembler, sink }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sink = Sink::from_output_config(&config.output)?;
        info!("Bundle emitter configured in {:?} mode", sink.mode());
        Ok(Self::new(BundleAssembler::new(config.retention.clone())?, sink))
    }

    pub fn assembler(&self) -> &BundleAssembler {
        &self.assembler
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Create a bundle and write it to the sink
    pub async fn emit(
        &self,
        event: &ChangeEvent,
        diff: Option<&DiffResult>,
        metadata: &ArtifactMetadata,
        risk_tier: RiskTier,
        bead_id: Option<&str>,
    ) -> Result<Emission> {
        let mut bundle = self.assembler.create(event, diff, metadata, risk_tier, bead_id)?;
        let receipt = self.dispatch(&mut bundle).await?;
        Ok(Emission { bundle, receipt })
    }

    /// Write an existing bundle once and record the outcome on it
    pub async fn dispatch(&self, bundle: &mut EvidenceBundle) -> Result<SinkReceipt> {
        match self.sink.write(bundle).await {
            Ok(receipt) => {
                bundle.mark_exported(&receipt.destination, Utc::now());
                Ok(receipt)
            }
            Err(e) => {
                error!("Failed to emit bundle {}: {}", bundle.bundle_id, e);
                bundle.mark_export_failed(&e.to_string(), Utc::now());
                Err(e)
            }
        }
    }
}
