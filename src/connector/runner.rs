//! One polling pass: events from a connector become emitted bundles

use serde_json::Value;
use tracing::{debug, error, info};

use crate::connector::filters::{PathFilter, RiskMapper};
use crate::connector::Connector;
use crate::emitter::BundleEmitter;
use crate::error::Result;
use crate::events::ChangeEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub seen: usize,
    pub filtered: usize,
    pub emitted: usize,
    pub failed: usize,
    pub bundle_ids: Vec<String>,
}

/// Poll once and emit a bundle for every accepted event.
///
/// A failure on one event is logged and counted; only a failed poll aborts.
pub async fn run_pass<C: Connector + ?Sized>(
    connector: &C,
    emitter: &BundleEmitter,
    filter: &PathFilter,
    risk: &RiskMapper,
) -> Result<PassSummary> {
    let events = connector.poll_changes().await?;
    let mut summary = PassSummary {
        seen: events.len(),
        ..PassSummary::default()
    };

    for event in &events {
        if !filter.should_process(&event.artifact_id) {
            debug!("Skipping {} (filtered)", event.artifact_id);
            summary.filtered += 1;
            continue;
        }

        match process_event(connector, emitter, risk, event).await {
            Ok(bundle_id) => {
                summary.emitted += 1;
                summary.bundle_ids.push(bundle_id);
            }
            Err(e) => {
                error!("Failed to process {}: {}", event.artifact_id, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Pass complete for {}: {} seen, {} filtered, {} emitted, {} failed",
        connector.name(),
        summary.seen,
        summary.filtered,
        summary.emitted,
        summary.failed
    );
    Ok(summary)
}

async fn process_event<C: Connector + ?Sized>(
    connector: &C,
    emitter: &BundleEmitter,
    risk: &RiskMapper,
    event: &ChangeEvent,
) -> Result<String> {
    info!("Processing: {}", event.artifact_id);

    let diff = connector.get_diff(event).await?;
    let mut metadata = connector.get_artifact_metadata(&event.artifact_id).await?;
    metadata
        .entry("connector_type")
        .or_insert_with(|| Value::from(connector.connector_type()));
    metadata
        .entry("connector_name")
        .or_insert_with(|| Value::from(connector.name()));

    let risk_tier = risk.map_risk_tier(&event.artifact_id);
    let mut bundle = emitter
        .assembler()
        .create(event, diff.as_ref(), &metadata, risk_tier, None)?;
    emitter.dispatch(&mut bundle).await?;

    info!("Emitted bundle: {}", bundle.bundle_id);
    Ok(bundle.bundle_id)
}
