//! Bundle Assembler
//!
//! Turns a change event, an optional diff and artifact metadata into a
//! complete evidence bundle: items, hash chain, root hash, scope, retention
//! and the initial audit trail entry. Construction is pure and performs no I/O.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::bundle::types::{
    Actor, AuditAction, AuditTrail, AuditTrailEntry, EvidenceBundle, EvidenceItem,
    ExportStatus, ImmutabilityProof, IntegrityStatus, RetentionPolicy, RiskTier, Scope,
    CONTENT_TYPE_AUDIT_EVENT, CONTENT_TYPE_DIFF,
};
use crate::config::RetentionConfig;
use crate::error::Result;
use crate::events::{ArtifactMetadata, ChangeEvent, DiffResult};
use crate::kernel::chain::build_hash_chain;
use crate::kernel::hash::{compute_content_hash, HASH_ALGORITHM};
use crate::kernel::root::compute_root_hash;

/// Bundle schema version
pub const KERNEL_VERSION: &str = "0.2.0";

const DEFAULT_FROM_VERSION: &str = "initial";
const DEFAULT_TO_VERSION: &str = "current";

#[derive(Debug, Clone, Default)]
pub struct BundleAssembler {
    retention: RetentionConfig,
}

impl BundleAssembler {
    /// Rejects retention settings no bundle could be created with
    pub fn new(retention: RetentionConfig) -> Result<Self> {
        retention.validate()?;
        Ok(Self { retention })
    }

    pub fn retention(&self) -> &RetentionConfig {
        &self.retention
    }

    /// Create a bundle stamped with the current time
    pub fn create(
        &self,
        event: &ChangeEvent,
        diff: Option<&DiffResult>,
        metadata: &ArtifactMetadata,
        risk_tier: RiskTier,
        bead_id: Option<&str>,
    ) -> Result<EvidenceBundle> {
        self.create_at(event, diff, metadata, risk_tier, bead_id, Utc::now())
    }

    /// Create a bundle using `now` for every timestamp it produces
    pub fn create_at(
        &self,
        event: &ChangeEvent,
        diff: Option<&DiffResult>,
        metadata: &ArtifactMetadata,
        risk_tier: RiskTier,
        bead_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EvidenceBundle> {
        let bundle_id = Uuid::new_v4().to_string();

        let mut contents: Vec<(&str, Value)> = Vec::with_capacity(2);
        if let Some(diff) = diff {
            contents.push((CONTENT_TYPE_DIFF, diff.to_content()));
        }
        contents.push((CONTENT_TYPE_AUDIT_EVENT, event.to_content()?));

        let items = contents
            .into_iter()
            .enumerate()
            .map(|(sequence, (content_type, content))| -> Result<EvidenceItem> {
                Ok(EvidenceItem {
                    item_id: Uuid::new_v4().to_string(),
                    sequence: sequence as u64,
                    content_type: content_type.to_string(),
                    content_hash: compute_content_hash(&content)?,
                    content,
                    created_at: now,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let hash_chain = build_hash_chain(&items)?;
        let root_hash = compute_root_hash(&hash_chain)?;
        debug!("Bundle {} root hash: {}", bundle_id, root_hash);

        let from_version = event
            .from_version
            .clone()
            .unwrap_or_else(|| DEFAULT_FROM_VERSION.to_string());
        let to_version = event
            .to_version
            .clone()
            .unwrap_or_else(|| DEFAULT_TO_VERSION.to_string());

        let title = metadata
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(&event.artifact_id);

        let scope = Scope {
            assertion_type: "change_evidence".to_string(),
            assertion_text: format!("Evidence of change to {}", title),
            artifact_id: event.artifact_id.clone(),
            version_from: from_version.clone(),
            version_to: to_version.clone(),
            policy_ids: Vec::new(),
            risk_tier_assessed: risk_tier,
            assessment_date: now,
        };

        let retention = RetentionPolicy::starting_at(
            self.retention.policy.clone(),
            self.retention.retention_days,
            self.retention.legal_hold,
            self.retention.compliance_frameworks.clone(),
            now,
        )?;

        let audit_trail = AuditTrail {
            bundle_id: bundle_id.clone(),
            entries: vec![created_entry(&bundle_id, event, metadata, now)],
            last_modified: now,
        };

        let item_count = items.len();
        let bundle = EvidenceBundle {
            bundle_id,
            version: KERNEL_VERSION.to_string(),
            bead_id: bead_id
                .map(str::to_string)
                .unwrap_or_else(|| format!("connector-{}", event.artifact_id)),
            artifact_id: event.artifact_id.clone(),
            from_version_id: from_version,
            to_version_id: to_version,
            risk_tier,
            scope,
            items,
            signatures: Vec::new(),
            immutability_proof: ImmutabilityProof {
                hash_chain,
                root_hash,
                algorithm: HASH_ALGORITHM.to_string(),
                verification_status: IntegrityStatus::Unverified,
                verified_at: None,
            },
            retention,
            export_status: ExportStatus::Pending,
            integrity_status: IntegrityStatus::Unverified,
            created_at: now,
            updated_at: now,
            verified_at: None,
            exported_at: None,
            audit_trail,
        };

        info!(
            "Created evidence bundle {} for {} ({} items, risk {})",
            bundle.bundle_id, bundle.artifact_id, item_count, risk_tier
        );
        Ok(bundle)
    }
}

fn created_entry(
    bundle_id: &str,
    event: &ChangeEvent,
    metadata: &ArtifactMetadata,
    now: DateTime<Utc>,
) -> AuditTrailEntry {
    let connector_type = metadata
        .get("connector_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let connector_name = metadata
        .get("connector_name")
        .and_then(Value::as_str)
        .unwrap_or("Connector");

    let mut details = Map::new();
    details.insert("source".to_string(), Value::from("connector"));
    details.insert("event_type".to_string(), Value::from(event.event_type.as_str()));

    AuditTrailEntry {
        entry_id: Uuid::new_v4().to_string(),
        bundle_id: bundle_id.to_string(),
        action: AuditAction::Created,
        actor: Actor::system(format!("connector:{}", connector_type), connector_name),
        timestamp: now,
        details,
    }
}
