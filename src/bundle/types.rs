//! Evidence bundle record and its wire format

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ConnectorError;
use crate::kernel::chain::HashChainEntry;
use crate::kernel::verify::{verify_bundle, VerificationReport};

pub const CONTENT_TYPE_DIFF: &str = "diff";
pub const CONTENT_TYPE_AUDIT_EVENT: &str = "audit_event";

/// Risk classification of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum RiskTier {
    #[default]
    L0,
    L1,
    L2,
    L3,
    L4,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::L0 => "L0",
            RiskTier::L1 => "L1",
            RiskTier::L2 => "L2",
            RiskTier::L3 => "L3",
            RiskTier::L4 => "L4",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L0" => Ok(RiskTier::L0),
            "L1" => Ok(RiskTier::L1),
            "L2" => Ok(RiskTier::L2),
            "L3" => Ok(RiskTier::L3),
            "L4" => Ok(RiskTier::L4),
            other => Err(ConnectorError::ConfigError(format!("Unknown risk tier: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Pending,
    Exported,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Unverified,
    Verified,
    Failed,
}

/// One unit of hashed content inside a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub item_id: String,
    pub sequence: u64,
    pub content_type: String,
    pub content_hash: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

/// What the bundle asserts and over which versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub assertion_type: String,
    pub assertion_text: String,
    pub artifact_id: String,
    pub version_from: String,
    pub version_to: String,
    pub policy_ids: Vec<String>,
    pub risk_tier_assessed: RiskTier,
    pub assessment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmutabilityProof {
    pub hash_chain: Vec<HashChainEntry>,
    pub root_hash: String,
    pub algorithm: String,
    pub verification_status: IntegrityStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub policy: String,
    pub retention_days: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub legal_hold: bool,
    pub compliance_frameworks: Vec<String>,
}

impl RetentionPolicy {
    /// Create a policy whose expiry is exactly `retention_days` after `now`
    pub fn starting_at(
        policy: impl Into<String>,
        retention_days: u32,
        legal_hold: bool,
        compliance_frameworks: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ConnectorError> {
        if retention_days == 0 {
            return Err(ConnectorError::ConfigError(
                "retention_days must be at least 1".to_string(),
            ));
        }

        let expires_at = now
            .checked_add_signed(Duration::days(i64::from(retention_days)))
            .ok_or_else(|| {
                ConnectorError::ConfigError(format!(
                    "retention of {} days from {} is out of range",
                    retention_days, now
                ))
            })?;

        Ok(Self {
            policy: policy.into(),
            retention_days,
            created_at: now,
            expires_at,
            legal_hold,
            compliance_frameworks,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Exported,
    ExportFailed,
    Verified,
    VerificationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub signer_id: String,
    pub signer_type: String,
    pub display_name: String,
}

impl Actor {
    pub fn system(signer_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            signer_id: signer_id.into(),
            signer_type: "system".to_string(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub entry_id: String,
    pub bundle_id: String,
    pub action: AuditAction,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub bundle_id: String,
    pub entries: Vec<AuditTrailEntry>,
    pub last_modified: DateTime<Utc>,
}

/// Complete hashed record of one detected change.
///
/// Items, hash chain and root hash are fixed at construction. Only the export
/// and integrity status fields, their timestamps and the audit trail change
/// afterwards, through the transition methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub bundle_id: String,
    pub version: String,
    pub bead_id: String,
    pub artifact_id: String,
    pub from_version_id: String,
    pub to_version_id: String,
    pub risk_tier: RiskTier,
    pub scope: Scope,
    pub(crate) items: Vec<EvidenceItem>,
    pub signatures: Vec<Value>,
    pub(crate) immutability_proof: ImmutabilityProof,
    pub retention: RetentionPolicy,
    pub(crate) export_status: ExportStatus,
    pub(crate) integrity_status: IntegrityStatus,
    pub created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) verified_at: Option<DateTime<Utc>>,
    pub(crate) exported_at: Option<DateTime<Utc>>,
    pub(crate) audit_trail: AuditTrail,
}

impl EvidenceBundle {
    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn immutability_proof(&self) -> &ImmutabilityProof {
        &self.immutability_proof
    }

    pub fn hash_chain(&self) -> &[HashChainEntry] {
        &self.immutability_proof.hash_chain
    }

    pub fn root_hash(&self) -> &str {
        &self.immutability_proof.root_hash
    }

    pub fn export_status(&self) -> ExportStatus {
        self.export_status
    }

    pub fn integrity_status(&self) -> IntegrityStatus {
        self.integrity_status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn exported_at(&self) -> Option<DateTime<Utc>> {
        self.exported_at
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit_trail
    }

    /// Record a successful export to a sink
    pub fn mark_exported(&mut self, destination: &str, now: DateTime<Utc>) {
        self.export_status = ExportStatus::Exported;
        self.exported_at = Some(now);

        let mut details = Map::new();
        details.insert("destination".to_string(), Value::from(destination));
        self.record(AuditAction::Exported, sink_actor(), details, now);
    }

    /// Record a failed export attempt
    pub fn mark_export_failed(&mut self, reason: &str, now: DateTime<Utc>) {
        self.export_status = ExportStatus::Failed;

        let mut details = Map::new();
        details.insert("reason".to_string(), Value::from(reason));
        self.record(AuditAction::ExportFailed, sink_actor(), details, now);
    }

    /// Apply the outcome of an integrity check
    pub fn apply_verification(&mut self, report: &VerificationReport, now: DateTime<Utc>) {
        let (status, action) = if report.is_valid() {
            (IntegrityStatus::Verified, AuditAction::Verified)
        } else {
            (IntegrityStatus::Failed, AuditAction::VerificationFailed)
        };

        self.integrity_status = status;
        self.verified_at = Some(now);
        self.immutability_proof.verification_status = status;
        self.immutability_proof.verified_at = Some(now);

        let mut details = Map::new();
        details.insert("root_hash".to_string(), Value::from(report.recomputed_root.clone()));
        if !report.is_valid() {
            details.insert("failures".to_string(), Value::from(report.failures.clone()));
        }
        self.record(
            action,
            Actor::system("verifier:kernel", "Bundle Verifier"),
            details,
            now,
        );
    }

    /// Verify the bundle's hashes and record the outcome
    pub fn verify(&mut self) -> VerificationReport {
        let report = verify_bundle(self);
        self.apply_verification(&report, Utc::now());
        report
    }

    fn record(&mut self, action: AuditAction, actor: Actor, details: Map<String, Value>, now: DateTime<Utc>) {
        self.audit_trail.entries.push(AuditTrailEntry {
            entry_id: Uuid::new_v4().to_string(),
            bundle_id: self.bundle_id.clone(),
            action,
            actor,
            timestamp: now,
            details,
        });
        self.audit_trail.last_modified = now;
        self.updated_at = now;
    }
}

fn sink_actor() -> Actor {
    Actor::system("emitter:sink", "Bundle Emitter")
}
