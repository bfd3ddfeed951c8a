//! Evidence Bundles
//!
//! The bundle record and the assembler that builds it from connector events.

pub mod assembler;
pub mod types;

pub use assembler::{BundleAssembler, KERNEL_VERSION};
pub use types::{
    Actor, AuditAction, AuditTrail, AuditTrailEntry, EvidenceBundle, EvidenceItem, ExportStatus,
    ImmutabilityProof, IntegrityStatus, RetentionPolicy, RiskTier, Scope,
};
