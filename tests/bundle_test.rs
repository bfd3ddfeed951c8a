//! Integration tests for bundle assembly and the hashing kernel

mod common;

use common::{fixed_now, github_metadata, scenario_diff, scenario_event};
use evidence_connector::bundle::types::{
    AuditAction, ExportStatus, IntegrityStatus, CONTENT_TYPE_AUDIT_EVENT, CONTENT_TYPE_DIFF,
};
use evidence_connector::config::RetentionConfig;
use evidence_connector::kernel::{
    compute_content_hash, compute_root_hash, compute_root_hash_from_hashes, verify_bundle,
};
use evidence_connector::{ArtifactMetadata, BundleAssembler, EvidenceBundle, RiskTier};
use sha2::{Digest, Sha256};

fn assemble(with_diff: bool) -> EvidenceBundle {
    let diff = scenario_diff();
    BundleAssembler::default()
        .create_at(
            &scenario_event(),
            with_diff.then_some(&diff),
            &ArtifactMetadata::new(),
            RiskTier::L2,
            None,
            fixed_now(),
        )
        .expect("bundle assembly failed")
}

fn bare(hash: &str) -> &str {
    hash.strip_prefix("sha256:").expect("missing algorithm prefix")
}

#[test]
fn test_event_with_diff_produces_two_linked_items() {
    let bundle = assemble(true);

    let items = bundle.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].content_type, CONTENT_TYPE_DIFF);
    assert_eq!(items[1].content_type, CONTENT_TYPE_AUDIT_EVENT);

    let chain = bundle.hash_chain();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].previous_hash, None);
    assert_eq!(chain[1].previous_hash.as_deref(), Some(chain[0].content_hash.as_str()));

    for (item, entry) in items.iter().zip(chain) {
        assert_eq!(item.content_hash, entry.content_hash);
        assert_eq!(item.content_hash, compute_content_hash(&item.content).unwrap());
    }

    let mut hasher = Sha256::new();
    hasher.update(bare(&chain[0].content_hash));
    hasher.update(bare(&chain[1].content_hash));
    let expected = format!("sha256:{}", hex::encode(hasher.finalize()));
    assert_eq!(bundle.root_hash(), expected);

    assert_eq!(bundle.export_status(), ExportStatus::Pending);
    assert_eq!(bundle.integrity_status(), IntegrityStatus::Unverified);
    assert_eq!(bundle.audit_trail().entries.len(), 1);
    assert_eq!(bundle.audit_trail().entries[0].action, AuditAction::Created);
}

#[test]
fn test_event_without_diff_produces_single_genesis_item() {
    let bundle = assemble(false);

    assert_eq!(bundle.items().len(), 1);
    assert_eq!(bundle.items()[0].content_type, CONTENT_TYPE_AUDIT_EVENT);
    assert!(bundle.hash_chain()[0].is_genesis());

    let mut hasher = Sha256::new();
    hasher.update(bare(&bundle.hash_chain()[0].content_hash));
    let expected = format!("sha256:{}", hex::encode(hasher.finalize()));
    assert_eq!(bundle.root_hash(), expected);
}

#[test]
fn test_identical_inputs_yield_identical_hashes() {
    let first = assemble(true);
    let second = assemble(true);

    assert_ne!(first.bundle_id, second.bundle_id);
    assert_eq!(first.root_hash(), second.root_hash());
    let first_hashes: Vec<_> = first.items().iter().map(|i| &i.content_hash).collect();
    let second_hashes: Vec<_> = second.items().iter().map(|i| &i.content_hash).collect();
    assert_eq!(first_hashes, second_hashes);
}

#[test]
fn test_root_hash_recomputes_from_chain() {
    let bundle = assemble(true);
    assert_eq!(compute_root_hash(bundle.hash_chain()).unwrap(), bundle.root_hash());
}

#[test]
fn test_root_hash_depends_on_order() {
    let bundle = assemble(true);
    let hashes: Vec<&str> = bundle
        .hash_chain()
        .iter()
        .map(|e| e.content_hash.as_str())
        .collect();
    let reversed: Vec<&str> = hashes.iter().rev().copied().collect();

    assert_eq!(compute_root_hash_from_hashes(&hashes).unwrap(), bundle.root_hash());
    assert_ne!(compute_root_hash_from_hashes(&reversed).unwrap(), bundle.root_hash());
}

#[test]
fn test_metadata_shapes_scope_and_audit_entry() {
    let diff = scenario_diff();
    let bundle = BundleAssembler::default()
        .create_at(
            &scenario_event(),
            Some(&diff),
            &github_metadata(),
            RiskTier::L3,
            Some("bead-42"),
            fixed_now(),
        )
        .unwrap();

    assert_eq!(bundle.bead_id, "bead-42");
    assert_eq!(bundle.risk_tier, RiskTier::L3);
    assert_eq!(bundle.scope.risk_tier_assessed, RiskTier::L3);
    assert_eq!(
        bundle.scope.assertion_text,
        "Evidence of change to PR #7: Harden input validation"
    );

    let created = &bundle.audit_trail().entries[0];
    assert_eq!(created.actor.signer_id, "connector:github");
    assert_eq!(created.actor.display_name, "Test GitHub");
}

#[test]
fn test_retention_window_from_config() {
    let assembler = BundleAssembler::new(RetentionConfig {
        policy: "extended".to_string(),
        retention_days: 30,
        legal_hold: true,
        compliance_frameworks: vec!["SOC2".to_string()],
    })
    .unwrap();
    let bundle = assembler
        .create_at(
            &scenario_event(),
            None,
            &ArtifactMetadata::new(),
            RiskTier::L0,
            None,
            fixed_now(),
        )
        .unwrap();

    assert_eq!(bundle.retention.policy, "extended");
    assert!(bundle.retention.legal_hold);
    assert_eq!(
        bundle.retention.expires_at - bundle.retention.created_at,
        chrono::Duration::days(30)
    );
}

#[test]
fn test_serialized_bundle_verifies_after_round_trip() {
    let mut bundle = assemble(true);
    let json = serde_json::to_string(&bundle).unwrap();
    let restored: EvidenceBundle = serde_json::from_str(&json).unwrap();

    let report = verify_bundle(&restored);
    assert!(report.is_valid(), "{}", report.summary());

    let report = bundle.verify();
    assert!(report.is_valid());
    assert_eq!(bundle.integrity_status(), IntegrityStatus::Verified);
    assert!(bundle.verified_at().is_some());
}

#[test]
fn test_tampered_content_is_detected() {
    let bundle = assemble(true);
    let mut value = serde_json::to_value(&bundle).unwrap();
    value["items"][0]["content"]["stats"]["additions"] = serde_json::json!(600);

    let mut tampered: EvidenceBundle = serde_json::from_value(value).unwrap();
    let report = tampered.verify();

    assert!(!report.is_valid());
    assert_eq!(tampered.integrity_status(), IntegrityStatus::Failed);
    assert_eq!(
        tampered.audit_trail().entries.last().unwrap().action,
        AuditAction::VerificationFailed
    );
}

#[test]
fn test_tampered_root_hash_is_detected() {
    let bundle = assemble(false);
    let mut value = serde_json::to_value(&bundle).unwrap();
    value["immutability_proof"]["root_hash"] = serde_json::json!(format!("sha256:{}", "0".repeat(64)));

    let tampered: EvidenceBundle = serde_json::from_value(value).unwrap();
    let report = verify_bundle(&tampered);
    assert!(!report.is_valid());
    assert_ne!(report.claimed_root, report.recomputed_root);
}

#[test]
fn test_diff_changes_root_hash() {
    assert_ne!(assemble(true).root_hash(), assemble(false).root_hash());
}
