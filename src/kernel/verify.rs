//! Bundle Verification
//!
//! Recomputes every hash in a bundle from its stored content and reports each
//! mismatch. A bundle verifies only when item hashes, chain links and the
//! root hash all reproduce exactly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::bundle::types::EvidenceBundle;
use crate::error::{ConnectorError, Result};
use crate::kernel::chain::verify_chain_links;
use crate::kernel::hash::{compute_content_hash, HASH_ALGORITHM};
use crate::kernel::root::compute_root_hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub bundle_id: String,
    pub item_count: usize,
    pub chain_length: usize,
    pub claimed_root: String,
    /// Empty when the chain could not be aggregated
    pub recomputed_root: String,
    pub failures: Vec<String>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Bundle {} verified: {} items, root {}",
                self.bundle_id, self.item_count, self.recomputed_root
            )
        } else {
            format!(
                "Bundle {} failed verification: {}",
                self.bundle_id,
                self.failures.join("; ")
            )
        }
    }
}

/// Recompute and check every hash in the bundle
pub fn verify_bundle(bundle: &EvidenceBundle) -> VerificationReport {
    let items = bundle.items();
    let proof = bundle.immutability_proof();
    let chain = &proof.hash_chain;
    let mut failures = Vec::new();

    if proof.algorithm != HASH_ALGORITHM {
        failures.push(format!("Unsupported hash algorithm: {}", proof.algorithm));
    }

    for (index, item) in items.iter().enumerate() {
        if item.sequence != index as u64 {
            failures.push(format!(
                "Item {} has sequence {}, expected {}",
                item.item_id, item.sequence, index
            ));
        }

        match compute_content_hash(&item.content) {
            Ok(hash) if hash == item.content_hash => {}
            Ok(hash) => failures.push(format!(
                "Content hash mismatch for item {}: stored {}, computed {}",
                index, item.content_hash, hash
            )),
            Err(e) => failures.push(format!("Item {} could not be hashed: {}", index, e)),
        }
    }

    if chain.len() != items.len() {
        failures.push(format!(
            "Chain length {} does not match item count {}",
            chain.len(),
            items.len()
        ));
    }

    for (index, (entry, item)) in chain.iter().zip(items.iter()).enumerate() {
        if entry.content_hash != item.content_hash {
            failures.push(format!("Chain entry {} does not match item hash", index));
        }
        if entry.content_id != item.item_id {
            failures.push(format!("Chain entry {} references unknown item {}", index, entry.content_id));
        }
    }

    if let Err(e) = verify_chain_links(chain) {
        failures.push(e);
    }

    let recomputed_root = match compute_root_hash(chain) {
        Ok(root) => {
            if root != proof.root_hash {
                failures.push(format!(
                    "Root hash mismatch: stored {}, computed {}",
                    proof.root_hash, root
                ));
            }
            root
        }
        Err(e) => {
            failures.push(format!("Root hash could not be computed: {}", e));
            String::new()
        }
    };

    let report = VerificationReport {
        bundle_id: bundle.bundle_id.clone(),
        item_count: items.len(),
        chain_length: chain.len(),
        claimed_root: proof.root_hash.clone(),
        recomputed_root,
        failures,
    };

    if report.is_valid() {
        debug!("{}", report.summary());
    } else {
        warn!("{}", report.summary());
    }
    report
}

/// Load a bundle from a JSON file
pub fn load_bundle_from_file<P: AsRef<Path>>(path: P) -> Result<EvidenceBundle> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        ConnectorError::VerificationError(format!("Failed to read {:?}: {}", path, e))
    })?;

    let bundle: EvidenceBundle = serde_json::from_str(&contents).map_err(|e| {
        ConnectorError::VerificationError(format!("Failed to parse bundle {:?}: {}", path, e))
    })?;

    info!("Loaded bundle {} from {:?}", bundle.bundle_id, path);
    Ok(bundle)
}
