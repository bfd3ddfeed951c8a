//! Root Hash Aggregation
//!
//! Folds the chain's content hashes into a single digest: the bare hex
//! digests are concatenated in chain order and hashed once more. This is a
//! sequential fold rather than a Merkle tree, so it supports full
//! recomputation but not inclusion proofs.

use tracing::debug;

use crate::error::Result;
use crate::kernel::chain::HashChainEntry;
use crate::kernel::hash::{digest_hex, hash_bytes};

/// Compute the root hash over chain entries in order
pub fn compute_root_hash(chain: &[HashChainEntry]) -> Result<String> {
    let hashes: Vec<&str> = chain.iter().map(|entry| entry.content_hash.as_str()).collect();
    compute_root_hash_from_hashes(&hashes)
}

/// Compute the root hash over an ordered list of prefixed content hashes
pub fn compute_root_hash_from_hashes<S: AsRef<str>>(hashes: &[S]) -> Result<String> {
    let mut concatenated = String::with_capacity(hashes.len() * 64);
    for hash in hashes {
        concatenated.push_str(digest_hex(hash.as_ref())?);
    }

    let root = hash_bytes(concatenated.as_bytes());
    debug!("Root hash over {} entries: {}", hashes.len(), root);
    Ok(root)
}

/// Verify a claimed root hash against the chain
pub fn verify_root_hash(chain: &[HashChainEntry], claimed_root: &str) -> Result<bool> {
    Ok(compute_root_hash(chain)? == claimed_root)
}
