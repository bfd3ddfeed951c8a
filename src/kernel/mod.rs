//! Hashing Kernel
//!
//! Canonical serialization, content hashing, hash chains and root hash
//! aggregation for evidence bundles. Everything here is pure and
//! deterministic: identical content always yields identical hashes.

pub mod canonical;
pub mod chain;
pub mod hash;
pub mod root;
pub mod verify;

pub use canonical::{canonical_json, canonical_string};
pub use chain::{build_hash_chain, HashChainEntry};
pub use hash::{compute_content_hash, HASH_ALGORITHM};
pub use root::{compute_root_hash, compute_root_hash_from_hashes, verify_root_hash};
pub use verify::{load_bundle_from_file, verify_bundle, VerificationReport};
