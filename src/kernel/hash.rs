//! Content Hashing
//!
//! SHA-256 digests over canonical JSON, rendered as `sha256:<hex>` so the
//! algorithm travels with every hash value.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{ConnectorError, Result};
use crate::kernel::canonical::canonical_json;

/// Algorithm tag prefixed to every digest
pub const HASH_ALGORITHM: &str = "sha256";

/// Compute the content hash of a structured value
pub fn compute_content_hash<T: Serialize + ?Sized>(content: &T) -> Result<String> {
    let canonical = canonical_json(content)?;
    Ok(hash_bytes(&canonical))
}

/// Hash raw bytes and prefix the algorithm tag
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}:{}", HASH_ALGORITHM, hex::encode(hasher.finalize()))
}

/// Strip the algorithm prefix, returning the bare hex digest
pub fn digest_hex(hash: &str) -> Result<&str> {
    let (algorithm, digest) = hash
        .split_once(':')
        .ok_or_else(|| ConnectorError::ContentError(format!("Hash missing algorithm prefix: {}", hash)))?;

    if algorithm != HASH_ALGORITHM {
        return Err(ConnectorError::ContentError(format!(
            "Unsupported hash algorithm: {}",
            algorithm
        )));
    }

    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return Err(ConnectorError::ContentError(format!("Malformed digest: {}", hash)));
    }

    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_format() {
        let hash = compute_content_hash(&json!({"a": 1})).unwrap();
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), 71); // "sha256:" + 64 hex chars
        assert_eq!(hash, hash.to_lowercase());
    }

    #[test]
    fn test_hash_deterministic_across_key_order() {
        let a = json!({"x": 1, "y": {"b": 2, "a": 1}});
        let b = json!({"y": {"a": 1, "b": 2}, "x": 1});

        assert_eq!(compute_content_hash(&a).unwrap(), compute_content_hash(&a).unwrap());
        assert_eq!(compute_content_hash(&a).unwrap(), compute_content_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_matches_known_vector() {
        // sha256 of the canonical form `{"a":1}`
        let expected = hash_bytes(br#"{"a":1}"#);
        assert_eq!(compute_content_hash(&json!({"a": 1})).unwrap(), expected);

        // sha256 of the empty string
        assert_eq!(
            hash_bytes(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(
            compute_content_hash(&json!({"a": 1})).unwrap(),
            compute_content_hash(&json!({"a": 2})).unwrap()
        );
    }

    #[test]
    fn test_digest_hex() {
        let hash = hash_bytes(b"evidence");
        assert_eq!(digest_hex(&hash).unwrap(), &hash[7..]);
        assert!(digest_hex("nocolon").is_err());
        assert!(digest_hex("md5:abcd").is_err());
        assert!(digest_hex("sha256:xyz").is_err());
    }
}
