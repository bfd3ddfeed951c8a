//! Canonical JSON Serialization
//!
//! Deterministic byte encoding of evidence content following RFC 8785 (JCS):
//! keys sorted lexicographically, no insignificant whitespace, UTF-8 output,
//! and ECMAScript number formatting (`1.0` encodes as `1`).

use serde::Serialize;

use crate::error::{ConnectorError, Result};

/// Serialize a value to canonical JSON bytes
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_jcs::to_vec(value)
        .map_err(|e| ConnectorError::ContentError(format!("Failed to canonicalize content: {}", e)))
}

/// Serialize a value to a canonical JSON string
pub fn canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_jcs::to_string(value)
        .map_err(|e| ConnectorError::ContentError(format!("Failed to canonicalize content: {}", e)))
}
