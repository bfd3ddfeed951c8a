//! Hash Chain Construction
//!
//! Links evidence items into a backward-referencing chain. Entry `i` carries
//! item `i`'s content hash and the content hash of entry `i - 1`; the first
//! entry has no predecessor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bundle::types::EvidenceItem;
use crate::error::{ConnectorError, Result};

/// One link of the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainEntry {
    pub sequence: u64,
    pub content_type: String,
    pub content_id: String,
    pub content_hash: String,
    /// `None` marks the genesis entry
    pub previous_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HashChainEntry {
    pub fn is_genesis(&self) -> bool {
        self.sequence == 0 && self.previous_hash.is_none()
    }
}

/// Build the hash chain for items in append order
pub fn build_hash_chain(items: &[EvidenceItem]) -> Result<Vec<HashChainEntry>> {
    let mut chain: Vec<HashChainEntry> = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let sequence = index as u64;
        if item.sequence != sequence {
            return Err(ConnectorError::ContentError(format!(
                "Evidence item {} has sequence {}, expected {}",
                item.item_id, item.sequence, sequence
            )));
        }

        let previous_hash = chain.last().map(|prev| prev.content_hash.clone());

        chain.push(HashChainEntry {
            sequence,
            content_type: item.content_type.clone(),
            content_id: item.item_id.clone(),
            content_hash: item.content_hash.clone(),
            previous_hash,
            timestamp: item.created_at,
        });
    }

    debug!("Built hash chain with {} entries", chain.len());
    Ok(chain)
}

/// Check the chain's sequence numbering and backward links
pub fn verify_chain_links(chain: &[HashChainEntry]) -> std::result::Result<(), String> {
    for (index, entry) in chain.iter().enumerate() {
        if entry.sequence != index as u64 {
            return Err(format!(
                "Chain entry {} has sequence {}",
                index, entry.sequence
            ));
        }

        let expected = match index {
            0 => None,
            _ => Some(&chain[index - 1].content_hash),
        };

        if entry.previous_hash.as_ref() != expected {
            return Err(format!(
                "Hash chain broken at entry {}: expected {:?}, got {:?}",
                index, expected, entry.previous_hash
            ));
        }
    }

    Ok(())
}
