use rusqlite::Connection;
use serde::Serialize;

use warden_core::errors::WardenResult;
use warden_core::models::AuditLogEntry;

use super::hash::compute_entry_hash;
use crate::queries::audit_ops;

/// Outcome of walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainVerification {
    Valid { entries: usize },
    /// First position at which the chain stops checking out.
    Diverged { chain_index: i64, reason: String },
}

impl ChainVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Check that `entries` (in chain order, starting at index 1) form an intact chain.
pub fn verify(entries: &[AuditLogEntry]) -> ChainVerification {
    let mut prev: Option<&AuditLogEntry> = None;
    for (pos, entry) in entries.iter().enumerate() {
        let expected_index = pos as i64 + 1;
        if entry.chain_index != expected_index {
            return ChainVerification::Diverged {
                chain_index: expected_index,
                reason: format!("expected chain index {expected_index}, found {}", entry.chain_index),
            };
        }
        let expected_prev = prev.map(|p| p.hash.as_str());
        if entry.prev_hash.as_deref() != expected_prev {
            return ChainVerification::Diverged {
                chain_index: entry.chain_index,
                reason: "previous hash does not match predecessor".to_string(),
            };
        }
        if compute_entry_hash(entry) != entry.hash {
            return ChainVerification::Diverged {
                chain_index: entry.chain_index,
                reason: "stored hash does not match entry contents".to_string(),
            };
        }
        prev = Some(entry);
    }
    ChainVerification::Valid {
        entries: entries.len(),
    }
}

/// Load the whole stored chain and [`verify`] it.
pub fn verify_stored_chain(conn: &Connection) -> WardenResult<ChainVerification> {
    let entries = audit_ops::list_entries(conn, None)?;
    let outcome = verify(&entries);
    if let ChainVerification::Diverged { chain_index, reason } = &outcome {
        tracing::warn!(chain_index, reason = %reason, "audit chain verification failed");
    }
    Ok(outcome)
}
