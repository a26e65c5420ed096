//! Appends entries to the chain.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::{debug, error};

use warden_core::clock::Clock;
use warden_core::config::AuditConfig;
use warden_core::errors::WardenResult;
use warden_core::models::{AuditLogEntry, NewAuditEntry};

use super::hash::compute_entry_hash;
use crate::queries::audit_ops;
use crate::transaction::{with_immediate_transaction, with_savepoint};

/// How an append failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    /// The failure propagates; an enclosing unit of work rolls back.
    Strict,
    /// The failure is logged (throttled) and swallowed. Inside a transaction
    /// the attempt runs under a savepoint so the enclosing work survives.
    BestEffort,
}

/// Serializes appends through the caller's connection and stamps entries with
/// the injected clock.
#[derive(Debug, Clone)]
pub struct AuditChainWriter {
    clock: Arc<dyn Clock>,
    error_log_interval: Duration,
    last_error_log: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AuditChainWriter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, &AuditConfig::default())
    }

    pub fn with_config(clock: Arc<dyn Clock>, config: &AuditConfig) -> Self {
        Self {
            clock,
            error_log_interval: Duration::seconds(config.error_log_interval_secs as i64),
            last_error_log: Arc::new(Mutex::new(None)),
        }
    }

    /// Append one entry. Returns the stored link, or `None` when a
    /// best-effort append failed.
    ///
    /// Called with the connection of the current unit of work, the append
    /// commits or rolls back with it. Called outside a transaction, it takes
    /// its own `BEGIN IMMEDIATE` so reading the tail and inserting the next
    /// link cannot interleave with another writer.
    pub fn append(
        &self,
        conn: &Connection,
        entry: NewAuditEntry,
        mode: AuditMode,
    ) -> WardenResult<Option<AuditLogEntry>> {
        match mode {
            AuditMode::Strict => self.append_strict(conn, entry).map(Some),
            AuditMode::BestEffort => {
                let event = entry.event;
                let attempt = if conn.is_autocommit() {
                    self.append_strict(conn, entry)
                } else {
                    with_savepoint(conn, "warden_audit", |c| self.append_strict(c, entry))
                };
                match attempt {
                    Ok(stored) => Ok(Some(stored)),
                    Err(e) => {
                        self.log_failure(event.as_str(), &e);
                        Ok(None)
                    }
                }
            }
        }
    }

    fn append_strict(&self, conn: &Connection, entry: NewAuditEntry) -> WardenResult<AuditLogEntry> {
        if conn.is_autocommit() {
            with_immediate_transaction(conn, |c| self.insert_with_fallback(c, entry))
        } else {
            self.insert_with_fallback(conn, entry)
        }
    }

    /// An actor id that no longer resolves to a user is moved into metadata
    /// and the entry is retried once without it.
    fn insert_with_fallback(&self, conn: &Connection, entry: NewAuditEntry) -> WardenResult<AuditLogEntry> {
        match self.insert_link(conn, &entry) {
            Err(e) if e.is_foreign_key_violation() && entry.actor_id.is_some() => {
                debug!(event = entry.event.as_str(), "actor unknown, recording anonymized audit entry");
                self.insert_link(conn, &anonymize(entry))
            }
            other => other,
        }
    }

    fn insert_link(&self, conn: &Connection, entry: &NewAuditEntry) -> WardenResult<AuditLogEntry> {
        let (chain_index, prev_hash) = match audit_ops::tail(conn)? {
            Some((index, hash)) => (index + 1, Some(hash)),
            None => (1, None),
        };
        let mut link = AuditLogEntry {
            chain_index,
            prev_hash,
            hash: String::new(),
            tenant_id: entry.tenant_id.clone(),
            actor_id: entry.actor_id.clone(),
            event_type: entry.event.as_str().to_string(),
            ip: entry.ip.clone(),
            user_agent: entry.user_agent.clone(),
            metadata: entry.metadata.clone(),
            created_at: self.clock.now(),
        };
        link.hash = compute_entry_hash(&link);
        audit_ops::insert_entry(conn, &link)?;
        debug!(chain_index, event = %link.event_type, "audit entry appended");
        Ok(link)
    }

    fn log_failure(&self, event: &str, err: &warden_core::WardenError) {
        let now = self.clock.now();
        let mut last = self.last_error_log.lock().unwrap_or_else(|e| e.into_inner());
        let due = (*last).map_or(true, |at| now - at >= self.error_log_interval);
        if due {
            *last = Some(now);
            error!(event, error = %err, "best-effort audit append failed");
        }
    }
}

fn anonymize(mut entry: NewAuditEntry) -> NewAuditEntry {
    let actor = entry.actor_id.take();
    entry.metadata = match entry.metadata {
        Value::Object(mut map) => {
            map.insert("actorUserId".into(), json!(actor));
            Value::Object(map)
        }
        other => json!({ "actorUserId": actor, "metadata": other }),
    };
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::models::AuditEvent;

    #[test]
    fn anonymize_moves_actor_into_metadata() {
        let entry = NewAuditEntry::new(AuditEvent::CaseCreated, json!({"caseId": "c1"})).actor("gone");
        let out = anonymize(entry);
        assert!(out.actor_id.is_none());
        assert_eq!(out.metadata, json!({"caseId": "c1", "actorUserId": "gone"}));
    }

    #[test]
    fn anonymize_wraps_non_object_metadata() {
        let entry = NewAuditEntry::new(AuditEvent::CaseCreated, json!([1, 2])).actor("gone");
        let out = anonymize(entry);
        assert_eq!(out.metadata, json!({"actorUserId": "gone", "metadata": [1, 2]}));
    }
}
