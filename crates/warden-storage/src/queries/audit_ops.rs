//! Audit log rows. The table is append-only; there are no update or delete helpers.

use rusqlite::{params, Connection, OptionalExtension, Row};

use warden_core::errors::WardenResult;
use warden_core::models::AuditLogEntry;

use crate::{fmt_ts, map_sqlite_err, parse_ts};

/// `(chain_index, hash)` of the newest entry, if any.
pub fn tail(conn: &Connection) -> WardenResult<Option<(i64, String)>> {
    conn.query_row(
        "SELECT chain_index, hash FROM audit_log ORDER BY chain_index DESC LIMIT 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(map_sqlite_err)
}

pub fn insert_entry(conn: &Connection, entry: &AuditLogEntry) -> WardenResult<()> {
    conn.execute(
        "INSERT INTO audit_log
            (chain_index, prev_hash, hash, tenant_id, actor_id, event_type, ip, user_agent, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.chain_index,
            entry.prev_hash,
            entry.hash,
            entry.tenant_id,
            entry.actor_id,
            entry.event_type,
            entry.ip,
            entry.user_agent,
            serde_json::to_string(&entry.metadata)?,
            fmt_ts(&entry.created_at),
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

struct RawEntry {
    chain_index: i64,
    prev_hash: Option<String>,
    hash: String,
    tenant_id: Option<String>,
    actor_id: Option<String>,
    event_type: String,
    ip: Option<String>,
    user_agent: Option<String>,
    metadata: String,
    created_at: String,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            chain_index: row.get(0)?,
            prev_hash: row.get(1)?,
            hash: row.get(2)?,
            tenant_id: row.get(3)?,
            actor_id: row.get(4)?,
            event_type: row.get(5)?,
            ip: row.get(6)?,
            user_agent: row.get(7)?,
            metadata: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_model(self) -> WardenResult<AuditLogEntry> {
        Ok(AuditLogEntry {
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: parse_ts(&self.created_at)?,
            chain_index: self.chain_index,
            prev_hash: self.prev_hash,
            hash: self.hash,
            tenant_id: self.tenant_id,
            actor_id: self.actor_id,
            event_type: self.event_type,
            ip: self.ip,
            user_agent: self.user_agent,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "chain_index, prev_hash, hash, tenant_id, actor_id, event_type, ip, user_agent, metadata, created_at";

/// Entries in chain order, optionally restricted to one tenant.
pub fn list_entries(conn: &Connection, tenant_id: Option<&str>) -> WardenResult<Vec<AuditLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_log
             WHERE ?1 IS NULL OR tenant_id = ?1
             ORDER BY chain_index"
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![tenant_id], RawEntry::from_row)
        .map_err(map_sqlite_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite_err)?.into_model()?);
    }
    Ok(out)
}

/// Entries of one event type, in chain order.
pub fn list_by_event(conn: &Connection, event_type: &str) -> WardenResult<Vec<AuditLogEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_log WHERE event_type = ?1 ORDER BY chain_index"
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![event_type], RawEntry::from_row)
        .map_err(map_sqlite_err)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(map_sqlite_err)?.into_model()?);
    }
    Ok(out)
}

pub fn count(conn: &Connection) -> WardenResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
        .map_err(map_sqlite_err)
}
