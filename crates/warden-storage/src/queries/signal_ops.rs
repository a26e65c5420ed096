//! Security signals.

use rusqlite::{params, Connection};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::{SecuritySignal, Severity};

use crate::{fmt_ts, map_sqlite_err, parse_ts, to_storage_err};

pub fn insert_signal(conn: &Connection, signal: &SecuritySignal) -> WardenResult<()> {
    debug!(
        event_type = %signal.event_type,
        severity = signal.severity.as_str(),
        "inserting security signal"
    );
    conn.execute(
        "INSERT INTO security_events (id, tenant_id, actor_id, severity, event_type, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            signal.id,
            signal.tenant_id,
            signal.actor_id,
            signal.severity.as_str(),
            signal.event_type,
            serde_json::to_string(&signal.metadata)?,
            fmt_ts(&signal.created_at),
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// True when a signal of `event_type` for this tenant/actor exists at or after `since`.
/// `None` matches rows whose column is NULL.
pub fn exists_since(
    conn: &Connection,
    event_type: &str,
    tenant_id: Option<&str>,
    actor_id: Option<&str>,
    since: &str,
) -> WardenResult<bool> {
    conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM security_events
             WHERE event_type = ?1 AND tenant_id IS ?2 AND actor_id IS ?3 AND created_at >= ?4
         )",
        params![event_type, tenant_id, actor_id, since],
        |row| row.get(0),
    )
    .map_err(map_sqlite_err)
}

/// True when a signal of `event_type` whose metadata `email` equals `email` exists at or after `since`.
pub fn exists_for_email_since(
    conn: &Connection,
    event_type: &str,
    email: &str,
    since: &str,
) -> WardenResult<bool> {
    conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM security_events
             WHERE event_type = ?1 AND json_extract(metadata, '$.email') = ?2 AND created_at >= ?3
         )",
        params![event_type, email, since],
        |row| row.get(0),
    )
    .map_err(map_sqlite_err)
}

/// All signals in insertion order, optionally filtered by event type.
pub fn list_signals(conn: &Connection, event_type: Option<&str>) -> WardenResult<Vec<SecuritySignal>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, tenant_id, actor_id, severity, event_type, metadata, created_at
             FROM security_events
             WHERE ?1 IS NULL OR event_type = ?1
             ORDER BY created_at, rowid",
        )
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![event_type], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(map_sqlite_err)?;

    let mut out = Vec::new();
    for row in rows {
        let (id, tenant_id, actor_id, severity, event_type, metadata, created_at) =
            row.map_err(map_sqlite_err)?;
        out.push(SecuritySignal {
            severity: Severity::parse(&severity)
                .ok_or_else(|| to_storage_err(format!("unknown severity {severity:?}")))?,
            metadata: serde_json::from_str(&metadata)?,
            created_at: parse_ts(&created_at)?,
            id,
            tenant_id,
            actor_id,
            event_type,
        });
    }
    Ok(out)
}
