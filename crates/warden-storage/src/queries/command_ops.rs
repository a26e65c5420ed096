//! Command toggles and execution history.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::{CommandExecutionRecord, RiskLevel};

use crate::{fmt_ts, map_sqlite_err, parse_ts};

/// Stored toggle for a command, if any.
pub fn get_toggle(conn: &Connection, tenant_id: &str, command_id: &str) -> WardenResult<Option<bool>> {
    conn.query_row(
        "SELECT enabled FROM command_toggles WHERE tenant_id = ?1 AND command_id = ?2",
        params![tenant_id, command_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_sqlite_err)
}

pub fn upsert_toggle(
    conn: &Connection,
    tenant_id: &str,
    command_id: &str,
    enabled: bool,
    updated_at: &str,
) -> WardenResult<()> {
    debug!(tenant_id, command_id, enabled, "upserting command toggle");
    conn.execute(
        "INSERT INTO command_toggles (tenant_id, command_id, enabled, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (tenant_id, command_id)
         DO UPDATE SET enabled = excluded.enabled, updated_at = excluded.updated_at",
        params![tenant_id, command_id, enabled, updated_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn insert_execution(conn: &Connection, record: &CommandExecutionRecord) -> WardenResult<()> {
    debug!(
        execution_id = %record.id,
        command_id = %record.command_id,
        approval_id = ?record.approval_id,
        "inserting command execution"
    );
    conn.execute(
        "INSERT INTO command_executions (id, tenant_id, command_id, risk_level, actor_id, approval_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.tenant_id,
            record.command_id,
            record.risk_level.as_str(),
            record.actor_id,
            record.approval_id,
            fmt_ts(&record.created_at),
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Most recent execution of `command_id` by `actor_id` at or after `since`.
pub fn latest_execution_since(
    conn: &Connection,
    tenant_id: &str,
    actor_id: &str,
    command_id: &str,
    since: &str,
) -> WardenResult<Option<chrono::DateTime<chrono::Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT created_at FROM command_executions
             WHERE tenant_id = ?1 AND actor_id = ?2 AND command_id = ?3 AND created_at >= ?4
             ORDER BY created_at DESC LIMIT 1",
            params![tenant_id, actor_id, command_id, since],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_err)?;
    raw.as_deref().map(parse_ts).transpose()
}

/// Executions of a given risk tier by `actor_id` at or after `since`.
pub fn count_executions_since(
    conn: &Connection,
    tenant_id: &str,
    actor_id: &str,
    risk_level: RiskLevel,
    since: &str,
) -> WardenResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM command_executions
         WHERE tenant_id = ?1 AND actor_id = ?2 AND risk_level = ?3 AND created_at >= ?4",
        params![tenant_id, actor_id, risk_level.as_str(), since],
        |row| row.get(0),
    )
    .map_err(map_sqlite_err)
}

pub fn list_executions(conn: &Connection, tenant_id: &str) -> WardenResult<Vec<CommandExecutionRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, tenant_id, command_id, risk_level, actor_id, approval_id, created_at
             FROM command_executions WHERE tenant_id = ?1 ORDER BY created_at, id",
        )
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![tenant_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(map_sqlite_err)?;

    let mut out = Vec::new();
    for row in rows {
        let (id, tenant_id, command_id, risk, actor_id, approval_id, created_at) =
            row.map_err(map_sqlite_err)?;
        out.push(CommandExecutionRecord {
            risk_level: RiskLevel::parse(&risk)
                .ok_or_else(|| crate::to_storage_err(format!("unknown risk level {risk:?}")))?,
            created_at: parse_ts(&created_at)?,
            id,
            tenant_id,
            command_id,
            actor_id,
            approval_id,
        });
    }
    Ok(out)
}
