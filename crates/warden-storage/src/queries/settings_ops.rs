//! Per-tenant settings documents.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::errors::WardenResult;

use crate::map_sqlite_err;

pub fn get_setting(conn: &Connection, tenant_id: &str, key: &str) -> WardenResult<Option<String>> {
    conn.query_row(
        "SELECT value_json FROM tenant_settings WHERE tenant_id = ?1 AND key = ?2",
        params![tenant_id, key],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_sqlite_err)
}

pub fn upsert_setting(
    conn: &Connection,
    tenant_id: &str,
    key: &str,
    value_json: &str,
    updated_at: &str,
) -> WardenResult<()> {
    debug!(tenant_id, key, "upserting setting");
    conn.execute(
        "INSERT INTO tenant_settings (tenant_id, key, value_json, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (tenant_id, key)
         DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        params![tenant_id, key, value_json, updated_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}
