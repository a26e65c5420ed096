//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, busy_timeout, foreign_keys ON.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::map_sqlite_err;

/// Apply write-side pragmas.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> WardenResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(map_sqlite_err)
}

/// Apply read-side pragmas. No journal changes on read-only handles.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> WardenResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        PRAGMA query_only = ON;
        "
    ))
    .map_err(map_sqlite_err)
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> WardenResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(map_sqlite_err)?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
