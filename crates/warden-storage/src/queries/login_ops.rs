//! Login attempt history.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::errors::WardenResult;

use crate::{map_sqlite_err, parse_ts};

pub struct InsertLoginAttemptParams<'a> {
    pub email: &'a str,
    pub user_id: Option<&'a str>,
    pub success: bool,
    pub ip: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub created_at: &'a str,
}

pub fn insert_attempt(conn: &Connection, p: &InsertLoginAttemptParams<'_>) -> WardenResult<()> {
    debug!(email = p.email, success = p.success, "recording login attempt");
    conn.execute(
        "INSERT INTO login_attempts (email, user_id, success, ip, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![p.email, p.user_id, p.success, p.ip, p.user_agent, p.created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Failed attempts for `email` at or after `since`.
pub fn count_failures_since(conn: &Connection, email: &str, since: &str) -> WardenResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM login_attempts WHERE email = ?1 AND success = 0 AND created_at >= ?2",
        params![email, since],
        |row| row.get(0),
    )
    .map_err(map_sqlite_err)
}

/// Most recent failed attempt for `email` at or after `since`.
pub fn latest_failure_since(
    conn: &Connection,
    email: &str,
    since: &str,
) -> WardenResult<Option<chrono::DateTime<chrono::Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT created_at FROM login_attempts
             WHERE email = ?1 AND success = 0 AND created_at >= ?2
             ORDER BY created_at DESC LIMIT 1",
            params![email, since],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_err)?;
    raw.as_deref().map(parse_ts).transpose()
}
