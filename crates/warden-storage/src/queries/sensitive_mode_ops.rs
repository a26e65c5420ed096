//! Sensitive-mode grants keyed by session token.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::errors::WardenResult;
use warden_core::models::SensitiveModeGrant;

use crate::{fmt_ts, map_sqlite_err, parse_ts};

pub fn upsert_grant(conn: &Connection, grant: &SensitiveModeGrant) -> WardenResult<()> {
    debug!(user_id = %grant.user_id, "upserting sensitive mode grant");
    conn.execute(
        "INSERT INTO sensitive_mode_grants (session_token, user_id, enabled_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (session_token)
         DO UPDATE SET user_id = excluded.user_id, enabled_at = excluded.enabled_at,
                       expires_at = excluded.expires_at",
        params![
            grant.session_token,
            grant.user_id,
            fmt_ts(&grant.enabled_at),
            fmt_ts(&grant.expires_at),
        ],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn get_grant(conn: &Connection, session_token: &str) -> WardenResult<Option<SensitiveModeGrant>> {
    let raw: Option<(String, String, String, String)> = conn
        .query_row(
            "SELECT session_token, user_id, enabled_at, expires_at
             FROM sensitive_mode_grants WHERE session_token = ?1",
            params![session_token],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()
        .map_err(map_sqlite_err)?;

    raw.map(|(session_token, user_id, enabled_at, expires_at)| {
        Ok(SensitiveModeGrant {
            session_token,
            user_id,
            enabled_at: parse_ts(&enabled_at)?,
            expires_at: parse_ts(&expires_at)?,
        })
    })
    .transpose()
}

pub fn delete_grant(conn: &Connection, session_token: &str) -> WardenResult<usize> {
    debug!("deleting sensitive mode grant");
    conn.execute(
        "DELETE FROM sensitive_mode_grants WHERE session_token = ?1",
        params![session_token],
    )
    .map_err(map_sqlite_err)
}

/// Drop every grant held by `user_id`. Returns the number removed.
pub fn delete_grants_for_user(conn: &Connection, user_id: &str) -> WardenResult<usize> {
    debug!(user_id, "deleting all sensitive mode grants for user");
    conn.execute(
        "DELETE FROM sensitive_mode_grants WHERE user_id = ?1",
        params![user_id],
    )
    .map_err(map_sqlite_err)
}
