//! v004: hash-chained audit log and security events.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS audit_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            chain_index INTEGER NOT NULL UNIQUE,
            prev_hash   TEXT,
            hash        TEXT NOT NULL,
            tenant_id   TEXT,
            actor_id    TEXT REFERENCES users(id),
            event_type  TEXT NOT NULL,
            ip          TEXT,
            user_agent  TEXT,
            metadata    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_tenant ON audit_log(tenant_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_audit_event ON audit_log(event_type, created_at);

        -- Append-only.
        CREATE TRIGGER IF NOT EXISTS audit_log_no_update
        BEFORE UPDATE ON audit_log
        BEGIN
            SELECT RAISE(ABORT, 'audit_log is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
        BEFORE DELETE ON audit_log
        BEGIN
            SELECT RAISE(ABORT, 'audit_log is append-only');
        END;

        CREATE TABLE IF NOT EXISTS security_events (
            id         TEXT PRIMARY KEY,
            tenant_id  TEXT,
            actor_id   TEXT,
            severity   TEXT NOT NULL,
            event_type TEXT NOT NULL,
            metadata   TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_security_events_window
            ON security_events(event_type, tenant_id, actor_id, created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}
