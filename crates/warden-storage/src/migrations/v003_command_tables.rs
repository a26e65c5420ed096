//! v003: command toggles, execution history, approval requests, tenant
//! settings, sensitive-mode grants, login attempts.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS command_toggles (
            tenant_id  TEXT NOT NULL REFERENCES tenants(id),
            command_id TEXT NOT NULL,
            enabled    INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, command_id)
        );

        CREATE TABLE IF NOT EXISTS command_executions (
            id          TEXT PRIMARY KEY,
            tenant_id   TEXT NOT NULL,
            command_id  TEXT NOT NULL,
            risk_level  TEXT NOT NULL,
            actor_id    TEXT NOT NULL,
            approval_id TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_executions_cooldown
            ON command_executions(tenant_id, actor_id, command_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_executions_risk
            ON command_executions(tenant_id, actor_id, risk_level, created_at);

        CREATE TABLE IF NOT EXISTS approval_requests (
            id           TEXT PRIMARY KEY,
            tenant_id    TEXT NOT NULL,
            status       TEXT NOT NULL,
            risk_level   TEXT NOT NULL,
            requested_by TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            decided_at   TEXT,
            decided_by   TEXT,
            reason       TEXT,
            CHECK (decided_by IS NULL OR decided_by <> requested_by)
        );

        CREATE INDEX IF NOT EXISTS idx_approvals_inbox
            ON approval_requests(tenant_id, status, created_at);
        CREATE INDEX IF NOT EXISTS idx_approvals_requester
            ON approval_requests(tenant_id, requested_by, created_at);

        -- A decision is written once and never changed.
        CREATE TRIGGER IF NOT EXISTS approval_decision_immutable
        BEFORE UPDATE ON approval_requests
        WHEN OLD.status <> 'PENDING'
        BEGIN
            SELECT RAISE(ABORT, 'approval request already decided');
        END;

        CREATE TABLE IF NOT EXISTS tenant_settings (
            tenant_id  TEXT NOT NULL,
            key        TEXT NOT NULL,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, key)
        );

        CREATE TABLE IF NOT EXISTS sensitive_mode_grants (
            session_token TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            enabled_at    TEXT NOT NULL,
            expires_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS login_attempts (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            email      TEXT NOT NULL,
            user_id    TEXT,
            success    INTEGER NOT NULL,
            ip         TEXT,
            user_agent TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_login_attempts_email
            ON login_attempts(email, success, created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}
