//! v002: players, moderation actions, cases, reports.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS players (
            id         TEXT PRIMARY KEY,
            tenant_id  TEXT NOT NULL REFERENCES tenants(id),
            name       TEXT NOT NULL,
            status     TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_players_tenant ON players(tenant_id);

        CREATE TABLE IF NOT EXISTS actions (
            id               TEXT PRIMARY KEY,
            tenant_id        TEXT NOT NULL REFERENCES tenants(id),
            action_type      TEXT NOT NULL,
            player_id        TEXT NOT NULL REFERENCES players(id),
            moderator_id     TEXT NOT NULL,
            reason           TEXT NOT NULL,
            duration_minutes INTEGER,
            evidence_urls    TEXT NOT NULL DEFAULT '[]',
            created_at       TEXT NOT NULL,
            revoked_at       TEXT,
            revoked_by       TEXT,
            revoked_reason   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_actions_player ON actions(tenant_id, player_id);

        CREATE TABLE IF NOT EXISTS cases (
            id          TEXT PRIMARY KEY,
            tenant_id   TEXT NOT NULL REFERENCES tenants(id),
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'OPEN',
            assigned_to TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS case_players (
            case_id   TEXT NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
            player_id TEXT NOT NULL REFERENCES players(id),
            PRIMARY KEY (case_id, player_id)
        );

        CREATE TABLE IF NOT EXISTS reports (
            id                TEXT PRIMARY KEY,
            tenant_id         TEXT NOT NULL REFERENCES tenants(id),
            summary           TEXT NOT NULL,
            reporter_name     TEXT,
            reporter_contact  TEXT,
            accused_player_id TEXT,
            status            TEXT NOT NULL DEFAULT 'OPEN',
            case_id           TEXT REFERENCES cases(id),
            created_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reports_tenant_status ON reports(tenant_id, status);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}
