//! v001: users, tenants, roles with their capabilities, memberships.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> WardenResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id           TEXT PRIMARY KEY,
            email        TEXT UNIQUE,
            display_name TEXT NOT NULL,
            disabled_at  TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tenants (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS roles (
            id        TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            name      TEXT NOT NULL,
            priority  INTEGER NOT NULL DEFAULT 0,
            is_owner  INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_roles_tenant ON roles(tenant_id);

        CREATE TABLE IF NOT EXISTS role_capabilities (
            role_id    TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
            capability TEXT NOT NULL,
            PRIMARY KEY (role_id, capability)
        );

        CREATE TABLE IF NOT EXISTS memberships (
            tenant_id  TEXT NOT NULL REFERENCES tenants(id),
            user_id    TEXT NOT NULL REFERENCES users(id),
            role_id    TEXT NOT NULL REFERENCES roles(id),
            created_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, user_id)
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}
