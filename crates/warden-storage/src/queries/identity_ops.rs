//! Users, tenants, roles, capabilities and memberships.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use warden_core::errors::WardenResult;

use crate::map_sqlite_err;

pub struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub disabled_at: Option<String>,
}

/// Role data attached to a membership.
pub struct MembershipRow {
    pub tenant_id: String,
    pub user_id: String,
    pub role_id: String,
    pub role_priority: i64,
    pub is_owner: bool,
}

pub struct InsertRoleParams<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub name: &'a str,
    pub priority: i64,
    pub is_owner: bool,
    pub capabilities: &'a [&'a str],
}

pub fn insert_user(
    conn: &Connection,
    id: &str,
    email: Option<&str>,
    display_name: &str,
    created_at: &str,
) -> WardenResult<()> {
    debug!(user_id = id, "inserting user");
    conn.execute(
        "INSERT INTO users (id, email, display_name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, email, display_name, created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> WardenResult<Option<UserRow>> {
    debug!(user_id = id, "getting user");
    conn.query_row(
        "SELECT id, email, display_name, disabled_at FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                disabled_at: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(map_sqlite_err)
}

pub fn find_user_id_by_email(conn: &Connection, email: &str) -> WardenResult<Option<String>> {
    conn.query_row(
        "SELECT id FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_sqlite_err)
}

/// Mark a user disabled. Returns false if the user was already disabled or missing.
pub fn disable_user(conn: &Connection, id: &str, disabled_at: &str) -> WardenResult<bool> {
    debug!(user_id = id, "disabling user");
    let changed = conn
        .execute(
            "UPDATE users SET disabled_at = ?2 WHERE id = ?1 AND disabled_at IS NULL",
            params![id, disabled_at],
        )
        .map_err(map_sqlite_err)?;
    Ok(changed == 1)
}

pub fn insert_tenant(conn: &Connection, id: &str, name: &str, created_at: &str) -> WardenResult<()> {
    debug!(tenant_id = id, "inserting tenant");
    conn.execute(
        "INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![id, name, created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Insert a role together with its capability strings.
pub fn insert_role(conn: &Connection, p: &InsertRoleParams<'_>) -> WardenResult<()> {
    debug!(role_id = p.id, tenant_id = p.tenant_id, "inserting role");
    conn.execute(
        "INSERT INTO roles (id, tenant_id, name, priority, is_owner) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![p.id, p.tenant_id, p.name, p.priority, p.is_owner],
    )
    .map_err(map_sqlite_err)?;
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO role_capabilities (role_id, capability) VALUES (?1, ?2)")
        .map_err(map_sqlite_err)?;
    for capability in p.capabilities {
        stmt.execute(params![p.id, capability]).map_err(map_sqlite_err)?;
    }
    Ok(())
}

/// True when `role_id` exists and belongs to `tenant_id`.
pub fn role_in_tenant(conn: &Connection, role_id: &str, tenant_id: &str) -> WardenResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM roles WHERE id = ?1 AND tenant_id = ?2",
            params![role_id, tenant_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_err)?;
    Ok(found.is_some())
}

pub fn get_membership(
    conn: &Connection,
    tenant_id: &str,
    user_id: &str,
) -> WardenResult<Option<MembershipRow>> {
    debug!(tenant_id, user_id, "getting membership");
    conn.query_row(
        "SELECT m.tenant_id, m.user_id, m.role_id, r.priority, r.is_owner
         FROM memberships m JOIN roles r ON r.id = m.role_id
         WHERE m.tenant_id = ?1 AND m.user_id = ?2",
        params![tenant_id, user_id],
        |row| {
            Ok(MembershipRow {
                tenant_id: row.get(0)?,
                user_id: row.get(1)?,
                role_id: row.get(2)?,
                role_priority: row.get(3)?,
                is_owner: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(map_sqlite_err)
}

pub fn is_member(conn: &Connection, tenant_id: &str, user_id: &str) -> WardenResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM memberships WHERE tenant_id = ?1 AND user_id = ?2",
            params![tenant_id, user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_err)?;
    Ok(found.is_some())
}

/// Create or re-role a membership.
pub fn upsert_membership(
    conn: &Connection,
    tenant_id: &str,
    user_id: &str,
    role_id: &str,
    created_at: &str,
) -> WardenResult<()> {
    debug!(tenant_id, user_id, role_id, "upserting membership");
    conn.execute(
        "INSERT INTO memberships (tenant_id, user_id, role_id, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (tenant_id, user_id) DO UPDATE SET role_id = excluded.role_id",
        params![tenant_id, user_id, role_id, created_at],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn role_capabilities(conn: &Connection, role_id: &str) -> WardenResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT capability FROM role_capabilities WHERE role_id = ?1 ORDER BY capability")
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![role_id], |row| row.get(0))
        .map_err(map_sqlite_err)?;
    rows.collect::<Result<Vec<String>, _>>().map_err(map_sqlite_err)
}

/// The tenant of the user's oldest membership, used to attribute
/// tenant-less events such as failed logins.
pub fn primary_tenant_for_user(conn: &Connection, user_id: &str) -> WardenResult<Option<String>> {
    conn.query_row(
        "SELECT tenant_id FROM memberships WHERE user_id = ?1 ORDER BY created_at, tenant_id LIMIT 1",
        params![user_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_sqlite_err)
}
