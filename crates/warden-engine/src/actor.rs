//! Fresh actor resolution from users, memberships and role capabilities.

use rusqlite::Connection;

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{Actor, Capability};
use warden_storage::queries::identity_ops;

/// Load `user_id` as an actor of `tenant_id`.
///
/// Unknown capability strings on the role are ignored.
pub fn resolve_actor(conn: &Connection, user_id: &str, tenant_id: &str) -> WardenResult<Actor> {
    let user = identity_ops::get_user(conn, user_id)?.ok_or_else(|| WardenError::not_found("User"))?;
    let membership = identity_ops::get_membership(conn, tenant_id, user_id)?
        .ok_or_else(|| WardenError::forbidden("Membership missing."))?;
    let capabilities = identity_ops::role_capabilities(conn, &membership.role_id)?
        .iter()
        .filter_map(|raw| Capability::parse(raw))
        .collect();

    Ok(Actor {
        user_id: user.id,
        disabled: user.disabled_at.is_some(),
        tenant_id: membership.tenant_id,
        capabilities,
        role_priority: membership.role_priority,
        is_owner: membership.is_owner,
    })
}
