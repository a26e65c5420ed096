//! Seeding helpers shared by the Warden integration tests.
//!
//! Everything here panics on failure; it is only ever linked into tests and
//! benches.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

use warden_core::clock::ManualClock;
use warden_core::models::SecuritySettings;
use warden_core::security::RoleTemplate;
use warden_storage::queries::{identity_ops, moderation_ops, settings_ops};
use warden_storage::{fmt_ts, StorageEngine};

/// Fixed starting instant for deterministic tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixed test instant is ambiguous"))
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(t0()))
}

fn ts() -> String {
    fmt_ts(&t0())
}

pub fn seed_user(conn: &Connection, id: &str) {
    let email = format!("{id}@example.test");
    identity_ops::insert_user(conn, id, Some(&email), id, &ts())
        .unwrap_or_else(|e| panic!("seed user {id}: {e}"));
}

pub fn seed_tenant(conn: &Connection, id: &str) {
    identity_ops::insert_tenant(conn, id, &format!("Community {id}"), &ts())
        .unwrap_or_else(|e| panic!("seed tenant {id}: {e}"));
}

/// Insert `template` as a role of `tenant_id`. Returns the role id.
pub fn seed_role(conn: &Connection, tenant_id: &str, template: RoleTemplate) -> String {
    let id = format!("{tenant_id}-{}", template.name().to_lowercase().replace(' ', "-"));
    let caps: Vec<&str> = template.capabilities().iter().map(|c| c.as_str()).collect();
    identity_ops::insert_role(
        conn,
        &identity_ops::InsertRoleParams {
            id: &id,
            tenant_id,
            name: template.name(),
            priority: template.priority(),
            is_owner: template == RoleTemplate::Owner,
            capabilities: &caps,
        },
    )
    .unwrap_or_else(|e| panic!("seed role {id}: {e}"));
    id
}

pub fn seed_member(conn: &Connection, tenant_id: &str, user_id: &str, role_id: &str) {
    identity_ops::upsert_membership(conn, tenant_id, user_id, role_id, &ts())
        .unwrap_or_else(|e| panic!("seed membership {user_id}@{tenant_id}: {e}"));
}

pub fn seed_player(conn: &Connection, tenant_id: &str, id: &str) {
    moderation_ops::insert_player(conn, id, tenant_id, &format!("Player {id}"), &ts())
        .unwrap_or_else(|e| panic!("seed player {id}: {e}"));
}

pub fn seed_case(conn: &Connection, tenant_id: &str, id: &str) {
    moderation_ops::insert_case(
        conn,
        &moderation_ops::InsertCaseParams {
            id,
            tenant_id,
            title: "Seeded case",
            description: "Seeded for tests",
            assigned_to: None,
            created_at: &ts(),
        },
    )
    .unwrap_or_else(|e| panic!("seed case {id}: {e}"));
}

pub fn seed_report(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    summary: &str,
    accused_player_id: Option<&str>,
) {
    moderation_ops::insert_report(
        conn,
        &moderation_ops::InsertReportParams {
            id,
            tenant_id,
            summary,
            reporter_name: Some("Reporter"),
            reporter_contact: Some("reporter#0001"),
            accused_player_id,
            created_at: &ts(),
        },
    )
    .unwrap_or_else(|e| panic!("seed report {id}: {e}"));
}

pub fn seed_settings(conn: &Connection, tenant_id: &str, settings: &SecuritySettings) {
    let json = serde_json::to_string(settings).unwrap_or_else(|e| panic!("settings json: {e}"));
    settings_ops::upsert_setting(
        conn,
        tenant_id,
        warden_core::constants::SECURITY_SETTINGS_KEY,
        &json,
        &ts(),
    )
    .unwrap_or_else(|e| panic!("seed settings {tenant_id}: {e}"));
}

/// Ids of a seeded two-community world.
#[derive(Debug, Clone)]
pub struct Community {
    pub tenant: String,
    pub other_tenant: String,
    pub owner: String,
    pub admin: String,
    pub second_admin: String,
    pub moderator: String,
    pub viewer: String,
    pub outsider: String,
    pub player: String,
    pub foreign_player: String,
    pub case_id: String,
    pub foreign_case: String,
    pub report: String,
    pub foreign_report: String,
    pub mod_role: String,
    pub foreign_role: String,
}

/// Seed community `t1` with one user per role plus a second admin, and
/// community `t2` with a member and its own resources.
pub fn seed_community(conn: &Connection) -> Community {
    seed_tenant(conn, "t1");
    seed_tenant(conn, "t2");

    let owner_role = seed_role(conn, "t1", RoleTemplate::Owner);
    let admin_role = seed_role(conn, "t1", RoleTemplate::Admin);
    let mod_role = seed_role(conn, "t1", RoleTemplate::Mod);
    let viewer_role = seed_role(conn, "t1", RoleTemplate::Viewer);
    let foreign_role = seed_role(conn, "t2", RoleTemplate::Admin);

    for (user, role) in [
        ("owner", &owner_role),
        ("admin", &admin_role),
        ("admin2", &admin_role),
        ("mod", &mod_role),
        ("viewer", &viewer_role),
    ] {
        seed_user(conn, user);
        seed_member(conn, "t1", user, role);
    }
    seed_user(conn, "outsider");
    seed_member(conn, "t2", "outsider", &foreign_role);

    seed_player(conn, "t1", "p1");
    seed_player(conn, "t2", "p2");
    seed_case(conn, "t1", "c1");
    seed_case(conn, "t2", "c2");
    seed_report(conn, "t1", "r1", "Griefing near spawn with repeated base raids", Some("p1"));
    seed_report(conn, "t2", "r2", "Foreign report", None);

    Community {
        tenant: "t1".into(),
        other_tenant: "t2".into(),
        owner: "owner".into(),
        admin: "admin".into(),
        second_admin: "admin2".into(),
        moderator: "mod".into(),
        viewer: "viewer".into(),
        outsider: "outsider".into(),
        player: "p1".into(),
        foreign_player: "p2".into(),
        case_id: "c1".into(),
        foreign_case: "c2".into(),
        report: "r1".into(),
        foreign_report: "r2".into(),
        mod_role,
        foreign_role,
    }
}

/// In-memory engine with [`seed_community`] applied.
pub fn seeded_storage() -> (StorageEngine, Community) {
    let storage = StorageEngine::open_in_memory().unwrap_or_else(|e| panic!("open storage: {e}"));
    let community = storage
        .with_writer(|conn| Ok(seed_community(conn)))
        .unwrap_or_else(|e| panic!("seed community: {e}"));
    (storage, community)
}
