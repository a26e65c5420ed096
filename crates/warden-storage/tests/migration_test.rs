//! Integration test: schema migrations, pragmas and the read pool.

use rusqlite::Connection;

use test_fixtures::{seed_community, seeded_storage};
use warden_core::models::{ApprovalStatus, RiskLevel};
use warden_storage::migrations::{current_version, run_migrations, LATEST_VERSION};
use warden_storage::pool::pragmas::verify_wal_mode;
use warden_storage::queries::{approval_ops, identity_ops};
use warden_storage::StorageEngine;

#[test]
fn fresh_database_is_at_latest_version() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let version = storage.with_writer(current_version).unwrap();
    assert_eq!(version, LATEST_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
    assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
}

#[test]
fn data_survives_reopen_and_reads_use_the_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.db");
    {
        let storage = StorageEngine::open(&path).unwrap();
        storage.with_writer(|conn| Ok(seed_community(conn))).unwrap();
        assert!(storage.with_writer(verify_wal_mode).unwrap());
    }

    let storage = StorageEngine::open(&path).unwrap();
    let member = storage
        .with_reader(|conn| identity_ops::get_membership(conn, "t1", "admin"))
        .unwrap()
        .expect("membership persisted");
    assert_eq!(member.role_priority, 40);
    assert!(storage.pool().reader_count() >= 1);
}

#[test]
fn decided_approvals_are_immutable() {
    let (storage, community) = seeded_storage();
    storage
        .with_writer(|conn| {
            approval_ops::insert_approval(
                conn,
                &approval_ops::InsertApprovalParams {
                    id: "a1",
                    tenant_id: &community.tenant,
                    risk_level: RiskLevel::High,
                    requested_by: &community.moderator,
                    payload_json: "{}",
                    created_at: "2026-03-01T08:00:00.000Z",
                },
            )?;
            let first = approval_ops::set_decision(
                conn,
                "a1",
                ApprovalStatus::Approved,
                &community.admin,
                "2026-03-01T08:01:00.000Z",
                None,
            )?;
            assert_eq!(first, 1);
            let again = approval_ops::set_decision(
                conn,
                "a1",
                ApprovalStatus::Rejected,
                &community.second_admin,
                "2026-03-01T08:02:00.000Z",
                None,
            )?;
            assert_eq!(again, 0);
            Ok(())
        })
        .unwrap();

    let raw_update = storage.with_writer(|conn| {
        conn.execute("UPDATE approval_requests SET status = 'REJECTED' WHERE id = 'a1'", [])
            .map_err(warden_storage::map_sqlite_err)
    });
    assert!(raw_update.is_err());
}

#[test]
fn requester_cannot_be_stored_as_decider() {
    let (storage, community) = seeded_storage();
    let result = storage.with_writer(|conn| {
        approval_ops::insert_approval(
            conn,
            &approval_ops::InsertApprovalParams {
                id: "a2",
                tenant_id: &community.tenant,
                risk_level: RiskLevel::High,
                requested_by: &community.moderator,
                payload_json: "{}",
                created_at: "2026-03-01T08:00:00.000Z",
            },
        )?;
        approval_ops::set_decision(
            conn,
            "a2",
            ApprovalStatus::Approved,
            &community.moderator,
            "2026-03-01T08:01:00.000Z",
            None,
        )
    });
    assert!(result.is_err());
}
