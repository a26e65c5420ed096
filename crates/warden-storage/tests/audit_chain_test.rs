//! Integration test: hash-chained audit log appends, fallback and failure modes.

use std::sync::Arc;

use chrono::Duration;
use rusqlite::Connection;
use serde_json::json;

use test_fixtures::{manual_clock, seed_player, seeded_storage};
use warden_core::models::{AuditEvent, NewAuditEntry};
use warden_core::{Clock, WardenError};
use warden_storage::audit::verify_stored_chain;
use warden_storage::queries::{audit_ops, moderation_ops};
use warden_storage::{map_sqlite_err, AuditChainWriter, AuditMode, ChainVerification, StorageEngine};

fn writer() -> AuditChainWriter {
    let clock: Arc<dyn Clock> = manual_clock();
    AuditChainWriter::new(clock)
}

fn case_event(n: usize) -> NewAuditEntry {
    NewAuditEntry::new(AuditEvent::CaseUpdated, json!({ "caseId": format!("c{n}") })).tenant("t1")
}

#[test]
fn sequential_appends_form_a_chain() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let writer = writer();

    for n in 0..10 {
        storage
            .with_writer(|conn| writer.append(conn, case_event(n), AuditMode::Strict))
            .unwrap();
    }

    let entries = storage.with_reader(|conn| audit_ops::list_entries(conn, None)).unwrap();
    assert_eq!(entries.len(), 10);
    assert!(entries[0].prev_hash.is_none());
    for (i, pair) in entries.windows(2).enumerate() {
        assert_eq!(pair[0].chain_index, i as i64 + 1);
        assert_eq!(pair[1].prev_hash.as_deref(), Some(pair[0].hash.as_str()));
    }
    let outcome = storage.with_reader(verify_stored_chain).unwrap();
    assert_eq!(outcome, ChainVerification::Valid { entries: 10 });
}

#[test]
fn unknown_actor_is_folded_into_metadata() {
    let (storage, community) = seeded_storage();
    let writer = writer();

    let known = NewAuditEntry::new(AuditEvent::CaseCreated, json!({"caseId": "c1"}))
        .tenant(&community.tenant)
        .actor(&community.admin);
    let ghost = NewAuditEntry::new(AuditEvent::CaseUpdated, json!({"caseId": "c1"}))
        .tenant(&community.tenant)
        .actor("deleted-user");
    let scalar = NewAuditEntry::new(AuditEvent::CaseUpdated, json!("free text")).actor("deleted-user");

    let first = storage
        .with_writer(|conn| writer.append(conn, known, AuditMode::Strict))
        .unwrap()
        .unwrap();
    assert_eq!(first.actor_id.as_deref(), Some("admin"));

    let second = storage
        .with_writer(|conn| writer.append(conn, ghost, AuditMode::Strict))
        .unwrap()
        .unwrap();
    assert!(second.actor_id.is_none());
    assert_eq!(second.metadata, json!({"caseId": "c1", "actorUserId": "deleted-user"}));
    assert_eq!(second.prev_hash.as_deref(), Some(first.hash.as_str()));

    let third = storage
        .with_writer(|conn| writer.append(conn, scalar, AuditMode::Strict))
        .unwrap()
        .unwrap();
    assert_eq!(third.metadata, json!({"actorUserId": "deleted-user", "metadata": "free text"}));

    assert!(storage.with_reader(verify_stored_chain).unwrap().is_valid());
}

fn install_failing_audit_trigger(conn: &Connection) {
    conn.execute_batch(
        "CREATE TRIGGER fail_login_audit BEFORE INSERT ON audit_log
         WHEN NEW.event_type = 'login.failed'
         BEGIN SELECT RAISE(ABORT, 'audit store rejected entry'); END;",
    )
    .unwrap();
}

#[test]
fn best_effort_failure_keeps_enclosing_work() {
    let (storage, community) = seeded_storage();
    let writer = writer();
    storage
        .with_writer(|conn| {
            install_failing_audit_trigger(conn);
            Ok(())
        })
        .unwrap();

    storage
        .with_transaction(|conn| {
            seed_player(conn, &community.tenant, "p-best-effort");
            let stored = writer.append(
                conn,
                NewAuditEntry::new(AuditEvent::LoginFailed, json!({"email": "x@example.test"})),
                AuditMode::BestEffort,
            )?;
            assert!(stored.is_none());
            writer.append(conn, case_event(1), AuditMode::Strict)?;
            Ok(())
        })
        .unwrap();

    storage
        .with_reader(|conn| {
            assert!(moderation_ops::get_player(conn, "p-best-effort")?.is_some());
            assert_eq!(audit_ops::count(conn)?, 1);
            Ok(())
        })
        .unwrap();
}

#[test]
fn strict_failure_rolls_back_enclosing_work() {
    let (storage, community) = seeded_storage();
    let writer = writer();
    storage
        .with_writer(|conn| {
            install_failing_audit_trigger(conn);
            Ok(())
        })
        .unwrap();

    let result = storage.with_transaction(|conn| {
        seed_player(conn, &community.tenant, "p-strict");
        writer.append(
            conn,
            NewAuditEntry::new(AuditEvent::LoginFailed, json!({})),
            AuditMode::Strict,
        )?;
        Ok(())
    });
    assert!(matches!(result, Err(WardenError::StorageError(_))));

    let player = storage
        .with_reader(|conn| moderation_ops::get_player(conn, "p-strict"))
        .unwrap();
    assert!(player.is_none());
}

#[test]
fn best_effort_outside_transaction_swallows_failure() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let writer = writer();
    storage
        .with_writer(|conn| {
            install_failing_audit_trigger(conn);
            Ok(())
        })
        .unwrap();

    let stored = storage
        .with_writer(|conn| {
            writer.append(conn, NewAuditEntry::new(AuditEvent::LoginFailed, json!({})), AuditMode::BestEffort)
        })
        .unwrap();
    assert!(stored.is_none());
    let autocommit = storage.with_writer(|conn| Ok(conn.is_autocommit())).unwrap();
    assert!(autocommit, "failed append must not leave a transaction open");
}

#[test]
fn entries_are_append_only() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let writer = writer();
    storage
        .with_writer(|conn| writer.append(conn, case_event(0), AuditMode::Strict))
        .unwrap();

    let update = storage.with_writer(|conn| {
        conn.execute("UPDATE audit_log SET metadata = '{}'", [])
            .map_err(map_sqlite_err)
    });
    assert!(update.is_err());
    let delete = storage.with_writer(|conn| {
        conn.execute("DELETE FROM audit_log", []).map_err(map_sqlite_err)
    });
    assert!(delete.is_err());
}

#[test]
fn tampering_is_reported_at_first_bad_index() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let writer = writer();
    for n in 0..5 {
        storage
            .with_writer(|conn| writer.append(conn, case_event(n), AuditMode::Strict))
            .unwrap();
    }

    storage
        .with_writer(|conn| {
            conn.execute_batch(
                "DROP TRIGGER audit_log_no_update;
                 UPDATE audit_log SET metadata = '{\"caseId\":\"forged\"}' WHERE chain_index = 3;",
            )
            .map_err(map_sqlite_err)
        })
        .unwrap();

    match storage.with_reader(verify_stored_chain).unwrap() {
        ChainVerification::Diverged { chain_index, .. } => assert_eq!(chain_index, 3),
        other => panic!("expected divergence, got {other:?}"),
    }
}

#[test]
fn entries_use_the_injected_clock() {
    let clock = manual_clock();
    let writer = AuditChainWriter::new(clock.clone());
    let storage = StorageEngine::open_in_memory().unwrap();

    clock.advance(Duration::minutes(5));
    let stored = storage
        .with_writer(|conn| writer.append(conn, case_event(0), AuditMode::Strict))
        .unwrap()
        .unwrap();
    assert_eq!(stored.created_at, clock.now());
}
