//! Two-person approval: submission, decision, audit ordering, schema drift,
//! invite joins.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use test_fixtures::{manual_clock, seed_user, seeded_storage, Community};
use warden_core::clock::ManualClock;
use warden_core::config::WardenConfig;
use warden_core::errors::CooldownKind;
use warden_core::models::{ApprovalDecision, ApprovalStatus, RiskLevel, SecuritySettings};
use warden_core::WardenError;
use warden_engine::catalog::schema::{FieldRule, InputSchema, Rule};
use warden_engine::{
    ClientInfo, CommandCatalog, CommandEngine, CommandOutcome, CommandRequest, DecisionOutcome,
    DecisionRequest, EngineContext,
};
use warden_storage::queries::{audit_ops, identity_ops, moderation_ops};

fn setup_with(config: WardenConfig) -> (CommandEngine, Community, Arc<ManualClock>) {
    let (storage, community) = seeded_storage();
    let clock = manual_clock();
    let ctx = EngineContext::new(Arc::new(storage), config, clock.clone());
    (CommandEngine::new(ctx), community, clock)
}

fn setup() -> (CommandEngine, Community, Arc<ManualClock>) {
    setup_with(WardenConfig::default())
}

fn client() -> ClientInfo {
    ClientInfo::new(Some("203.0.113.7".into()), Some("tests".into()))
}

fn grant(engine: &CommandEngine, tenant: &str, user: &str) -> String {
    let token = format!("sess-{user}");
    engine
        .sensitive_mode()
        .enable(tenant, user, &token, None, &client())
        .unwrap();
    token
}

fn perm_ban(c: &Community, token: &str) -> CommandRequest {
    CommandRequest::new(
        &c.moderator,
        &c.tenant,
        "ban.perm",
        json!({"playerId": c.player, "reason": "Repeated griefing at spawn"}),
    )
    .session_token(token)
}

fn events(engine: &CommandEngine) -> Vec<String> {
    engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_entries(conn, None))
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .filter(|e| !e.starts_with("sensitive_mode."))
        .collect()
}

fn action_count(engine: &CommandEngine, c: &Community) -> usize {
    engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::list_actions_for_player(conn, &c.tenant, &c.player))
        .unwrap()
        .len()
}

fn submit_perm_ban(engine: &CommandEngine, c: &Community) -> String {
    let token = grant(engine, &c.tenant, &c.moderator);
    match engine.run_command(perm_ban(c, &token)).unwrap() {
        CommandOutcome::PendingApproval { approval_id, message } => {
            assert_eq!(message, "Approval requested. Awaiting a second staff decision.");
            approval_id
        }
        other => panic!("expected pending approval, got {other:?}"),
    }
}

#[test]
fn high_risk_command_is_parked_without_side_effects() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    assert_eq!(action_count(&engine, &c), 0);
    let approval = engine.approval(&approval_id).unwrap();
    assert_eq!(approval.status, ApprovalStatus::Pending);
    assert_eq!(approval.risk_level, RiskLevel::High);
    assert_eq!(approval.requested_by, c.moderator);
    assert_eq!(approval.payload["kind"], "command");
    assert_eq!(approval.payload["commandId"], "ban.perm");
    assert_eq!(approval.payload["input"]["reason"], "Repeated griefing at spawn");

    assert_eq!(events(&engine), vec!["approval.requested"]);
    let pending = engine.list_pending_approvals(&c.tenant).unwrap();
    assert_eq!(pending.len(), 1);
}

#[test]
fn approval_applies_command_and_audits_in_order() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    let token = grant(&engine, &c.tenant, &c.admin);
    let outcome = engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Approve).session_token(token),
        )
        .unwrap();
    assert_eq!(
        outcome,
        DecisionOutcome::Approved {
            message: "Permanent Ban completed.".into(),
            redirect: None,
        }
    );

    assert_eq!(
        events(&engine),
        vec![
            "approval.requested",
            "approval.decided",
            "action.created",
            "command.executed",
        ]
    );

    let approval = engine.approval(&approval_id).unwrap();
    assert_eq!(approval.status, ApprovalStatus::Approved);
    assert_eq!(approval.decided_by.as_deref(), Some(c.admin.as_str()));

    let actions = engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::list_actions_for_player(conn, &c.tenant, &c.player))
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].moderator_id, c.moderator, "runs as the requester");

    let executed = engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_by_event(conn, "command.executed"))
        .unwrap();
    assert_eq!(executed[0].metadata["approvalId"], json!(approval_id));
    assert_eq!(executed[0].metadata["approvedByUserId"], json!(c.admin));
    assert_eq!(executed[0].actor_id.as_deref(), Some(c.moderator.as_str()));

    assert!(engine.verify_audit_chain().unwrap().is_valid());
    assert!(engine.list_pending_approvals(&c.tenant).unwrap().is_empty());
}

#[test]
fn self_approval_is_refused_and_request_stays_pending() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    let err = engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.moderator, ApprovalDecision::Approve)
                .session_token(format!("sess-{}", c.moderator)),
        )
        .unwrap_err();
    assert!(matches!(err, WardenError::SelfApprovalForbidden));
    assert_eq!(err.to_string(), "Approver must be different from requester.");

    assert_eq!(engine.approval(&approval_id).unwrap().status, ApprovalStatus::Pending);
    assert_eq!(action_count(&engine, &c), 0);
    assert_eq!(events(&engine), vec!["approval.requested"]);
}

#[test]
fn decider_needs_the_decide_capability() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    let err = engine
        .decide_approval(DecisionRequest::new(&approval_id, &c.viewer, ApprovalDecision::Approve))
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient permissions.");
    assert_eq!(engine.approval(&approval_id).unwrap().status, ApprovalStatus::Pending);
}

#[test]
fn high_risk_decision_requires_sensitive_mode() {
    let (engine, c, clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    let err = engine
        .decide_approval(DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Approve))
        .unwrap_err();
    assert!(matches!(err, WardenError::SensitiveModeRequired));

    let token = grant(&engine, &c.tenant, &c.admin);
    clock.advance(chrono::Duration::minutes(11));
    let err = engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Reject).session_token(&token),
        )
        .unwrap_err();
    assert!(matches!(err, WardenError::SensitiveModeRequired), "expired grant");
    assert_eq!(engine.approval(&approval_id).unwrap().status, ApprovalStatus::Pending);
}

#[test]
fn rejection_records_reason_and_touches_nothing_else() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);
    let token = grant(&engine, &c.tenant, &c.admin);

    let outcome = engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Reject)
                .session_token(token)
                .reason("  Not enough evidence  "),
        )
        .unwrap();
    assert!(matches!(outcome, DecisionOutcome::Rejected { .. }));

    let approval = engine.approval(&approval_id).unwrap();
    assert_eq!(approval.status, ApprovalStatus::Rejected);
    assert_eq!(approval.reason.as_deref(), Some("Not enough evidence"));
    assert_eq!(action_count(&engine, &c), 0);

    let decided = engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_by_event(conn, "approval.decided"))
        .unwrap();
    assert_eq!(decided.len(), 1);
    assert_eq!(decided[0].metadata["status"], "REJECTED");
    assert_eq!(decided[0].metadata["reason"], "Not enough evidence");
}

#[test]
fn decided_request_cannot_be_decided_again() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);
    let token = grant(&engine, &c.tenant, &c.admin);
    engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Reject).session_token(&token),
        )
        .unwrap();

    let token2 = grant(&engine, &c.tenant, &c.second_admin);
    let err = engine
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.second_admin, ApprovalDecision::Approve)
                .session_token(token2),
        )
        .unwrap_err();
    assert!(matches!(err, WardenError::AlreadyDecided));
    assert_eq!(action_count(&engine, &c), 0);
}

#[test]
fn unknown_approval_is_not_found() {
    let (engine, c, _clock) = setup();
    let err = engine
        .decide_approval(DecisionRequest::new("missing", &c.admin, ApprovalDecision::Approve))
        .unwrap_err();
    assert_eq!(err.to_string(), "Approval request not found.");
}

#[test]
fn two_person_rule_off_applies_immediately() {
    let mut config = WardenConfig::default();
    config.security.two_person_rule = false;
    let (engine, c, _clock) = setup_with(config);
    let token = grant(&engine, &c.tenant, &c.moderator);

    let outcome = engine.run_command(perm_ban(&c, &token)).unwrap();
    assert_eq!(outcome.message(), "Permanent Ban completed.");
    assert_eq!(action_count(&engine, &c), 1);
    assert!(engine.list_pending_approvals(&c.tenant).unwrap().is_empty());
    assert_eq!(events(&engine), vec!["action.created", "command.executed"]);
}

#[test]
fn schema_drift_leaves_request_pending() {
    let (engine, c, _clock) = setup();
    let approval_id = submit_perm_ban(&engine, &c);

    let current = engine.catalog().lookup("ban.perm").unwrap().clone();
    let stricter = CommandCatalog::standard().with_definition(warden_engine::CommandDefinition {
        schema: InputSchema::new(vec![
            FieldRule::required("playerId", "Player ID", Rule::Id),
            FieldRule::required("reason", "Reason", Rule::Text { min: 200 }),
        ]),
        ..current
    });
    let drifted = CommandEngine::new(engine.context().clone().with_catalog(stricter));

    let token = grant(&drifted, &c.tenant, &c.admin);
    let err = drifted
        .decide_approval(
            DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Approve).session_token(token),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Approval payload is invalid for the command.");

    assert_eq!(drifted.approval(&approval_id).unwrap().status, ApprovalStatus::Pending);
    assert_eq!(action_count(&drifted, &c), 0);
    assert_eq!(events(&drifted), vec!["approval.requested"]);
}

#[test]
fn invite_join_is_granted_on_approval() {
    let (engine, c, _clock) = setup();
    engine
        .context()
        .storage
        .with_writer(|conn| {
            seed_user(conn, "joiner");
            Ok(())
        })
        .unwrap();

    let approval_id = engine
        .submit_invite_join(&c.tenant, "joiner", "inv-1", &c.mod_role, &client())
        .unwrap();
    let approval = engine.approval(&approval_id).unwrap();
    assert_eq!(approval.risk_level, RiskLevel::Medium);
    assert_eq!(approval.payload["kind"], "invite.join");

    let outcome = engine
        .decide_approval(DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Approve))
        .unwrap();
    assert_eq!(outcome.message(), "Invite access approved.");

    let member = engine
        .context()
        .storage
        .with_reader(|conn| identity_ops::is_member(conn, &c.tenant, "joiner"))
        .unwrap();
    assert!(member);

    let decided = engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_by_event(conn, "approval.decided"))
        .unwrap();
    assert_eq!(decided[0].metadata["kind"], "invite.join");
    assert_eq!(decided[0].metadata["targetUserId"], "joiner");
}

#[test]
fn invite_join_with_foreign_role_is_refused() {
    let (engine, c, _clock) = setup();
    engine
        .context()
        .storage
        .with_writer(|conn| {
            seed_user(conn, "joiner");
            Ok(())
        })
        .unwrap();

    let approval_id = engine
        .submit_invite_join(&c.tenant, "joiner", "inv-2", &c.foreign_role, &client())
        .unwrap();
    let err = engine
        .decide_approval(DecisionRequest::new(&approval_id, &c.admin, ApprovalDecision::Approve))
        .unwrap_err();
    assert_eq!(err.to_string(), "Role not found for this community.");
    assert_eq!(engine.approval(&approval_id).unwrap().status, ApprovalStatus::Pending);
}

#[test]
fn approval_rechecks_cooldown_against_current_policy() {
    let (engine, c, clock) = setup();
    let first = submit_perm_ban(&engine, &c);
    let admin_token = grant(&engine, &c.tenant, &c.admin);
    engine
        .decide_approval(DecisionRequest::new(&first, &c.admin, ApprovalDecision::Approve).session_token(&admin_token))
        .unwrap();

    clock.advance(Duration::seconds(61));
    let second = submit_perm_ban(&engine, &c);

    let stricter = SecuritySettings {
        high_risk_command_cooldown_seconds: 600,
        ..engine.security_settings(&c.tenant).unwrap()
    };
    engine
        .update_security_settings(&c.admin, &c.tenant, &stricter, &client())
        .unwrap();

    let err = engine
        .decide_approval(DecisionRequest::new(&second, &c.admin, ApprovalDecision::Approve).session_token(&admin_token))
        .unwrap_err();
    assert!(matches!(
        err,
        WardenError::CooldownActive {
            remaining_seconds: 539,
            kind: CooldownKind::Command,
        }
    ));
    assert_eq!(engine.approval(&second).unwrap().status, ApprovalStatus::Pending);
    assert_eq!(action_count(&engine, &c), 1);
}
