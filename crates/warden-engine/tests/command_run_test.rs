//! Direct execution of LOW and MEDIUM commands, toggles, validation and
//! authorization.

use std::sync::Arc;

use serde_json::json;

use test_fixtures::{manual_clock, seeded_storage, Community};
use warden_core::config::WardenConfig;
use warden_core::constants::SIGNAL_CROSS_TENANT;
use warden_core::models::{ActionType, PlayerStatus, ReportStatus, Severity};
use warden_core::WardenError;
use warden_engine::{ClientInfo, CommandEngine, CommandOutcome, CommandRequest, EngineContext};
use warden_storage::queries::{audit_ops, command_ops, moderation_ops, signal_ops};

fn setup() -> (CommandEngine, Community) {
    let (storage, community) = seeded_storage();
    let ctx = EngineContext::new(Arc::new(storage), WardenConfig::default(), manual_clock());
    (CommandEngine::new(ctx), community)
}

fn run(engine: &CommandEngine, actor: &str, command: &str, input: serde_json::Value) -> Result<CommandOutcome, WardenError> {
    engine.run_command(CommandRequest::new(actor, "t1", command, input).client("198.51.100.4", "tests"))
}

fn events(engine: &CommandEngine) -> Vec<String> {
    engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_entries(conn, None))
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[test]
fn warning_executes_and_is_audited() {
    let (engine, c) = setup();
    let outcome = run(
        &engine,
        &c.moderator,
        "warning.create",
        json!({"playerId": c.player, "reason": "Spamming global chat"}),
    )
    .unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Executed {
            message: "Create Warning completed.".into(),
            redirect: None,
        }
    );

    assert_eq!(events(&engine), vec!["action.created", "command.executed"]);

    let storage = &engine.context().storage;
    let actions = storage
        .with_reader(|conn| moderation_ops::list_actions_for_player(conn, &c.tenant, &c.player))
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action_type, ActionType::Warning);
    assert_eq!(actions[0].reason, "Spamming global chat");

    let entries = storage.with_reader(|conn| audit_ops::list_entries(conn, None)).unwrap();
    assert_eq!(entries[0].metadata["actionId"], json!(actions[0].id));
    assert_eq!(entries[0].ip.as_deref(), Some("198.51.100.4"));
    assert_eq!(entries[1].metadata["commandId"], "warning.create");
    assert_eq!(entries[1].metadata["riskLevel"], "LOW");

    let executions = storage
        .with_reader(|conn| command_ops::list_executions(conn, &c.tenant))
        .unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].actor_id, c.moderator);
    assert!(executions[0].approval_id.is_none());

    assert!(engine.verify_audit_chain().unwrap().is_valid());
}

#[test]
fn invalid_input_is_rejected_before_anything_is_written() {
    let (engine, c) = setup();

    let err = run(&engine, &c.moderator, "warning.create", json!({"playerId": c.player})).unwrap_err();
    assert_eq!(err.to_string(), "Reason is required.");

    let err = run(
        &engine,
        &c.moderator,
        "warning.create",
        json!({"playerId": c.player, "reason": "short"}),
    )
    .unwrap_err();
    assert!(matches!(err, WardenError::ValidationFailed { .. }));
    assert!(err.to_string().contains("at least 8 characters"), "{err}");

    let err = run(&engine, &c.moderator, "warning.create", json!("not an object")).unwrap_err();
    assert_eq!(err.to_string(), "Invalid command input.");

    assert!(events(&engine).is_empty());
}

#[test]
fn unknown_command_is_reported_by_id() {
    let (engine, c) = setup();
    let err = run(&engine, &c.admin, "server.nuke", json!({})).unwrap_err();
    assert!(matches!(err, WardenError::UnknownCommand { .. }));
    assert_eq!(err.to_string(), "Unknown command: server.nuke.");
}

#[test]
fn capability_and_membership_are_enforced() {
    let (engine, c) = setup();
    let input = json!({"playerId": c.player, "reason": "Spamming global chat"});

    let err = run(&engine, &c.viewer, "warning.create", input.clone()).unwrap_err();
    assert_eq!(err.to_string(), "Insufficient permissions.");

    let err = run(&engine, &c.outsider, "warning.create", input).unwrap_err();
    assert!(matches!(err, WardenError::Forbidden { .. }));
    assert_eq!(err.to_string(), "Membership missing.");

    assert!(events(&engine).is_empty());
}

#[test]
fn disabled_command_is_refused_until_reenabled() {
    let (engine, c) = setup();
    let client = ClientInfo::default();
    engine
        .set_command_enabled(&c.admin, &c.tenant, "warning.create", false, &client)
        .unwrap();

    let input = json!({"playerId": c.player, "reason": "Spamming global chat"});
    let err = run(&engine, &c.moderator, "warning.create", input.clone()).unwrap_err();
    assert!(matches!(err, WardenError::CommandDisabled { .. }));
    assert_eq!(err.to_string(), "This command is currently disabled.");

    engine
        .set_command_enabled(&c.admin, &c.tenant, "warning.create", true, &client)
        .unwrap();
    run(&engine, &c.moderator, "warning.create", input).unwrap();

    let toggles = engine
        .context()
        .storage
        .with_reader(|conn| audit_ops::list_by_event(conn, "command.toggled"))
        .unwrap();
    assert_eq!(toggles.len(), 2);
    assert_eq!(toggles[0].metadata["enabled"], false);
}

#[test]
fn toggling_requires_commands_manage() {
    let (engine, c) = setup();
    let err = engine
        .set_command_enabled(&c.moderator, &c.tenant, "warning.create", false, &ClientInfo::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient permissions.");
    let toggle = engine
        .context()
        .storage
        .with_reader(|conn| command_ops::get_toggle(conn, &c.tenant, "warning.create"))
        .unwrap();
    assert!(toggle.is_none());
}

#[test]
fn temp_ban_accepts_numeric_strings_and_extends() {
    let (engine, c) = setup();
    run(
        &engine,
        &c.moderator,
        "ban.temp",
        json!({"playerId": c.player, "durationMinutes": " 60 ", "reason": "Exploiting a dupe glitch"}),
    )
    .unwrap();

    let storage = &engine.context().storage;
    let action = storage
        .with_reader(|conn| moderation_ops::list_actions_for_player(conn, &c.tenant, &c.player))
        .unwrap()
        .remove(0);
    assert_eq!(action.action_type, ActionType::TempBan);
    assert_eq!(action.duration_minutes, Some(60));

    run(
        &engine,
        &c.moderator,
        "ban.extend",
        json!({"actionId": action.id, "extraMinutes": 30, "reason": "Evaded once"}),
    )
    .unwrap();
    let extended = storage
        .with_reader(|conn| moderation_ops::get_action(conn, &action.id))
        .unwrap()
        .unwrap();
    assert_eq!(extended.duration_minutes, Some(90));
}

#[test]
fn extending_a_non_temp_ban_rolls_back() {
    let (engine, c) = setup();
    run(
        &engine,
        &c.moderator,
        "warning.create",
        json!({"playerId": c.player, "reason": "Spamming global chat"}),
    )
    .unwrap();
    let action_id = engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::list_actions_for_player(conn, &c.tenant, &c.player))
        .unwrap()
        .remove(0)
        .id;
    let before = events(&engine).len();

    let err = run(
        &engine,
        &c.moderator,
        "ban.extend",
        json!({"actionId": action_id, "extraMinutes": 30, "reason": "Evaded once"}),
    )
    .unwrap_err();
    assert!(matches!(err, WardenError::InvalidState { .. }));
    assert_eq!(err.to_string(), "Only TEMP_BAN actions can be extended.");
    assert_eq!(events(&engine).len(), before);
}

#[test]
fn temp_ban_out_of_range_is_rejected() {
    let (engine, c) = setup();
    let err = run(
        &engine,
        &c.moderator,
        "ban.temp",
        json!({"playerId": c.player, "durationMinutes": 0, "reason": "Exploiting a dupe glitch"}),
    )
    .unwrap_err();
    assert!(err.to_string().contains("must be between 1 and 43200"), "{err}");
}

#[test]
fn flag_player_updates_status() {
    let (engine, c) = setup();
    run(&engine, &c.moderator, "player.flag", json!({"playerId": c.player, "status": "WATCHED"})).unwrap();
    let player = engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::get_player(conn, &c.player))
        .unwrap()
        .unwrap();
    assert_eq!(player.status, PlayerStatus::Watched);

    let err = run(&engine, &c.moderator, "player.flag", json!({"playerId": c.player, "status": "BANNED"})).unwrap_err();
    assert!(err.to_string().contains("must be one of: ACTIVE, WATCHED"), "{err}");
}

#[test]
fn case_from_report_derives_title_and_moves_report_to_review() {
    let (engine, c) = setup();
    run(
        &engine,
        &c.moderator,
        "case.from_report",
        json!({"reportId": c.report, "assignToUserId": c.admin}),
    )
    .unwrap();

    let storage = &engine.context().storage;
    let report = storage
        .with_reader(|conn| moderation_ops::get_report(conn, &c.report))
        .unwrap()
        .unwrap();
    assert_eq!(report.status, ReportStatus::InReview);
    let case_id = report.case_id.expect("report linked to the new case");

    let case = storage
        .with_reader(|conn| moderation_ops::get_case(conn, &case_id))
        .unwrap()
        .unwrap();
    assert_eq!(case.title, "Griefing near spawn with repeated base raids");
    assert!(case.description.starts_with("Report: Griefing"));
    assert!(case.description.contains("Reporter: Reporter"));
    assert!(case.description.contains("Contact: reporter#0001"));
    assert_eq!(case.assigned_to.as_deref(), Some(c.admin.as_str()));

    let linked = storage
        .with_reader(|conn| moderation_ops::case_player_ids(conn, &case_id))
        .unwrap();
    assert_eq!(linked, vec![c.player.clone()]);
}

#[test]
fn assignee_must_be_a_member() {
    let (engine, c) = setup();
    let err = run(
        &engine,
        &c.moderator,
        "case.assign",
        json!({"caseId": c.case_id, "userId": c.outsider}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Assignee must be a member of this community.");

    run(&engine, &c.moderator, "case.assign", json!({"caseId": c.case_id, "userId": c.viewer})).unwrap();
    let case = engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::get_case(conn, &c.case_id))
        .unwrap()
        .unwrap();
    assert_eq!(case.assigned_to.as_deref(), Some(c.viewer.as_str()));
}

#[test]
fn bulk_resolve_updates_own_reports() {
    let (engine, c) = setup();
    run(
        &engine,
        &c.moderator,
        "report.bulk_resolve",
        json!({"reportIds": format!(" {} \n", c.report), "resolution": "RESOLVED"}),
    )
    .unwrap();

    let own = engine
        .context()
        .storage
        .with_reader(|conn| moderation_ops::get_report(conn, &c.report))
        .unwrap()
        .unwrap();
    assert_eq!(own.status, ReportStatus::Resolved);

    let err = run(
        &engine,
        &c.moderator,
        "report.bulk_resolve",
        json!({"reportIds": "  ", "resolution": "RESOLVED"}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Provide at least one report id.");
}

#[test]
fn bulk_resolve_with_a_foreign_report_fails_as_not_found() {
    let (engine, c) = setup();
    let err = run(
        &engine,
        &c.moderator,
        "report.bulk_resolve",
        json!({"reportIds": format!("{}\n{}", c.report, c.foreign_report), "resolution": "RESOLVED"}),
    )
    .unwrap_err();
    assert!(matches!(err, WardenError::NotFound { .. }));
    assert_eq!(err.to_string(), "Report not found.");

    let storage = &engine.context().storage;
    let own = storage.with_reader(|conn| moderation_ops::get_report(conn, &c.report)).unwrap().unwrap();
    let foreign = storage
        .with_reader(|conn| moderation_ops::get_report(conn, &c.foreign_report))
        .unwrap()
        .unwrap();
    assert_eq!(own.status, ReportStatus::Open, "the batch rolled back");
    assert_eq!(foreign.status, ReportStatus::Open);

    let signals = storage
        .with_reader(|conn| signal_ops::list_signals(conn, Some(SIGNAL_CROSS_TENANT)))
        .unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].severity, Severity::Critical);
    assert_eq!(events(&engine), vec!["tenant.violation"]);
}

#[test]
fn export_packet_redirects_to_the_export_view() {
    let (engine, c) = setup();
    let outcome = run(&engine, &c.viewer, "case.export_packet", json!({"caseId": c.case_id})).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Executed {
            message: "Export Case Packet completed.".into(),
            redirect: Some("/app/cases/c1/export".into()),
        }
    );
}

#[test]
fn catalog_listing_covers_every_command() {
    let (engine, _c) = setup();
    let summaries = engine.list_commands();
    assert_eq!(summaries.len(), 12);
    assert!(summaries.iter().any(|s| s.id == "ban.perm"));
}
