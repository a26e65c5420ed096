//! Burst and spam detectors, and high-risk cooldowns.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use test_fixtures::{manual_clock, seeded_storage, Community};
use warden_core::clock::{Clock, ManualClock};
use warden_core::config::WardenConfig;
use warden_core::constants::{SIGNAL_APPROVAL_SPAM, SIGNAL_HIGH_RISK_BURST};
use warden_core::errors::CooldownKind;
use warden_core::models::{CommandExecutionRecord, RiskLevel, SecuritySignal, Severity};
use warden_core::WardenError;
use warden_engine::{CommandEngine, CommandOutcome, CommandRequest, EngineContext};
use warden_storage::new_id;
use warden_storage::queries::{command_ops, signal_ops};

fn setup_with(config: WardenConfig) -> (CommandEngine, Community, Arc<ManualClock>) {
    let (storage, community) = seeded_storage();
    let clock = manual_clock();
    let ctx = EngineContext::new(Arc::new(storage), config, clock.clone());
    (CommandEngine::new(ctx), community, clock)
}

/// HIGH commands run directly with no cooldown.
fn direct_config() -> WardenConfig {
    let mut config = WardenConfig::default();
    config.security.two_person_rule = false;
    config.security.require_sensitive_mode_for_high_risk = false;
    config.security.high_risk_command_cooldown_seconds = 0;
    config
}

fn perm_ban(engine: &CommandEngine, c: &Community, actor: &str) -> Result<CommandOutcome, WardenError> {
    engine.run_command(CommandRequest::new(
        actor,
        &c.tenant,
        "ban.perm",
        json!({"playerId": c.player, "reason": "Repeated griefing at spawn"}),
    ))
}

fn signals(engine: &CommandEngine, event_type: &str) -> Vec<SecuritySignal> {
    engine
        .context()
        .storage
        .with_reader(|conn| signal_ops::list_signals(conn, Some(event_type)))
        .unwrap()
}

#[test]
fn high_risk_burst_fires_once_per_window() {
    let (engine, c, clock) = setup_with(direct_config());

    for _ in 0..2 {
        perm_ban(&engine, &c, &c.admin).unwrap();
    }
    assert!(signals(&engine, SIGNAL_HIGH_RISK_BURST).is_empty());

    perm_ban(&engine, &c, &c.admin).unwrap();
    let burst = signals(&engine, SIGNAL_HIGH_RISK_BURST);
    assert_eq!(burst.len(), 1);
    assert_eq!(burst[0].severity, Severity::High);
    assert_eq!(burst[0].actor_id.as_deref(), Some(c.admin.as_str()));
    assert_eq!(burst[0].metadata["count"], 3);

    for _ in 0..3 {
        clock.advance(Duration::seconds(5));
        perm_ban(&engine, &c, &c.admin).unwrap();
    }
    assert_eq!(signals(&engine, SIGNAL_HIGH_RISK_BURST).len(), 1);
}

#[test]
fn high_risk_burst_is_critical_at_the_upper_threshold() {
    let (engine, c, clock) = setup_with(direct_config());
    engine
        .context()
        .storage
        .with_writer(|conn| {
            for _ in 0..5 {
                command_ops::insert_execution(
                    conn,
                    &CommandExecutionRecord {
                        id: new_id(),
                        tenant_id: c.tenant.clone(),
                        command_id: "ban.perm".into(),
                        risk_level: RiskLevel::High,
                        actor_id: c.admin.clone(),
                        approval_id: None,
                        created_at: clock.now(),
                    },
                )?;
            }
            Ok(())
        })
        .unwrap();

    perm_ban(&engine, &c, &c.admin).unwrap();
    let burst = signals(&engine, SIGNAL_HIGH_RISK_BURST);
    assert_eq!(burst.len(), 1);
    assert_eq!(burst[0].severity, Severity::Critical);
    assert_eq!(burst[0].metadata["count"], 6);
}

#[test]
fn burst_counts_only_inside_the_window() {
    let (engine, c, clock) = setup_with(direct_config());
    for _ in 0..2 {
        perm_ban(&engine, &c, &c.admin).unwrap();
    }
    clock.advance(Duration::minutes(11));
    perm_ban(&engine, &c, &c.admin).unwrap();
    assert!(signals(&engine, SIGNAL_HIGH_RISK_BURST).is_empty());
}

#[test]
fn approval_spam_fires_once() {
    let mut config = WardenConfig::default();
    config.security.require_sensitive_mode_for_high_risk = false;
    config.security.high_risk_command_cooldown_seconds = 0;
    let (engine, c, _clock) = setup_with(config);

    for i in 1..=4 {
        let outcome = perm_ban(&engine, &c, &c.moderator).unwrap();
        assert!(matches!(outcome, CommandOutcome::PendingApproval { .. }), "request {i}");
    }
    assert!(signals(&engine, SIGNAL_APPROVAL_SPAM).is_empty());

    perm_ban(&engine, &c, &c.moderator).unwrap();
    perm_ban(&engine, &c, &c.moderator).unwrap();
    let spam = signals(&engine, SIGNAL_APPROVAL_SPAM);
    assert_eq!(spam.len(), 1);
    assert_eq!(spam[0].severity, Severity::Medium);
    assert_eq!(spam[0].metadata["count"], 5);
    assert_eq!(engine.list_pending_approvals(&c.tenant).unwrap().len(), 6);
}

#[test]
fn command_cooldown_reports_remaining_seconds() {
    let mut config = direct_config();
    config.security.high_risk_command_cooldown_seconds = 60;
    let (engine, c, clock) = setup_with(config);

    perm_ban(&engine, &c, &c.admin).unwrap();

    clock.advance(Duration::seconds(30));
    let err = perm_ban(&engine, &c, &c.admin).unwrap_err();
    assert!(matches!(
        err,
        WardenError::CooldownActive {
            remaining_seconds: 30,
            kind: CooldownKind::Command,
        }
    ));
    assert_eq!(err.to_string(), "Command cooldown active. Try again in 30s.");

    clock.advance(Duration::milliseconds(29_500));
    let err = perm_ban(&engine, &c, &c.admin).unwrap_err();
    assert!(matches!(err, WardenError::CooldownActive { remaining_seconds: 1, .. }));

    clock.advance(Duration::milliseconds(500));
    perm_ban(&engine, &c, &c.admin).unwrap();

    // Another actor is not affected.
    perm_ban(&engine, &c, &c.owner).unwrap();
}

#[test]
fn pending_request_cools_down_further_high_risk_requests() {
    let mut config = WardenConfig::default();
    config.security.require_sensitive_mode_for_high_risk = false;
    let (engine, c, clock) = setup_with(config);

    perm_ban(&engine, &c, &c.moderator).unwrap();
    clock.advance(Duration::seconds(10));
    let err = perm_ban(&engine, &c, &c.moderator).unwrap_err();
    assert!(matches!(
        err,
        WardenError::CooldownActive {
            remaining_seconds: 50,
            kind: CooldownKind::PendingApproval,
        }
    ));
    assert_eq!(err.to_string(), "High-risk requests are cooling down. Try again in 50s.");

    clock.advance(Duration::seconds(50));
    let outcome = perm_ban(&engine, &c, &c.moderator).unwrap();
    assert!(matches!(outcome, CommandOutcome::PendingApproval { .. }));
}

#[test]
fn low_risk_commands_have_no_cooldown() {
    let (engine, c, _clock) = setup_with(WardenConfig::default());
    for _ in 0..3 {
        engine
            .run_command(CommandRequest::new(
                &c.moderator,
                &c.tenant,
                "warning.create",
                json!({"playerId": c.player, "reason": "Spamming global chat"}),
            ))
            .unwrap();
    }
    assert!(signals(&engine, SIGNAL_HIGH_RISK_BURST).is_empty());
}
