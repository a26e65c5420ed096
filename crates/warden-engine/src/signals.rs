//! Security signals and the detectors that raise them.
//!
//! Detectors are stateless: each one counts recent history, checks whether an
//! equivalent signal already exists in the window, and records at most one.
//! All functions take the connection of the caller's unit of work.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::{info, warn};

use warden_core::constants::{
    SIGNAL_APPROVAL_SPAM, SIGNAL_CROSS_TENANT, SIGNAL_HIGH_RISK_BURST, SIGNAL_LOGIN_BURST,
};
use warden_core::errors::WardenResult;
use warden_core::models::{
    AuditEvent, NewAuditEntry, NewSecuritySignal, RiskLevel, SecuritySettings, SecuritySignal,
    Severity,
};
use warden_storage::queries::{
    approval_ops, command_ops, identity_ops, sensitive_mode_ops, signal_ops,
};
use warden_storage::{fmt_ts, new_id, AuditMode};

use crate::context::EngineContext;
use crate::settings::load_security_settings;

/// Insert `signal`, then apply the tenant's auto-freeze policy to its actor.
pub fn record_signal(
    ctx: &EngineContext,
    conn: &Connection,
    signal: NewSecuritySignal,
) -> WardenResult<SecuritySignal> {
    let stored = SecuritySignal {
        id: new_id(),
        tenant_id: signal.tenant_id,
        actor_id: signal.actor_id,
        severity: signal.severity,
        event_type: signal.event_type,
        metadata: signal.metadata,
        created_at: ctx.clock.now(),
    };
    signal_ops::insert_signal(conn, &stored)?;
    info!(
        event_type = %stored.event_type,
        severity = stored.severity.as_str(),
        tenant_id = ?stored.tenant_id,
        actor_id = ?stored.actor_id,
        "security signal recorded"
    );

    maybe_auto_freeze(ctx, conn, &stored)?;
    Ok(stored)
}

fn freezes_on(event_type: &str) -> bool {
    event_type == SIGNAL_CROSS_TENANT || event_type == SIGNAL_LOGIN_BURST
}

/// Disable the signal's actor when the tenant asks for it. Owners and
/// already-disabled accounts are left alone. Returns true when a user was frozen.
fn maybe_auto_freeze(ctx: &EngineContext, conn: &Connection, signal: &SecuritySignal) -> WardenResult<bool> {
    if !freezes_on(&signal.event_type) {
        return Ok(false);
    }
    let (Some(tenant_id), Some(user_id)) = (signal.tenant_id.as_deref(), signal.actor_id.as_deref())
    else {
        return Ok(false);
    };

    let settings = load_security_settings(conn, tenant_id, &ctx.config.security)?;
    if !settings.auto_freeze_enabled || signal.severity < settings.auto_freeze_threshold {
        return Ok(false);
    }

    if identity_ops::get_membership(conn, tenant_id, user_id)?.is_some_and(|m| m.is_owner) {
        info!(tenant_id, user_id, "auto-freeze skipped for tenant owner");
        return Ok(false);
    }

    let now = ctx.clock.now();
    if !identity_ops::disable_user(conn, user_id, &fmt_ts(&now))? {
        return Ok(false);
    }
    let revoked = sensitive_mode_ops::delete_grants_for_user(conn, user_id)?;

    ctx.audit.append(
        conn,
        NewAuditEntry::new(
            AuditEvent::UserDisabled,
            json!({
                "targetUserId": user_id,
                "disabled": true,
                "source": "auto_freeze",
                "trigger": {
                    "eventType": signal.event_type,
                    "severity": signal.severity.as_str(),
                    "metadata": signal.metadata,
                },
            }),
        )
        .tenant(tenant_id),
        AuditMode::Strict,
    )?;
    warn!(
        tenant_id,
        user_id,
        trigger = %signal.event_type,
        revoked_grants = revoked,
        "user auto-frozen"
    );
    Ok(true)
}

fn window_start(now: DateTime<Utc>, minutes: i64) -> String {
    fmt_ts(&(now - Duration::minutes(minutes)))
}

/// `high_risk_command_burst` once the actor's HIGH executions in the window
/// reach the threshold; CRITICAL at the upper threshold.
pub fn maybe_record_high_risk_burst(
    ctx: &EngineContext,
    conn: &Connection,
    tenant_id: &str,
    actor_id: &str,
) -> WardenResult<Option<SecuritySignal>> {
    let cfg = &ctx.config.signals;
    let since = window_start(ctx.clock.now(), cfg.window_minutes);
    let count = command_ops::count_executions_since(conn, tenant_id, actor_id, RiskLevel::High, &since)?;
    if count < cfg.high_risk_burst_threshold {
        return Ok(None);
    }
    if signal_ops::exists_since(conn, SIGNAL_HIGH_RISK_BURST, Some(tenant_id), Some(actor_id), &since)? {
        return Ok(None);
    }
    let severity = if count >= cfg.high_risk_burst_critical {
        Severity::Critical
    } else {
        Severity::High
    };
    record_signal(
        ctx,
        conn,
        NewSecuritySignal {
            tenant_id: Some(tenant_id.to_string()),
            actor_id: Some(actor_id.to_string()),
            severity,
            event_type: SIGNAL_HIGH_RISK_BURST.to_string(),
            metadata: json!({ "count": count, "windowMinutes": cfg.window_minutes }),
        },
    )
    .map(Some)
}

/// `approval_spam` once the actor's approval requests in the window reach the threshold.
pub fn maybe_record_approval_spam(
    ctx: &EngineContext,
    conn: &Connection,
    tenant_id: &str,
    actor_id: &str,
) -> WardenResult<Option<SecuritySignal>> {
    let cfg = &ctx.config.signals;
    let since = window_start(ctx.clock.now(), cfg.window_minutes);
    let count = approval_ops::count_requests_since(conn, tenant_id, actor_id, &since)?;
    if count < cfg.approval_spam_threshold {
        return Ok(None);
    }
    if signal_ops::exists_since(conn, SIGNAL_APPROVAL_SPAM, Some(tenant_id), Some(actor_id), &since)? {
        return Ok(None);
    }
    record_signal(
        ctx,
        conn,
        NewSecuritySignal {
            tenant_id: Some(tenant_id.to_string()),
            actor_id: Some(actor_id.to_string()),
            severity: Severity::Medium,
            event_type: SIGNAL_APPROVAL_SPAM.to_string(),
            metadata: json!({ "count": count, "windowMinutes": cfg.window_minutes }),
        },
    )
    .map(Some)
}

/// Facts about a failed login, as seen by the burst detector.
#[derive(Debug, Clone)]
pub struct LoginFailure<'a> {
    pub email: &'a str,
    pub user_id: Option<&'a str>,
    pub ip: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub failures: i64,
    pub locked: bool,
}

/// `login_failed_burst` once failures for an email in the lockout window
/// reach the threshold. CRITICAL when the account is now locked.
pub fn maybe_record_login_burst(
    ctx: &EngineContext,
    conn: &Connection,
    settings: &SecuritySettings,
    failure: &LoginFailure<'_>,
) -> WardenResult<Option<SecuritySignal>> {
    if failure.failures < ctx.config.signals.login_burst_threshold {
        return Ok(None);
    }
    let since = window_start(ctx.clock.now(), settings.lockout_window_minutes);
    if signal_ops::exists_for_email_since(conn, SIGNAL_LOGIN_BURST, failure.email, &since)? {
        return Ok(None);
    }
    let tenant_id = match failure.user_id {
        Some(user_id) => identity_ops::primary_tenant_for_user(conn, user_id)?,
        None => None,
    };
    record_signal(
        ctx,
        conn,
        NewSecuritySignal {
            tenant_id,
            actor_id: failure.user_id.map(str::to_string),
            severity: if failure.locked {
                Severity::Critical
            } else {
                Severity::High
            },
            event_type: SIGNAL_LOGIN_BURST.to_string(),
            metadata: json!({
                "email": failure.email,
                "ip": failure.ip,
                "userAgent": failure.user_agent,
                "failures": failure.failures,
                "windowMinutes": settings.lockout_window_minutes,
            }),
        },
    )
    .map(Some)
}

/// Run a detector in its own unit of work after the triggering unit has
/// committed. Failures are logged and dropped.
pub(crate) fn run_detector<F>(ctx: &EngineContext, name: &'static str, detector: F)
where
    F: FnOnce(&Connection) -> WardenResult<Option<SecuritySignal>>,
{
    if let Err(e) = ctx.storage.with_transaction(detector) {
        warn!(detector = name, error = %e, "security signal detector failed");
    }
}
