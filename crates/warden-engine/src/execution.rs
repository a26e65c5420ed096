//! The single code path that applies a command, shared by direct runs and
//! approved requests.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

use warden_core::errors::{CooldownKind, WardenError, WardenResult};
use warden_core::models::{
    AuditEvent, CommandExecutionRecord, NewAuditEntry, RiskLevel, SecuritySettings,
};
use warden_core::security::authorize;
use warden_storage::queries::{approval_ops, command_ops};
use warden_storage::{fmt_ts, new_id, AuditMode};

use crate::actor::resolve_actor;
use crate::catalog::CommandDefinition;
use crate::context::{ClientInfo, EngineContext};
use crate::handlers::HandlerContext;
use crate::tenant_guard::{TenantGuard, ViolationLog};

/// Who runs what, and under which approval.
#[derive(Debug, Clone)]
pub struct ExecutionInput<'a> {
    pub definition: &'a CommandDefinition,
    pub actor_user_id: &'a str,
    pub tenant_id: &'a str,
    /// Already normalized by the command's schema.
    pub input: &'a Value,
    pub client: &'a ClientInfo,
    pub approval_id: Option<&'a str>,
    pub approved_by: Option<&'a str>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub message: String,
    pub redirect: Option<String>,
}

/// Commands are enabled unless a toggle says otherwise.
pub fn ensure_enabled(conn: &Connection, tenant_id: &str, definition: &CommandDefinition) -> WardenResult<()> {
    if command_ops::get_toggle(conn, tenant_id, definition.id)? == Some(false) {
        return Err(WardenError::CommandDisabled {
            id: definition.id.to_string(),
        });
    }
    Ok(())
}

/// Seconds left until `last + cooldown`, rounded up and never below one.
/// `None` once the cooldown has elapsed.
fn remaining_seconds(last: DateTime<Utc>, cooldown_secs: i64, now: DateTime<Utc>) -> Option<i64> {
    let remaining_ms = (last + Duration::seconds(cooldown_secs) - now).num_milliseconds();
    (remaining_ms > 0).then(|| ((remaining_ms + 999) / 1000).max(1))
}

/// Reject a HIGH-risk run while the actor's previous run of the same command
/// is inside the cooldown.
pub fn enforce_command_cooldown(
    conn: &Connection,
    settings: &SecuritySettings,
    tenant_id: &str,
    actor_id: &str,
    command_id: &str,
    now: DateTime<Utc>,
) -> WardenResult<()> {
    let cooldown = settings.high_risk_command_cooldown_seconds;
    if cooldown <= 0 {
        return Ok(());
    }
    let since = fmt_ts(&(now - Duration::seconds(cooldown)));
    let last = command_ops::latest_execution_since(conn, tenant_id, actor_id, command_id, &since)?;
    match last.and_then(|last| remaining_seconds(last, cooldown, now)) {
        Some(remaining_seconds) => Err(WardenError::CooldownActive {
            remaining_seconds,
            kind: CooldownKind::Command,
        }),
        None => Ok(()),
    }
}

/// Reject a new HIGH-risk request while the actor already has a pending one
/// inside the cooldown.
pub fn enforce_pending_cooldown(
    conn: &Connection,
    settings: &SecuritySettings,
    tenant_id: &str,
    actor_id: &str,
    now: DateTime<Utc>,
) -> WardenResult<()> {
    let cooldown = settings.high_risk_command_cooldown_seconds;
    if cooldown <= 0 {
        return Ok(());
    }
    let since = fmt_ts(&(now - Duration::seconds(cooldown)));
    let last = approval_ops::latest_pending_since(conn, tenant_id, actor_id, RiskLevel::High, &since)?;
    match last.and_then(|last| remaining_seconds(last, cooldown, now)) {
        Some(remaining_seconds) => Err(WardenError::CooldownActive {
            remaining_seconds,
            kind: CooldownKind::PendingApproval,
        }),
        None => Ok(()),
    }
}

/// Apply one command inside the caller's unit of work: re-authorize, re-check
/// the toggle, run the handler, write `command.executed`, record the run.
pub fn execute_command(
    ctx: &EngineContext,
    conn: &Connection,
    violations: &ViolationLog,
    exec: &ExecutionInput<'_>,
) -> WardenResult<ExecutionResult> {
    let def = exec.definition;
    let actor = resolve_actor(conn, exec.actor_user_id, exec.tenant_id)?;
    authorize(&actor, def.capability)?;
    ensure_enabled(conn, exec.tenant_id, def)?;

    let handler_ctx = HandlerContext {
        conn,
        tenant_id: exec.tenant_id,
        actor_id: exec.actor_user_id,
        now: exec.now,
        client: exec.client,
        audit: &ctx.audit,
        guard: TenantGuard::new(conn, exec.tenant_id, Some(exec.actor_user_id), exec.client, violations),
    };
    let output = (def.handler)(&handler_ctx, exec.input)?;

    let mut metadata = json!({
        "commandId": def.id,
        "riskLevel": def.risk.as_str(),
    });
    if let Some(approval_id) = exec.approval_id {
        metadata["approvalId"] = json!(approval_id);
    }
    if let Some(approved_by) = exec.approved_by {
        metadata["approvedByUserId"] = json!(approved_by);
    }
    ctx.audit.append(
        conn,
        NewAuditEntry::new(AuditEvent::CommandExecuted, metadata)
            .tenant(exec.tenant_id)
            .actor(exec.actor_user_id)
            .client(exec.client.ip.clone(), exec.client.user_agent.clone()),
        AuditMode::Strict,
    )?;

    command_ops::insert_execution(
        conn,
        &CommandExecutionRecord {
            id: new_id(),
            tenant_id: exec.tenant_id.to_string(),
            command_id: def.id.to_string(),
            risk_level: def.risk,
            actor_id: exec.actor_user_id.to_string(),
            approval_id: exec.approval_id.map(str::to_string),
            created_at: exec.now,
        },
    )?;

    info!(
        command_id = def.id,
        tenant_id = exec.tenant_id,
        actor_id = exec.actor_user_id,
        approval_id = ?exec.approval_id,
        "command executed"
    );
    Ok(ExecutionResult {
        message: format!("{} completed.", def.name),
        redirect: output.redirect,
    })
}
