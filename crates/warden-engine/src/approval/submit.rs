use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

use warden_core::errors::WardenResult;
use warden_core::models::{ApprovalPayload, AuditEvent, NewAuditEntry, RiskLevel, SecuritySettings};
use warden_storage::queries::approval_ops::{self, InsertApprovalParams};
use warden_storage::{fmt_ts, new_id, AuditMode};

use crate::catalog::CommandDefinition;
use crate::context::{ClientInfo, EngineContext};
use crate::execution::enforce_pending_cooldown;

fn insert_pending(
    conn: &Connection,
    tenant_id: &str,
    requested_by: &str,
    risk: RiskLevel,
    payload: &ApprovalPayload,
    now: DateTime<Utc>,
) -> WardenResult<String> {
    let id = new_id();
    let payload_json = serde_json::to_string(payload)?;
    approval_ops::insert_approval(
        conn,
        &InsertApprovalParams {
            id: &id,
            tenant_id,
            risk_level: risk,
            requested_by,
            payload_json: &payload_json,
            created_at: &fmt_ts(&now),
        },
    )?;
    Ok(id)
}

/// Park a HIGH-risk command as a PENDING request. `input` is the normalized
/// form. Returns the request id.
#[allow(clippy::too_many_arguments)]
pub(crate) fn submit_command(
    ctx: &EngineContext,
    conn: &Connection,
    settings: &SecuritySettings,
    tenant_id: &str,
    actor_id: &str,
    definition: &CommandDefinition,
    input: &Value,
    client: &ClientInfo,
) -> WardenResult<String> {
    let now = ctx.clock.now();
    enforce_pending_cooldown(conn, settings, tenant_id, actor_id, now)?;

    let payload = ApprovalPayload::Command {
        command_id: definition.id.to_string(),
        input: input.clone(),
    };
    let approval_id = insert_pending(conn, tenant_id, actor_id, definition.risk, &payload, now)?;

    ctx.audit.append(
        conn,
        NewAuditEntry::new(
            AuditEvent::ApprovalRequested,
            json!({
                "approvalId": approval_id,
                "commandId": definition.id,
                "riskLevel": definition.risk.as_str(),
            }),
        )
        .tenant(tenant_id)
        .actor(actor_id)
        .client(client.ip.clone(), client.user_agent.clone()),
        AuditMode::Strict,
    )?;
    info!(approval_id = %approval_id, command_id = definition.id, tenant_id, "approval requested");
    Ok(approval_id)
}

/// Park a community join behind a MEDIUM-risk request. The joining user is
/// the requester.
pub(crate) fn submit_invite_join(
    ctx: &EngineContext,
    conn: &Connection,
    tenant_id: &str,
    user_id: &str,
    invite_id: &str,
    role_id: &str,
    client: &ClientInfo,
) -> WardenResult<String> {
    let now = ctx.clock.now();
    let payload = ApprovalPayload::InviteJoin {
        invite_id: invite_id.to_string(),
        user_id: user_id.to_string(),
        role_id: role_id.to_string(),
    };
    let approval_id = insert_pending(conn, tenant_id, user_id, RiskLevel::Medium, &payload, now)?;

    ctx.audit.append(
        conn,
        NewAuditEntry::new(
            AuditEvent::ApprovalRequested,
            json!({
                "approvalId": approval_id,
                "kind": payload.kind(),
                "inviteId": invite_id,
                "roleId": role_id,
            }),
        )
        .tenant(tenant_id)
        .actor(user_id)
        .client(client.ip.clone(), client.user_agent.clone()),
        AuditMode::Strict,
    )?;
    info!(approval_id = %approval_id, tenant_id, user_id, "invite join approval requested");
    Ok(approval_id)
}
