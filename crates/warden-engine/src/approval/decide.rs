use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{
    ApprovalDecision, ApprovalPayload, ApprovalRequest, ApprovalStatus, AuditEvent, Capability,
    NewAuditEntry, ResourceKind, RiskLevel,
};
use warden_core::security::authorize;
use warden_storage::queries::{approval_ops, identity_ops};
use warden_storage::{fmt_ts, AuditMode};

use super::{DecisionOutcome, DecisionRequest};
use crate::actor::resolve_actor;
use crate::context::{ClientInfo, EngineContext};
use crate::execution::{enforce_command_cooldown, execute_command, ExecutionInput};
use crate::sensitive_mode::require_sensitive_mode;
use crate::settings::load_security_settings;
use crate::tenant_guard::{TenantGuard, ViolationLog};

const INVALID_PAYLOAD: &str = "Approval payload is invalid for the command.";

/// Result of a decision plus the follow-up the engine runs after commit.
#[derive(Debug)]
pub(crate) struct Decided {
    pub outcome: DecisionOutcome,
    /// `(tenant_id, requester)` when a HIGH-risk command was executed.
    pub burst_check: Option<(String, String)>,
}

/// Decide one request inside the caller's unit of work. Any error rolls the
/// whole decision back and leaves the request PENDING.
pub(crate) fn decide(
    ctx: &EngineContext,
    conn: &Connection,
    violations: &ViolationLog,
    request: &DecisionRequest,
    now: DateTime<Utc>,
) -> WardenResult<Decided> {
    let client = request.client();
    let decider = request.decider_user_id.as_str();

    let approval = approval_ops::get_approval(conn, &request.approval_id)?
        .ok_or_else(|| WardenError::not_found(ResourceKind::Approval.label()))?;

    if let Some(active_tenant) = request.active_tenant_id.as_deref() {
        TenantGuard::new(conn, active_tenant, Some(decider), &client, violations)
            .operation("decide")
            .check_owner(ResourceKind::Approval, &approval.id, &approval.tenant_id)?;
    }

    if approval.status.is_terminal() {
        return Err(WardenError::AlreadyDecided);
    }
    if approval.requested_by == decider {
        return Err(WardenError::SelfApprovalForbidden);
    }

    let reviewer = resolve_actor(conn, decider, &approval.tenant_id)?;
    authorize(&reviewer, Capability::ApprovalsDecide)?;

    let settings = load_security_settings(conn, &approval.tenant_id, &ctx.config.security)?;
    if approval.risk_level == RiskLevel::High && settings.require_sensitive_mode_for_high_risk {
        require_sensitive_mode(conn, now, decider, request.session_token.as_deref())?;
    }

    match request.decision {
        ApprovalDecision::Reject => reject(ctx, conn, &approval, request, &client, now),
        ApprovalDecision::Approve => {
            let payload: ApprovalPayload = serde_json::from_value(approval.payload.clone())
                .map_err(|_| WardenError::validation(INVALID_PAYLOAD))?;
            match payload {
                ApprovalPayload::Command { command_id, input } => {
                    if approval.risk_level == RiskLevel::High {
                        enforce_command_cooldown(
                            conn,
                            &settings,
                            &approval.tenant_id,
                            &approval.requested_by,
                            &command_id,
                            now,
                        )?;
                    }
                    let definition = ctx.catalog.lookup(&command_id)?;
                    let parsed = definition
                        .parse_input(&input)
                        .map_err(|_| WardenError::validation(INVALID_PAYLOAD))?;

                    record_decision(
                        ctx,
                        conn,
                        &approval,
                        decider,
                        &client,
                        json!({
                            "approvalId": approval.id,
                            "status": ApprovalStatus::Approved.as_str(),
                            "commandId": command_id,
                        }),
                    )?;

                    let result = execute_command(
                        ctx,
                        conn,
                        violations,
                        &ExecutionInput {
                            definition,
                            actor_user_id: &approval.requested_by,
                            tenant_id: &approval.tenant_id,
                            input: &parsed,
                            client: &client,
                            approval_id: Some(&approval.id),
                            approved_by: Some(decider),
                            now,
                        },
                    )?;

                    mark(conn, &approval, ApprovalStatus::Approved, decider, now, None)?;
                    info!(approval_id = %approval.id, command_id = %command_id, decider, "approval approved");

                    Ok(Decided {
                        outcome: DecisionOutcome::Approved {
                            message: result.message,
                            redirect: result.redirect,
                        },
                        burst_check: (definition.risk == RiskLevel::High)
                            .then(|| (approval.tenant_id.clone(), approval.requested_by.clone())),
                    })
                }
                ApprovalPayload::InviteJoin { role_id, .. } => {
                    if !identity_ops::role_in_tenant(conn, &role_id, &approval.tenant_id)? {
                        return Err(WardenError::invalid_state("Role not found for this community."));
                    }
                    record_decision(
                        ctx,
                        conn,
                        &approval,
                        decider,
                        &client,
                        json!({
                            "approvalId": approval.id,
                            "status": ApprovalStatus::Approved.as_str(),
                            "kind": warden_core::constants::PAYLOAD_KIND_INVITE_JOIN,
                            "roleId": role_id,
                            "targetUserId": approval.requested_by,
                        }),
                    )?;
                    identity_ops::upsert_membership(
                        conn,
                        &approval.tenant_id,
                        &approval.requested_by,
                        &role_id,
                        &fmt_ts(&now),
                    )?;
                    mark(conn, &approval, ApprovalStatus::Approved, decider, now, None)?;
                    info!(approval_id = %approval.id, decider, "invite join approved");

                    Ok(Decided {
                        outcome: DecisionOutcome::Approved {
                            message: "Invite access approved.".to_string(),
                            redirect: None,
                        },
                        burst_check: None,
                    })
                }
            }
        }
    }
}

fn reject(
    ctx: &EngineContext,
    conn: &Connection,
    approval: &ApprovalRequest,
    request: &DecisionRequest,
    client: &ClientInfo,
    now: DateTime<Utc>,
) -> WardenResult<Decided> {
    let decider = request.decider_user_id.as_str();
    let reason = request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    mark(conn, approval, ApprovalStatus::Rejected, decider, now, reason)?;

    let mut metadata = json!({
        "approvalId": approval.id,
        "status": ApprovalStatus::Rejected.as_str(),
    });
    if let Some(reason) = reason {
        metadata["reason"] = json!(reason);
    }
    record_decision(ctx, conn, approval, decider, client, metadata)?;
    info!(approval_id = %approval.id, decider, "approval rejected");

    Ok(Decided {
        outcome: DecisionOutcome::Rejected {
            message: "Approval rejected.".to_string(),
        },
        burst_check: None,
    })
}

fn record_decision(
    ctx: &EngineContext,
    conn: &Connection,
    approval: &ApprovalRequest,
    decider: &str,
    client: &ClientInfo,
    metadata: serde_json::Value,
) -> WardenResult<()> {
    ctx.audit.append(
        conn,
        NewAuditEntry::new(AuditEvent::ApprovalDecided, metadata)
            .tenant(approval.tenant_id.as_str())
            .actor(decider)
            .client(client.ip.clone(), client.user_agent.clone()),
        AuditMode::Strict,
    )?;
    Ok(())
}

/// Flip the status. A concurrent decision that got there first makes this
/// touch zero rows.
fn mark(
    conn: &Connection,
    approval: &ApprovalRequest,
    status: ApprovalStatus,
    decider: &str,
    now: DateTime<Utc>,
    reason: Option<&str>,
) -> WardenResult<()> {
    let changed = approval_ops::set_decision(conn, &approval.id, status, decider, &fmt_ts(&now), reason)?;
    if changed != 1 {
        return Err(WardenError::AlreadyDecided);
    }
    Ok(())
}
