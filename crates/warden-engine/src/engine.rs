//! `CommandEngine`: the public face of the crate.
//!
//! Every mutating call is one `BEGIN IMMEDIATE` unit of work. Tenant
//! violations collected during the unit are flushed after it ends, and the
//! burst and spam detectors run after commit in their own units.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use warden_core::constants::{PENDING_APPROVALS_LIMIT, SECURITY_SETTINGS_KEY};
use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{
    ApprovalRequest, AuditEvent, Capability, NewAuditEntry, RiskLevel, SecuritySettings,
};
use warden_core::security::authorize;
use warden_storage::audit::verify_stored_chain;
use warden_storage::queries::{approval_ops, command_ops, settings_ops};
use warden_storage::{fmt_ts, AuditMode, ChainVerification};

use crate::actor::resolve_actor;
use crate::approval::{self, DecisionOutcome, DecisionRequest};
use crate::catalog::{CommandCatalog, CommandSummary};
use crate::context::{ClientInfo, EngineContext};
use crate::execution::{
    enforce_command_cooldown, ensure_enabled, execute_command, ExecutionInput,
};
use crate::sensitive_mode::{require_sensitive_mode, SensitiveModeService};
use crate::settings::{load_security_settings, validate_security_settings};
use crate::signals::{maybe_record_approval_spam, maybe_record_high_risk_burst, run_detector};
use crate::tenant_guard::{flush_violations, ViolationLog};

const PENDING_MESSAGE: &str = "Approval requested. Awaiting a second staff decision.";

/// A request to run one catalog command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub actor_user_id: String,
    pub tenant_id: String,
    pub command_id: String,
    pub raw_input: Value,
    pub session_token: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl CommandRequest {
    pub fn new(
        actor_user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        command_id: impl Into<String>,
        raw_input: Value,
    ) -> Self {
        Self {
            actor_user_id: actor_user_id.into(),
            tenant_id: tenant_id.into(),
            command_id: command_id.into(),
            raw_input,
            session_token: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn client(mut self, ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Executed {
        message: String,
        redirect: Option<String>,
    },
    PendingApproval {
        approval_id: String,
        message: String,
    },
}

impl CommandOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Executed { message, .. } | Self::PendingApproval { message, .. } => message,
        }
    }
}

pub struct CommandEngine {
    ctx: EngineContext,
}

impl CommandEngine {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.ctx.catalog
    }

    pub fn list_commands(&self) -> Vec<CommandSummary> {
        self.ctx.catalog.summaries()
    }

    pub fn sensitive_mode(&self) -> SensitiveModeService {
        SensitiveModeService::new(self.ctx.clone())
    }

    /// Run a command, or park it for a second decision when the tenant's
    /// two-person rule covers its risk tier.
    pub fn run_command(&self, request: CommandRequest) -> WardenResult<CommandOutcome> {
        let ctx = &self.ctx;
        let now = ctx.clock.now();
        let client = ClientInfo::new(request.ip.clone(), request.user_agent.clone());
        let tenant_id = request.tenant_id.as_str();
        let actor_id = request.actor_user_id.as_str();

        let definition = ctx.catalog.lookup(&request.command_id)?;

        let (input, settings) = ctx.storage.breaker().guard(now, || {
            ctx.storage.with_reader(|conn| {
                let actor = resolve_actor(conn, actor_id, tenant_id)?;
                authorize(&actor, definition.capability)?;
                ensure_enabled(conn, tenant_id, definition)?;
                let input = definition.parse_input(&request.raw_input)?;
                let settings = load_security_settings(conn, tenant_id, &ctx.config.security)?;
                Ok((input, settings))
            })
        })?;

        let violations = ViolationLog::new();
        let result = ctx.storage.with_transaction(|conn| {
            if definition.risk == RiskLevel::High {
                if settings.require_sensitive_mode_for_high_risk {
                    require_sensitive_mode(conn, now, actor_id, request.session_token.as_deref())?;
                }
                enforce_command_cooldown(conn, &settings, tenant_id, actor_id, definition.id, now)?;

                if settings.two_person_rule {
                    let approval_id = approval::submit_command(
                        ctx, conn, &settings, tenant_id, actor_id, definition, &input, &client,
                    )?;
                    return Ok(CommandOutcome::PendingApproval {
                        approval_id,
                        message: PENDING_MESSAGE.to_string(),
                    });
                }
            }

            let executed = execute_command(
                ctx,
                conn,
                &violations,
                &ExecutionInput {
                    definition,
                    actor_user_id: actor_id,
                    tenant_id,
                    input: &input,
                    client: &client,
                    approval_id: None,
                    approved_by: None,
                    now,
                },
            )?;
            Ok(CommandOutcome::Executed {
                message: executed.message,
                redirect: executed.redirect,
            })
        });
        flush_violations(ctx, &violations);
        let outcome = result?;

        match &outcome {
            CommandOutcome::PendingApproval { .. } => {
                run_detector(ctx, "approval_spam", |conn| {
                    maybe_record_approval_spam(ctx, conn, tenant_id, actor_id)
                });
            }
            CommandOutcome::Executed { .. } if definition.risk == RiskLevel::High => {
                run_detector(ctx, "high_risk_command_burst", |conn| {
                    maybe_record_high_risk_burst(ctx, conn, tenant_id, actor_id)
                });
            }
            CommandOutcome::Executed { .. } => {}
        }
        Ok(outcome)
    }

    /// Approve or reject a pending request.
    pub fn decide_approval(&self, request: DecisionRequest) -> WardenResult<DecisionOutcome> {
        let ctx = &self.ctx;
        let now = ctx.clock.now();
        let violations = ViolationLog::new();

        let result = ctx.storage.breaker().guard(now, || {
            ctx.storage
                .with_transaction(|conn| approval::decide(ctx, conn, &violations, &request, now))
        });
        flush_violations(ctx, &violations);
        let decided = result?;

        if let Some((tenant_id, requester)) = decided.burst_check.as_ref() {
            run_detector(ctx, "high_risk_command_burst", |conn| {
                maybe_record_high_risk_burst(ctx, conn, tenant_id, requester)
            });
        }
        Ok(decided.outcome)
    }

    /// Park a community join for staff approval. Returns the request id.
    pub fn submit_invite_join(
        &self,
        tenant_id: &str,
        user_id: &str,
        invite_id: &str,
        role_id: &str,
        client: &ClientInfo,
    ) -> WardenResult<String> {
        let ctx = &self.ctx;
        let approval_id = ctx.storage.with_transaction(|conn| {
            approval::submit_invite_join(ctx, conn, tenant_id, user_id, invite_id, role_id, client)
        })?;
        run_detector(ctx, "approval_spam", |conn| {
            maybe_record_approval_spam(ctx, conn, tenant_id, user_id)
        });
        Ok(approval_id)
    }

    /// Enable or disable a catalog command for one tenant.
    pub fn set_command_enabled(
        &self,
        actor_user_id: &str,
        tenant_id: &str,
        command_id: &str,
        enabled: bool,
        client: &ClientInfo,
    ) -> WardenResult<()> {
        let ctx = &self.ctx;
        let definition = ctx.catalog.lookup(command_id)?;
        let now = ctx.clock.now();
        ctx.storage.with_transaction(|conn| {
            let actor = resolve_actor(conn, actor_user_id, tenant_id)?;
            authorize(&actor, Capability::CommandsManage)?;
            command_ops::upsert_toggle(conn, tenant_id, definition.id, enabled, &fmt_ts(&now))?;
            ctx.audit.append(
                conn,
                NewAuditEntry::new(
                    AuditEvent::CommandToggled,
                    json!({ "commandId": definition.id, "enabled": enabled }),
                )
                .tenant(tenant_id)
                .actor(actor_user_id)
                .client(client.ip.clone(), client.user_agent.clone()),
                AuditMode::Strict,
            )?;
            info!(command_id = definition.id, tenant_id, enabled, "command toggled");
            Ok(())
        })
    }

    /// The tenant's effective security policy.
    pub fn security_settings(&self, tenant_id: &str) -> WardenResult<SecuritySettings> {
        self.ctx
            .storage
            .with_reader(|conn| load_security_settings(conn, tenant_id, &self.ctx.config.security))
    }

    pub fn update_security_settings(
        &self,
        actor_user_id: &str,
        tenant_id: &str,
        settings: &SecuritySettings,
        client: &ClientInfo,
    ) -> WardenResult<SecuritySettings> {
        validate_security_settings(settings)?;
        let ctx = &self.ctx;
        let now = ctx.clock.now();
        let document = serde_json::to_value(settings)?;
        ctx.storage.with_transaction(|conn| {
            let actor = resolve_actor(conn, actor_user_id, tenant_id)?;
            authorize(&actor, Capability::SettingsEdit)?;
            settings_ops::upsert_setting(
                conn,
                tenant_id,
                SECURITY_SETTINGS_KEY,
                &document.to_string(),
                &fmt_ts(&now),
            )?;
            ctx.audit.append(
                conn,
                NewAuditEntry::new(
                    AuditEvent::SettingsUpdated,
                    json!({ "key": SECURITY_SETTINGS_KEY, "value": document }),
                )
                .tenant(tenant_id)
                .actor(actor_user_id)
                .client(client.ip.clone(), client.user_agent.clone()),
                AuditMode::Strict,
            )?;
            info!(tenant_id, "security settings updated");
            Ok(settings.clone())
        })
    }

    /// Newest pending requests of a tenant.
    pub fn list_pending_approvals(&self, tenant_id: &str) -> WardenResult<Vec<ApprovalRequest>> {
        self.ctx
            .storage
            .with_reader(|conn| approval_ops::list_pending(conn, tenant_id, PENDING_APPROVALS_LIMIT))
    }

    pub fn verify_audit_chain(&self) -> WardenResult<ChainVerification> {
        self.ctx.storage.with_reader(verify_stored_chain)
    }

    pub fn approval(&self, approval_id: &str) -> WardenResult<ApprovalRequest> {
        self.ctx
            .storage
            .with_reader(|conn| approval_ops::get_approval(conn, approval_id))?
            .ok_or_else(|| WardenError::not_found("Approval request"))
    }
}
