//! Tenant isolation.
//!
//! Every resource a command touches is loaded through a [`TenantGuard`].
//! A resource owned by another tenant is reported to the caller exactly like
//! a missing one, while the attempt itself is collected in a
//! [`ViolationLog`]. The log is flushed by [`flush_violations`] in separate
//! units of work once the caller's unit has ended, so the telemetry survives
//! the rollback of the operation that triggered it.

use std::cell::RefCell;

use rusqlite::Connection;
use serde_json::json;
use tracing::{error, warn};

use warden_core::constants::SIGNAL_CROSS_TENANT;
use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::{
    AuditEvent, CaseRecord, ModerationAction, NewAuditEntry, NewSecuritySignal, Player, Report,
    ResourceKind, Severity,
};
use warden_storage::queries::{approval_ops, moderation_ops};
use warden_storage::AuditMode;

use crate::context::{ClientInfo, EngineContext};
use crate::signals::record_signal;

/// A cross-tenant reference caught by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub tenant_id: String,
    pub actor_id: Option<String>,
    pub operation: &'static str,
    pub kind: ResourceKind,
    pub resource_id: String,
    pub owner_tenant_id: String,
    pub client: ClientInfo,
}

/// Violations observed during one unit of work.
#[derive(Debug, Default)]
pub struct ViolationLog {
    entries: RefCell<Vec<Violation>>,
}

impl ViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, violation: Violation) {
        self.entries.borrow_mut().push(violation);
    }

    pub fn take(&self) -> Vec<Violation> {
        self.entries.take()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Loads resources on behalf of `actor_id` acting in `tenant_id`.
pub struct TenantGuard<'a> {
    conn: &'a Connection,
    tenant_id: &'a str,
    actor_id: Option<&'a str>,
    client: &'a ClientInfo,
    operation: &'static str,
    log: &'a ViolationLog,
}

impl<'a> TenantGuard<'a> {
    pub fn new(
        conn: &'a Connection,
        tenant_id: &'a str,
        actor_id: Option<&'a str>,
        client: &'a ClientInfo,
        log: &'a ViolationLog,
    ) -> Self {
        Self {
            conn,
            tenant_id,
            actor_id,
            client,
            operation: "write",
            log,
        }
    }

    /// Label recorded as the violation's operation. Defaults to `write`.
    pub fn operation(mut self, operation: &'static str) -> Self {
        self.operation = operation;
        self
    }

    pub fn tenant_id(&self) -> &str {
        self.tenant_id
    }

    /// Fail with `NotFound` unless `resource_id` exists in this tenant.
    pub fn require_in_tenant(&self, kind: ResourceKind, resource_id: &str) -> WardenResult<()> {
        let owner = match kind {
            ResourceKind::Player => {
                moderation_ops::get_player(self.conn, resource_id)?.map(|p| p.tenant_id)
            }
            ResourceKind::Action => {
                moderation_ops::get_action(self.conn, resource_id)?.map(|a| a.tenant_id)
            }
            ResourceKind::Case => {
                moderation_ops::get_case(self.conn, resource_id)?.map(|c| c.tenant_id)
            }
            ResourceKind::Report => {
                moderation_ops::get_report(self.conn, resource_id)?.map(|r| r.tenant_id)
            }
            ResourceKind::Approval => {
                approval_ops::get_approval(self.conn, resource_id)?.map(|a| a.tenant_id)
            }
        };
        match owner {
            Some(owner) => self.check_owner(kind, resource_id, &owner),
            None => Err(WardenError::not_found(kind.label())),
        }
    }

    /// Compare an already-loaded resource's owner against this tenant.
    pub fn check_owner(&self, kind: ResourceKind, resource_id: &str, owner: &str) -> WardenResult<()> {
        if owner == self.tenant_id {
            return Ok(());
        }
        warn!(
            tenant_id = self.tenant_id,
            owner_tenant_id = owner,
            resource = kind.as_str(),
            resource_id,
            "cross-tenant access attempt"
        );
        self.log.record(Violation {
            tenant_id: self.tenant_id.to_string(),
            actor_id: self.actor_id.map(str::to_string),
            operation: self.operation,
            kind,
            resource_id: resource_id.to_string(),
            owner_tenant_id: owner.to_string(),
            client: self.client.clone(),
        });
        Err(WardenError::not_found(kind.label()))
    }

    pub fn player(&self, id: &str) -> WardenResult<Player> {
        let player = moderation_ops::get_player(self.conn, id)?
            .ok_or_else(|| WardenError::not_found(ResourceKind::Player.label()))?;
        self.check_owner(ResourceKind::Player, id, &player.tenant_id)?;
        Ok(player)
    }

    pub fn action(&self, id: &str) -> WardenResult<ModerationAction> {
        let action = moderation_ops::get_action(self.conn, id)?
            .ok_or_else(|| WardenError::not_found(ResourceKind::Action.label()))?;
        self.check_owner(ResourceKind::Action, id, &action.tenant_id)?;
        Ok(action)
    }

    pub fn case(&self, id: &str) -> WardenResult<CaseRecord> {
        let case = moderation_ops::get_case(self.conn, id)?
            .ok_or_else(|| WardenError::not_found(ResourceKind::Case.label()))?;
        self.check_owner(ResourceKind::Case, id, &case.tenant_id)?;
        Ok(case)
    }

    pub fn report(&self, id: &str) -> WardenResult<Report> {
        let report = moderation_ops::get_report(self.conn, id)?
            .ok_or_else(|| WardenError::not_found(ResourceKind::Report.label()))?;
        self.check_owner(ResourceKind::Report, id, &report.tenant_id)?;
        Ok(report)
    }
}

/// Persist every collected violation: a `tenant.violation` audit entry and a
/// CRITICAL `cross_tenant_access_attempt` signal, one transaction each.
///
/// The audit entry is best-effort, so the signal commits even when the
/// append fails. Other failures are logged and dropped.
pub fn flush_violations(ctx: &EngineContext, log: &ViolationLog) {
    for violation in log.take() {
        let result = ctx
            .storage
            .with_transaction(|conn| persist_violation(ctx, conn, &violation));
        if let Err(e) = result {
            error!(
                tenant_id = %violation.tenant_id,
                resource = violation.kind.as_str(),
                resource_id = %violation.resource_id,
                error = %e,
                "failed to record tenant violation"
            );
        }
    }
}

fn persist_violation(ctx: &EngineContext, conn: &Connection, violation: &Violation) -> WardenResult<()> {
    let mut entry = NewAuditEntry::new(
        AuditEvent::TenantViolation,
        json!({
            "operation": violation.operation,
            "resource": violation.kind.as_str(),
            "resourceId": violation.resource_id,
            "resourceCommunityId": violation.owner_tenant_id,
        }),
    )
    .tenant(violation.tenant_id.as_str())
    .client(violation.client.ip.clone(), violation.client.user_agent.clone());
    entry.actor_id = violation.actor_id.clone();
    ctx.audit.append(conn, entry, AuditMode::BestEffort)?;

    record_signal(
        ctx,
        conn,
        NewSecuritySignal {
            tenant_id: Some(violation.tenant_id.clone()),
            actor_id: violation.actor_id.clone(),
            severity: Severity::Critical,
            event_type: SIGNAL_CROSS_TENANT.to_string(),
            metadata: json!({
                "operation": violation.operation,
                "resource": violation.kind.as_str(),
                "resourceId": violation.resource_id,
                "ownerTenantId": violation.owner_tenant_id,
                "ip": violation.client.ip,
                "userAgent": violation.client.user_agent,
            }),
        },
    )?;
    Ok(())
}
