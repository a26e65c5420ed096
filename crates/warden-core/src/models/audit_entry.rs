use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types recorded in the audit chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEvent {
    #[serde(rename = "action.created")]
    ActionCreated,
    #[serde(rename = "action.revoked")]
    ActionRevoked,
    #[serde(rename = "player.updated")]
    PlayerUpdated,
    #[serde(rename = "case.created")]
    CaseCreated,
    #[serde(rename = "case.updated")]
    CaseUpdated,
    #[serde(rename = "report.status_updated")]
    ReportStatusUpdated,
    #[serde(rename = "approval.requested")]
    ApprovalRequested,
    #[serde(rename = "approval.decided")]
    ApprovalDecided,
    #[serde(rename = "command.executed")]
    CommandExecuted,
    #[serde(rename = "command.toggled")]
    CommandToggled,
    #[serde(rename = "tenant.violation")]
    TenantViolation,
    #[serde(rename = "user.disabled")]
    UserDisabled,
    #[serde(rename = "settings.updated")]
    SettingsUpdated,
    #[serde(rename = "sensitive_mode.enabled")]
    SensitiveModeEnabled,
    #[serde(rename = "sensitive_mode.disabled")]
    SensitiveModeDisabled,
    #[serde(rename = "login.failed")]
    LoginFailed,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionCreated => "action.created",
            Self::ActionRevoked => "action.revoked",
            Self::PlayerUpdated => "player.updated",
            Self::CaseCreated => "case.created",
            Self::CaseUpdated => "case.updated",
            Self::ReportStatusUpdated => "report.status_updated",
            Self::ApprovalRequested => "approval.requested",
            Self::ApprovalDecided => "approval.decided",
            Self::CommandExecuted => "command.executed",
            Self::CommandToggled => "command.toggled",
            Self::TenantViolation => "tenant.violation",
            Self::UserDisabled => "user.disabled",
            Self::SettingsUpdated => "settings.updated",
            Self::SensitiveModeEnabled => "sensitive_mode.enabled",
            Self::SensitiveModeDisabled => "sensitive_mode.disabled",
            Self::LoginFailed => "login.failed",
        }
    }
}

/// A fact to be appended to the chain. Index and hashes are assigned by the writer.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub event: AuditEvent,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
}

impl NewAuditEntry {
    pub fn new(event: AuditEvent, metadata: serde_json::Value) -> Self {
        Self {
            tenant_id: None,
            actor_id: None,
            event,
            ip: None,
            user_agent: None,
            metadata,
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip = ip;
        self.user_agent = user_agent;
        self
    }
}

/// One persisted link of the audit chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// 1-based, gap-free.
    pub chain_index: i64,
    /// Hash of the entry at `chain_index - 1`; `None` only for the first entry.
    pub prev_hash: Option<String>,
    pub hash: String,
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub event_type: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
