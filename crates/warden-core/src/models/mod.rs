mod actor;
mod approval;
mod audit_entry;
mod capability;
mod execution;
mod moderation;
mod resource;
mod risk;
mod security_settings;
mod security_signal;
mod sensitive_mode;

pub use actor::Actor;
pub use approval::{ApprovalDecision, ApprovalPayload, ApprovalRequest, ApprovalStatus};
pub use audit_entry::{AuditEvent, AuditLogEntry, NewAuditEntry};
pub use capability::Capability;
pub use execution::CommandExecutionRecord;
pub use moderation::{
    ActionType, CaseRecord, CaseStatus, ModerationAction, Player, PlayerStatus, Report,
    ReportStatus,
};
pub use resource::ResourceKind;
pub use risk::RiskLevel;
pub use security_settings::SecuritySettings;
pub use security_signal::{NewSecuritySignal, SecuritySignal, Severity};
pub use sensitive_mode::{SensitiveModeGrant, SensitiveModeStatus};
