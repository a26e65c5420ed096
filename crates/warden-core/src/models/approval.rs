use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// Lifecycle of an approval request. Both decided states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// What a second staff member is asked to approve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum ApprovalPayload {
    /// Run a catalog command with already-validated input.
    #[serde(rename = "command")]
    Command {
        command_id: String,
        input: serde_json::Value,
    },
    /// Admit the requester into the tenant with the given role.
    #[serde(rename = "invite.join")]
    InviteJoin {
        invite_id: String,
        user_id: String,
        role_id: String,
    },
}

impl ApprovalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => crate::constants::PAYLOAD_KIND_COMMAND,
            Self::InviteJoin { .. } => crate::constants::PAYLOAD_KIND_INVITE_JOIN,
        }
    }
}

/// A pending or decided two-party decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub tenant_id: String,
    pub status: ApprovalStatus,
    pub risk_level: RiskLevel,
    pub requested_by: String,
    /// Kept as raw JSON so that drifted payloads can still be loaded and reported.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub reason: Option<String>,
}

/// The decision a reviewer submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}
