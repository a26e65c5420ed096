//! Two-person approval workflow.
//!
//! A request moves `PENDING -> APPROVED` or `PENDING -> REJECTED` exactly
//! once. Submission and decision each run inside the caller's unit of work;
//! the engine runs the follow-up detectors after commit.

mod decide;
mod submit;

use serde::{Deserialize, Serialize};

use warden_core::models::ApprovalDecision;

use crate::context::ClientInfo;

pub(crate) use decide::decide;
pub(crate) use submit::{submit_command, submit_invite_join};

/// A reviewer's decision on one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub approval_id: String,
    pub decider_user_id: String,
    pub decision: ApprovalDecision,
    pub session_token: Option<String>,
    pub reason: Option<String>,
    /// Tenant the reviewer is currently acting in. A request from another
    /// tenant is then reported as not found.
    #[serde(default)]
    pub active_tenant_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl DecisionRequest {
    pub fn new(approval_id: impl Into<String>, decider_user_id: impl Into<String>, decision: ApprovalDecision) -> Self {
        Self {
            approval_id: approval_id.into(),
            decider_user_id: decider_user_id.into(),
            decision,
            session_token: None,
            reason: None,
            active_tenant_id: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn in_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.active_tenant_id = Some(tenant_id.into());
        self
    }

    pub(crate) fn client(&self) -> ClientInfo {
        ClientInfo::new(self.ip.clone(), self.user_agent.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved {
        message: String,
        redirect: Option<String>,
    },
    Rejected {
        message: String,
    },
}

impl DecisionOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Approved { message, .. } | Self::Rejected { message } => message,
        }
    }
}
