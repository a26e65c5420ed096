use std::fmt;

use super::StorageError;

/// Which cooldown rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownKind {
    /// The actor recently executed the same high-risk command.
    Command,
    /// The actor already has a pending high-risk approval request.
    PendingApproval,
}

impl fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("Command cooldown active."),
            Self::PendingApproval => f.write_str("High-risk requests are cooling down."),
        }
    }
}

/// Top-level error type surfaced to engine callers.
///
/// Messages of the caller-facing variants are user-presentable as is.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    #[error("{reason}")]
    Forbidden { reason: String },

    #[error("Unknown command: {id}.")]
    UnknownCommand { id: String },

    #[error("This command is currently disabled.")]
    CommandDisabled { id: String },

    #[error("{message}")]
    ValidationFailed { message: String },

    /// Also returned for resources owned by another tenant.
    #[error("{resource} not found.")]
    NotFound { resource: String },

    #[error("Approver must be different from requester.")]
    SelfApprovalForbidden,

    #[error("Sensitive mode is required for high-risk operations.")]
    SensitiveModeRequired,

    #[error("{kind} Try again in {remaining_seconds}s.")]
    CooldownActive {
        remaining_seconds: i64,
        kind: CooldownKind,
    },

    #[error("Approval request is no longer pending.")]
    AlreadyDecided,

    #[error("Service temporarily unavailable. Try again shortly.")]
    ServiceUnavailable,

    /// A domain rule rejected the operation (e.g. extending a permanent ban).
    #[error("{message}")]
    InvalidState { message: String },

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl WardenError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// True when the failure came from the datastore being unreachable.
    pub fn is_outage(&self) -> bool {
        matches!(self, Self::StorageError(e) if e.is_unavailable())
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::StorageError(e) if e.is_foreign_key_violation())
    }
}
