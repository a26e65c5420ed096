use std::fmt;

/// Tenant-scoped resources a command may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Player,
    Action,
    Case,
    Report,
    Approval,
}

impl ResourceKind {
    /// Lowercase name used in telemetry metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Action => "action",
            Self::Case => "case",
            Self::Report => "report",
            Self::Approval => "approval",
        }
    }

    /// Capitalized name used in caller-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Action => "Action",
            Self::Case => "Case",
            Self::Report => "Report",
            Self::Approval => "Approval request",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
