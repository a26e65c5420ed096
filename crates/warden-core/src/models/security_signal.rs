use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered so that `Severity::Critical > Severity::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A signal to be recorded.
#[derive(Debug, Clone)]
pub struct NewSecuritySignal {
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub severity: Severity,
    pub event_type: String,
    pub metadata: serde_json::Value,
}

/// A stored security signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySignal {
    pub id: String,
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub severity: Severity,
    pub event_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
