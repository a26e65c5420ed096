use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// "Command X ran for actor Y at time T". Written once, read for cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandExecutionRecord {
    pub id: String,
    pub tenant_id: String,
    pub command_id: String,
    pub risk_level: RiskLevel,
    pub actor_id: String,
    pub approval_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
