use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-lived elevated-trust flag bound to one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveModeGrant {
    pub session_token: String,
    pub user_id: String,
    pub enabled_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SensitiveModeGrant {
    /// True when the grant belongs to `user_id` and has not expired at `now`.
    pub fn is_valid_for(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.user_id == user_id && self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveModeStatus {
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
