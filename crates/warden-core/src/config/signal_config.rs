use serde::{Deserialize, Serialize};

use super::defaults;

/// Thresholds for the burst and spam detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Sliding window for burst and spam detection, in minutes. Default: 10.
    pub window_minutes: i64,
    /// HIGH-risk executions in the window that raise a HIGH signal. Default: 3.
    pub high_risk_burst_threshold: i64,
    /// HIGH-risk executions in the window that raise a CRITICAL signal. Default: 6.
    pub high_risk_burst_critical: i64,
    /// Approval requests in the window that raise a spam signal. Default: 5.
    pub approval_spam_threshold: i64,
    /// Failed logins in the lockout window that raise a burst signal. Default: 5.
    pub login_burst_threshold: i64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            window_minutes: defaults::DEFAULT_SIGNAL_WINDOW_MINUTES,
            high_risk_burst_threshold: defaults::DEFAULT_HIGH_RISK_BURST_THRESHOLD,
            high_risk_burst_critical: defaults::DEFAULT_HIGH_RISK_BURST_CRITICAL,
            approval_spam_threshold: defaults::DEFAULT_APPROVAL_SPAM_THRESHOLD,
            login_burst_threshold: defaults::DEFAULT_LOGIN_BURST_THRESHOLD,
        }
    }
}
