//! Small operational knobs: audit error logging, circuit breaker, login throttle, logging.

use serde::{Deserialize, Serialize};

use super::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Minimum spacing between logged best-effort audit failures. Default: 10.
    pub error_log_interval_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            error_log_interval_secs: defaults::DEFAULT_AUDIT_ERROR_LOG_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// How long the breaker stays open after an outage. Default: 10.
    pub open_secs: i64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            open_secs: defaults::DEFAULT_BREAKER_OPEN_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Attempts allowed per ip and email inside one window. Default: 5.
    pub max_attempts: u32,
    /// Rate limiter window. Default: 15.
    pub window_minutes: i64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_LOGIN_RATE_MAX_ATTEMPTS,
            window_minutes: defaults::DEFAULT_LOGIN_RATE_WINDOW_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when `WARDEN_LOG` is unset. Default: "info".
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
