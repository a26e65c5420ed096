use serde::{Deserialize, Serialize};

use super::Severity;
use crate::config::defaults;

/// Per-tenant security policy.
///
/// Stored as JSON (camelCase keys) and read fresh for every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecuritySettings {
    /// HIGH-risk commands need a second staff decision. Default: true.
    pub two_person_rule: bool,
    /// HIGH-risk runs and decisions need an active sensitive-mode grant. Default: true.
    pub require_sensitive_mode_for_high_risk: bool,
    /// Lifetime of a sensitive-mode grant. Default: 10.
    pub sensitive_mode_ttl_minutes: i64,
    /// Minimum spacing of HIGH-risk runs per actor and command; 0 disables. Default: 60.
    pub high_risk_command_cooldown_seconds: i64,
    /// Disable accounts on qualifying security signals. Default: false.
    pub auto_freeze_enabled: bool,
    /// Minimum signal severity that triggers a freeze. Default: CRITICAL.
    pub auto_freeze_threshold: Severity,
    /// Failed logins before lockout. Default: 5.
    pub lockout_max_attempts: i64,
    /// Window over which failed logins are counted. Default: 15.
    pub lockout_window_minutes: i64,
    /// How long a lockout lasts. Default: 15.
    pub lockout_duration_minutes: i64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            two_person_rule: defaults::DEFAULT_TWO_PERSON_RULE,
            require_sensitive_mode_for_high_risk: defaults::DEFAULT_REQUIRE_SENSITIVE_MODE,
            sensitive_mode_ttl_minutes: defaults::DEFAULT_SENSITIVE_MODE_TTL_MINUTES,
            high_risk_command_cooldown_seconds: defaults::DEFAULT_HIGH_RISK_COOLDOWN_SECS,
            auto_freeze_enabled: defaults::DEFAULT_AUTO_FREEZE_ENABLED,
            auto_freeze_threshold: Severity::Critical,
            lockout_max_attempts: defaults::DEFAULT_LOCKOUT_MAX_ATTEMPTS,
            lockout_window_minutes: defaults::DEFAULT_LOCKOUT_WINDOW_MINUTES,
            lockout_duration_minutes: defaults::DEFAULT_LOCKOUT_DURATION_MINUTES,
        }
    }
}

impl SecuritySettings {
    /// Merge a stored JSON document over `fallback`, field by field.
    ///
    /// Fields that are missing or have the wrong type keep the fallback value.
    pub fn from_stored(stored: &serde_json::Value, fallback: &SecuritySettings) -> Self {
        let bool_field = |key: &str, default: bool| {
            stored.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
        };
        let int_field = |key: &str, default: i64| {
            stored
                .get(key)
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .unwrap_or(default)
        };

        Self {
            two_person_rule: bool_field("twoPersonRule", fallback.two_person_rule),
            require_sensitive_mode_for_high_risk: bool_field(
                "requireSensitiveModeForHighRisk",
                fallback.require_sensitive_mode_for_high_risk,
            ),
            sensitive_mode_ttl_minutes: int_field(
                "sensitiveModeTtlMinutes",
                fallback.sensitive_mode_ttl_minutes,
            ),
            high_risk_command_cooldown_seconds: int_field(
                "highRiskCommandCooldownSeconds",
                fallback.high_risk_command_cooldown_seconds,
            ),
            auto_freeze_enabled: bool_field("autoFreezeEnabled", fallback.auto_freeze_enabled),
            auto_freeze_threshold: stored
                .get("autoFreezeThreshold")
                .and_then(|v| v.as_str())
                .and_then(Severity::parse)
                .unwrap_or(fallback.auto_freeze_threshold),
            lockout_max_attempts: int_field("lockoutMaxAttempts", fallback.lockout_max_attempts),
            lockout_window_minutes: int_field(
                "lockoutWindowMinutes",
                fallback.lockout_window_minutes,
            ),
            lockout_duration_minutes: int_field(
                "lockoutDurationMinutes",
                fallback.lockout_duration_minutes,
            ),
        }
    }
}
