//! Per-tenant security settings, read fresh on every call.

use rusqlite::Connection;
use tracing::warn;

use warden_core::constants::SECURITY_SETTINGS_KEY;
use warden_core::errors::{WardenError, WardenResult};
use warden_core::models::SecuritySettings;
use warden_storage::queries::settings_ops;

/// Stored settings merged field by field over `fallback`.
pub fn load_security_settings(
    conn: &Connection,
    tenant_id: &str,
    fallback: &SecuritySettings,
) -> WardenResult<SecuritySettings> {
    let Some(raw) = settings_ops::get_setting(conn, tenant_id, SECURITY_SETTINGS_KEY)? else {
        return Ok(fallback.clone());
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(stored) => Ok(SecuritySettings::from_stored(&stored, fallback)),
        Err(e) => {
            warn!(tenant_id, error = %e, "stored security settings unreadable, using defaults");
            Ok(fallback.clone())
        }
    }
}

/// Range checks applied before settings are stored.
pub fn validate_security_settings(settings: &SecuritySettings) -> WardenResult<()> {
    let checks: [(&str, i64, i64, i64); 5] = [
        ("Sensitive mode TTL", settings.sensitive_mode_ttl_minutes, 1, 120),
        ("High-risk cooldown", settings.high_risk_command_cooldown_seconds, 0, 3600),
        ("Lockout attempts", settings.lockout_max_attempts, 1, 20),
        ("Lockout window", settings.lockout_window_minutes, 1, 120),
        ("Lockout duration", settings.lockout_duration_minutes, 1, 240),
    ];
    for (label, value, min, max) in checks {
        if !(min..=max).contains(&value) {
            return Err(WardenError::validation(format!(
                "{label} must be between {min} and {max}."
            )));
        }
    }
    Ok(())
}
