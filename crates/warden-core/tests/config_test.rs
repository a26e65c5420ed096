//! Configuration loading: TOML parsing, per-section defaults, file loading.

use std::io::Write;

use warden_core::config::WardenConfig;
use warden_core::models::Severity;
use warden_core::WardenError;

/// An empty document yields the full default config.
#[test]
fn empty_toml_gives_defaults() {
    let config = WardenConfig::from_toml_str("").unwrap();
    assert!(config.security.two_person_rule);
    assert!(config.security.require_sensitive_mode_for_high_risk);
    assert_eq!(config.security.high_risk_command_cooldown_seconds, 60);
    assert_eq!(config.security.sensitive_mode_ttl_minutes, 10);
    assert!(!config.security.auto_freeze_enabled);
    assert_eq!(config.security.auto_freeze_threshold, Severity::Critical);
    assert_eq!(config.signals.high_risk_burst_threshold, 3);
    assert_eq!(config.signals.approval_spam_threshold, 5);
    assert_eq!(config.audit.error_log_interval_secs, 10);
    assert_eq!(config.circuit_breaker.open_secs, 10);
    assert_eq!(config.storage.read_pool_size, 4);
    assert_eq!(config.observability.log_level, "info");
}

/// Overriding one field leaves the rest of its section at defaults.
#[test]
fn partial_section_keeps_other_defaults() {
    let config = WardenConfig::from_toml_str(
        r#"
        [security]
        highRiskCommandCooldownSeconds = 0
        autoFreezeEnabled = true
        autoFreezeThreshold = "HIGH"

        [signals]
        window_minutes = 5
        "#,
    )
    .unwrap();
    assert_eq!(config.security.high_risk_command_cooldown_seconds, 0);
    assert!(config.security.auto_freeze_enabled);
    assert_eq!(config.security.auto_freeze_threshold, Severity::High);
    assert!(config.security.two_person_rule);
    assert_eq!(config.signals.window_minutes, 5);
    assert_eq!(config.signals.high_risk_burst_critical, 6);
}

/// Malformed TOML surfaces as a config error.
#[test]
fn malformed_toml_is_config_error() {
    let err = WardenConfig::from_toml_str("[security\n").unwrap_err();
    assert!(matches!(err, WardenError::ConfigError(_)));
}

/// Config loads from a file on disk.
#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[storage]\ndb_path = \"/tmp/warden-test.db\"\nread_pool_size = 2").unwrap();
    let config = WardenConfig::load(file.path()).unwrap();
    assert_eq!(config.storage.db_path, "/tmp/warden-test.db");
    assert_eq!(config.storage.read_pool_size, 2);
}

/// A missing file is a config error naming the path.
#[test]
fn missing_file_is_config_error() {
    let err = WardenConfig::load(std::path::Path::new("/nonexistent/warden.toml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/warden.toml"));
}

#[test]
fn memory_path_is_recognised() {
    let config = WardenConfig::from_toml_str("[storage]\ndb_path = \" :memory: \"\n").unwrap();
    assert!(config.storage.is_in_memory());
    assert!(!WardenConfig::default().storage.is_in_memory());
}
