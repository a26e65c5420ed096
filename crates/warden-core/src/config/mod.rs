//! Workspace configuration, loadable from TOML.
//!
//! # Examples
//!
//! ```
//! use warden_core::config::WardenConfig;
//!
//! let config = WardenConfig::from_toml_str("[security]\ntwoPersonRule = false\n").unwrap();
//! assert!(!config.security.two_person_rule);
//! assert_eq!(config.signals.window_minutes, 10);
//! ```

pub mod defaults;
mod ops_config;
mod signal_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{WardenError, WardenResult};
use crate::models::SecuritySettings;

pub use ops_config::{AuditConfig, CircuitBreakerConfig, LoginConfig, ObservabilityConfig};
pub use signal_config::SignalConfig;
pub use storage_config::{StorageConfig, IN_MEMORY_PATH};

/// Top-level configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub storage: StorageConfig,
    /// Security policy used for tenants that have not stored their own.
    pub security: SecuritySettings,
    pub signals: SignalConfig,
    pub audit: AuditConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub login: LoginConfig,
    pub observability: ObservabilityConfig,
}

impl WardenConfig {
    pub fn from_toml_str(s: &str) -> WardenResult<Self> {
        toml::from_str(s).map_err(|e| WardenError::ConfigError(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> WardenResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| WardenError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}
