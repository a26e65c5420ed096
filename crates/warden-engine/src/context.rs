//! Shared dependencies of every engine service.

use std::sync::Arc;

use warden_core::clock::{Clock, SystemClock};
use warden_core::config::WardenConfig;
use warden_core::errors::WardenResult;
use warden_storage::{AuditChainWriter, CircuitBreaker, StorageEngine};

use crate::catalog::CommandCatalog;

/// Storage, configuration, time source, audit writer and command catalog.
///
/// Cheap to share behind an `Arc`; nothing in here is mutated after construction.
#[derive(Clone)]
pub struct EngineContext {
    pub storage: Arc<StorageEngine>,
    pub config: WardenConfig,
    pub clock: Arc<dyn Clock>,
    pub audit: AuditChainWriter,
    pub catalog: Arc<CommandCatalog>,
}

impl EngineContext {
    pub fn new(storage: Arc<StorageEngine>, config: WardenConfig, clock: Arc<dyn Clock>) -> Self {
        let audit = AuditChainWriter::with_config(Arc::clone(&clock), &config.audit);
        Self {
            storage,
            config,
            clock,
            audit,
            catalog: Arc::new(CommandCatalog::standard()),
        }
    }

    /// Open the store named by `config.storage` and use the wall clock.
    pub fn open(config: WardenConfig) -> WardenResult<Self> {
        let storage = StorageEngine::open_with_config(&config)?;
        Ok(Self::new(Arc::new(storage), config, Arc::new(SystemClock)))
    }

    /// In-memory store with default configuration and the given clock.
    pub fn in_memory(clock: Arc<dyn Clock>) -> WardenResult<Self> {
        let config = WardenConfig::default();
        let storage = StorageEngine::open_in_memory()?.with_breaker(CircuitBreaker::new(
            chrono::Duration::seconds(config.circuit_breaker.open_secs),
        ));
        Ok(Self::new(Arc::new(storage), config, clock))
    }

    pub fn with_catalog(mut self, catalog: CommandCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }
}

/// Where a request came from. Copied onto audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}
