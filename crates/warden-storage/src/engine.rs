//! StorageEngine: owns the connection pool and the datastore circuit breaker,
//! runs migrations at startup, and hands out reader, writer and
//! unit-of-work access.

use std::path::Path;

use chrono::Duration;
use rusqlite::Connection;

use warden_core::config::defaults::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_READ_POOL_SIZE};
use warden_core::config::WardenConfig;
use warden_core::errors::WardenResult;

use crate::breaker::CircuitBreaker;
use crate::migrations;
use crate::pool::ConnectionPool;
use crate::transaction::with_immediate_transaction;

pub struct StorageEngine {
    pool: ConnectionPool,
    breaker: CircuitBreaker,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> WardenResult<Self> {
        let pool = ConnectionPool::open(
            path,
            DEFAULT_READ_POOL_SIZE,
            DEFAULT_BUSY_TIMEOUT_MS,
            migrations::run_migrations,
        )?;
        Ok(Self::from_pool(pool, CircuitBreaker::default()))
    }

    /// Open using the storage and circuit breaker sections of `config`.
    /// A `db_path` of `:memory:` gives an in-memory engine.
    pub fn open_with_config(config: &WardenConfig) -> WardenResult<Self> {
        let pool = if config.storage.is_in_memory() {
            ConnectionPool::open_in_memory(migrations::run_migrations)?
        } else {
            ConnectionPool::open(
                Path::new(&config.storage.db_path),
                config.storage.read_pool_size,
                config.storage.busy_timeout_ms,
                migrations::run_migrations,
            )?
        };
        let breaker = CircuitBreaker::new(Duration::seconds(config.circuit_breaker.open_secs));
        Ok(Self::from_pool(pool, breaker))
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> WardenResult<Self> {
        let pool = ConnectionPool::open_in_memory(migrations::run_migrations)?;
        Ok(Self::from_pool(pool, CircuitBreaker::default()))
    }

    /// Replace the circuit breaker, e.g. with one using a shorter interval.
    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    fn from_pool(pool: ConnectionPool, breaker: CircuitBreaker) -> Self {
        tracing::debug!(
            path = ?pool.db_path,
            readers = pool.reader_count(),
            "storage engine initialized"
        );
        Self { pool, breaker }
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run a read-only query. In-memory databases have no readers, so their
    /// reads share the writer.
    pub fn with_reader<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn_sync(f),
        }
    }

    /// Exclusive access to the write connection, outside any transaction.
    pub fn with_writer<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }

    /// Run `f` as one atomic unit of work (`BEGIN IMMEDIATE` ... `COMMIT`).
    pub fn with_transaction<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        self.pool
            .writer
            .with_conn_sync(|conn| with_immediate_transaction(conn, f))
    }

    /// Async variant of [`with_transaction`](Self::with_transaction) for callers
    /// already running on a tokio runtime.
    pub async fn with_transaction_async<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        self.pool
            .writer
            .with_conn(|conn| with_immediate_transaction(conn, f))
            .await
    }
}
