//! Single write connection behind `tokio::sync::Mutex`.
//!
//! Every write in the process goes through this one handle, which is what
//! serializes audit chain appends inside a process.

use std::path::Path;

use rusqlite::Connection;
use tokio::sync::Mutex;

use warden_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use warden_core::errors::WardenResult;

use super::pragmas::apply_pragmas;
use crate::map_sqlite_err;

/// A single write connection protected by an async mutex.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a new write connection to the given database path.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> WardenResult<Self> {
        let conn = Connection::open(path).map_err(map_sqlite_err)?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> WardenResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_err)?;
        apply_pragmas(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub async fn with_conn<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        let guard = self.conn.lock().await;
        f(&guard)
    }

    /// Blocking access for synchronous callers. Must not be called from
    /// within an async runtime worker.
    pub fn with_conn_sync<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        let guard = self.conn.blocking_lock();
        f(&guard)
    }

    /// Exclusive access without locking, for startup work such as migrations.
    pub fn with_conn_mut<F, T>(&mut self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        f(self.conn.get_mut())
    }
}
