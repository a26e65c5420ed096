//! Read-only connections for queries that never need the write lock.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use warden_core::errors::WardenResult;

use super::pragmas::apply_read_pragmas;
use crate::map_sqlite_err;

const MAX_READERS: usize = 8;

pub struct ReadPool {
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl ReadPool {
    /// Open `size` readers (clamped to 1..=8) against an existing database
    /// file. The writer must have created the schema first.
    pub fn open(path: &Path, size: usize, busy_timeout_ms: u32) -> WardenResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let readers = (0..size.clamp(1, MAX_READERS))
            .map(|_| {
                let conn = Connection::open_with_flags(path, flags).map_err(map_sqlite_err)?;
                apply_read_pragmas(&conn, busy_timeout_ms)?;
                Ok(Mutex::new(conn))
            })
            .collect::<WardenResult<Vec<_>>>()?;
        Ok(Self {
            readers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Hand `f` the next reader in rotation. A reader poisoned by a panicking
    /// query is still usable: SQLite state lives in the database, not the guard.
    pub fn with_conn<F, T>(&self, f: F) -> WardenResult<T>
    where
        F: FnOnce(&Connection) -> WardenResult<T>,
    {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[slot].lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}
