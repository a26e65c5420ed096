//! One writer plus, for file-backed databases, a set of readers.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use warden_core::errors::WardenResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

pub struct ConnectionPool {
    pub writer: WriteConnection,
    /// `None` for in-memory databases, which a second connection cannot see.
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open the writer and run `init` on it before any reader is opened, so
    /// readers always see a migrated schema.
    pub fn open<I>(
        path: &Path,
        read_pool_size: usize,
        busy_timeout_ms: u32,
        init: I,
    ) -> WardenResult<Self>
    where
        I: FnOnce(&Connection) -> WardenResult<()>,
    {
        let mut writer = WriteConnection::open(path, busy_timeout_ms)?;
        writer.with_conn_mut(init)?;
        let readers = ReadPool::open(path, read_pool_size, busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers: Some(readers),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory<I>(init: I) -> WardenResult<Self>
    where
        I: FnOnce(&Connection) -> WardenResult<()>,
    {
        let mut writer = WriteConnection::open_in_memory()?;
        writer.with_conn_mut(init)?;
        Ok(Self {
            writer,
            readers: None,
            db_path: None,
        })
    }

    pub fn reader_count(&self) -> usize {
        self.readers.as_ref().map_or(0, ReadPool::len)
    }
}
