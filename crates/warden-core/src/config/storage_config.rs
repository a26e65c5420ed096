use serde::{Deserialize, Serialize};

use super::defaults;

/// Path given in `db_path` to keep everything in memory.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Where the datastore lives and how its connections behave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file, or `:memory:`.
    pub db_path: String,
    pub busy_timeout_ms: u32,
    /// Readers opened next to the writer. Ignored in memory.
    pub read_pool_size: usize,
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.db_path.trim() == IN_MEMORY_PATH
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
        }
    }
}
