/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("database corruption detected: {details}")]
    CorruptionDetected { details: String },

    /// A FOREIGN KEY constraint rejected the write.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database could not be reached (locked, busy, unopenable, I/O).
    #[error("database unavailable: {message}")]
    Unavailable { message: String },
}

impl StorageError {
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::ForeignKeyViolation { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
