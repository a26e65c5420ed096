//! # warden-storage
//!
//! SQLite persistence for the Warden engine: a single serialized write
//! connection plus a read pool, forward-only migrations, raw query modules,
//! and the hash-chained audit log.

pub mod audit;
pub mod breaker;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod transaction;

pub use audit::{AuditChainWriter, AuditMode, ChainVerification};
pub use breaker::CircuitBreaker;
pub use engine::StorageEngine;
pub use transaction::{with_immediate_transaction, with_savepoint};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::ErrorCode;

use warden_core::errors::{StorageError, WardenError, WardenResult};

/// Wrap a message as a generic SQLite storage error.
pub fn to_storage_err(message: String) -> WardenError {
    WardenError::StorageError(StorageError::SqliteError { message })
}

/// Classify a rusqlite error.
///
/// Foreign-key rejections, outages and corruption get their own variants so
/// callers can react without matching on message text.
pub fn map_sqlite_err(e: rusqlite::Error) -> WardenError {
    let message = e.to_string();
    let classified = match &e {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            ErrorCode::ConstraintViolation
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StorageError::ForeignKeyViolation { message }
            }
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::DiskFull => StorageError::Unavailable { message },
            ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                StorageError::CorruptionDetected { details: message }
            }
            _ => StorageError::SqliteError { message },
        },
        _ => StorageError::SqliteError { message },
    };
    WardenError::StorageError(classified)
}

/// Timestamps are stored as fixed-width RFC 3339 with milliseconds and `Z`,
/// so lexicographic order in SQL equals chronological order.
pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_ts(s: &str) -> WardenResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("bad timestamp {s:?}: {e}")))
}

/// Fresh random identifier for new rows.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
