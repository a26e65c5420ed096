//! Forward-only schema migrations tracked with PRAGMA user_version.

pub mod v001_identity_tables;
pub mod v002_moderation_tables;
pub mod v003_command_tables;
pub mod v004_audit_tables;

use rusqlite::Connection;

use warden_core::errors::{StorageError, WardenError, WardenResult};

type Migration = fn(&Connection) -> WardenResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_identity_tables::migrate),
    (2, v002_moderation_tables::migrate),
    (3, v003_command_tables::migrate),
    (4, v004_audit_tables::migrate),
];

/// Latest schema version known to this build.
pub const LATEST_VERSION: u32 = 4;

fn migration_err(version: u32, reason: impl ToString) -> WardenError {
    WardenError::StorageError(StorageError::MigrationFailed {
        version,
        reason: reason.to_string(),
    })
}

/// Run all pending migrations, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> WardenResult<()> {
    let current = current_version(conn)?;

    for (version, migrate) in MIGRATIONS {
        if current >= *version {
            continue;
        }
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| migration_err(*version, e))?;
        let applied = migrate(conn).and_then(|()| {
            conn.pragma_update(None, "user_version", version)
                .map_err(|e| migration_err(*version, e))
        });
        match applied {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| migration_err(*version, e))?;
                tracing::info!(version, "applied migration");
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(migration_err(*version, e));
            }
        }
    }

    Ok(())
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> WardenResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| migration_err(0, e))
}
