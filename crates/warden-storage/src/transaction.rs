//! Transaction helpers: BEGIN IMMEDIATE units of work and savepoints.

use rusqlite::Connection;

use warden_core::errors::WardenResult;

use crate::map_sqlite_err;

/// Run `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// The reserved lock is taken up front, so no other connection (in this or
/// any other process) can write until the unit commits or rolls back. Any
/// error from `f` rolls the whole unit back.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> WardenResult<T>
where
    F: FnOnce(&Connection) -> WardenResult<T>,
{
    conn.execute_batch("BEGIN IMMEDIATE").map_err(map_sqlite_err)?;

    match f(conn) {
        Ok(value) => match conn.execute_batch("COMMIT") {
            Ok(()) => Ok(value),
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(map_sqlite_err(e))
            }
        },
        Err(e) => {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %rollback_err, "rollback after failed unit of work failed");
            }
            Err(e)
        }
    }
}

/// Run `f` inside a named savepoint. On error only the savepoint is undone;
/// an enclosing transaction stays open.
pub fn with_savepoint<F, T>(conn: &Connection, name: &str, f: F) -> WardenResult<T>
where
    F: FnOnce(&Connection) -> WardenResult<T>,
{
    conn.execute_batch(&format!("SAVEPOINT {name}"))
        .map_err(map_sqlite_err)?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))
                .map_err(map_sqlite_err)?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::WardenError;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn commit_on_success() {
        let conn = conn();
        with_immediate_transaction(&conn, |c| {
            c.execute("INSERT INTO t (v) VALUES (1)", []).map_err(map_sqlite_err)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&conn), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn rollback_on_error() {
        let conn = conn();
        let result: WardenResult<()> = with_immediate_transaction(&conn, |c| {
            c.execute("INSERT INTO t (v) VALUES (1)", []).map_err(map_sqlite_err)?;
            Err(WardenError::invalid_state("boom"))
        });
        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn savepoint_failure_keeps_outer_work() {
        let conn = conn();
        with_immediate_transaction(&conn, |c| {
            c.execute("INSERT INTO t (v) VALUES (1)", []).map_err(map_sqlite_err)?;
            let inner: WardenResult<()> = with_savepoint(c, "inner", |c| {
                c.execute("INSERT INTO t (v) VALUES (2)", []).map_err(map_sqlite_err)?;
                Err(WardenError::invalid_state("inner failure"))
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&conn), 1);
    }
}
