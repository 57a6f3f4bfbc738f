use rusqlite::{Connection, Transaction};

use crate::StoreError;

/// Run `f` inside a transaction, committing on success.
///
/// On failure the error is logged, the transaction is rolled back and the
/// original error is returned. Nothing `f` wrote survives a failure.
pub fn in_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
{
    let tx = conn.transaction()?;

    match f(&tx) {
        Ok(value) => {
            tx.commit().inspect_err(|e| {
                tracing::error!(error = %e, "transaction commit failed, rolled back");
            })?;
            Ok(value)
        }
        Err(err) => {
            tracing::error!(error = ?err, "transaction failed, rolling back");
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")
            .unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn commits_on_success() {
        let mut conn = conn();
        let value = in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(7)
        })
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn rolls_back_on_error() {
        let mut conn = conn();
        let result: Result<(), _> = in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(StoreError::NotFound("x".into()))
        });

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(count(&conn), 0);
    }
}
