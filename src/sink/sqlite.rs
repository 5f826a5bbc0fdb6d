//! SQLite connection provider

use super::connection::{ConnectionProvider, StorageRow, TableConnection};
use crate::error::{EtlError, Result};

use rusqlite::{OpenFlags, params};
use std::path::{Path, PathBuf};

/// Opens a new SQLite connection to a database file for every operation
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    location: PathBuf,
}

impl SqliteProvider {
    pub fn new(location: impl AsRef<Path>) -> Self {
        Self {
            location: location.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.location
    }
}

impl ConnectionProvider for SqliteProvider {
    type Connection = SqliteConnection;

    /// Open an existing database and start a transaction
    ///
    /// A missing database file is an error; it is never created.
    fn connect(&self) -> Result<SqliteConnection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = rusqlite::Connection::open_with_flags(&self.location, flags).map_err(|e| {
            EtlError::storage(format!("open {}", self.location.display()), e)
        })?;
        conn.execute_batch("BEGIN")
            .map_err(|e| EtlError::storage("begin transaction", e))?;

        log::debug!("Opened connection to {}", self.location.display());
        Ok(SqliteConnection {
            conn,
            location: self.location.clone(),
        })
    }

    fn location(&self) -> String {
        self.location.display().to_string()
    }
}

/// An open SQLite connection with a transaction in progress
///
/// Dropping it closes the connection; SQLite rolls back a transaction that
/// was never committed.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    location: PathBuf,
}

/// Quote a table name for use in statement text
///
/// Table names are checked to be plain identifiers before they get here.
fn quoted(table: &str) -> String {
    format!("\"{}\"", table)
}

impl TableConnection for SqliteConnection {
    fn delete_all(&mut self, table: &str) -> Result<usize> {
        self.conn
            .execute(&format!("DELETE FROM {}", quoted(table)), [])
            .map_err(|e| EtlError::storage(format!("delete from {}", table), e))
    }

    fn insert(&mut self, table: &str, row: &StorageRow) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (id, value, ts) VALUES (?1, ?2, ?3)",
            quoted(table)
        );
        self.conn
            .execute(&sql, params![row.id, row.value, row.ts])
            .map_err(|e| EtlError::storage(format!("insert into {}", table), e))?;
        Ok(())
    }

    fn select_all(&mut self, table: &str) -> Result<Vec<StorageRow>> {
        let context = format!("select from {}", table);
        let sql = format!("SELECT id, value, ts FROM {} ORDER BY rowid", quoted(table));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| EtlError::storage(&context, e))?;
        let rows = stmt
            .query_map([], |r| {
                Ok(StorageRow {
                    id: r.get(0)?,
                    value: r.get(1)?,
                    ts: r.get(2)?,
                })
            })
            .map_err(|e| EtlError::storage(&context, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EtlError::storage(&context, e))?;

        Ok(rows)
    }

    fn commit(self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| EtlError::storage("commit", e))
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        log::debug!("Released connection to {}", self.location.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn database(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("test.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE msg_table (id TEXT, value REAL, ts TEXT)")
            .unwrap();
        path
    }

    fn row(id: &str, value: f64) -> StorageRow {
        StorageRow {
            id: id.to_string(),
            value,
            ts: "2024-01-01 00:00:00.000000+0000".to_string(),
        }
    }

    #[test]
    fn test_insert_commit_select() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::new(database(&dir));

        let mut conn = provider.connect().unwrap();
        conn.insert("msg_table", &row("A1", 1.0)).unwrap();
        conn.insert("msg_table", &row("B2", 2.5)).unwrap();
        conn.commit().unwrap();

        let mut conn = provider.connect().unwrap();
        let rows = conn.select_all("msg_table").unwrap();
        assert_eq!(rows, vec![row("A1", 1.0), row("B2", 2.5)]);
    }

    #[test]
    fn test_uncommitted_insert_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::new(database(&dir));

        {
            let mut conn = provider.connect().unwrap();
            conn.insert("msg_table", &row("A1", 1.0)).unwrap();
        }

        let mut conn = provider.connect().unwrap();
        assert!(conn.select_all("msg_table").unwrap().is_empty());
    }

    #[test]
    fn test_values_are_bound_not_interpolated() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::new(database(&dir));

        let hostile = "x'); DROP TABLE msg_table; --";
        let mut conn = provider.connect().unwrap();
        conn.insert("msg_table", &row(hostile, 3.0)).unwrap();
        conn.commit().unwrap();

        let mut conn = provider.connect().unwrap();
        let rows = conn.select_all("msg_table").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, hostile);
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::new(database(&dir));

        let mut conn = provider.connect().unwrap();
        let err = conn.insert("other_table", &row("A1", 1.0)).unwrap_err();
        assert!(matches!(err, EtlError::Storage { .. }));
    }

    #[test]
    fn test_missing_database_is_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let provider = SqliteProvider::new(&path);

        let err = provider.connect().err().unwrap();
        assert!(matches!(err, EtlError::Storage { .. }));
        assert!(!path.exists(), "connect should not create the database");
    }

    #[test]
    fn test_unreachable_location() {
        let provider = SqliteProvider::new("/nonexistent/dir/test.db");
        let err = provider.connect().err().unwrap();
        assert!(matches!(err, EtlError::Storage { .. }));
    }
}
