//! Connection providers backing the storage sink
//!
//! A [`ConnectionProvider`] hands out one short-lived [`TableConnection`]
//! per storage operation. Work done on a connection becomes visible only
//! after [`TableConnection::commit`]; dropping a connection without
//! committing discards the work and releases the connection.

use crate::error::{EtlError, Result};
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Timestamp format used for the `ts` column
///
/// Six fractional digits and a numeric offset, so a stored row reloads
/// through a file source with the default timestamp format.
pub const STORAGE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%z";

/// One row of a storage table: columns `(id, value, ts)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageRow {
    pub id: String,
    pub value: f64,
    pub ts: String,
}

impl From<&Message> for StorageRow {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.key().to_string(),
            value: msg.value(),
            ts: msg.timestamp().format(STORAGE_TS_FORMAT).to_string(),
        }
    }
}

/// Opens connections to a store
pub trait ConnectionProvider {
    type Connection: TableConnection;

    /// Acquire a fresh connection
    ///
    /// # Errors
    /// Returns a storage error if the store cannot be reached
    fn connect(&self) -> Result<Self::Connection>;

    /// Human-readable location of the store, for logs
    fn location(&self) -> String;
}

/// A single open connection; released when dropped
pub trait TableConnection {
    /// Delete every row of `table`, returning how many were removed
    fn delete_all(&mut self, table: &str) -> Result<usize>;

    /// Insert one row into `table`
    fn insert(&mut self, table: &str, row: &StorageRow) -> Result<()>;

    /// Read every row of `table`, in insertion order
    fn select_all(&mut self, table: &str) -> Result<Vec<StorageRow>>;

    /// Make the work done on this connection durable
    fn commit(self) -> Result<()>;
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<StorageRow>>,
    open: usize,
}

enum PendingOp {
    DeleteAll(String),
    Insert(String, StorageRow),
}

/// In-memory store for running storage sinks without a database
///
/// Tables must be declared up front with [`MemoryProvider::with_table`];
/// writing to an undeclared table fails the same way a missing SQL table
/// would. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an empty table
    pub fn with_table(self, table: impl Into<String>) -> Self {
        self.lock().tables.entry(table.into()).or_default();
        self
    }

    /// Number of connections currently acquired and not yet released
    pub fn open_connections(&self) -> usize {
        self.lock().open
    }

    /// Committed rows of `table`, if it exists
    pub fn rows(&self, table: &str) -> Option<Vec<StorageRow>> {
        self.lock().tables.get(table).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConnectionProvider for MemoryProvider {
    type Connection = MemoryConnection;

    fn connect(&self) -> Result<MemoryConnection> {
        self.lock().open += 1;
        Ok(MemoryConnection {
            provider: self.clone(),
            pending: Vec::new(),
        })
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Connection to a [`MemoryProvider`]; buffers work until commit
pub struct MemoryConnection {
    provider: MemoryProvider,
    pending: Vec<PendingOp>,
}

impl MemoryConnection {
    fn check_table(&self, state: &MemoryState, table: &str) -> Result<()> {
        if state.tables.contains_key(table) {
            Ok(())
        } else {
            Err(EtlError::storage(
                format!("table {}", table),
                format!("no such table: {}", table),
            ))
        }
    }

    /// Rows of `table` as they would be after this connection commits
    fn visible_rows(&self, state: &MemoryState, table: &str) -> Vec<StorageRow> {
        let mut rows = state.tables.get(table).cloned().unwrap_or_default();
        for op in &self.pending {
            match op {
                PendingOp::DeleteAll(t) if t == table => rows.clear(),
                PendingOp::Insert(t, row) if t == table => rows.push(row.clone()),
                _ => {}
            }
        }
        rows
    }
}

impl TableConnection for MemoryConnection {
    fn delete_all(&mut self, table: &str) -> Result<usize> {
        let deleted = {
            let state = self.provider.lock();
            self.check_table(&state, table)?;
            self.visible_rows(&state, table).len()
        };
        self.pending.push(PendingOp::DeleteAll(table.to_string()));
        Ok(deleted)
    }

    fn insert(&mut self, table: &str, row: &StorageRow) -> Result<()> {
        {
            let state = self.provider.lock();
            self.check_table(&state, table)?;
        }
        self.pending
            .push(PendingOp::Insert(table.to_string(), row.clone()));
        Ok(())
    }

    fn select_all(&mut self, table: &str) -> Result<Vec<StorageRow>> {
        let state = self.provider.lock();
        self.check_table(&state, table)?;
        Ok(self.visible_rows(&state, table))
    }

    fn commit(mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut state = self.provider.lock();
        for op in pending {
            match op {
                PendingOp::DeleteAll(table) => {
                    if let Some(rows) = state.tables.get_mut(&table) {
                        rows.clear();
                    }
                }
                PendingOp::Insert(table, row) => {
                    if let Some(rows) = state.tables.get_mut(&table) {
                        rows.push(row);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Rolling back {} uncommitted operations", self.pending.len());
        }
        let mut state = self.provider.lock();
        state.open = state.open.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> StorageRow {
        StorageRow {
            id: id.to_string(),
            value: 1.5,
            ts: "2024-01-01 00:00:00.000000+0000".to_string(),
        }
    }

    #[test]
    fn test_row_from_message() {
        let ts = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:01:00.5+02:00").unwrap();
        let msg = Message::new("B2", 2.5, ts);
        let row = StorageRow::from(&msg);
        assert_eq!(row.id, "B2");
        assert_eq!(row.value, 2.5);
        assert_eq!(row.ts, "2024-01-01 00:01:00.500000+0200");
    }

    #[test]
    fn test_commit_makes_rows_visible() {
        let provider = MemoryProvider::new().with_table("msg_table");

        let mut conn = provider.connect().unwrap();
        conn.insert("msg_table", &row("A1")).unwrap();
        assert_eq!(provider.rows("msg_table").unwrap().len(), 0);
        assert_eq!(conn.select_all("msg_table").unwrap().len(), 1);
        conn.commit().unwrap();

        assert_eq!(provider.rows("msg_table").unwrap(), vec![row("A1")]);
        assert_eq!(provider.open_connections(), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let provider = MemoryProvider::new().with_table("msg_table");

        {
            let mut conn = provider.connect().unwrap();
            conn.insert("msg_table", &row("A1")).unwrap();
            assert_eq!(provider.open_connections(), 1);
        }

        assert!(provider.rows("msg_table").unwrap().is_empty());
        assert_eq!(provider.open_connections(), 0);
    }

    #[test]
    fn test_missing_table() {
        let provider = MemoryProvider::new();
        let mut conn = provider.connect().unwrap();

        let err = conn.insert("nope", &row("A1")).unwrap_err();
        assert!(matches!(err, EtlError::Storage { ref detail, .. } if detail.contains("no such table")));
        assert!(conn.delete_all("nope").is_err());
    }

    #[test]
    fn test_delete_all_counts_rows() {
        let provider = MemoryProvider::new().with_table("t");
        let mut conn = provider.connect().unwrap();
        conn.insert("t", &row("A1")).unwrap();
        conn.insert("t", &row("B2")).unwrap();
        conn.commit().unwrap();

        let mut conn = provider.connect().unwrap();
        assert_eq!(conn.delete_all("t").unwrap(), 2);
        conn.commit().unwrap();
        assert!(provider.rows("t").unwrap().is_empty());
    }
}
