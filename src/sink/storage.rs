//! Sink inserting messages as rows of a database table

use super::connection::{ConnectionProvider, StorageRow, TableConnection};
use super::sqlite::SqliteProvider;
use crate::error::{EtlError, Result};
use crate::etl::Sink;
use crate::message::Message;

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name pattern"));

/// Sink writing each message as one `(id, value, ts)` row
///
/// The sink holds only connection parameters. Every operation acquires its
/// own connection from the provider, commits, and releases it before
/// returning, whether or not the operation succeeded. The table must
/// already exist.
///
/// # Example
/// ```no_run
/// use etl_system::etl::Sink;
/// use etl_system::sink::StorageSink;
/// # use etl_system::Message;
///
/// # fn example(msg: Message) -> etl_system::Result<()> {
/// let mut sink = StorageSink::new("DB Sink", "test.db", "msg_table")?;
/// sink.cleanup_table()?;
/// sink.write_message(&msg)?;
/// # Ok(())
/// # }
/// ```
pub struct StorageSink<P = SqliteProvider> {
    name: String,
    table: String,
    provider: P,
}

impl StorageSink {
    /// Create a storage sink backed by the SQLite database at `location`
    ///
    /// # Errors
    /// Returns a configuration error if `table` is not a plain identifier
    pub fn new(
        name: impl Into<String>,
        location: impl AsRef<Path>,
        table: impl Into<String>,
    ) -> Result<Self> {
        Self::with_provider(name, SqliteProvider::new(location), table)
    }
}

impl<P: ConnectionProvider> StorageSink<P> {
    /// Create a storage sink on top of any connection provider
    pub fn with_provider(
        name: impl Into<String>,
        provider: P,
        table: impl Into<String>,
    ) -> Result<Self> {
        let table = table.into();
        if !TABLE_NAME.is_match(&table) {
            return Err(EtlError::config(format!("invalid table name '{}'", table)));
        }

        Ok(Self {
            name: name.into(),
            table,
            provider,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Delete every row of the configured table
    ///
    /// Returns the number of rows removed
    pub fn cleanup_table(&self) -> Result<usize> {
        let mut conn = self.provider.connect()?;
        let deleted = conn.delete_all(&self.table)?;
        conn.commit()?;

        log::info!(
            "Deleted {} rows from {} at {}",
            deleted,
            self.table,
            self.provider.location()
        );
        Ok(deleted)
    }

    /// Insert one message and commit it
    pub fn insert(&self, msg: &Message) -> Result<()> {
        let row = StorageRow::from(msg);

        let mut conn = self.provider.connect()?;
        conn.insert(&self.table, &row)?;
        conn.commit()
    }

    /// Read back every row of the configured table
    pub fn rows(&self) -> Result<Vec<StorageRow>> {
        let mut conn = self.provider.connect()?;
        conn.select_all(&self.table)
    }
}

impl<P> fmt::Display for StorageSink<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageSink({})", self.name)
    }
}

impl<P: ConnectionProvider> Sink for StorageSink<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_message(&mut self, msg: &Message) -> Result<()> {
        self.insert(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryProvider;
    use chrono::DateTime;

    fn msg(key: &str, value: f64) -> Message {
        Message::new(
            key,
            value,
            DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
        )
    }

    fn memory_sink() -> (StorageSink<MemoryProvider>, MemoryProvider) {
        let provider = MemoryProvider::new().with_table("msg_table");
        let sink = StorageSink::with_provider("DB Sink", provider.clone(), "msg_table").unwrap();
        (sink, provider)
    }

    #[test]
    fn test_write_then_cleanup() {
        let (mut sink, provider) = memory_sink();

        sink.write_message(&msg("A1", 1.0)).unwrap();
        sink.write_message(&msg("B2", 2.5)).unwrap();

        let rows = sink.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "A1");
        assert_eq!(rows[1].value, 2.5);
        assert_eq!(rows[0].ts, "2024-01-01 00:00:00.000000+0000");

        assert_eq!(sink.cleanup_table().unwrap(), 2);
        assert!(provider.rows("msg_table").unwrap().is_empty());
        assert_eq!(provider.open_connections(), 0);
    }

    #[test]
    fn test_connection_released_on_failure() {
        let provider = MemoryProvider::new();
        let mut sink = StorageSink::with_provider("DB Sink", provider.clone(), "missing").unwrap();

        let err = sink.write_message(&msg("A1", 1.0)).unwrap_err();
        assert!(matches!(err, EtlError::Storage { .. }));
        assert_eq!(provider.open_connections(), 0);

        let err = sink.cleanup_table().unwrap_err();
        assert!(matches!(err, EtlError::Storage { .. }));
        assert_eq!(provider.open_connections(), 0);
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        for bad in ["", "1table", "msg; DROP TABLE x", "a-b", "\"quoted\""] {
            let result = StorageSink::with_provider("DB Sink", MemoryProvider::new(), bad);
            assert!(
                matches!(result, Err(EtlError::Configuration(_))),
                "accepted {:?}",
                bad
            );
        }
        assert!(StorageSink::new("DB Sink", "test.db", "msg_table_2").is_ok());
    }

    #[test]
    fn test_display() {
        let (sink, _) = memory_sink();
        assert_eq!(sink.to_string(), "StorageSink(DB Sink)");
        assert_eq!(sink.name(), "DB Sink");
    }
}
