//! Message sinks
//!
//! This module holds the concrete [`Sink`] variants, the connection
//! providers behind the storage sink, and the factory that builds sinks
//! from a type tag:
//! - `console`: [`ConsoleSink`], one text line per message on stdout
//! - `storage` (alias `sqlite`): [`StorageSink`], one row per message

mod connection;
mod console;
mod sqlite;
mod storage;

pub use connection::{
    ConnectionProvider, MemoryConnection, MemoryProvider, STORAGE_TS_FORMAT, StorageRow,
    TableConnection,
};
pub use console::ConsoleSink;
pub use sqlite::{SqliteConnection, SqliteProvider};
pub use storage::StorageSink;

use crate::error::{EtlError, Result};
use crate::etl::Sink;
use crate::message::Message;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Type tag naming a sink variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SinkType {
    Console,
    #[value(alias = "sqlite")]
    Storage,
}

impl FromStr for SinkType {
    type Err = EtlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "storage" | "sqlite" => Ok(Self::Storage),
            _ => Err(EtlError::config(format!("unknown sink type '{}'", s))),
        }
    }
}

impl fmt::Display for SinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Any sink the factory can build
pub enum AnySink {
    Console(ConsoleSink),
    Storage(StorageSink),
}

impl AnySink {
    pub fn sink_type(&self) -> SinkType {
        match self {
            Self::Console(_) => SinkType::Console,
            Self::Storage(_) => SinkType::Storage,
        }
    }

    /// The storage sink, for table maintenance such as `cleanup_table`
    pub fn as_storage(&self) -> Option<&StorageSink> {
        match self {
            Self::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Sink {
        match self {
            Self::Console(console) => console,
            Self::Storage(storage) => storage,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Sink {
        match self {
            Self::Console(console) => console,
            Self::Storage(storage) => storage,
        }
    }
}

impl fmt::Display for AnySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

impl Sink for AnySink {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn write_message(&mut self, msg: &Message) -> Result<()> {
        self.inner_mut().write_message(msg)
    }
}

/// Builds sinks from a type tag and variant-specific arguments
pub struct SinkFactory;

impl SinkFactory {
    /// Create a sink from a string tag
    ///
    /// | tag                  | args                  |
    /// |----------------------|-----------------------|
    /// | `console`            | none                  |
    /// | `storage` / `sqlite` | `[location, table]`   |
    ///
    /// # Errors
    /// Configuration error for an unknown tag, the wrong number of args, or
    /// an invalid table name
    pub fn create(name: &str, tag: &str, args: &[&str]) -> Result<AnySink> {
        let sink_type = tag.parse::<SinkType>()?;
        Self::create_typed(name, sink_type, args)
    }

    /// Create a sink from an already parsed tag
    pub fn create_typed(name: &str, sink_type: SinkType, args: &[&str]) -> Result<AnySink> {
        log::debug!("Creating {} sink '{}'", sink_type, name);
        match (sink_type, args) {
            (SinkType::Console, []) => Ok(AnySink::Console(ConsoleSink::new(name))),
            (SinkType::Storage, [location, table]) => Ok(AnySink::Storage(StorageSink::new(
                name, location, *table,
            )?)),
            (SinkType::Console, _) => Err(arity_error(sink_type, "no arguments", args)),
            (SinkType::Storage, _) => {
                Err(arity_error(sink_type, "2 arguments (location, table)", args))
            }
        }
    }
}

fn arity_error(sink_type: SinkType, expected: &str, args: &[&str]) -> EtlError {
    EtlError::config(format!(
        "sink type '{}' takes {}, got {}",
        sink_type,
        expected,
        args.len()
    ))
}
