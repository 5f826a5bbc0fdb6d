//! Finite source replaying records from a JSON or NDJSON file

use crate::error::{EtlError, Result};
use crate::etl::Source;
use crate::message::Message;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default timestamp format, e.g. `2024-01-01 00:00:00.000000+0000`
pub const DEFAULT_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%z";

/// Shape of one record in the backing file
#[derive(Debug, Deserialize)]
struct RawRecord {
    key: String,
    value: f64,
    ts: String,
}

/// Source that replays the records of a file, in file order
///
/// The whole file is loaded when the source is built; records are parsed
/// one at a time as they are read. Files ending in `.ndjson` or `.jsonl`
/// hold one record per line, anything else must hold a JSON array.
///
/// # Example
/// ```no_run
/// use etl_system::etl::Source;
/// use etl_system::source::FileSource;
///
/// # fn example() -> etl_system::Result<()> {
/// let mut source = FileSource::new("Json Source", "messages.json")?;
/// while let Some(msg) = source.read_message()? {
///     println!("{}", msg);
/// }
/// # Ok(())
/// # }
/// ```
pub struct FileSource {
    name: String,
    path: PathBuf,
    records: Vec<Value>,
    index: usize,
    ts_format: String,
}

impl FileSource {
    /// Load a file source using [`DEFAULT_TS_FORMAT`]
    ///
    /// # Errors
    /// - Io error if the file is missing or unreadable
    /// - Parse error if the file is not valid JSON records
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Self::with_timestamp_format(name, path, DEFAULT_TS_FORMAT)
    }

    /// Load a file source whose `ts` fields use a custom `chrono` format
    pub fn with_timestamp_format(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        ts_format: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = load_records(&path)?;
        log::debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            name: name.into(),
            path,
            records,
            index: 0,
            ts_format: ts_format.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of records loaded
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the next record to read
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.records.len() - self.index
    }

    fn parse_record(&self, position: usize, record: &Value) -> Result<Message> {
        let raw = RawRecord::deserialize(record).map_err(|e| {
            EtlError::parse(format!(
                "record {} of {}: {}",
                position,
                self.path.display(),
                e
            ))
        })?;

        let ts = DateTime::parse_from_str(&raw.ts, &self.ts_format).map_err(|e| {
            EtlError::parse(format!(
                "record {} of {}: timestamp {:?} does not match {:?}: {}",
                position,
                self.path.display(),
                raw.ts,
                self.ts_format,
                e
            ))
        })?;

        Ok(Message::new(raw.key, raw.value, ts))
    }
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;

    let line_delimited = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("ndjson") | Some("jsonl")
    );

    if line_delimited {
        return content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    EtlError::parse(format!("failed to parse JSON line {:?}: {}", line, e))
                })
            })
            .collect();
    }

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| EtlError::parse(format!("failed to parse {}: {}", path.display(), e)))?;

    match value {
        Value::Array(records) => Ok(records),
        _ => Err(EtlError::parse(format!(
            "{} must contain a JSON array of records",
            path.display()
        ))),
    }
}

impl fmt::Display for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSource({})", self.name)
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_infinite(&self) -> bool {
        false
    }

    fn has_message(&self) -> bool {
        self.index < self.records.len()
    }

    /// Read the record under the cursor
    ///
    /// The cursor moves past the record even when it fails to parse.
    fn read_message(&mut self) -> Result<Option<Message>> {
        let Some(record) = self.records.get(self.index) else {
            return Ok(None);
        };
        let position = self.index;
        self.index += 1;
        self.parse_record(position, record).map(Some)
    }
}
