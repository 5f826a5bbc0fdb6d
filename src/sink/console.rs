//! Sink printing messages as text lines

use crate::error::{EtlError, Result};
use crate::etl::Sink;
use crate::message::Message;

use std::fmt;
use std::io::{Stdout, Write};

/// Sink writing one `Key: .., Value: .., Timestamp: ..` line per message
///
/// Writes to standard output unless built with another writer.
pub struct ConsoleSink<W = Stdout> {
    name: String,
    out: W,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_writer(name, std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn with_writer(name: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W> fmt::Display for ConsoleSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsoleSink({})", self.name)
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_message(&mut self, msg: &Message) -> Result<()> {
        writeln!(self.out, "{}", msg)
            .and_then(|_| self.out.flush())
            .map_err(EtlError::output)
    }
}
