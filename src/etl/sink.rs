//! Sink trait for writing messages to destinations

use crate::error::Result;
use crate::message::Message;
use std::fmt;

/// Sink trait for writing messages to a destination
///
/// Implementors define where messages end up:
/// - Terminal output
/// - Database tables
///
/// # Example
/// ```no_run
/// use etl_system::etl::Sink;
/// use etl_system::{Message, Result};
///
/// struct Collector {
///     seen: Vec<Message>,
/// }
///
/// impl std::fmt::Display for Collector {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "Collector")
///     }
/// }
///
/// impl Sink for Collector {
///     fn name(&self) -> &str {
///         "collector"
///     }
///
///     fn write_message(&mut self, msg: &Message) -> Result<()> {
///         self.seen.push(msg.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait Sink: fmt::Display {
    /// Name used to identify this sink in logs
    fn name(&self) -> &str;

    /// Write a single message
    ///
    /// # Errors
    /// Returns an error if the destination rejects or fails the write
    fn write_message(&mut self, msg: &Message) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_message(&mut self, msg: &Message) -> Result<()> {
        (**self).write_message(msg)
    }
}
