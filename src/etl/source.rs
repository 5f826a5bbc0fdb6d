//! Source trait for reading messages

use crate::error::Result;
use crate::message::Message;
use std::fmt;

/// Source trait for reading messages one at a time
///
/// Implementors define where messages come from:
/// - Synthetic generators
/// - Files
/// - Anything else that yields `(key, value, timestamp)` records
///
/// # Example
/// ```no_run
/// use etl_system::etl::Source;
/// use etl_system::{Message, Result};
///
/// struct Countdown {
///     left: Vec<Message>,
/// }
///
/// impl std::fmt::Display for Countdown {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "Countdown({})", self.left.len())
///     }
/// }
///
/// impl Source for Countdown {
///     fn name(&self) -> &str {
///         "countdown"
///     }
///
///     fn is_infinite(&self) -> bool {
///         false
///     }
///
///     fn has_message(&self) -> bool {
///         !self.left.is_empty()
///     }
///
///     fn read_message(&mut self) -> Result<Option<Message>> {
///         Ok(self.left.pop())
///     }
/// }
/// ```
pub trait Source: fmt::Display {
    /// Name used to identify this source in logs
    fn name(&self) -> &str;

    /// Whether this source generates without bound
    ///
    /// An infinite source is read once per [`Pipeline::run`](super::Pipeline::run),
    /// a finite one is drained.
    fn is_infinite(&self) -> bool;

    /// Returns true if another message can be read
    ///
    /// Must not change any state.
    fn has_message(&self) -> bool;

    /// Read the next message, advancing the source
    ///
    /// Returns `Ok(None)` once a finite source is exhausted.
    ///
    /// # Errors
    /// Returns an error if the next record cannot be parsed
    fn read_message(&mut self) -> Result<Option<Message>>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_infinite(&self) -> bool {
        (**self).is_infinite()
    }

    fn has_message(&self) -> bool {
        (**self).has_message()
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        (**self).read_message()
    }
}
