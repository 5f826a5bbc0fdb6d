//! ETL System
//!
//! A minimal extract-transform-load pipeline: messages are read from a
//! [`Source`](etl::Source), and written to a [`Sink`](etl::Sink) by a
//! [`Pipeline`].

pub mod cli;
pub mod error;
pub mod etl;
pub mod message;
pub mod sink;
pub mod source;

// Re-exports for convenience
pub use error::{EtlError, Result};
pub use etl::{EndpointConfig, Pipeline, PipelineConfig, Sink, Source};
pub use message::Message;
pub use sink::{AnySink, ConsoleSink, SinkFactory, SinkType, StorageSink};
pub use source::{AnySource, FileSource, SimulationSource, SourceFactory, SourceType};
