//! Core ETL abstractions
//!
//! This module provides the capability traits every pipeline endpoint
//! implements, and the [`Pipeline`] that drains a [`Source`] into a [`Sink`].

mod config;
mod pipeline;
mod sink;
mod source;

pub use config::{EndpointConfig, PipelineConfig};
pub use pipeline::Pipeline;
pub use sink::Sink;
pub use source::Source;
