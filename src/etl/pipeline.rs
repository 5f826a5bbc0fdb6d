//! Pipeline orchestration for ETL operations

use super::{PipelineConfig, Sink, Source};
use crate::error::{EtlError, Result};
use crate::sink::SinkFactory;
use crate::source::SourceFactory;

/// ETL Pipeline that drains one [`Source`] into one [`Sink`]
///
/// Both slots must be configured before [`run`](Pipeline::run). How much a
/// single run moves depends on the source:
/// - infinite sources: exactly one read-then-write per call
/// - finite sources: every remaining message, in source order
///
/// # Example
/// ```no_run
/// use etl_system::etl::Pipeline;
/// use etl_system::{SinkFactory, SourceFactory};
///
/// # fn example() -> etl_system::Result<()> {
/// let source = SourceFactory::create("Json Source", "file", &["messages.json"])?;
/// let sink = SinkFactory::create("Console Target", "console", &[])?;
///
/// let mut pipeline = Pipeline::new(source, sink);
/// let count = pipeline.run()?;
/// println!("Processed {} messages", count);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Pipeline {
    source: Option<Box<dyn Source>>,
    sink: Option<Box<dyn Sink>>,
}

impl Pipeline {
    /// Create a pipeline with both slots filled
    pub fn new(source: impl Source + 'static, sink: impl Sink + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            sink: Some(Box::new(sink)),
        }
    }

    /// Create a pipeline with no source and no sink
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a pipeline from a configuration value
    ///
    /// Each section present in the config is built through its factory.
    /// Missing sections leave the matching slot empty.
    ///
    /// # Errors
    /// Returns any error raised by the factories
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut pipeline = Self::empty();

        if let Some(src) = &config.source {
            let args = src.arg_refs();
            pipeline.set_source(SourceFactory::create(&src.name, &src.kind, &args)?);
        }
        if let Some(tgt) = &config.sink {
            let args = tgt.arg_refs();
            pipeline.set_sink(SinkFactory::create(&tgt.name, &tgt.kind, &args)?);
        }

        Ok(pipeline)
    }

    /// Replace the source slot
    pub fn set_source(&mut self, source: impl Source + 'static) {
        self.source = Some(Box::new(source));
    }

    /// Replace the sink slot
    pub fn set_sink(&mut self, sink: impl Sink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn source(&self) -> Option<&dyn Source> {
        self.source.as_deref()
    }

    pub fn sink(&self) -> Option<&dyn Sink> {
        self.sink.as_deref()
    }

    /// Run the pipeline once
    ///
    /// Returns the number of messages written during this call
    ///
    /// # Errors
    /// - Configuration error if the source or sink is unset (checked before any I/O)
    /// - Any error from reading the source or writing the sink; the run stops
    ///   there and messages already written stay written
    pub fn run(&mut self) -> Result<usize> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| EtlError::config("no source specified"))?;
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| EtlError::config("no sink specified"))?;

        log::info!("Reading from source {} and writing to sink {}", source, sink);

        if source.is_infinite() {
            return match source.read_message()? {
                Some(msg) => {
                    sink.write_message(&msg)?;
                    log::debug!("Wrote message {}", msg.key());
                    Ok(1)
                }
                None => Ok(0),
            };
        }

        let mut count = 0;
        while source.has_message() {
            let Some(msg) = source.read_message()? else {
                break;
            };
            sink.write_message(&msg)?;
            log::debug!("Wrote message {}", msg.key());
            count += 1;
        }

        if count == 0 {
            log::warn!("No messages read from {}, pipeline complete", source);
        } else {
            log::info!("Loaded {} messages into {}", count, sink);
        }

        Ok(count)
    }
}
