//! CLI helper functions
//!
//! These sit outside the pipeline core: they only build endpoints through
//! the factories, clear storage tables, and call [`Pipeline::run`].

use crate::{
    etl::{EndpointConfig, Pipeline, PipelineConfig},
    sink::{SinkFactory, StorageSink},
};
use eyre::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Merge a config file with endpoints given on the command line
///
/// Endpoints given directly take precedence over the file's sections.
pub fn resolve_config(
    config_path: Option<&Path>,
    source: Option<EndpointConfig>,
    sink: Option<EndpointConfig>,
) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading pipeline config from {}", path.display());
            PipelineConfig::read(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if source.is_some() {
        config.source = source;
    }
    if sink.is_some() {
        config.sink = sink;
    }

    Ok(config)
}

/// Delete all rows behind a storage sink endpoint
///
/// Returns the number of rows removed; other sink types are left alone.
pub fn cleanup_sink(endpoint: &EndpointConfig) -> Result<usize> {
    let args = endpoint.arg_refs();
    let sink = SinkFactory::create(&endpoint.name, &endpoint.kind, &args)
        .with_context(|| format!("Failed to create sink '{}'", endpoint.name))?;

    match sink.as_storage() {
        Some(storage) => storage
            .cleanup_table()
            .with_context(|| format!("Failed to clean up table {}", storage.table())),
        None => {
            log::warn!("Sink {} has no table to clean up, skipping", sink);
            Ok(0)
        }
    }
}

/// Build a pipeline from `config` and run it
///
/// Pipeline: SourceFactory → Pipeline::run × iterations → SinkFactory
///
/// An infinite source moves one message per run, so `iterations` controls
/// how many it produces. A finite source is drained by the first run.
pub fn run_pipeline(config: &PipelineConfig, cleanup: bool, iterations: usize) -> Result<usize> {
    if cleanup {
        match &config.sink {
            Some(sink) => {
                let deleted = cleanup_sink(sink)?;
                log::info!("✓ Cleaned up {} row(s)", deleted);
            }
            None => log::warn!("No sink configured, nothing to clean up"),
        }
    }

    let mut pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;

    let infinite = pipeline.source().is_some_and(|s| s.is_infinite());
    let runs = if infinite { iterations.max(1) } else { 1 };

    let mut total = 0;
    for _ in 0..runs {
        total += pipeline.run().context("Pipeline run failed")?;
    }

    log::info!("✓ Moved {} message(s)", total);
    Ok(total)
}

/// Write every row of a storage table to `out`, one per line
pub fn dump_rows(location: impl AsRef<Path>, table: &str, out: &mut impl Write) -> Result<usize> {
    let location = location.as_ref();
    let sink = StorageSink::new("rows", location, table)?;
    let rows = sink
        .rows()
        .with_context(|| format!("Failed to read {} from {}", table, location.display()))?;

    for row in &rows {
        writeln!(out, "({:?}, {:?}, {:?})", row.id, row.value, row.ts)?;
    }

    Ok(rows.len())
}
