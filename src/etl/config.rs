//! Pipeline configuration
//!
//! A pipeline config names the source and sink to build, in the same terms
//! the factories take. It can be read from YAML or JSON:
//! ```yaml
//! source:
//!   name: Json Source
//!   type: file
//!   args: [messages.json]
//! sink:
//!   name: DB Sink
//!   type: storage
//!   args: [test.db, msg_table]
//! ```

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One endpoint of a pipeline: a factory tag plus its arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// Name used to identify the endpoint in logs
    pub name: String,
    /// Factory type tag, e.g. `file` or `storage`
    #[serde(rename = "type")]
    pub kind: String,
    /// Variant-specific arguments, in factory order
    #[serde(default)]
    pub args: Vec<String>,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Source and sink sections of a pipeline; either may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub source: Option<EndpointConfig>,
    #[serde(default)]
    pub sink: Option<EndpointConfig>,
}

impl PipelineConfig {
    pub fn new(source: Option<EndpointConfig>, sink: Option<EndpointConfig>) -> Self {
        Self { source, sink }
    }

    /// Read a config file, choosing the format by extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;

        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        if is_json {
            serde_json::from_str(&content).map_err(|e| {
                EtlError::parse(format!("invalid config {}: {}", path.display(), e))
            })
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                EtlError::parse(format!("invalid config {}: {}", path.display(), e))
            })
        }
    }
}
