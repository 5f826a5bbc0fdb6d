//! Message sources
//!
//! This module holds the concrete [`Source`] variants and the factory that
//! builds them from a type tag:
//! - `sim`: [`SimulationSource`], unbounded random messages
//! - `file`: [`FileSource`], finite replay of a JSON/NDJSON file

mod file;
mod simulation;

pub use file::{DEFAULT_TS_FORMAT, FileSource};
pub use simulation::SimulationSource;

use crate::error::{EtlError, Result};
use crate::etl::Source;
use crate::message::Message;
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Type tag naming a source variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceType {
    #[value(name = "sim")]
    Simulation,
    File,
}

impl FromStr for SourceType {
    type Err = EtlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sim" => Ok(Self::Simulation),
            "file" => Ok(Self::File),
            _ => Err(EtlError::config(format!("unknown source type '{}'", s))),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulation => write!(f, "sim"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Any source the factory can build
pub enum AnySource {
    Simulation(SimulationSource),
    File(FileSource),
}

impl AnySource {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Simulation(_) => SourceType::Simulation,
            Self::File(_) => SourceType::File,
        }
    }

    pub fn as_file(&self) -> Option<&FileSource> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Source {
        match self {
            Self::Simulation(sim) => sim,
            Self::File(file) => file,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Source {
        match self {
            Self::Simulation(sim) => sim,
            Self::File(file) => file,
        }
    }
}

impl fmt::Display for AnySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

impl Source for AnySource {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn is_infinite(&self) -> bool {
        self.inner().is_infinite()
    }

    fn has_message(&self) -> bool {
        self.inner().has_message()
    }

    fn read_message(&mut self) -> Result<Option<Message>> {
        self.inner_mut().read_message()
    }
}

/// Builds sources from a type tag and variant-specific arguments
pub struct SourceFactory;

impl SourceFactory {
    /// Create a source from a string tag
    ///
    /// | tag    | args            |
    /// |--------|-----------------|
    /// | `sim`  | none            |
    /// | `file` | `[path]`        |
    ///
    /// # Errors
    /// - Configuration error for an unknown tag or the wrong number of args
    /// - Any error from building the variant (e.g. a missing file)
    pub fn create(name: &str, tag: &str, args: &[&str]) -> Result<AnySource> {
        let source_type = tag.parse::<SourceType>()?;
        Self::create_typed(name, source_type, args)
    }

    /// Create a source from an already parsed tag
    pub fn create_typed(name: &str, source_type: SourceType, args: &[&str]) -> Result<AnySource> {
        log::debug!("Creating {} source '{}'", source_type, name);
        match (source_type, args) {
            (SourceType::Simulation, []) => Ok(AnySource::Simulation(SimulationSource::new(name))),
            (SourceType::File, [path]) => Ok(AnySource::File(FileSource::new(name, path)?)),
            (SourceType::Simulation, _) => Err(arity_error(source_type, "no arguments", args)),
            (SourceType::File, _) => Err(arity_error(source_type, "1 argument (path)", args)),
        }
    }
}

fn arity_error(source_type: SourceType, expected: &str, args: &[&str]) -> EtlError {
    EtlError::config(format!(
        "source type '{}' takes {}, got {}",
        source_type,
        expected,
        args.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_source_type_from_str() {
        assert_eq!("sim".parse::<SourceType>().unwrap(), SourceType::Simulation);
        assert_eq!("FILE".parse::<SourceType>().unwrap(), SourceType::File);
        assert!("kafka".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_create_simulation() {
        let source = SourceFactory::create("Simulation Source", "sim", &[]).unwrap();
        assert_eq!(source.source_type(), SourceType::Simulation);
        assert!(source.is_infinite());
        assert_eq!(source.name(), "Simulation Source");
        assert_eq!(source.to_string(), "SimulationSource(Simulation Source)");
    }

    #[test]
    fn test_create_file() {
        let mut temp = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            temp,
            r#"[{{"key": "A1", "value": 1.0, "ts": "2024-01-01 00:00:00.000000+0000"}}]"#
        )
        .unwrap();
        let path = temp.path().to_str().unwrap();

        let mut source = SourceFactory::create("Json Source 1", "file", &[path]).unwrap();
        assert!(!source.is_infinite());
        assert_eq!(source.as_file().unwrap().len(), 1);
        assert_eq!(source.read_message().unwrap().unwrap().key(), "A1");
        assert!(!source.has_message());
    }

    #[test]
    fn test_unknown_tag_names_the_tag() {
        let err = SourceFactory::create("Bad", "ftp", &[]).err().unwrap();
        assert!(matches!(err, EtlError::Configuration(ref m) if m.contains("'ftp'")));
    }

    #[test]
    fn test_wrong_arity() {
        let err = SourceFactory::create("Bad", "file", &[]).err().unwrap();
        assert!(matches!(err, EtlError::Configuration(ref m) if m.contains("path")));

        let err = SourceFactory::create("Bad", "sim", &["extra"]).err().unwrap();
        assert!(matches!(err, EtlError::Configuration(_)));
    }

    #[test]
    fn test_missing_file_propagates() {
        let err = SourceFactory::create("Json", "file", &["/nonexistent/messages.json"])
            .err()
            .unwrap();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
