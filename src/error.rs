//! Error taxonomy shared by every pipeline component

use std::path::PathBuf;

/// Errors surfaced by sources, sinks, factories and the pipeline
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// Unknown factory tag, bad factory arguments, or an unset pipeline slot
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed backing data or a timestamp that does not match the format
    #[error("parse error: {0}")]
    Parse(String),

    /// Backing resource missing or unreadable, or an output stream failed
    ///
    /// `path` is `None` for streams with no file behind them, such as stdout.
    #[error("io error{}: {source}", describe_path(.path))]
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    /// Any failure while connecting, inserting, committing or deleting
    #[error("storage error ({context}): {detail}")]
    Storage { context: String, detail: String },
}

impl EtlError {
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse(detail.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// An output stream failed
    pub fn output(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    pub fn storage(context: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Storage {
            context: context.into(),
            detail: detail.to_string(),
        }
    }
}

fn describe_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
