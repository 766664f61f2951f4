//! Error types for cellsweep

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while preparing or running a batch
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the engines or a back-end
    #[error(transparent)]
    Core(#[from] cellsweep_core::Error),

    /// Filesystem error with the path involved
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for the expected shape
    #[error("Invalid JSON in configuration file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Core(cellsweep_core::Error::configuration(msg))
    }

    /// Wrap an I/O error with its path
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
