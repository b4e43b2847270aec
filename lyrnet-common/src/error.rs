//! Common error types for lyrnet

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for lyrnet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across lyrnet crates
#[derive(Error, Debug)]
pub enum Error {
    /// File system operation on `path` failed
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
