use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for splice operations
pub type Result<T> = std::result::Result<T, SpliceError>;

/// Errors that can occur while patching a file
///
/// Alignment itself never fails: unmatched or malformed descriptor blocks are
/// absorbed as "no match". Only file access and configuration are fallible.
#[derive(Error, Debug)]
pub enum SpliceError {
    /// Reading or writing one of the patch files failed
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The already-annotated pattern does not compile
    #[error("Invalid annotated pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl SpliceError {
    /// Create an IO error bound to the file it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
