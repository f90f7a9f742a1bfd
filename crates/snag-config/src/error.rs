//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration file was requested explicitly but does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),
}
