//! Error types for jsearch configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// Failed to compile an access rule glob.
    #[error("invalid access rule pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The invalid pattern.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },
}
