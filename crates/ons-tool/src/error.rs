//! Error types for the command-line tool.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Archive directory does not exist
    #[error("Archive directory not found: {0}")]
    MissingArchivePath(PathBuf),

    /// `--register` value is not `EXT=TYPE`
    #[error("Invalid compression registration '{value}': {reason}")]
    InvalidRegistration {
        /// The rejected argument
        value: String,
        /// Reason for rejection
        reason: String,
    },

    /// Key table file could not be used
    #[error("Failed to load key table from {path}: {source}")]
    KeyTable {
        /// Path given on the command line
        path: PathBuf,
        /// Underlying archive error
        #[source]
        source: ons_archive::ArchiveError,
    },
}

/// Errors raised by individual commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Asset is not served by any source in the chain
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Pack input is not a regular file
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// `--nbz` used with an archive kind that has no compression byte
    #[error("NBZ compression requires an NSA archive, got {0}")]
    CompressionUnsupported(ons_archive::ArchiveKind),
}
