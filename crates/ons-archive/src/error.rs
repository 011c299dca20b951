//! Error types for archive chain operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening or reading archives.
///
/// Asset lookups that simply miss are not errors: the chain reports them
/// as a zero length or `None` so callers can fall back to another source.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No archive generation could be located under the archive path
    #[error("no archive found under {0}")]
    ArchiveNotFound(PathBuf),

    /// Archive directory could not be parsed
    #[error("invalid archive {path}: {reason}")]
    InvalidArchive {
        /// Archive file that failed to parse
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Directory bytes do not follow the archive layout
    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Compressed entry could not be decoded
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Key table did not contain exactly 256 bytes
    #[error("key table must be 256 bytes, got {0}")]
    InvalidKeyTable(usize),

    /// Builder was given an entry it cannot store
    #[error("cannot build archive: {0}")]
    Build(String),
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
