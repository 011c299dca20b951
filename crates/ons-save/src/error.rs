//! Error types for save-file operations

use crate::version::SaveVersion;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, storing or writing save files.
///
/// A failed secondary copy is not an error; it is only logged.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Save file is missing, empty or could not be read
    #[error("cannot read save file {path}: {source}")]
    Unreadable {
        /// Save file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Save file was written by a newer format version
    #[error("save file version {found} is newer than {supported}")]
    TooNew {
        /// Version recorded in the file
        found: SaveVersion,
        /// Newest version this codec reads
        supported: SaveVersion,
    },

    /// Save file predates the versioned format
    #[error("save file version {0} is too old")]
    TooOld(SaveVersion),

    /// Primary save file could not be written
    #[error("cannot write save file {path}: {source}")]
    Write {
        /// Save file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Stream ended before a field was complete
    #[error("save data truncated at offset {offset}: {needed} more bytes needed")]
    Truncated {
        /// Read cursor when the field started
        offset: usize,
        /// Bytes missing
        needed: usize,
    },

    /// Emit pass wrote a different number of bytes than the measure pass
    #[error("save state emitted {emitted} bytes, measured {measured}")]
    LengthMismatch {
        /// Bytes counted by the measure pass
        measured: usize,
        /// Bytes written by the emit pass
        emitted: usize,
    },

    /// `write` was called before any state was stored
    #[error("no save snapshot has been stored")]
    NoSnapshot,

    /// Save data decoded but describes an impossible state
    #[error("invalid save data: {0}")]
    InvalidState(String),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for save operations
pub type Result<T> = std::result::Result<T, SaveError>;
