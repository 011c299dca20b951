//! Save files for ONScripter games
//!
#![allow(clippy::cast_possible_truncation)] // Version bytes
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! Interpreter state is serialized into a versioned stream (`ONS`, major,
//! minor, payload) and written to `save<N>.dat` followed by the slot's
//! display label. Loading dispatches on the recorded version: files from
//! before the header existed are read as the current version, newer files
//! and files older than 2.0 are refused.
//!
//! ```no_run
//! use ons_save::{RawPayload, SaveConfig, SaveFiles};
//!
//! let mut saves = SaveFiles::new(SaveConfig::new("game"));
//! saves.store(&RawPayload(vec![1, 2, 3]))?;
//! saves.write(3, "Chapter 2")?;
//!
//! let mut state = RawPayload::default();
//! let report = saves.load(3, &mut state)?;
//! println!("loaded version {}", report.version);
//! # Ok::<(), ons_save::SaveError>(())
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod config;
pub mod error;
pub mod slot;
pub mod state;
pub mod stream;
pub mod version;

pub use codec::{LoadReport, SaveFiles, SaveHeader, extract_label, load_from_bytes, store_to_bytes};
pub use config::SaveConfig;
pub use error::{Result, SaveError};
pub use slot::{AsciiDigits, DigitFormatter, FullWidthDigits, SaveFileInfo};
pub use state::{RawPayload, SaveState};
pub use stream::{SaveReader, SaveWriter, WriteMode};
pub use version::SaveVersion;

/// Magic at the start of versioned save files
pub const SAVE_MAGIC: &[u8; 3] = b"ONS";

/// Major version written by this codec
pub const SAVE_VERSION_MAJOR: u8 = 2;

/// Minor version written by this codec
pub const SAVE_VERSION_MINOR: u8 = 8;

/// Magic plus the two version bytes
pub const SAVE_HEADER_SIZE: usize = 5;

/// Default directory of the header-less save copies
pub const QUICK_COPY_DIR: &str = "sav";

/// Quote around the display label
pub const LABEL_QUOTE: u8 = b'"';

/// Last byte of a labelled save file
pub const LABEL_TERMINATOR: u8 = b'*';
