//! Asset archive access for ONScripter games
//!
#![allow(clippy::cast_possible_truncation)] // Binary format fields are u16/u32
#![allow(clippy::cast_possible_wrap)] // Delta decoding in SPB
#![allow(clippy::cast_sign_loss)] // Delta decoding in SPB
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Archive names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::missing_errors_doc)] // Error enums are documented instead
//! A game directory ships its assets as one of three archive generations:
//!
//! - **SAR**: the legacy single file `arc.sar`
//! - **NSA**: `arc.nsa` plus numbered extras `arc1.nsa` .. `arc9.nsa`, with
//!   per-entry compression (SPB images, LZSS, NBZ/bzip2)
//! - **NS2**: numbered files `00.ns2` .. `99.ns2`
//!
//! [`ArchiveChain`] finds the generation present, indexes every archive
//! once and answers length and content queries in a fixed precedence
//! order, with loose files on disk shadowing the archives. Decompressed
//! lengths of NBZ and SPB entries are read from payload headers on first
//! use and cached.
//!
//! ```no_run
//! use ons_archive::{ArchiveChain, ArchiveConfig, CompressionType};
//!
//! let config = ArchiveConfig::new("game").with_compression_type("jpg", CompressionType::Nbz);
//! let mut chain = ArchiveChain::open(config)?;
//! if let Some(file) = chain.get_file(b"bg\\bg1.jpg") {
//!     println!("{} bytes from {:?}", file.data.len(), file.location);
//! }
//! # Ok::<(), ons_archive::ArchiveError>(())
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod chain;
pub mod compression;
pub mod config;
pub mod direct;
pub mod error;
pub mod keyed;
pub mod source;

pub use archive::{ArchiveBuilder, ArchiveInfo, ArchiveKind, CompressionType, FileEntry};
pub use chain::{ArchiveChain, ProbePlan};
pub use compression::CompressionRegistry;
pub use config::{ArchiveConfig, ArchiveKinds};
pub use direct::DirectReader;
pub use error::{ArchiveError, Result};
pub use keyed::KeyTable;
pub use source::{AssetSource, FileData};

/// File that selects single-archive mode
pub const SAR_ARCHIVE_NAME: &str = "arc.sar";

/// Extension of NSA archives
pub const NSA_EXTENSION: &str = "nsa";

/// Extension of NSA archives read through a key table
pub const KEYED_NSA_EXTENSION: &str = "___";

/// Extension of NS2 archives
pub const NS2_EXTENSION: &str = "ns2";

/// Highest number of NS2 archives probed
pub const MAX_NS2_ARCHIVES: usize = 100;

/// Highest number of numbered NSA extras probed after `arc.nsa`
pub const MAX_EXTRA_ARCHIVES: usize = 9;
