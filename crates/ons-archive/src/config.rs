//! Configuration for opening an archive chain

use crate::archive::CompressionType;
use crate::compression::CompressionRegistry;
use crate::keyed::KeyTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Archive generations the chain may probe for.
///
/// SAR is always probed: it decides whether the chain runs in
/// single-archive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveKinds {
    /// Probe for `arc.nsa` and its numbered extras
    pub nsa: bool,
    /// Probe for `00.ns2` onwards
    pub ns2: bool,
}

impl Default for ArchiveKinds {
    fn default() -> Self {
        Self {
            nsa: true,
            ns2: true,
        }
    }
}

/// Configuration for [`ArchiveChain::open`](crate::ArchiveChain::open)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding the archives and loose files
    pub archive_path: PathBuf,

    /// Generations to probe for
    pub kinds: ArchiveKinds,

    /// Bytes to skip before each archive header
    pub nsa_offset: u32,

    /// Substitution table applied to every archive byte
    pub key_table: Option<KeyTable>,

    /// Extension to compression mapping for entries that declare none
    pub compression_types: CompressionRegistry,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("."),
            kinds: ArchiveKinds::default(),
            nsa_offset: 0,
            key_table: None,
            compression_types: CompressionRegistry::new(),
        }
    }
}

impl ArchiveConfig {
    /// Configuration rooted at `archive_path`
    pub fn new<P: AsRef<Path>>(archive_path: P) -> Self {
        Self {
            archive_path: archive_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the archive directory
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = path.as_ref().to_path_buf();
        self
    }

    /// Select the generations to probe for
    #[must_use]
    pub const fn with_kinds(mut self, kinds: ArchiveKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Set the header offset
    #[must_use]
    pub const fn with_nsa_offset(mut self, offset: u32) -> Self {
        self.nsa_offset = offset;
        self
    }

    /// Decode archives through `key_table`
    #[must_use]
    pub fn with_key_table(mut self, key_table: KeyTable) -> Self {
        self.key_table = Some(key_table);
        self
    }

    /// Map `extension` to `compression`
    #[must_use]
    pub fn with_compression_type(mut self, extension: &str, compression: CompressionType) -> Self {
        self.compression_types.register(extension, compression);
        self
    }

    /// Extension of NSA archive files: `___` when a key table is set
    pub fn nsa_extension(&self) -> &'static str {
        if self.key_table.is_some() {
            crate::KEYED_NSA_EXTENSION
        } else {
            crate::NSA_EXTENSION
        }
    }
}
