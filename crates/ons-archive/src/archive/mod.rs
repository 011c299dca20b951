//! Single archive files and their directories

pub mod builder;
mod entry;
pub mod index;

pub use builder::ArchiveBuilder;
pub use entry::{CompressionType, FileEntry};

use crate::compression::{self, CompressionRegistry, LENGTH_HEADER_SIZE};
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::keyed::{KeyTable, KeyedReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Archive generation, also used as the provenance tag of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Legacy single-file archive (`arc.sar`)
    Sar,
    /// Split archives with per-entry compression (`arc.nsa`, `arc1.nsa`, ...)
    Nsa,
    /// Numbered archives (`00.ns2`, `01.ns2`, ...)
    Ns2,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sar => f.write_str("sar"),
            Self::Nsa => f.write_str("nsa"),
            Self::Ns2 => f.write_str("ns2"),
        }
    }
}

/// One opened archive file and its parsed directory.
///
/// The file handle is held for the lifetime of the value and read with
/// positioned reads. Entry `i` of [`entries`](Self::entries) is identified
/// by this archive plus `i`; that pair is the key of the length cache.
pub struct ArchiveInfo {
    file_name: PathBuf,
    kind: ArchiveKind,
    reader: KeyedReader<BufReader<File>>,
    entries: Vec<FileEntry>,
}

impl fmt::Debug for ArchiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveInfo")
            .field("file_name", &self.file_name)
            .field("kind", &self.kind)
            .field("num_of_files", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ArchiveInfo {
    /// Open `path` and parse its directory.
    pub fn open(path: impl AsRef<Path>, kind: ArchiveKind, config: &ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_file(path.to_path_buf(), file, kind, config)
    }

    /// Parse the directory of an already opened archive file.
    ///
    /// A directory that cannot be parsed is reported as
    /// [`ArchiveError::InvalidArchive`]; the file is closed on that path.
    pub fn from_file(
        file_name: PathBuf,
        file: File,
        kind: ArchiveKind,
        config: &ArchiveConfig,
    ) -> Result<Self> {
        let mut reader = KeyedReader::new(BufReader::new(file), config.key_table.clone());
        let entries = index::build_index(
            &mut reader,
            kind,
            config.nsa_offset,
            &config.compression_types,
        )
        .map_err(|e| ArchiveError::InvalidArchive {
            path: file_name.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            "Opened {} archive {} with {} files",
            kind,
            file_name.display(),
            entries.len()
        );

        Ok(Self {
            file_name,
            kind,
            reader,
            entries,
        })
    }

    /// Wrap an opened file with a directory built elsewhere.
    pub fn with_entries(
        file_name: PathBuf,
        file: File,
        kind: ArchiveKind,
        key_table: Option<KeyTable>,
        entries: Vec<FileEntry>,
    ) -> Self {
        Self {
            file_name,
            kind,
            reader: KeyedReader::new(BufReader::new(file), key_table),
            entries,
        }
    }

    /// Path the archive was opened from
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Archive generation
    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// Number of directory entries
    pub fn num_of_files(&self) -> usize {
        self.entries.len()
    }

    /// Directory entries in archive order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Index of the entry named exactly `name`.
    ///
    /// Returns [`num_of_files`](Self::num_of_files) when there is no such
    /// entry; callers compare against it rather than expecting an error.
    pub fn find_entry(&self, name: &[u8]) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .unwrap_or(self.entries.len())
    }

    /// Entry at `index`, if in bounds
    pub fn entry(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(buf)?;
        Ok(())
    }

    /// Decompressed length of entry `index`, resolving it on first use.
    ///
    /// A non-zero `original_length` is returned as is. Otherwise the
    /// effective compression type decides: NBZ and SPB payload headers are
    /// read (four bytes, nothing is decompressed) and the result is stored
    /// in the entry, so later calls do no I/O. Other types yield 0.
    pub fn resolve_length(&mut self, index: usize, registry: &CompressionRegistry) -> Result<u32> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(0);
        };
        if entry.original_length != 0 {
            return Ok(entry.original_length);
        }

        let compression = registry.effective(entry.compression_type, &entry.name);
        if !compression.has_lazy_length() {
            return Ok(0);
        }

        let offset = entry.offset;
        let mut header = [0u8; LENGTH_HEADER_SIZE];
        self.read_at(offset, &mut header)?;
        let length = compression::decompressed_length(compression, header);
        trace!(
            "Resolved {} length of entry {} in {}: {}",
            compression,
            index,
            self.file_name.display(),
            length
        );

        self.entries[index].original_length = length;
        Ok(length)
    }

    /// Decompressed length of `name`, or 0 if this archive lacks it.
    pub fn file_length(&mut self, name: &[u8], registry: &CompressionRegistry) -> Result<u32> {
        let index = self.find_entry(name);
        if index == self.entries.len() {
            return Ok(0);
        }
        self.resolve_length(index, registry)
    }

    /// Drop lengths recorded for entries that `registry` now decodes.
    ///
    /// Entries declaring no compression record their stored length at index
    /// time. Once their extension maps to NBZ or SPB that value is wrong, so
    /// it is cleared and resolved from the payload header on next use.
    pub(crate) fn reset_lazy_lengths(&mut self, registry: &CompressionRegistry) {
        let mut reset = 0usize;
        for entry in &mut self.entries {
            if entry.compression_type == CompressionType::None
                && registry
                    .effective(entry.compression_type, &entry.name)
                    .has_lazy_length()
            {
                entry.original_length = 0;
                reset += 1;
            }
        }
        if reset > 0 {
            debug!(
                "Cleared {} cached lengths in {}",
                reset,
                self.file_name.display()
            );
        }
    }

    /// Stored bytes of entry `index`, without decoding.
    ///
    /// An entry reaching past the end of the archive file is rejected
    /// before anything is allocated.
    pub fn read_raw(&mut self, index: usize) -> Result<Vec<u8>> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(Vec::new());
        };
        let (offset, length) = (entry.offset, entry.length);
        let file_size = self.reader.seek(SeekFrom::End(0))?;
        if offset.saturating_add(u64::from(length)) > file_size {
            return Err(ArchiveError::InvalidArchive {
                path: self.file_name.clone(),
                reason: format!(
                    "entry {index} spans {length} bytes at offset {offset}, file has {file_size}"
                ),
            });
        }
        let mut raw = vec![0u8; length as usize];
        self.read_at(offset, &mut raw)?;
        Ok(raw)
    }

    /// Decoded content of `name`, or `None` if this archive lacks it.
    pub fn read_file(
        &mut self,
        name: &[u8],
        registry: &CompressionRegistry,
    ) -> Result<Option<Vec<u8>>> {
        let index = self.find_entry(name);
        if index == self.entries.len() {
            return Ok(None);
        }

        let original_length = self.resolve_length(index, registry)?;
        let entry = &self.entries[index];
        let compression = registry.effective(entry.compression_type, &entry.name);
        let raw = self.read_raw(index)?;
        compression::decode(compression, &raw, original_length).map(Some)
    }
}
