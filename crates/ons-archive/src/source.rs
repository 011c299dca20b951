//! Uniform interface over the places an asset can come from

use crate::archive::{ArchiveInfo, ArchiveKind};
use crate::compression::CompressionRegistry;
use crate::error::Result;
use serde::Serialize;

/// Something that can answer asset lookups: the plain filesystem or one
/// archive file.
///
/// Misses are `Ok(0)` / `Ok(None)`; errors are reserved for sources that
/// could not be read.
pub trait AssetSource {
    /// Provenance tag reported for reads from this source
    fn location(&self) -> Option<ArchiveKind>;

    /// Number of files the source lists; 0 for unlisted sources
    fn num_files(&self) -> usize;

    /// Decompressed length of `name`, or 0 on a miss
    fn file_length(&mut self, name: &[u8], registry: &CompressionRegistry) -> Result<u64>;

    /// Decoded content of `name`
    fn read_file(&mut self, name: &[u8], registry: &CompressionRegistry)
    -> Result<Option<Vec<u8>>>;

    /// Short description for log messages
    fn describe(&self) -> String;
}

impl AssetSource for ArchiveInfo {
    fn location(&self) -> Option<ArchiveKind> {
        Some(self.kind())
    }

    fn num_files(&self) -> usize {
        self.num_of_files()
    }

    fn file_length(&mut self, name: &[u8], registry: &CompressionRegistry) -> Result<u64> {
        Self::file_length(self, name, registry).map(u64::from)
    }

    fn read_file(
        &mut self,
        name: &[u8],
        registry: &CompressionRegistry,
    ) -> Result<Option<Vec<u8>>> {
        Self::read_file(self, name, registry)
    }

    fn describe(&self) -> String {
        self.file_name().display().to_string()
    }
}

/// Content of a resolved asset and where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileData {
    /// Decoded bytes
    pub data: Vec<u8>,
    /// Archive generation that served the read; `None` for the filesystem
    pub location: Option<ArchiveKind>,
}

impl FileData {
    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the content is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
