//! Archive builder
//!
//! Writes SAR, NSA and NS2 archives in the layouts read by
//! [`index::build_index`](super::index::build_index). Payloads are laid out
//! back to back in insertion order, right after the directory.

use super::ArchiveKind;
use super::entry::CompressionType;
use super::index::{NS2_END_MARKER, NS2_QUOTE};
use crate::compression::nbz;
use crate::error::{ArchiveError, Result};
use crate::keyed::KeyTable;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
struct PendingEntry {
    name: Vec<u8>,
    compression: CompressionType,
    original_length: u32,
    payload: Vec<u8>,
}

/// Builder for archive files
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    kind: ArchiveKind,
    header_offset: u32,
    encode_key: Option<KeyTable>,
    entries: Vec<PendingEntry>,
}

impl ArchiveBuilder {
    /// Empty archive of the given generation
    pub fn new(kind: ArchiveKind) -> Self {
        Self {
            kind,
            header_offset: 0,
            encode_key: None,
            entries: Vec::new(),
        }
    }

    /// Store every byte so that reading it through `key` gives it back.
    ///
    /// Fails when `key` is not a permutation of the 256 byte values.
    pub fn with_key_table(mut self, key: &KeyTable) -> Result<Self> {
        let inverse = key
            .inverse()
            .ok_or_else(|| ArchiveError::Build("key table is not a permutation".into()))?;
        self.encode_key = Some(inverse);
        Ok(self)
    }

    /// Pad the file with `offset` zero bytes before the header
    pub fn with_header_offset(mut self, offset: u32) -> Self {
        self.header_offset = offset;
        self
    }

    /// Add an uncompressed file
    pub fn add_file(&mut self, name: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>) -> &mut Self {
        let payload = data.into();
        let original_length = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        self.add_raw(name, CompressionType::None, original_length, payload)
    }

    /// Add a file compressed as NBZ
    pub fn add_nbz(&mut self, name: impl Into<Vec<u8>>, data: &[u8]) -> Result<&mut Self> {
        let payload = nbz::encode(data)?;
        let original_length = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Ok(self.add_raw(name, CompressionType::Nbz, original_length, payload))
    }

    /// Add an already encoded payload with an explicit directory record.
    pub fn add_raw(
        &mut self,
        name: impl Into<Vec<u8>>,
        compression: CompressionType,
        original_length: u32,
        payload: Vec<u8>,
    ) -> &mut Self {
        self.entries.push(PendingEntry {
            name: name.into(),
            compression,
            original_length,
            payload,
        });
        self
    }

    /// Number of files added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no file has been added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.kind == ArchiveKind::Sar || self.kind == ArchiveKind::Nsa {
            u16::try_from(self.entries.len()).map_err(|_| {
                ArchiveError::Build(format!("{} files exceed the u16 count", self.entries.len()))
            })?;
        }

        for entry in &self.entries {
            let forbidden = match self.kind {
                ArchiveKind::Sar | ArchiveKind::Nsa => 0,
                ArchiveKind::Ns2 => NS2_QUOTE,
            };
            if entry.name.is_empty() || entry.name.contains(&forbidden) {
                return Err(ArchiveError::Build(format!(
                    "invalid {} entry name {:?}",
                    self.kind,
                    String::from_utf8_lossy(&entry.name)
                )));
            }
            if self.kind != ArchiveKind::Nsa && entry.compression != CompressionType::None {
                return Err(ArchiveError::Build(format!(
                    "{} archives cannot store {} entries",
                    self.kind, entry.compression
                )));
            }
            u32::try_from(entry.payload.len()).map_err(|_| {
                ArchiveError::Build(format!("payload of {} bytes is too large", entry.payload.len()))
            })?;
        }
        Ok(())
    }

    fn directory_size(&self) -> usize {
        match self.kind {
            ArchiveKind::Sar => 6 + self.entries.iter().map(|e| e.name.len() + 1 + 8).sum::<usize>(),
            ArchiveKind::Nsa => {
                6 + self
                    .entries
                    .iter()
                    .map(|e| e.name.len() + 1 + 1 + 12)
                    .sum::<usize>()
            }
            ArchiveKind::Ns2 => {
                4 + self.entries.iter().map(|e| e.name.len() + 2 + 4).sum::<usize>() + 1
            }
        }
    }

    fn write_directory(&self, out: &mut Vec<u8>, data_base: u32) {
        match self.kind {
            ArchiveKind::Sar | ArchiveKind::Nsa => {
                // count fits, checked by validate
                out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
                out.extend_from_slice(&data_base.to_be_bytes());

                let mut offset = 0u32;
                for entry in &self.entries {
                    let length = entry.payload.len() as u32;
                    out.extend_from_slice(&entry.name);
                    out.push(0);
                    if self.kind == ArchiveKind::Nsa {
                        out.push(entry.compression.to_byte());
                    }
                    out.extend_from_slice(&offset.to_be_bytes());
                    out.extend_from_slice(&length.to_be_bytes());
                    if self.kind == ArchiveKind::Nsa {
                        out.extend_from_slice(&entry.original_length.to_be_bytes());
                    }
                    offset = offset.wrapping_add(length);
                }
            }
            ArchiveKind::Ns2 => {
                out.extend_from_slice(&data_base.to_le_bytes());
                for entry in &self.entries {
                    out.push(NS2_QUOTE);
                    out.extend_from_slice(&entry.name);
                    out.push(NS2_QUOTE);
                    out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
                }
                out.push(NS2_END_MARKER);
            }
        }
    }

    /// Build the archive bytes
    pub fn build(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let directory_size = self.directory_size();
        let data_base = u32::try_from(directory_size)
            .map_err(|_| ArchiveError::Build("directory is too large".into()))?;
        let payload_size: u64 = self.entries.iter().map(|e| e.payload.len() as u64).sum();
        if u64::from(self.header_offset) + u64::from(data_base) + payload_size > u64::from(u32::MAX) {
            return Err(ArchiveError::Build("archive exceeds 4 GiB of offsets".into()));
        }

        let mut out = vec![0u8; self.header_offset as usize];
        out.reserve(directory_size + payload_size as usize);
        self.write_directory(&mut out, data_base);
        debug_assert_eq!(out.len(), self.header_offset as usize + directory_size);

        for entry in &self.entries {
            out.extend_from_slice(&entry.payload);
        }

        if let Some(ref key) = self.encode_key {
            for byte in &mut out {
                *byte = key.decode(*byte);
            }
        }

        debug!(
            "Built {} archive with {} files, {} bytes",
            self.kind,
            self.entries.len(),
            out.len()
        );
        Ok(out)
    }

    /// Build the archive and write it to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.build()?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
