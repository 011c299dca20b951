//! Compression resolution and payload decoding
//!
//! NBZ and SPB entries do not record their decompressed size in the
//! archive directory. The size sits in the first bytes of the payload, so
//! it is read on demand (see [`decompressed_length`]) and cached in the
//! entry by [`ArchiveInfo::resolve_length`](crate::ArchiveInfo::resolve_length).

pub mod bits;
pub mod lzss;
pub mod nbz;
pub mod spb;

use crate::archive::CompressionType;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload header bytes needed to size a lazily sized entry
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Maps file extensions to the compression type assumed for entries that
/// declare none.
///
/// Extensions are matched case-insensitively, without the leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressionRegistry {
    by_extension: BTreeMap<String, CompressionType>,
}

impl CompressionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat files ending in `extension` as `compression`.
    pub fn register(&mut self, extension: &str, compression: CompressionType) {
        let key = extension.trim_start_matches('.').to_ascii_uppercase();
        self.by_extension.insert(key, compression);
    }

    /// Compression registered for `name`'s extension, or `None`.
    pub fn lookup(&self, name: &[u8]) -> CompressionType {
        let Some(dot) = name.iter().rposition(|&b| b == b'.') else {
            return CompressionType::None;
        };
        let Ok(extension) = std::str::from_utf8(&name[dot + 1..]) else {
            return CompressionType::None;
        };
        self.by_extension
            .get(&extension.to_ascii_uppercase())
            .copied()
            .unwrap_or(CompressionType::None)
    }

    /// Declared type, or the registered type when nothing is declared.
    pub fn effective(&self, declared: CompressionType, name: &[u8]) -> CompressionType {
        if declared == CompressionType::None {
            self.lookup(name)
        } else {
            declared
        }
    }

    /// Registered extensions and their types
    pub fn iter(&self) -> impl Iterator<Item = (&str, CompressionType)> {
        self.by_extension.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    /// Whether no extension is registered
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

/// Decompressed size computed from the payload header alone.
///
/// Returns 0 for types whose size is not carried in the payload.
pub fn decompressed_length(compression: CompressionType, header: [u8; LENGTH_HEADER_SIZE]) -> u32 {
    match compression {
        CompressionType::Nbz => nbz::declared_size(header),
        CompressionType::Spb => {
            let (width, height) = spb::dimensions(header);
            u32::try_from(spb::image_size(width, height)).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}

/// Decode a stored payload according to its effective compression type.
///
/// Unknown types are returned raw.
pub fn decode(compression: CompressionType, raw: &[u8], original_length: u32) -> Result<Vec<u8>> {
    match compression {
        CompressionType::Nbz => nbz::decode(raw),
        CompressionType::Spb => spb::decode(raw),
        CompressionType::Lzss => Ok(lzss::decode(raw, original_length)),
        CompressionType::None | CompressionType::Unknown(_) => Ok(raw.to_vec()),
    }
}
