//! Directory entries and their compression types

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Compression scheme recorded for an archive entry.
///
/// NSA archives store this as a single byte per entry; SAR and NS2
/// archives always declare [`CompressionType::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// Stored as-is
    None,
    /// Bit-packed 24-bit image, decoded to a BMP
    Spb,
    /// LZSS with a 256-byte window
    Lzss,
    /// 4-byte big-endian size followed by a bzip2 stream
    Nbz,
    /// Byte value this reader does not understand; read raw
    Unknown(u8),
}

impl CompressionType {
    /// Parse the NSA compression byte
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::None,
            1 => Self::Spb,
            2 => Self::Lzss,
            4 => Self::Nbz,
            other => Self::Unknown(other),
        }
    }

    /// NSA compression byte
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Spb => 1,
            Self::Lzss => 2,
            Self::Nbz => 4,
            Self::Unknown(byte) => byte,
        }
    }

    /// Whether the decompressed size has to be read from the payload header
    /// instead of the directory.
    pub const fn has_lazy_length(self) -> bool {
        matches!(self, Self::Nbz | Self::Spb)
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Spb => f.write_str("spb"),
            Self::Lzss => f.write_str("lzss"),
            Self::Nbz => f.write_str("nbz"),
            Self::Unknown(byte) => write!(f, "unknown(0x{byte:02x})"),
        }
    }
}

impl FromStr for CompressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "spb" => Ok(Self::Spb),
            "lzss" => Ok(Self::Lzss),
            "nbz" => Ok(Self::Nbz),
            other => Err(format!("unknown compression type: {other}")),
        }
    }
}

/// One asset listed in an archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name exactly as stored (usually Shift-JIS, compared byte-wise)
    pub name: Vec<u8>,
    /// Absolute byte offset of the payload in the archive file
    pub offset: u64,
    /// Stored payload length
    pub length: u32,
    /// Compression declared by the directory
    pub compression_type: CompressionType,
    /// Decompressed length; 0 until resolved for lazily sized entries
    pub original_length: u32,
}

impl FileEntry {
    /// Name for display, with invalid UTF-8 replaced
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}
