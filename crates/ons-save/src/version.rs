//! Save format versions and the file header

use binrw::BinRead;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format version as stored after the magic: one byte each.
///
/// Versions compare by their `major * 100 + minor` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveVersion {
    /// Major version byte
    pub major: u8,
    /// Minor version byte
    pub minor: u8,
}

impl SaveVersion {
    /// Version written by this codec
    pub const CURRENT: Self = Self::new(crate::SAVE_VERSION_MAJOR, crate::SAVE_VERSION_MINOR);

    /// Oldest version with a readable versioned payload
    pub const MIN_VERSIONED: u16 = 200;

    /// Version from its two header bytes
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// `major * 100 + minor`
    pub const fn encoded(self) -> u16 {
        self.major as u16 * 100 + self.minor as u16
    }

    /// Whether payloads of this version can be read
    pub const fn is_supported(self) -> bool {
        let encoded = self.encoded();
        encoded >= Self::MIN_VERSIONED && encoded <= Self::CURRENT.encoded()
    }

    /// Whether this version is at least `major.minor`
    pub const fn at_least(self, major: u8, minor: u8) -> bool {
        self.encoded() >= Self::new(major, minor).encoded()
    }
}

impl PartialOrd for SaveVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SaveVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.encoded().cmp(&other.encoded())
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Magic and version at the start of a versioned save file.
#[derive(Debug, Clone, Copy, BinRead)]
#[br(little, magic = b"ONS")]
pub(crate) struct VersionHeader {
    pub major: u8,
    pub minor: u8,
}

impl From<VersionHeader> for SaveVersion {
    fn from(header: VersionHeader) -> Self {
        Self::new(header.major, header.minor)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(SaveVersion::CURRENT.encoded(), 208);
        assert_eq!(SaveVersion::new(1, 50).encoded(), 150);
        assert_eq!(SaveVersion::CURRENT.to_string(), "2.8");
    }

    #[test]
    fn test_supported_range() {
        assert!(SaveVersion::new(2, 0).is_supported());
        assert!(SaveVersion::CURRENT.is_supported());
        assert!(!SaveVersion::new(2, 9).is_supported());
        assert!(!SaveVersion::new(3, 0).is_supported());
        assert!(!SaveVersion::new(1, 99).is_supported());
    }

    #[test]
    fn test_ordering_uses_encoding() {
        assert!(SaveVersion::new(2, 10) > SaveVersion::new(2, 8));
        assert!(SaveVersion::new(1, 150) > SaveVersion::new(2, 0));
        assert!(SaveVersion::new(2, 5).at_least(2, 5));
        assert!(!SaveVersion::new(2, 4).at_least(2, 5));
    }

    #[test]
    fn test_header_reads_magic_and_version() {
        let header = VersionHeader::read(&mut std::io::Cursor::new(b"ONS\x02\x05rest"))
            .expect("valid header");
        assert_eq!(SaveVersion::from(header), SaveVersion::new(2, 5));

        assert!(VersionHeader::read(&mut std::io::Cursor::new(b"ONT\x02\x05")).is_err());
        assert!(VersionHeader::read(&mut std::io::Cursor::new(b"ONS\x02")).is_err());
    }
}
