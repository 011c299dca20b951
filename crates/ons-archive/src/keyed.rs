//! Byte-substitution key table applied to everything read from an archive
//!
//! Some distributions obfuscate their archives by passing every byte through
//! a fixed 256-entry substitution table. The table is opaque to the chain:
//! it is loaded once and applied by [`KeyedReader`] underneath the directory
//! parser and the payload reads alike.

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Size of a key table in bytes
pub const KEY_TABLE_SIZE: usize = 256;

/// Byte-substitution table: a stored byte `b` reads as `table[b]`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct KeyTable(Box<[u8; KEY_TABLE_SIZE]>);

impl KeyTable {
    /// Table that leaves every byte unchanged.
    pub fn identity() -> Self {
        let mut table = [0u8; KEY_TABLE_SIZE];
        for (slot, value) in table.iter_mut().zip(0u8..=255) {
            *slot = value;
        }
        Self(Box::new(table))
    }

    /// Build a table from exactly 256 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let table: [u8; KEY_TABLE_SIZE] = bytes
            .try_into()
            .map_err(|_| ArchiveError::InvalidKeyTable(bytes.len()))?;
        Ok(Self(Box::new(table)))
    }

    /// Load a table from a 256-byte key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode one stored byte.
    #[inline]
    pub fn decode(&self, byte: u8) -> u8 {
        self.0[usize::from(byte)]
    }

    /// Table mapping plain bytes back to stored bytes.
    ///
    /// Returns `None` when the table is not a permutation, in which case
    /// some plain bytes have no stored form.
    pub fn inverse(&self) -> Option<Self> {
        let mut inverse = [0u8; KEY_TABLE_SIZE];
        let mut seen = [false; KEY_TABLE_SIZE];
        for (stored, &plain) in (0u8..=255).zip(self.0.iter()) {
            if seen[usize::from(plain)] {
                return None;
            }
            seen[usize::from(plain)] = true;
            inverse[usize::from(plain)] = stored;
        }
        Some(Self(Box::new(inverse)))
    }

    /// Raw table bytes
    pub fn as_bytes(&self) -> &[u8; KEY_TABLE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for KeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyTable").field(&"..").finish()
    }
}

impl TryFrom<Vec<u8>> for KeyTable {
    type Error = ArchiveError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(&bytes)
    }
}

impl From<KeyTable> for Vec<u8> {
    fn from(table: KeyTable) -> Self {
        table.0.to_vec()
    }
}

/// Reader that decodes every byte through an optional key table.
///
/// Seeking is passed straight through, so positioned reads work the same
/// with or without a key.
pub struct KeyedReader<R> {
    inner: R,
    key: Option<KeyTable>,
}

impl<R> KeyedReader<R> {
    /// Wrap `inner`, decoding through `key` when one is given.
    pub fn new(inner: R, key: Option<KeyTable>) -> Self {
        Self { inner, key }
    }

    /// Whether a key table is active
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }
}

impl<R: Read> Read for KeyedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(ref key) = self.key {
            for byte in &mut buf[..n] {
                *byte = key.decode(*byte);
            }
        }
        Ok(n)
    }
}

impl<R: Seek> Seek for KeyedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn xor_table(mask: u8) -> KeyTable {
        let bytes: Vec<u8> = (0u8..=255).map(|b| b ^ mask).collect();
        KeyTable::from_bytes(&bytes).expect("256 bytes")
    }

    #[test]
    fn test_keyed_reader_decodes_bytes() {
        let key = xor_table(0x5A);
        let stored: Vec<u8> = b"arc".iter().map(|b| b ^ 0x5A).collect();
        let mut reader = KeyedReader::new(Cursor::new(stored), Some(key));

        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("read");
        assert_eq!(out, b"arc");
    }

    #[test]
    fn test_unkeyed_reader_passes_through() {
        let mut reader = KeyedReader::new(Cursor::new(b"plain".to_vec()), None);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).expect("read");
        assert_eq!(out, b"plain");
        assert!(!reader.is_keyed());
    }

    #[test]
    fn test_inverse_of_permutation() {
        let key = xor_table(0x33);
        let inverse = key.inverse().expect("permutation");
        for byte in 0u8..=255 {
            assert_eq!(key.decode(inverse.decode(byte)), byte);
        }
    }

    #[test]
    fn test_inverse_rejects_non_permutation() {
        let key = KeyTable::from_bytes(&[0u8; KEY_TABLE_SIZE]).expect("256 bytes");
        assert!(key.inverse().is_none());
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert!(matches!(
            KeyTable::from_bytes(&[1, 2, 3]),
            Err(ArchiveError::InvalidKeyTable(3))
        ));
    }

    #[test]
    fn test_identity_table() {
        let key = KeyTable::identity();
        assert_eq!(key.decode(0), 0);
        assert_eq!(key.decode(200), 200);
    }
}
