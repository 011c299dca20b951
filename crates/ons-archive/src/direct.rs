//! Loose files under the archive path
//!
//! Names use the script's `\` separator. Names that are not valid UTF-8
//! cannot be mapped onto the filesystem portably and always miss.

use crate::archive::ArchiveKind;
use crate::compression::CompressionRegistry;
use crate::error::Result;
use crate::source::AssetSource;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Reader for files stored directly on disk.
#[derive(Debug, Clone)]
pub struct DirectReader {
    base_path: PathBuf,
}

impl DirectReader {
    /// Reader rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Filesystem path `name` maps to, if it maps to one.
    pub fn resolve(&self, name: &[u8]) -> Option<PathBuf> {
        let name = std::str::from_utf8(name).ok()?;
        let mut path = self.base_path.clone();
        for component in name.split(['\\', '/']).filter(|c| !c.is_empty()) {
            if component == ".." {
                return None;
            }
            path.push(component);
        }
        Some(path)
    }
}

impl AssetSource for DirectReader {
    fn location(&self) -> Option<ArchiveKind> {
        None
    }

    fn num_files(&self) -> usize {
        0
    }

    fn file_length(&mut self, name: &[u8], _registry: &CompressionRegistry) -> Result<u64> {
        let Some(path) = self.resolve(name) else {
            return Ok(0);
        };
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Ok(0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn read_file(
        &mut self,
        name: &[u8],
        _registry: &CompressionRegistry,
    ) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        match std::fs::read(&path) {
            Ok(data) => {
                trace!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("filesystem at {}", self.base_path.display())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backslash_names_map_to_subdirectories() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir(dir.path().join("bgm")).expect("mkdir");
        std::fs::write(dir.path().join("bgm").join("title.ogg"), b"ogg!").expect("write");

        let mut reader = DirectReader::new(dir.path());
        let registry = CompressionRegistry::new();
        assert_eq!(
            reader.file_length(b"bgm\\title.ogg", &registry).expect("length"),
            4
        );
        assert_eq!(
            reader.read_file(b"bgm\\title.ogg", &registry).expect("read"),
            Some(b"ogg!".to_vec())
        );
    }

    #[test]
    fn test_misses() {
        let dir = TempDir::new().expect("temp dir");
        let mut reader = DirectReader::new(dir.path());
        let registry = CompressionRegistry::new();

        assert_eq!(reader.file_length(b"absent.txt", &registry).expect("length"), 0);
        assert_eq!(reader.read_file(b"absent.txt", &registry).expect("read"), None);
        // Shift-JIS bytes are not valid UTF-8
        assert_eq!(reader.read_file(&[0x82, 0xa0], &registry).expect("read"), None);
        assert!(reader.resolve(b"..\\escape").is_none());
    }

    #[test]
    fn test_directories_are_not_files() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let mut reader = DirectReader::new(dir.path());
        let registry = CompressionRegistry::new();

        assert_eq!(reader.file_length(b"sub", &registry).expect("length"), 0);
        assert_eq!(reader.read_file(b"sub", &registry).expect("read"), None);
    }
}
