//! Configuration for save slots

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where save files live and how many slots the menu shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory holding `save<N>.dat`
    pub save_dir: PathBuf,

    /// Directory receiving the header-less copy of each written save;
    /// relative paths are taken from `save_dir`
    pub quick_copy_dir: PathBuf,

    /// Number of slots in the save menu
    pub slot_count: u32,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("."),
            quick_copy_dir: PathBuf::from(crate::QUICK_COPY_DIR),
            slot_count: 9,
        }
    }
}

impl SaveConfig {
    /// Configuration with saves under `save_dir`
    pub fn new<P: AsRef<Path>>(save_dir: P) -> Self {
        Self {
            save_dir: save_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the directory of the header-less copies
    #[must_use]
    pub fn with_quick_copy_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.quick_copy_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the number of menu slots
    #[must_use]
    pub const fn with_slot_count(mut self, slot_count: u32) -> Self {
        self.slot_count = slot_count;
        self
    }

    /// Path of the save file for slot `no`
    pub fn save_path(&self, no: u32) -> PathBuf {
        self.save_dir.join(save_file_name(no))
    }

    /// Path of the header-less copy for slot `no`
    pub fn quick_copy_path(&self, no: u32) -> PathBuf {
        self.save_dir
            .join(&self.quick_copy_dir)
            .join(save_file_name(no))
    }
}

/// `save<no>.dat`
pub fn save_file_name(no: u32) -> String {
    format!("save{no}.dat")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = SaveConfig::new("/games/title");
        assert_eq!(config.save_path(3), PathBuf::from("/games/title/save3.dat"));
        assert_eq!(
            config.quick_copy_path(3),
            PathBuf::from("/games/title/sav/save3.dat")
        );
        assert_eq!(config.slot_count, 9);
    }

    #[test]
    fn test_builders() {
        let config = SaveConfig::new("/games/title")
            .with_quick_copy_dir("copies")
            .with_slot_count(20);
        assert_eq!(
            config.quick_copy_path(12),
            PathBuf::from("/games/title/copies/save12.dat")
        );
        assert_eq!(config.slot_count, 20);

        let config = SaveConfig::new("/games/title").with_quick_copy_dir("/backup");
        assert_eq!(config.quick_copy_path(1), PathBuf::from("/backup/save1.dat"));
    }
}
