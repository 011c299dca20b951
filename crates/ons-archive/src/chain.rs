//! Archive chain resolution
//!
//! A game directory holds one archive generation. `arc.sar` selects the
//! legacy single-archive mode. Otherwise numbered NS2 archives are used if
//! any exist, and only when none do are the NSA primary and its numbered
//! extras probed. Loose files in the directory shadow every archive.
//!
//! Lookups walk the sources in precedence order and stop at the first
//! non-zero answer. A source that fails to read is logged and skipped.

use crate::archive::{ArchiveInfo, ArchiveKind};
use crate::compression::CompressionRegistry;
use crate::config::ArchiveConfig;
use crate::direct::DirectReader;
use crate::error::{ArchiveError, Result};
use crate::source::{AssetSource, FileData};
use crate::{MAX_EXTRA_ARCHIVES, MAX_NS2_ARCHIVES, NS2_EXTENSION, SAR_ARCHIVE_NAME};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// How the files of one generation are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// `00.ext`, `01.ext`, ...
    ZeroPadded,
    /// `stem.ext`, then `stem1.ext`, `stem2.ext`, ...
    StemThenNumbered(&'static str),
}

/// File names to probe for one archive generation.
///
/// Probing stops at the first index whose file cannot be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePlan {
    /// Generation the probed files belong to
    pub kind: ArchiveKind,
    /// Numbering scheme
    pub pattern: NamePattern,
    /// File extension without the dot
    pub extension: &'static str,
    /// Number of indices to try
    pub limit: usize,
}

impl ProbePlan {
    /// Plan for `00.ns2` .. `99.ns2`
    pub const fn ns2() -> Self {
        Self {
            kind: ArchiveKind::Ns2,
            pattern: NamePattern::ZeroPadded,
            extension: NS2_EXTENSION,
            limit: MAX_NS2_ARCHIVES,
        }
    }

    /// Plan for `arc.<ext>` followed by `arc1.<ext>` .. `arc9.<ext>`
    pub const fn nsa(extension: &'static str) -> Self {
        Self {
            kind: ArchiveKind::Nsa,
            pattern: NamePattern::StemThenNumbered("arc"),
            extension,
            limit: 1 + MAX_EXTRA_ARCHIVES,
        }
    }

    /// File name probed at `index`
    pub fn file_name(&self, index: usize) -> String {
        match self.pattern {
            NamePattern::ZeroPadded => format!("{index:02}.{}", self.extension),
            NamePattern::StemThenNumbered(stem) if index == 0 => {
                format!("{stem}.{}", self.extension)
            }
            NamePattern::StemThenNumbered(stem) => format!("{stem}{index}.{}", self.extension),
        }
    }

    /// Open and parse archives until the first missing index.
    fn probe(&self, base: &Path, config: &ArchiveConfig) -> Result<Vec<ArchiveInfo>> {
        let mut found = Vec::new();
        for index in 0..self.limit {
            let path = base.join(self.file_name(index));
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    debug!("Stopped {} probe at {}: {}", self.kind, path.display(), e);
                    break;
                }
            };
            found.push(ArchiveInfo::from_file(path, file, self.kind, config)?);
        }
        Ok(found)
    }
}

/// Iterate sources in lookup order.
fn sources<'a>(
    direct: &'a mut DirectReader,
    archives: &'a mut [ArchiveInfo],
) -> impl Iterator<Item = &'a mut dyn AssetSource> {
    std::iter::once(direct as &mut dyn AssetSource)
        .chain(archives.iter_mut().map(|a| a as &mut dyn AssetSource))
}

/// Ordered set of asset sources for one game directory.
///
/// File handles stay open for the lifetime of the chain. Lookups take
/// `&mut self` because they seek the shared handles and fill the length
/// cache; share a chain across threads behind a lock.
#[derive(Debug)]
pub struct ArchiveChain {
    config: ArchiveConfig,
    single_archive: bool,
    direct: DirectReader,
    archives: Vec<ArchiveInfo>,
}

impl ArchiveChain {
    /// Locate and index the archives under `config.archive_path`.
    ///
    /// Fails with [`ArchiveError::ArchiveNotFound`] when no generation is
    /// present, and with [`ArchiveError::InvalidArchive`] as soon as one
    /// located archive cannot be parsed.
    pub fn open(config: ArchiveConfig) -> Result<Self> {
        let base = config.archive_path.clone();
        let direct = DirectReader::new(&base);

        let sar_path = base.join(SAR_ARCHIVE_NAME);
        if let Ok(file) = File::open(&sar_path) {
            let sar = ArchiveInfo::from_file(sar_path, file, ArchiveKind::Sar, &config)?;
            info!("Using single archive {}", sar.file_name().display());
            return Ok(Self {
                config,
                single_archive: true,
                direct,
                archives: vec![sar],
            });
        }

        let mut archives = Vec::new();
        if config.kinds.ns2 {
            archives = ProbePlan::ns2().probe(&base, &config)?;
        }
        if archives.is_empty() && config.kinds.nsa {
            archives = ProbePlan::nsa(config.nsa_extension()).probe(&base, &config)?;
        }

        if archives.is_empty() {
            return Err(ArchiveError::ArchiveNotFound(base));
        }

        info!(
            "Opened {} {} archive(s) under {}",
            archives.len(),
            archives[0].kind(),
            base.display()
        );

        Ok(Self {
            config,
            single_archive: false,
            direct,
            archives,
        })
    }

    /// Configuration the chain was opened with
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Whether the chain runs on `arc.sar` alone
    pub fn is_single_archive(&self) -> bool {
        self.single_archive
    }

    /// Name of the archive family: `sar` or `nsa`
    pub fn archive_name(&self) -> &'static str {
        if self.single_archive { "sar" } else { "nsa" }
    }

    /// Opened archives in lookup order
    pub fn archives(&self) -> &[ArchiveInfo] {
        &self.archives
    }

    /// Map `extension` to `compression` for entries that declare none.
    ///
    /// Stored lengths of undeclared entries that now decode as NBZ or SPB
    /// are dropped, so their next lookup reads the payload header.
    pub fn register_compression_type(
        &mut self,
        extension: &str,
        compression: crate::CompressionType,
    ) {
        self.config
            .compression_types
            .register(extension, compression);
        for archive in &mut self.archives {
            archive.reset_lazy_lengths(&self.config.compression_types);
        }
    }

    /// Compression registry used by lookups
    pub fn compression_types(&self) -> &CompressionRegistry {
        &self.config.compression_types
    }

    /// Total entries over every opened archive.
    ///
    /// Names present in several archives are counted once per archive.
    pub fn num_files(&self) -> usize {
        self.archives.iter().map(ArchiveInfo::num_of_files).sum()
    }

    /// Length of `name` from the first source that knows it, or 0.
    pub fn file_length(&mut self, name: impl AsRef<[u8]>) -> u64 {
        let name = name.as_ref();
        let registry = &self.config.compression_types;
        for source in sources(&mut self.direct, &mut self.archives) {
            match source.file_length(name, registry) {
                Ok(0) => {}
                Ok(length) => return length,
                Err(e) => warn!(
                    "Length lookup of {} in {} failed: {}",
                    String::from_utf8_lossy(name),
                    source.describe(),
                    e
                ),
            }
        }
        0
    }

    /// Content of `name` from the first source that has it.
    ///
    /// The returned location is the generation that served the read, or
    /// `None` when a loose file did.
    pub fn get_file(&mut self, name: impl AsRef<[u8]>) -> Option<FileData> {
        let name = name.as_ref();
        let registry = &self.config.compression_types;
        for source in sources(&mut self.direct, &mut self.archives) {
            match source.read_file(name, registry) {
                Ok(Some(data)) if !data.is_empty() => {
                    return Some(FileData {
                        data,
                        location: source.location(),
                    });
                }
                Ok(_) => {}
                Err(e) => warn!(
                    "Read of {} from {} failed: {}",
                    String::from_utf8_lossy(name),
                    source.describe(),
                    e
                ),
            }
        }
        None
    }
}
