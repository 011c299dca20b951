//! Tool configuration.
//!
//! Options come from CLI arguments, environment variables
//! (`ONS_ARCHIVE_PATH`, `ONS_SAVE_DIR`, `ONS_KEY_TABLE`) and defaults.
//!
//! ```no_run
//! use ons_tool::ToolConfig;
//!
//! let config = ToolConfig::from_args();
//! config.validate().expect("Invalid configuration");
//! let archives = config.archive_config().expect("key table");
//! println!("archives under {}", archives.archive_path.display());
//! ```

use crate::error::ConfigError;
use clap::{Parser, Subcommand, ValueEnum};
use ons_archive::{ArchiveConfig, ArchiveKind, ArchiveKinds, CompressionType, KeyTable};
use ons_save::SaveConfig;
use std::path::PathBuf;

/// Configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ons-tool",
    about = "Inspect ONScripter archives and save files",
    version
)]
pub struct ToolConfig {
    /// Directory holding the archives and loose asset files
    #[arg(
        long,
        short = 'p',
        env = "ONS_ARCHIVE_PATH",
        default_value = ".",
        global = true
    )]
    pub archive_path: PathBuf,

    /// Directory holding save files (defaults to the archive directory)
    #[arg(long, env = "ONS_SAVE_DIR", global = true)]
    pub save_dir: Option<PathBuf>,

    /// Directory receiving header-less save copies, relative to the save directory
    #[arg(long, default_value = ons_save::QUICK_COPY_DIR, global = true)]
    pub quick_copy_dir: PathBuf,

    /// Number of slots in the save menu
    #[arg(long, default_value_t = 9, global = true)]
    pub slot_count: u32,

    /// 256-byte substitution table applied to archive bytes
    #[arg(long, env = "ONS_KEY_TABLE", global = true)]
    pub key_table: Option<PathBuf>,

    /// Bytes to skip before each archive header
    #[arg(long, default_value_t = 0, global = true)]
    pub nsa_offset: u32,

    /// Map a file extension to a compression type, e.g. `jpg=nbz`
    #[arg(
        long = "register",
        value_name = "EXT=TYPE",
        value_parser = parse_registration,
        global = true
    )]
    pub registrations: Vec<(String, CompressionType)>,

    /// Do not probe for NSA archives
    #[arg(long, global = true)]
    pub no_nsa: bool,

    /// Do not probe for NS2 archives
    #[arg(long, global = true)]
    pub no_ns2: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Tool subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the opened archives and their entries
    List,

    /// Print the decoded length of assets
    Length {
        /// Asset names as used by scripts
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Write a decoded asset to disk
    Extract {
        /// Asset name as used by scripts
        name: String,

        /// Output file (defaults to the last path component of the name)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Build an archive from files
    Pack {
        /// Archive kind to write
        #[arg(long, value_enum, default_value_t = PackKind::Nsa)]
        kind: PackKind,

        /// Archive file to create
        #[arg(long, short)]
        output: PathBuf,

        /// Store entries NBZ compressed (NSA only)
        #[arg(long)]
        nbz: bool,

        /// Directory entry names are made relative to
        #[arg(long)]
        base: Option<PathBuf>,

        /// Files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Describe every save slot
    Saves,

    /// Show the header and label of one save file
    SaveInfo {
        /// Slot number
        slot: u32,
    },

    /// Print the effective configuration as JSON
    Config,
}

/// Archive kinds accepted by `pack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PackKind {
    /// `arc.sar` layout
    Sar,
    /// `arc.nsa` layout
    Nsa,
    /// `NN.ns2` layout
    Ns2,
}

impl From<PackKind> for ArchiveKind {
    fn from(kind: PackKind) -> Self {
        match kind {
            PackKind::Sar => Self::Sar,
            PackKind::Nsa => Self::Nsa,
            PackKind::Ns2 => Self::Ns2,
        }
    }
}

fn parse_registration(value: &str) -> Result<(String, CompressionType), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRegistration {
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let (extension, ty) = value
        .split_once('=')
        .ok_or_else(|| invalid("expected EXT=TYPE"))?;
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(invalid("empty extension"));
    }
    let ty = ty.parse::<CompressionType>().map_err(|e| invalid(&e))?;
    Ok((extension.to_string(), ty))
}

impl ToolConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    ///
    /// `pack` writes wherever it is told, so the archive directory is only
    /// required by the commands that read from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reads_archives = matches!(
            self.command,
            Command::List | Command::Length { .. } | Command::Extract { .. }
        );
        if reads_archives && !self.archive_path.is_dir() {
            return Err(ConfigError::MissingArchivePath(self.archive_path.clone()));
        }
        Ok(())
    }

    /// Key table named by `--key-table`, if any.
    pub fn load_key_table(&self) -> Result<Option<KeyTable>, ConfigError> {
        self.key_table
            .as_ref()
            .map(|path| {
                KeyTable::load(path).map_err(|source| ConfigError::KeyTable {
                    path: path.clone(),
                    source,
                })
            })
            .transpose()
    }

    /// Archive chain configuration.
    pub fn archive_config(&self) -> Result<ArchiveConfig, ConfigError> {
        let mut config = ArchiveConfig::new(&self.archive_path)
            .with_kinds(ArchiveKinds {
                nsa: !self.no_nsa,
                ns2: !self.no_ns2,
            })
            .with_nsa_offset(self.nsa_offset);
        if let Some(key_table) = self.load_key_table()? {
            config = config.with_key_table(key_table);
        }
        for (extension, ty) in &self.registrations {
            config = config.with_compression_type(extension, *ty);
        }
        Ok(config)
    }

    /// Save slot configuration.
    pub fn save_config(&self) -> SaveConfig {
        let save_dir = self.save_dir.as_ref().unwrap_or(&self.archive_path);
        SaveConfig::new(save_dir)
            .with_quick_copy_dir(&self.quick_copy_dir)
            .with_slot_count(self.slot_count)
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub const fn default_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
