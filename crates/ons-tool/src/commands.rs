//! Subcommand implementations.
//!
//! Every command writes its report to the given writer, as plain text or,
//! with `--json`, as one JSON document.

use crate::config::{Command, PackKind, ToolConfig};
use crate::error::CommandError;
use anyhow::{Context, Result};
use ons_archive::{ArchiveBuilder, ArchiveChain, ArchiveConfig, ArchiveKind, ArchiveInfo};
use ons_save::{AsciiDigits, SaveConfig, SaveFileInfo, SaveFiles};
use serde::Serialize;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Run the configured command.
pub fn run(config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    match &config.command {
        Command::List => list(config, out),
        Command::Length { names } => length(config, names, out),
        Command::Extract { name, output } => extract(config, name, output.as_deref(), out),
        Command::Pack {
            kind,
            output,
            nbz,
            base,
            files,
        } => pack(config, *kind, output, *nbz, base.as_deref(), files, out),
        Command::Saves => saves(config, out),
        Command::SaveInfo { slot } => save_info(config, *slot, out),
        Command::Config => show_config(config, out),
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn open_chain(config: &ToolConfig) -> Result<ArchiveChain> {
    let archive_config = config.archive_config()?;
    let path = archive_config.archive_path.clone();
    ArchiveChain::open(archive_config)
        .with_context(|| format!("Failed to open archives under {}", path.display()))
}

#[derive(Debug, Serialize)]
struct EntryListing {
    name: String,
    offset: u64,
    length: u32,
    compression: String,
    original_length: u32,
}

#[derive(Debug, Serialize)]
struct ArchiveListing {
    file: PathBuf,
    kind: ArchiveKind,
    entries: Vec<EntryListing>,
}

impl From<&ArchiveInfo> for ArchiveListing {
    fn from(archive: &ArchiveInfo) -> Self {
        Self {
            file: archive.file_name().to_path_buf(),
            kind: archive.kind(),
            entries: archive
                .entries()
                .iter()
                .map(|entry| EntryListing {
                    name: entry.display_name().into_owned(),
                    offset: entry.offset,
                    length: entry.length,
                    compression: entry.compression_type.to_string(),
                    original_length: entry.original_length,
                })
                .collect(),
        }
    }
}

fn list(config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    let chain = open_chain(config)?;
    let listings: Vec<ArchiveListing> = chain.archives().iter().map(ArchiveListing::from).collect();

    if config.json {
        return write_json(out, &listings);
    }

    writeln!(
        out,
        "{} mode, {} archive(s), {} file(s)",
        chain.archive_name(),
        listings.len(),
        chain.num_files()
    )?;
    for listing in &listings {
        writeln!(
            out,
            "{} ({}, {} files)",
            listing.file.display(),
            listing.kind,
            listing.entries.len()
        )?;
        for entry in &listing.entries {
            writeln!(
                out,
                "  {:>10} {:>10} {:<6} {}",
                entry.offset, entry.length, entry.compression, entry.name
            )?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LengthReport<'a> {
    name: &'a str,
    length: u64,
}

fn length(config: &ToolConfig, names: &[String], out: &mut dyn Write) -> Result<()> {
    let mut chain = open_chain(config)?;
    let reports: Vec<LengthReport<'_>> = names
        .iter()
        .map(|name| LengthReport {
            name,
            length: chain.file_length(name),
        })
        .collect();

    if config.json {
        return write_json(out, &reports);
    }
    for report in &reports {
        writeln!(out, "{}\t{}", report.length, report.name)?;
    }
    Ok(())
}

/// Last component of an asset name, split on either separator.
fn default_output_name(name: &str) -> &str {
    name.rsplit(['\\', '/'])
        .find(|part| !part.is_empty())
        .unwrap_or(name)
}

fn extract(
    config: &ToolConfig,
    name: &str,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let mut chain = open_chain(config)?;
    let file = chain
        .get_file(name)
        .ok_or_else(|| CommandError::AssetNotFound(name.to_string()))?;

    let target = output.map_or_else(|| PathBuf::from(default_output_name(name)), Path::to_path_buf);
    std::fs::write(&target, &file.data)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    let source = file
        .location
        .map_or_else(|| "filesystem".to_string(), |kind| kind.to_string());
    info!("Extracted {} ({} bytes) from {}", name, file.len(), source);

    if config.json {
        #[derive(Serialize)]
        struct Extracted<'a> {
            name: &'a str,
            length: usize,
            location: Option<ArchiveKind>,
            output: &'a Path,
        }
        return write_json(
            out,
            &Extracted {
                name,
                length: file.len(),
                location: file.location,
                output: &target,
            },
        );
    }
    writeln!(
        out,
        "{} -> {} ({} bytes from {})",
        name,
        target.display(),
        file.len(),
        source
    )?;
    Ok(())
}

/// Directory name of a packed file: its path below `base`, joined with
/// backslashes.
fn entry_name(file: &Path, base: Option<&Path>) -> Result<String> {
    let relative = match base {
        Some(base) => file
            .strip_prefix(base)
            .with_context(|| format!("{} is not under {}", file.display(), base.display()))?,
        None => Path::new(file.file_name().ok_or_else(|| CommandError::NotAFile(file.to_path_buf()))?),
    };
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    Ok(parts.join("\\"))
}

fn pack(
    config: &ToolConfig,
    kind: PackKind,
    output: &Path,
    nbz: bool,
    base: Option<&Path>,
    files: &[PathBuf],
    out: &mut dyn Write,
) -> Result<()> {
    let kind = ArchiveKind::from(kind);
    if nbz && kind != ArchiveKind::Nsa {
        return Err(CommandError::CompressionUnsupported(kind).into());
    }

    let mut builder = ArchiveBuilder::new(kind).with_header_offset(config.nsa_offset);
    if let Some(key_table) = config.load_key_table()? {
        builder = builder.with_key_table(&key_table)?;
    }

    for file in files {
        if !file.is_file() {
            return Err(CommandError::NotAFile(file.clone()).into());
        }
        let name = entry_name(file, base)?;
        let data =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        debug!("Adding {} as {} ({} bytes)", file.display(), name, data.len());
        if nbz {
            builder.add_nbz(name, &data)?;
        } else {
            builder.add_file(name, data);
        }
    }

    builder
        .write_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} archive {}", kind, output.display());

    if config.json {
        #[derive(Serialize)]
        struct Packed<'a> {
            output: &'a Path,
            kind: ArchiveKind,
            files: usize,
        }
        return write_json(
            out,
            &Packed {
                output,
                kind,
                files: builder.len(),
            },
        );
    }
    writeln!(
        out,
        "{} ({}, {} files)",
        output.display(),
        kind,
        builder.len()
    )?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SlotReport {
    #[serde(flatten)]
    info: SaveFileInfo,
    label: Option<String>,
}

fn save_files(config: &ToolConfig) -> SaveFiles<AsciiDigits> {
    SaveFiles::with_formatter(config.save_config(), AsciiDigits)
}

fn saves(config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    let mut files = save_files(config);
    let mut reports = Vec::new();
    for info in files.search_all() {
        let label = if info.valid {
            match files.read_label(info.no) {
                Ok(label) => label.map(|label| String::from_utf8_lossy(&label).into_owned()),
                Err(e) => {
                    warn!("Cannot read label of save slot {}: {}", info.no, e);
                    None
                }
            }
        } else {
            None
        };
        reports.push(SlotReport { info, label });
    }

    if config.json {
        return write_json(out, &reports);
    }
    for report in &reports {
        let info = &report.info;
        if info.valid {
            writeln!(
                out,
                "{} {}/{} {}:{} {}",
                info.no_text,
                info.month_text,
                info.day_text,
                info.hour_text,
                info.minute_text,
                report.label.as_deref().unwrap_or("")
            )?;
        } else {
            writeln!(out, "{} -", info.no_text)?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SaveInfoReport {
    slot: u32,
    path: PathBuf,
    version: Option<String>,
    legacy: bool,
    loadable: bool,
    payload_offset: usize,
    label: Option<String>,
}

fn save_info(config: &ToolConfig, slot: u32, out: &mut dyn Write) -> Result<()> {
    let mut files = save_files(config);
    let header = files.header(slot)?;
    let report = SaveInfoReport {
        slot,
        path: files.config().save_path(slot),
        version: header.version.map(|v| v.to_string()),
        legacy: header.version.is_none(),
        loadable: header.is_loadable(),
        payload_offset: header.payload_offset,
        label: header
            .label
            .as_deref()
            .map(|label| String::from_utf8_lossy(label).into_owned()),
    };

    if config.json {
        return write_json(out, &report);
    }
    writeln!(out, "{}", report.path.display())?;
    writeln!(
        out,
        "  version: {}",
        report.version.as_deref().unwrap_or("none (legacy)")
    )?;
    writeln!(out, "  loadable: {}", report.loadable)?;
    writeln!(out, "  payload offset: {}", report.payload_offset)?;
    writeln!(out, "  label: {}", report.label.as_deref().unwrap_or("-"))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct EffectiveConfig {
    archive: ArchiveConfig,
    save: SaveConfig,
}

fn show_config(config: &ToolConfig, out: &mut dyn Write) -> Result<()> {
    write_json(
        out,
        &EffectiveConfig {
            archive: config.archive_config()?,
            save: config.save_config(),
        },
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(default_output_name("bg\\title.bmp"), "title.bmp");
        assert_eq!(default_output_name("voice/a.ogg"), "a.ogg");
        assert_eq!(default_output_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_entry_name_uses_backslashes() {
        let name = entry_name(Path::new("game/bg/title.bmp"), Some(Path::new("game")))
            .expect("under base");
        assert_eq!(name, "bg\\title.bmp");

        let name = entry_name(Path::new("game/bg/title.bmp"), None).expect("file name");
        assert_eq!(name, "title.bmp");

        assert!(entry_name(Path::new("other/a.txt"), Some(Path::new("game"))).is_err());
    }
}
