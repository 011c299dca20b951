//! Archive directory parsing
//!
//! SAR and NSA archives open with a big-endian header:
//!
//! | Field       | Size | Notes                                  |
//! |-------------|------|----------------------------------------|
//! | file count  | 2    |                                        |
//! | data base   | 4    | start of payload data, from the header |
//!
//! followed by one record per file: a NUL-terminated name, a compression
//! byte (NSA only), offset and stored length relative to the data base,
//! and the decompressed length (NSA only).
//!
//! NS2 archives start with a little-endian `u32` data base. Records are a
//! quoted name and a little-endian `u32` length; payloads follow the
//! directory back to back in listing order. An `e` byte closes the list.

use super::entry::{CompressionType, FileEntry};
use super::ArchiveKind;
use crate::compression::CompressionRegistry;
use crate::error::{ArchiveError, Result};
use binrw::{BinRead, BinReaderExt, NullString};
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

/// Marker that ends an NS2 directory
pub const NS2_END_MARKER: u8 = b'e';

/// Quote that delimits NS2 names
pub const NS2_QUOTE: u8 = b'"';

#[derive(Debug, BinRead)]
#[br(big)]
struct DirectoryHeader {
    file_count: u16,
    data_base: u32,
}

#[derive(Debug, BinRead)]
#[br(big, import(with_compression: bool))]
struct DirectoryRecord {
    name: NullString,
    #[br(if(with_compression))]
    compression: Option<u8>,
    offset: u32,
    length: u32,
    #[br(if(with_compression))]
    original_length: Option<u32>,
}

/// Parse the directory of an archive of `kind` whose header starts at
/// `header_offset`.
///
/// No payload is read or decompressed. Entries whose effective compression
/// carries its size in the payload get `original_length = 0`, to be
/// resolved on first use.
pub fn build_index<R: Read + Seek>(
    reader: &mut R,
    kind: ArchiveKind,
    header_offset: u32,
    registry: &CompressionRegistry,
) -> Result<Vec<FileEntry>> {
    reader.seek(SeekFrom::Start(u64::from(header_offset)))?;

    let mut entries = match kind {
        ArchiveKind::Sar => read_sar_directory(reader, header_offset, false)?,
        ArchiveKind::Nsa => read_sar_directory(reader, header_offset, true)?,
        ArchiveKind::Ns2 => read_ns2_directory(reader, header_offset)?,
    };

    for entry in &mut entries {
        if registry
            .effective(entry.compression_type, &entry.name)
            .has_lazy_length()
        {
            entry.original_length = 0;
        }
    }

    Ok(entries)
}

fn read_sar_directory<R: Read + Seek>(
    reader: &mut R,
    header_offset: u32,
    with_compression: bool,
) -> Result<Vec<FileEntry>> {
    let header = DirectoryHeader::read(reader)?;
    let data_base = u64::from(header_offset) + u64::from(header.data_base);
    trace!(
        "directory lists {} files, data at {}",
        header.file_count, data_base
    );

    let mut entries = Vec::with_capacity(usize::from(header.file_count));
    for _ in 0..header.file_count {
        let record = DirectoryRecord::read_args(reader, (with_compression,))?;
        entries.push(FileEntry {
            name: record.name.0,
            offset: data_base + u64::from(record.offset),
            length: record.length,
            compression_type: record
                .compression
                .map_or(CompressionType::None, CompressionType::from_byte),
            original_length: record.original_length.unwrap_or(record.length),
        });
    }
    Ok(entries)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_ns2_directory<R: Read + Seek>(reader: &mut R, header_offset: u32) -> Result<Vec<FileEntry>> {
    let data_base = u64::from(header_offset) + u64::from(reader.read_le::<u32>()?);
    let mut next_offset = data_base;
    let mut entries = Vec::new();

    while reader.stream_position()? < data_base {
        match read_byte(reader)? {
            NS2_END_MARKER => break,
            NS2_QUOTE => {}
            other => {
                return Err(ArchiveError::InvalidDirectory(format!(
                    "unexpected byte 0x{other:02x} in NS2 directory"
                )));
            }
        }

        let mut name = Vec::new();
        loop {
            match read_byte(reader)? {
                NS2_QUOTE => break,
                byte => name.push(byte),
            }
        }
        let length = reader.read_le::<u32>()?;

        entries.push(FileEntry {
            name,
            offset: next_offset,
            length,
            compression_type: CompressionType::None,
            original_length: length,
        });
        next_offset += u64::from(length);
    }

    trace!("NS2 directory lists {} files, data at {}", entries.len(), data_base);
    Ok(entries)
}
