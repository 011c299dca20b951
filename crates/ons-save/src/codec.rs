//! Save file codec
//!
//! A save file is laid out as
//!
//! | Field   | Size | Notes                                      |
//! |---------|------|--------------------------------------------|
//! | magic   | 3    | `ONS`; absent in files from before 2.0     |
//! | major   | 1    |                                            |
//! | minor   | 1    |                                            |
//! | payload | n    | written by [`SaveState::save`]             |
//! | label   | n    | `"` label `"*`, the slot's display string  |
//!
//! The copy under the quick-copy directory is the same file without the
//! five header bytes.

use crate::config::SaveConfig;
use crate::error::{Result, SaveError};
use crate::slot::{DigitFormatter, FullWidthDigits, SaveFileInfo};
use crate::state::SaveState;
use crate::stream::{SaveReader, SaveWriter};
use crate::version::{SaveVersion, VersionHeader};
use crate::{LABEL_QUOTE, LABEL_TERMINATOR, SAVE_HEADER_SIZE, SAVE_MAGIC};
use binrw::BinRead;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// How a loaded file was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Version the payload was read as
    pub version: SaveVersion,
    /// Whether the file had no header and was read as the current version
    pub legacy: bool,
}

/// Decode a complete save file into `state`.
///
/// Files without the magic are read from offset 0 as the current version.
/// Versioned files newer than the current version fail with
/// [`SaveError::TooNew`], those older than 2.0 with [`SaveError::TooOld`].
pub fn load_from_bytes<S: SaveState + ?Sized>(data: &[u8], state: &mut S) -> Result<LoadReport> {
    let mut reader = SaveReader::new(data);

    if !data.starts_with(SAVE_MAGIC) {
        info!("Save file version is unknown, reading as {}", SaveVersion::CURRENT);
        reader.rewind();
        state.load(&mut reader, SaveVersion::CURRENT)?;
        return Ok(LoadReport {
            version: SaveVersion::CURRENT,
            legacy: true,
        });
    }

    let header = VersionHeader::read(&mut Cursor::new(data)).map_err(|_| SaveError::Truncated {
        offset: SAVE_MAGIC.len(),
        needed: SAVE_HEADER_SIZE.saturating_sub(data.len()),
    })?;
    let version = SaveVersion::from(header);
    info!("Save file version is {}", version);

    if version > SaveVersion::CURRENT {
        return Err(SaveError::TooNew {
            found: version,
            supported: SaveVersion::CURRENT,
        });
    }
    if version.encoded() < SaveVersion::MIN_VERSIONED {
        return Err(SaveError::TooOld(version));
    }

    reader.seek(SAVE_HEADER_SIZE);
    state.load(&mut reader, version)?;
    Ok(LoadReport {
        version,
        legacy: false,
    })
}

/// Serialize `state` behind the current header.
///
/// The state is written once to measure it and once into a buffer of the
/// measured size.
pub fn store_to_bytes<S: SaveState + ?Sized>(state: &S) -> Result<Vec<u8>> {
    let mut measure = SaveWriter::measure();
    write_header(&mut measure);
    state.save(&mut measure);
    let size = measure.position();

    let mut emit = SaveWriter::emit(size);
    write_header(&mut emit);
    state.save(&mut emit);
    emit.finish()
}

fn write_header(writer: &mut SaveWriter) {
    writer.write_bytes(SAVE_MAGIC);
    writer.write_u8(SaveVersion::CURRENT.major);
    writer.write_u8(SaveVersion::CURRENT.minor);
}

/// Display label stored at the end of a save file.
///
/// The file must end in `"*`; the label runs from the quote before that
/// back to the preceding one.
pub fn extract_label(data: &[u8]) -> Option<&[u8]> {
    let [rest @ .., LABEL_QUOTE, LABEL_TERMINATOR] = data else {
        return None;
    };
    if data.len() < 4 {
        return None;
    }
    let start = rest.iter().rposition(|&b| b == LABEL_QUOTE)?;
    Some(&rest[start + 1..])
}

fn write_with_label(path: &Path, data: &[u8], label: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.write_all(&[LABEL_QUOTE])?;
    file.write_all(label)?;
    file.write_all(&[LABEL_QUOTE, LABEL_TERMINATOR])?;
    file.flush()
}

/// Header and label of a save file, read without an interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveHeader {
    /// Recorded version; `None` for files without the magic
    pub version: Option<SaveVersion>,
    /// Offset of the payload
    pub payload_offset: usize,
    /// Display label, if the file ends with one
    pub label: Option<Vec<u8>>,
}

impl SaveHeader {
    /// Inspect a complete save file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (version, payload_offset) = if data.starts_with(SAVE_MAGIC) {
            let header = VersionHeader::read(&mut Cursor::new(data))?;
            (Some(SaveVersion::from(header)), SAVE_HEADER_SIZE)
        } else {
            (None, 0)
        };
        Ok(Self {
            version,
            payload_offset,
            label: extract_label(data).map(<[u8]>::to_vec),
        })
    }

    /// Whether the codec would accept this file
    pub fn is_loadable(&self) -> bool {
        self.version.is_none_or(SaveVersion::is_supported)
    }
}

/// Save slots of one game.
///
/// Holds the stream buffer reused by every load and write, and the
/// snapshot produced by the last [`store`](Self::store).
#[derive(Debug)]
pub struct SaveFiles<F = FullWidthDigits> {
    config: SaveConfig,
    digits: F,
    io_buf: Vec<u8>,
    snapshot: Vec<u8>,
}

impl SaveFiles<FullWidthDigits> {
    /// Save slots rendered with full-width digits
    pub fn new(config: SaveConfig) -> Self {
        Self::with_formatter(config, FullWidthDigits)
    }
}

impl<F: DigitFormatter> SaveFiles<F> {
    /// Save slots rendered with `digits`
    pub fn with_formatter(config: SaveConfig, digits: F) -> Self {
        Self {
            config,
            digits,
            io_buf: Vec::new(),
            snapshot: Vec::new(),
        }
    }

    /// Slot configuration
    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Describe slot `no` for the save menu.
    pub fn search(&self, no: u32) -> SaveFileInfo {
        SaveFileInfo::search(
            &self.config.save_path(no),
            no,
            self.config.slot_count,
            &self.digits,
        )
    }

    /// Describe slots `1..=slot_count`
    pub fn search_all(&self) -> Vec<SaveFileInfo> {
        (1..=self.config.slot_count).map(|no| self.search(no)).collect()
    }

    fn read_slot(&mut self, no: u32) -> Result<()> {
        let path = self.config.save_path(no);
        self.io_buf.clear();
        let read = File::open(&path).and_then(|mut file| file.read_to_end(&mut self.io_buf));
        match read {
            Ok(0) => Err(SaveError::Unreadable {
                path,
                source: io::Error::new(ErrorKind::UnexpectedEof, "save file is empty"),
            }),
            Ok(_) => Ok(()),
            Err(source) => Err(SaveError::Unreadable { path, source }),
        }
    }

    /// Load slot `no` into `state`.
    pub fn load<S: SaveState + ?Sized>(&mut self, no: u32, state: &mut S) -> Result<LoadReport> {
        self.read_slot(no)?;
        debug!("Loading save slot {} ({} bytes)", no, self.io_buf.len());
        load_from_bytes(&self.io_buf, state)
    }

    /// Serialize `state` into the current snapshot.
    ///
    /// Nothing is written to disk until [`write`](Self::write).
    pub fn store<S: SaveState + ?Sized>(&mut self, state: &S) -> Result<()> {
        self.snapshot = store_to_bytes(state)?;
        debug!("Stored save snapshot of {} bytes", self.snapshot.len());
        Ok(())
    }

    /// Last stored snapshot, header included
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    /// Write the current snapshot to slot `no` followed by `label`.
    ///
    /// The header-less copy under the quick-copy directory is best effort:
    /// a failure there is logged and does not affect the result.
    pub fn write(&mut self, no: u32, label: impl AsRef<[u8]>) -> Result<()> {
        if self.snapshot.is_empty() {
            return Err(SaveError::NoSnapshot);
        }
        let label = label.as_ref();

        self.io_buf.clear();
        self.io_buf.extend_from_slice(&self.snapshot);

        let path = self.config.save_path(no);
        write_with_label(&path, &self.io_buf, label)
            .map_err(|source| SaveError::Write { path, source })?;

        let copy = self.config.quick_copy_path(no);
        let payload = self.io_buf.get(SAVE_HEADER_SIZE..).unwrap_or_default();
        if let Err(e) = write_with_label(&copy, payload, label) {
            warn!(
                "Cannot write save copy {} (not an error): {}",
                copy.display(),
                e
            );
        }
        Ok(())
    }

    /// Display label of slot `no`, if its file ends with one.
    pub fn read_label(&mut self, no: u32) -> Result<Option<Vec<u8>>> {
        self.read_slot(no)?;
        Ok(extract_label(&self.io_buf).map(<[u8]>::to_vec))
    }

    /// Header and label of slot `no`
    pub fn header(&mut self, no: u32) -> Result<SaveHeader> {
        self.read_slot(no)?;
        SaveHeader::parse(&self.io_buf)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::RawPayload;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Recorder {
        version: Option<SaveVersion>,
        first_byte: Option<u8>,
    }

    impl SaveState for Recorder {
        fn save(&self, _writer: &mut SaveWriter) {}

        fn load(&mut self, reader: &mut SaveReader<'_>, version: SaveVersion) -> Result<()> {
            self.version = Some(version);
            self.first_byte = reader.read_u8().ok();
            Ok(())
        }
    }

    #[test]
    fn test_missing_magic_is_read_as_current_version() {
        let mut state = Recorder::default();
        let report = load_from_bytes(b"legacy payload", &mut state).expect("load");

        assert_eq!(
            report,
            LoadReport {
                version: SaveVersion::CURRENT,
                legacy: true
            }
        );
        assert_eq!(state.version, Some(SaveVersion::new(2, 8)));
        // rewound to the first byte
        assert_eq!(state.first_byte, Some(b'l'));
    }

    #[test]
    fn test_version_dispatch() {
        let mut state = Recorder::default();
        let report = load_from_bytes(b"ONS\x02\x05X", &mut state).expect("load");
        assert_eq!(report.version, SaveVersion::new(2, 5));
        assert!(!report.legacy);
        assert_eq!(state.first_byte, Some(b'X'));

        let too_new = load_from_bytes(b"ONS\x03\x00", &mut Recorder::default());
        assert!(matches!(too_new, Err(SaveError::TooNew { .. })));

        let too_old = load_from_bytes(b"ONS\x01\x32", &mut Recorder::default());
        assert!(matches!(too_old, Err(SaveError::TooOld(v)) if v.encoded() == 150));
    }

    #[test]
    fn test_magic_without_version_is_truncated() {
        let result = load_from_bytes(b"ONS\x02", &mut Recorder::default());
        assert!(matches!(result, Err(SaveError::Truncated { needed: 1, .. })));
    }

    #[test]
    fn test_store_prepends_header() {
        let bytes = store_to_bytes(&RawPayload(vec![1, 2, 3])).expect("store");
        assert_eq!(bytes, vec![b'O', b'N', b'S', 2, 8, 1, 2, 3]);
    }

    #[test]
    fn test_extract_label() {
        assert_eq!(extract_label(b"payload\"Chapter 2\"*"), Some(&b"Chapter 2"[..]));
        assert_eq!(extract_label(b"x\"\"*"), Some(&b""[..]));
        assert_eq!(extract_label(b"no label"), None);
        assert_eq!(extract_label(b"unopened\"*"), None);
        assert_eq!(extract_label(b"\"*"), None);
    }

    #[test]
    fn test_header_parse() {
        let header = SaveHeader::parse(b"ONS\x02\x08data\"Slot\"*").expect("parse");
        assert_eq!(header.version, Some(SaveVersion::new(2, 8)));
        assert_eq!(header.payload_offset, 5);
        assert_eq!(header.label, Some(b"Slot".to_vec()));
        assert!(header.is_loadable());

        let legacy = SaveHeader::parse(b"old data").expect("parse");
        assert_eq!(legacy.version, None);
        assert_eq!(legacy.payload_offset, 0);
        assert!(legacy.is_loadable());

        let future = SaveHeader::parse(b"ONS\x03\x00").expect("parse");
        assert!(!future.is_loadable());
    }

    #[test]
    fn test_header_and_report_serialize() {
        let header = SaveHeader::parse(b"ONS\x02\x08data\"Slot\"*").expect("parse");
        let value = serde_json::to_value(&header).expect("header json");
        assert_eq!(value["version"], serde_json::json!({ "major": 2, "minor": 8 }));
        assert_eq!(value["payload_offset"], 5);
        assert_eq!(value["label"], serde_json::json!(b"Slot".to_vec()));

        let legacy = SaveHeader::parse(b"old data").expect("parse");
        assert!(serde_json::to_value(&legacy).expect("json")["version"].is_null());

        let report = LoadReport {
            version: SaveVersion::CURRENT,
            legacy: true,
        };
        let value = serde_json::to_value(report).expect("report json");
        assert_eq!(value["legacy"], true);
        assert_eq!(value["version"]["minor"], 8);
    }

    #[test]
    fn test_write_without_store_fails() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let mut saves = SaveFiles::new(SaveConfig::new(dir.path()));
        assert!(matches!(saves.write(1, "x"), Err(SaveError::NoSnapshot)));
    }
}
