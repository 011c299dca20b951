//! Interpreter state as seen by the save codec

use crate::error::Result;
use crate::stream::{SaveReader, SaveWriter};
use crate::version::SaveVersion;

/// State that can be written to and restored from a save stream.
///
/// `save` runs twice per store, first against a measuring writer and then
/// against an emitting one; both runs must write the same bytes. `load`
/// receives the version found in the file, or the current version for
/// files written before the format carried one.
pub trait SaveState {
    /// Write the state to `writer`
    fn save(&self, writer: &mut SaveWriter);

    /// Restore the state from `reader`, positioned after the header
    fn load(&mut self, reader: &mut SaveReader<'_>, version: SaveVersion) -> Result<()>;
}

/// Raw payload bytes, copied through unchanged.
///
/// Loading keeps everything after the header, the trailing label included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPayload(pub Vec<u8>);

impl SaveState for RawPayload {
    fn save(&self, writer: &mut SaveWriter) {
        writer.write_bytes(&self.0);
    }

    fn load(&mut self, reader: &mut SaveReader<'_>, _version: SaveVersion) -> Result<()> {
        self.0 = reader.remaining().to_vec();
        reader.seek(usize::MAX);
        Ok(())
    }
}
