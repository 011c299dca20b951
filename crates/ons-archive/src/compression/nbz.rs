//! NBZ payloads: a big-endian `u32` decompressed size followed by a bzip2
//! stream.

use crate::error::{ArchiveError, Result};
use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use std::io::{Read, Write};
use tracing::warn;

/// Bytes of NBZ header carrying the decompressed size
pub const NBZ_HEADER_SIZE: usize = 4;

/// Most bytes reserved up front; larger payloads grow as they decode
const MAX_PREALLOCATION: usize = 16 << 20;

/// Decompressed size recorded in the NBZ header
pub fn declared_size(header: [u8; NBZ_HEADER_SIZE]) -> u32 {
    u32::from_be_bytes(header)
}

/// Decode an NBZ payload.
///
/// Output is capped at one byte past the declared size, so a stream that
/// expands further than its header says is cut off rather than buffered.
pub fn decode(raw: &[u8]) -> Result<Vec<u8>> {
    let Some((header, stream)) = raw.split_first_chunk::<NBZ_HEADER_SIZE>() else {
        return Err(ArchiveError::Decompression(
            "NBZ entry shorter than its size header".into(),
        ));
    };
    let expected = declared_size(*header) as usize;

    let mut out = Vec::with_capacity(expected.min(MAX_PREALLOCATION));
    BzDecoder::new(stream)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Decompression(format!("bzip2: {e}")))?;

    if out.len() != expected {
        warn!(
            "NBZ payload decoded to {} bytes, header declares {}",
            out.len(),
            expected
        );
        out.truncate(expected);
    }
    Ok(out)
}

/// Encode `data` as an NBZ payload.
pub fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let size = u32::try_from(data.len())
        .map_err(|_| ArchiveError::Build(format!("{} bytes is too large for NBZ", data.len())))?;

    let mut encoder = BzEncoder::new(size.to_be_bytes().to_vec(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
