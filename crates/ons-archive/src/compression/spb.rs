//! SPB image decoder
//!
//! An SPB payload is a big-endian `u16` width and height followed by a bit
//! stream holding the three colour planes one after another. Each plane is
//! delta coded in runs of four pixels and walks the image in serpentine row
//! order. The decoded output is a bottom-up 24-bit BMP.

use super::bits::BitReader;
use crate::error::{ArchiveError, Result};

/// Size of the BMP file and info headers written before the pixels
pub const BMP_HEADER_SIZE: usize = 54;

/// Bytes of SPB header carrying the image dimensions
pub const SPB_HEADER_SIZE: usize = 4;

/// Row stride of a 24-bit BMP, padded to four bytes.
fn stride(width: usize) -> usize {
    let pad = (4 - width * 3 % 4) % 4;
    width * 3 + pad
}

/// Size of the BMP an SPB image of these dimensions decodes to.
pub fn image_size(width: u16, height: u16) -> u64 {
    (stride(usize::from(width)) * usize::from(height) + BMP_HEADER_SIZE) as u64
}

/// Width and height from the first four payload bytes
pub fn dimensions(header: [u8; SPB_HEADER_SIZE]) -> (u16, u16) {
    (
        u16::from_be_bytes([header[0], header[1]]),
        u16::from_be_bytes([header[2], header[3]]),
    )
}

fn write_bmp_header(out: &mut [u8], width: usize, height: usize, total: usize) {
    out[0] = b'B';
    out[1] = b'M';
    out[2..6].copy_from_slice(&(total as u32).to_le_bytes());
    out[10] = BMP_HEADER_SIZE as u8;
    out[14] = 40;
    out[18..22].copy_from_slice(&(width as u32).to_le_bytes());
    out[22..26].copy_from_slice(&(height as u32).to_le_bytes());
    out[26] = 1;
    out[28] = 24;
    out[34..38].copy_from_slice(&((total - BMP_HEADER_SIZE) as u32).to_le_bytes());
}

/// Fewest stream bits that can describe `pixels` pixels.
///
/// Each plane opens with an 8-bit value and every further run of four
/// pixels costs at least its 3-bit code.
fn min_stream_bits(pixels: u64) -> u64 {
    3 * (8 + pixels.saturating_sub(1).div_ceil(4) * 3)
}

fn truncated() -> ArchiveError {
    ArchiveError::Decompression("SPB bit stream ended early".into())
}

/// Decode one colour plane into `plane`, in stream order.
fn decode_plane(bits: &mut BitReader<'_>, plane: &mut [u8], pixels: usize) -> Result<()> {
    let mut count = 0;
    let mut c = bits.read(8).ok_or_else(truncated)? as i32;
    plane[count] = c as u8;
    count += 1;

    while count < pixels {
        let n = bits.read(3).ok_or_else(truncated)?;
        if n == 0 {
            plane[count..count + 4].fill(c as u8);
            count += 4;
            continue;
        }
        let m = if n == 7 {
            bits.read(1).ok_or_else(truncated)? + 1
        } else {
            n + 2
        };

        for _ in 0..4 {
            if m == 8 {
                c = bits.read(8).ok_or_else(truncated)? as i32;
            } else {
                let k = bits.read(m as u8).ok_or_else(truncated)? as i32;
                if k & 1 == 0 {
                    c -= k >> 1;
                } else {
                    c += (k >> 1) + 1;
                }
            }
            plane[count] = c as u8;
            count += 1;
        }
    }
    Ok(())
}

/// Decode an SPB payload into a BMP image.
pub fn decode(raw: &[u8]) -> Result<Vec<u8>> {
    let Some((header, stream)) = raw.split_first_chunk::<SPB_HEADER_SIZE>() else {
        return Err(ArchiveError::Decompression(
            "SPB entry shorter than its header".into(),
        ));
    };
    let (width, height) = dimensions(*header);
    let pixels = u64::from(width) * u64::from(height);
    if pixels > 0 && (stream.len() as u64) * 8 < min_stream_bits(pixels) {
        return Err(ArchiveError::Decompression(format!(
            "SPB stream of {} bytes cannot hold a {width}x{height} image",
            stream.len()
        )));
    }

    let (width, height) = (usize::from(width), usize::from(height));
    let stride = stride(width);
    let total = stride * height + BMP_HEADER_SIZE;

    let mut out = vec![0u8; total];
    write_bmp_header(&mut out, width, height, total);

    let pixels = width * height;
    if pixels == 0 {
        return Ok(out);
    }

    // runs of four may overshoot the last pixel by up to three
    let mut plane = vec![0u8; pixels + 4];
    let mut bits = BitReader::new(stream);

    for channel in 0..3 {
        decode_plane(&mut bits, &mut plane, pixels)?;

        for (row, line) in plane[..pixels].chunks(width).enumerate() {
            let base = BMP_HEADER_SIZE + (height - 1 - row) * stride + channel;
            for (x, &value) in line.iter().enumerate() {
                let column = if row % 2 == 0 { x } else { width - 1 - x };
                out[base + column * 3] = value;
            }
        }
    }

    Ok(out)
}
