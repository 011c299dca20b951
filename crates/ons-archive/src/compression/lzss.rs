//! LZSS decoder for NSA entries
//!
//! A set flag bit is followed by one literal byte. A clear flag bit is
//! followed by an 8-bit window position and a 4-bit count; `count + 2`
//! bytes are copied from the window. The window is 256 bytes, zeroed, with
//! the write position starting at 239.

use super::bits::BitReader;

const WINDOW_SIZE: usize = 256;
const WINDOW_START: usize = 239;

/// Sliding window shared by literals and back references
struct Window {
    bytes: [u8; WINDOW_SIZE],
    write_pos: usize,
}

impl Window {
    fn new() -> Self {
        Self {
            bytes: [0; WINDOW_SIZE],
            write_pos: WINDOW_START,
        }
    }

    fn at(&self, pos: usize) -> u8 {
        self.bytes[pos % WINDOW_SIZE]
    }

    fn push(&mut self, byte: u8, out: &mut Vec<u8>) {
        out.push(byte);
        self.bytes[self.write_pos] = byte;
        self.write_pos = (self.write_pos + 1) % WINDOW_SIZE;
    }
}

/// Most bytes `raw` can expand to: 13-bit references of 17 bytes each.
fn max_output(raw: &[u8]) -> usize {
    raw.len().saturating_mul(8) / 13 * 17 + 17
}

/// Decode up to `original_length` bytes.
///
/// Decoding stops early if the stream runs dry; the caller sees the
/// shorter output.
pub fn decode(raw: &[u8], original_length: u32) -> Vec<u8> {
    let limit = original_length as usize;
    let mut out = Vec::with_capacity(limit.min(max_output(raw)));
    let mut window = Window::new();
    let mut bits = BitReader::new(raw);

    while out.len() < limit {
        let Some(flag) = bits.read(1) else { break };
        if flag == 1 {
            let Some(literal) = bits.read(8) else { break };
            window.push(literal as u8, &mut out);
        } else {
            let Some(position) = bits.read(8) else { break };
            let Some(count) = bits.read(4) else { break };
            for k in 0..=(count as usize + 1) {
                let byte = window.at(position as usize + k);
                window.push(byte, &mut out);
            }
        }
    }

    out.truncate(limit);
    out
}
