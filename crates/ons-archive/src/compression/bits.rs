//! MSB-first bit streams used by the SPB and LZSS codecs

/// Reads bit fields most-significant bit first.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    current: u8,
    mask: u8,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            current: 0,
            mask: 0,
        }
    }

    /// Read `count` bits (at most 32) as an unsigned value.
    ///
    /// Returns `None` once the input runs out.
    pub fn read(&mut self, count: u8) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            if self.mask == 0 {
                self.current = *self.data.get(self.pos)?;
                self.pos += 1;
                self.mask = 0x80;
            }
            value <<= 1;
            if self.current & self.mask != 0 {
                value |= 1;
            }
            self.mask >>= 1;
        }
        Some(value)
    }
}

/// Packs bit fields most-significant bit first.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, high bit first.
    pub fn write(&mut self, value: u32, count: u8) -> &mut Self {
        for shift in (0..count).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            if (value >> shift) & 1 != 0
                && let Some(last) = self.bytes.last_mut()
            {
                *last |= 0x80 >> self.used;
            }
            self.used = (self.used + 1) % 8;
        }
        self
    }

    /// Finished bytes, zero-padded to a byte boundary
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
