//! Byte cursors for the save stream
//!
//! [`SaveWriter`] runs twice per store: once in [`WriteMode::Measure`],
//! where only the cursor moves, and once in [`WriteMode::Emit`] against a
//! buffer allocated at the measured size. Values go out one byte at a time;
//! 32-bit integers are little-endian and strings are NUL-terminated.

use crate::error::{Result, SaveError};

/// Whether a writer stores bytes or only counts them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Advance the cursor without storing anything
    Measure,
    /// Store bytes into the preallocated buffer
    Emit,
}

/// Write cursor over the save stream.
#[derive(Debug)]
pub struct SaveWriter {
    mode: WriteMode,
    position: usize,
    expected: usize,
    buf: Vec<u8>,
}

impl SaveWriter {
    /// Writer that only counts bytes
    pub fn measure() -> Self {
        Self {
            mode: WriteMode::Measure,
            position: 0,
            expected: 0,
            buf: Vec::new(),
        }
    }

    /// Writer that stores exactly `size` bytes
    pub fn emit(size: usize) -> Self {
        Self {
            mode: WriteMode::Emit,
            position: 0,
            expected: size,
            buf: Vec::with_capacity(size),
        }
    }

    /// Current mode
    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Bytes written or counted so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Write one byte
    pub fn write_u8(&mut self, value: u8) {
        if self.mode == WriteMode::Emit {
            self.buf.push(value);
        }
        self.position += 1;
    }

    /// Write a 32-bit integer, low byte first
    pub fn write_i32(&mut self, value: i32) {
        for byte in value.to_le_bytes() {
            self.write_u8(byte);
        }
    }

    /// Write a boolean as one byte
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.mode == WriteMode::Emit {
            self.buf.extend_from_slice(bytes);
        }
        self.position += bytes.len();
    }

    /// Write a string followed by a NUL byte
    pub fn write_str(&mut self, value: &[u8]) {
        self.write_bytes(value);
        self.write_u8(0);
    }

    /// Emitted bytes.
    ///
    /// Fails when the emit pass wrote a different amount than was measured.
    /// A measuring writer yields an empty buffer.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.mode == WriteMode::Emit && self.position != self.expected {
            return Err(SaveError::LengthMismatch {
                measured: self.expected,
                emitted: self.position,
            });
        }
        Ok(self.buf)
    }
}

/// Read cursor over a loaded save stream.
#[derive(Debug, Clone)]
pub struct SaveReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SaveReader<'a> {
    /// Reader positioned at the first byte of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor back to the start
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Move the cursor to `position`, clamped to the end
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.position;
        if available < count {
            return Err(SaveError::Truncated {
                offset: self.position,
                needed: count - available,
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian 32-bit integer
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a boolean byte; any non-zero value is true
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read `count` raw bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Read a NUL-terminated string, without the terminator
    pub fn read_str(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining();
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(SaveError::Truncated {
                offset: self.position,
                needed: 1,
            });
        };
        self.position += end + 1;
        Ok(&rest[..end])
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_sample(writer: &mut SaveWriter) {
        writer.write_u8(7);
        writer.write_i32(-2);
        writer.write_str(b"name");
        writer.write_bool(true);
    }

    #[test]
    fn test_measure_then_emit() {
        let mut measure = SaveWriter::measure();
        write_sample(&mut measure);
        assert_eq!(measure.position(), 1 + 4 + 5 + 1);
        assert!(measure.finish().expect("measure").is_empty());

        let mut emit = SaveWriter::emit(11);
        write_sample(&mut emit);
        let bytes = emit.finish().expect("emit");
        assert_eq!(
            bytes,
            vec![7, 0xFE, 0xFF, 0xFF, 0xFF, b'n', b'a', b'm', b'e', 0, 1]
        );
    }

    #[test]
    fn test_emit_length_mismatch() {
        let mut emit = SaveWriter::emit(3);
        emit.write_i32(1);
        assert!(matches!(
            emit.finish(),
            Err(SaveError::LengthMismatch {
                measured: 3,
                emitted: 4
            })
        ));
    }

    #[test]
    fn test_reader() {
        let data = [7, 0xFE, 0xFF, 0xFF, 0xFF, b'h', b'i', 0, 2];
        let mut reader = SaveReader::new(&data);
        assert_eq!(reader.read_u8().expect("u8"), 7);
        assert_eq!(reader.read_i32().expect("i32"), -2);
        assert_eq!(reader.read_str().expect("str"), b"hi");
        assert!(reader.read_bool().expect("bool"));
        assert!(reader.remaining().is_empty());

        reader.rewind();
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_reader_truncation() {
        let mut reader = SaveReader::new(&[1, 2]);
        assert!(matches!(
            reader.read_i32(),
            Err(SaveError::Truncated {
                offset: 0,
                needed: 2
            })
        ));
        let mut reader = SaveReader::new(b"no terminator");
        assert!(reader.read_str().is_err());
    }
}
