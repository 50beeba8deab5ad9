//! Low-level binary reading utilities for ZIP record parsing.

use std::io::{self, Read};

/// Reads an unsigned 16-bit little-endian integer.
pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads an unsigned 32-bit little-endian integer.
pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads exact number of bytes into a new vector.
pub fn read_bytes<R: Read>(r: &mut R, count: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Fills as much of `buf` as the reader can provide.
///
/// Unlike `read_exact`, hitting end of input is not an error; the number of
/// bytes actually read is returned so the caller can tell a clean EOF (0)
/// from a truncated record.
pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Sequential little-endian field reader over a fixed-size record buffer.
///
/// Record prefixes are read into a stack array first, then split into
/// fields with this cursor, so a short read surfaces as one error.
#[derive(Debug)]
pub struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    /// Creates a field reader starting at `pos`.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Reads the next `u16`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is exhausted; callers size their buffers to the
    /// fixed record layout.
    pub fn u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        v
    }

    /// Reads the next `u32`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is exhausted.
    pub fn u32(&mut self) -> u32 {
        let b = &self.buf[self.pos..self.pos + 4];
        self.pos += 4;
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_le_integers() {
        let mut cursor = Cursor::new([0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(read_u16_le(&mut cursor).unwrap(), 0x1234);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0x1234_5678);
        assert!(read_u16_le(&mut cursor).is_err());
    }

    #[test]
    fn test_read_full_reports_short_read() {
        let mut cursor = Cursor::new([1u8, 2, 3]);
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut cursor, &mut buf).unwrap(), 3);
        assert_eq!(read_full(&mut cursor, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_fields() {
        let buf = [0xAA, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut fields = Fields::new(&buf, 1);
        assert_eq!(fields.u16(), 1);
        assert_eq!(fields.u32(), 2);
    }
}
