//! Offset tracking for writers that cannot seek.

use std::io::{self, Write};

/// A writer adapter that tracks the absolute stream offset.
///
/// The streaming writer records each entry's header offset from this
/// instead of calling `stream_position`, so it works over pipes and
/// sockets.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W> CountingWriter<W> {
    /// Wraps `inner`, treating its current offset as `position`.
    pub fn starting_at(inner: W, position: u64) -> Self {
        Self { inner, position }
    }

    /// Returns the offset of the next byte to be written.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
