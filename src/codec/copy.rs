//! Store codec (no compression).

use std::io::{self, Read, Write};

use super::{Decoder, Encoder, method};

/// A decoder that passes at most `size` bytes through unchanged.
pub struct CopyDecoder<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> CopyDecoder<R> {
    /// Creates a new copy decoder that yields at most `size` bytes.
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read> Read for CopyDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }

        let max_read = self.remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max_read])?;
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}

impl<R: Read> Decoder for CopyDecoder<R> {
    fn method(&self) -> u16 {
        method::STORE
    }
}

/// An encoder that writes bytes through unchanged.
pub struct CopyEncoder<W> {
    inner: W,
}

impl<W: Write> CopyEncoder<W> {
    /// Creates a new copy encoder.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for CopyEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for CopyEncoder<W> {
    fn method(&self) -> u16 {
        method::STORE
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.inner.flush()
    }
}
