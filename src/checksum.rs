//! CRC-32 bookkeeping.
//!
//! Every ZIP entry carries the CRC-32 (IEEE 802.3 polynomial) of its
//! uncompressed bytes in both the local header and the central directory.
//! The writer computes it while the payload streams into the encoder, and
//! extraction recomputes it to detect corruption.
//!
//! # Example
//!
//! ```rust
//! use pkarchive::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// Incremental CRC-32, backed by `crc32fast`.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Starts a new checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// The checksum of everything fed so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Checksums a single slice.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &format_args!("{:#010x}", self.finalize()))
            .finish()
    }
}

/// Checks `actual` against the CRC stored for `path`.
pub fn verify_crc32(path: &str, expected: u32, actual: u32) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::CrcMismatch {
            path: path.to_string(),
            expected,
            actual,
        })
    }
}

/// A writer adapter that accumulates CRC-32 and a byte count.
///
/// Extraction writes decoded bytes through this so the CRC can be checked
/// once the entry is complete, without holding the payload in memory.
pub struct Crc32Writer<W> {
    inner: W,
    crc: Crc32,
    bytes_written: u64,
}

impl<W> Crc32Writer<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_written: 0,
        }
    }

    /// Returns the CRC-32 of the bytes written so far.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl<W: Write> Write for Crc32Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader adapter that accumulates CRC-32 and a byte count.
///
/// The streaming writer pulls caller payloads through this on the way into
/// the encoder, so the descriptor written after the body carries real values.
pub struct Crc32Reader<R> {
    inner: R,
    crc: Crc32,
    bytes_read: u64,
}

impl<R> Crc32Reader<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_read: 0,
        }
    }

    /// Returns the CRC-32 of the bytes read so far.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}
