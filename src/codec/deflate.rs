//! Raw Deflate codec.
//!
//! ZIP stores Deflate without the zlib wrapper, so both directions use the
//! raw variants from `flate2`. [`measure_stream`] walks a stream without
//! knowing its compressed length in advance, which the scanner needs for
//! entries whose sizes live in a trailing data descriptor.

use std::io::{self, Read, Write};

use flate2::bufread::DeflateDecoder as FlateDecoder;
use flate2::write::DeflateEncoder as FlateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use super::{Decoder, Encoder, method};
use crate::READ_BUFFER_SIZE;
use crate::checksum::Crc32;
use crate::{Error, Result};

/// Deflate decoder.
pub struct DeflateDecoder<R> {
    inner: FlateDecoder<R>,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: io::BufRead> DeflateDecoder<R> {
    /// Creates a new Deflate decoder over a buffered source.
    pub fn new(input: R) -> Self {
        Self {
            inner: FlateDecoder::new(input),
        }
    }
}

impl<R: io::BufRead> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: io::BufRead> Decoder for DeflateDecoder<R> {
    fn method(&self) -> u16 {
        method::DEFLATE
    }
}

/// Deflate encoder options.
#[derive(Debug, Clone)]
pub struct DeflateEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for DeflateEncoderOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateEncoderOptions {
    /// Creates options with the given compression level, clamped to 9.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Deflate encoder.
pub struct DeflateEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for DeflateEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> DeflateEncoder<W> {
    /// Creates a new Deflate encoder.
    pub fn new(output: W, options: &DeflateEncoderOptions) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(options.level)),
        }
    }

    /// Finishes encoding and returns the inner writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for DeflateEncoder<W> {
    fn method(&self) -> u16 {
        method::DEFLATE
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.inner.finish()?;
        Ok(())
    }
}

/// Where a raw Deflate stream ended and what it decoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamExtent {
    /// Bytes of compressed input the stream occupies.
    pub compressed_size: u64,
    /// Bytes of output the stream decodes to.
    pub uncompressed_size: u64,
    /// CRC-32 of the decoded output.
    pub crc32: u32,
}

/// Inflates a raw Deflate stream to find where it ends.
///
/// The reader is consumed in blocks and may be left past the end of the
/// stream; callers seek back using [`StreamExtent::compressed_size`].
pub fn measure_stream<R: Read>(input: &mut R) -> Result<StreamExtent> {
    let mut inflater = Decompress::new(false);
    let mut crc = Crc32::new();
    let mut in_buf = vec![0u8; READ_BUFFER_SIZE];
    let mut out_buf = vec![0u8; READ_BUFFER_SIZE];
    // Bytes at the front of `in_buf` the inflater has not consumed yet.
    let mut filled = 0;

    loop {
        if filled == in_buf.len() {
            in_buf.resize(in_buf.len() * 2, 0);
        }
        let n = input.read(&mut in_buf[filled..])?;
        if n == 0 {
            return Err(Error::InvalidFormat(format!(
                "deflate stream truncated after {} bytes",
                inflater.total_in()
            )));
        }
        filled += n;

        let mut pos = 0;
        loop {
            let before_in = inflater.total_in();
            let before_out = inflater.total_out();
            let status = inflater
                .decompress(&in_buf[pos..filled], &mut out_buf, FlushDecompress::None)
                .map_err(|e| Error::InvalidFormat(format!("invalid deflate stream: {}", e)))?;
            let consumed = (inflater.total_in() - before_in) as usize;
            let produced = (inflater.total_out() - before_out) as usize;
            crc.update(&out_buf[..produced]);
            pos += consumed;

            if status == Status::StreamEnd {
                return Ok(StreamExtent {
                    compressed_size: inflater.total_in(),
                    uncompressed_size: inflater.total_out(),
                    crc32: crc.finalize(),
                });
            }
            if consumed == 0 && produced == 0 {
                break;
            }
            if pos >= filled && produced < out_buf.len() {
                break;
            }
        }

        in_buf.copy_within(pos..filled, 0);
        filled -= pos;
    }
}
