//! Compression codec infrastructure for ZIP entries.
//!
//! Each entry names its codec with a 16-bit method code. This module maps
//! those codes to decoder and encoder implementations and provides the two
//! decompression entry points used by extraction:
//!
//! - [`decompress_buffered`] reads exactly `compressed_size` bytes and returns
//!   the decoded payload as a `Vec<u8>`.
//! - [`decompress_streamed`] pulls decoded bytes in 1024-byte blocks into a
//!   sink and reports whether the expected uncompressed size was reached.
//!
//! | Method | Code | Read | Write | Feature |
//! |--------|------|------|-------|---------|
//! | Store | 0 | yes | yes | always |
//! | Deflate | 8 | yes | yes | always |
//! | BZip2 | 12 | yes | no | `bzip2` |
//! | LZMA | 14 | yes | no | `lzma` |

pub mod copy;
pub mod deflate;

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "lzma")]
pub mod lzma;

use std::io::{self, BufReader, Cursor, Read, Write};

use crate::{Error, Result};

pub use copy::{CopyDecoder, CopyEncoder};
pub use deflate::{DeflateDecoder, DeflateEncoder, DeflateEncoderOptions};

#[cfg(feature = "bzip2")]
pub use self::bzip2::Bzip2Decoder;

#[cfg(feature = "lzma")]
pub use lzma::LzmaDecoder;

/// Block size used by [`decompress_streamed`].
pub const STREAM_BLOCK_SIZE: usize = 1024;

/// Largest up-front allocation made from an untrusted size field.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Method codes for compression algorithms.
pub mod method {
    /// No compression.
    pub const STORE: u16 = 0;
    /// Raw Deflate (RFC 1951).
    pub const DEFLATE: u16 = 8;
    /// BZip2.
    pub const BZIP2: u16 = 12;
    /// LZMA with the ZIP property header.
    pub const LZMA: u16 = 14;
}

/// The compression methods this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// Bytes are stored as-is.
    Store,
    /// Raw Deflate.
    #[default]
    Deflate,
    /// BZip2 (decode only).
    Bzip2,
    /// LZMA (decode only).
    Lzma,
}

impl CompressionMethod {
    /// Returns the on-disk method code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Store => method::STORE,
            Self::Deflate => method::DEFLATE,
            Self::Bzip2 => method::BZIP2,
            Self::Lzma => method::LZMA,
        }
    }

    /// Looks up a method by its on-disk code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            method::STORE => Some(Self::Store),
            method::DEFLATE => Some(Self::Deflate),
            method::BZIP2 => Some(Self::Bzip2),
            method::LZMA => Some(Self::Lzma),
            _ => None,
        }
    }

    /// Returns a short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Deflate => "Deflate",
            Self::Bzip2 => "BZip2",
            Self::Lzma => "LZMA",
        }
    }

    /// Returns `true` if this build can decode the method.
    pub const fn is_available(self) -> bool {
        match self {
            Self::Store | Self::Deflate => true,
            Self::Bzip2 => cfg!(feature = "bzip2"),
            Self::Lzma => cfg!(feature = "lzma"),
        }
    }
}

impl TryFrom<u16> for CompressionMethod {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        Self::from_code(code).ok_or(Error::UnsupportedMethod { method: code })
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` if entries with this method code can be extracted.
pub fn is_available(code: u16) -> bool {
    CompressionMethod::from_code(code).is_some_and(CompressionMethod::is_available)
}

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {
    /// Returns the method code for this decoder.
    fn method(&self) -> u16;
}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write {
    /// Returns the method code for this encoder.
    fn method(&self) -> u16;

    /// Finishes encoding and flushes any remaining data.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Builds a decoder for the given method code.
///
/// `input` must yield exactly the compressed body of one entry.
pub fn build_decoder<'a, R: Read + 'a>(
    input: R,
    code: u16,
    uncompressed_size: u64,
) -> Result<Box<dyn Decoder + 'a>> {
    let method = CompressionMethod::try_from(code)?;

    match method {
        CompressionMethod::Store => Ok(Box::new(CopyDecoder::new(input, uncompressed_size))),

        CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(BufReader::new(input)))),

        #[cfg(feature = "bzip2")]
        CompressionMethod::Bzip2 => Ok(Box::new(Bzip2Decoder::new(input))),

        #[cfg(not(feature = "bzip2"))]
        CompressionMethod::Bzip2 => Err(Error::UnsupportedFeature {
            feature: "BZip2 decompression (enable the `bzip2` feature)",
        }),

        #[cfg(feature = "lzma")]
        CompressionMethod::Lzma => Ok(Box::new(LzmaDecoder::from_zip_stream(
            input,
            uncompressed_size,
        )?)),

        #[cfg(not(feature = "lzma"))]
        CompressionMethod::Lzma => Err(Error::UnsupportedFeature {
            feature: "LZMA decompression (enable the `lzma` feature)",
        }),
    }
}

/// Builds an encoder writing compressed bytes into `output`.
///
/// Only Store and Deflate can be written.
pub fn build_encoder<'a>(
    output: &'a mut dyn Write,
    method: CompressionMethod,
    level: u32,
) -> Result<Box<dyn Encoder + 'a>> {
    match method {
        CompressionMethod::Store => Ok(Box::new(CopyEncoder::new(output))),
        CompressionMethod::Deflate => Ok(Box::new(DeflateEncoder::new(
            output,
            &DeflateEncoderOptions::with_level(level),
        ))),
        CompressionMethod::Bzip2 => Err(Error::UnsupportedFeature {
            feature: "BZip2 compression",
        }),
        CompressionMethod::Lzma => Err(Error::UnsupportedFeature {
            feature: "LZMA compression",
        }),
    }
}

/// Reads exactly `compressed_size` bytes from `input` and decodes them.
///
/// Fails with [`Error::InvalidFormat`] if the body is shorter than declared
/// or decodes to more than `uncompressed_size` bytes. Decoding stops at the
/// first byte past the declared size.
pub fn decompress_buffered<R: Read>(
    input: &mut R,
    code: u16,
    compressed_size: u64,
    uncompressed_size: u64,
) -> Result<Vec<u8>> {
    // Reject the method before touching the stream.
    CompressionMethod::try_from(code)?;

    let mut body = Vec::with_capacity(compressed_size.min(MAX_PREALLOCATION) as usize);
    input.take(compressed_size).read_to_end(&mut body)?;
    if (body.len() as u64) < compressed_size {
        return Err(Error::InvalidFormat(format!(
            "entry body truncated: expected {} bytes, found {}",
            compressed_size,
            body.len()
        )));
    }

    let mut decoder = build_decoder(Cursor::new(body), code, uncompressed_size)?;
    let mut output = Vec::with_capacity(uncompressed_size.min(MAX_PREALLOCATION) as usize);
    decoder
        .take(uncompressed_size.saturating_add(1))
        .read_to_end(&mut output)?;
    if output.len() as u64 > uncompressed_size {
        return Err(Error::InvalidFormat(format!(
            "entry decodes past its declared size of {} bytes",
            uncompressed_size
        )));
    }
    Ok(output)
}

/// Decodes `input` into `sink` in [`STREAM_BLOCK_SIZE`] blocks.
///
/// Stops once `uncompressed_size` bytes were produced or the decoder hits
/// end of input. Returns `true` if the full count was produced and `false`
/// if the stream was truncated.
pub fn decompress_streamed<R: Read, W: Write + ?Sized>(
    input: R,
    code: u16,
    uncompressed_size: u64,
    sink: &mut W,
) -> Result<bool> {
    let mut decoder = build_decoder(input, code, uncompressed_size)?;
    let mut block = [0u8; STREAM_BLOCK_SIZE];
    let mut produced = 0u64;

    while produced < uncompressed_size {
        let n = decoder.read(&mut block)?;
        if n == 0 {
            break;
        }
        let take = (n as u64).min(uncompressed_size - produced) as usize;
        sink.write_all(&block[..take])?;
        produced += take as u64;
    }

    if produced < uncompressed_size {
        log::debug!(
            "decoder stopped after {} of {} bytes",
            produced,
            uncompressed_size
        );
    }

    Ok(produced == uncompressed_size)
}
