//! LZMA decoding (method 14).
//!
//! ZIP wraps the raw LZMA stream in a small header: a 2-byte encoder
//! version, a 2-byte little-endian properties length (normally 5), and the
//! properties themselves (1 byte `lc/lp/pb`, 4 bytes dictionary size).

use crate::{Error, Result};
use std::io::{self, Read};

use super::{Decoder, method};

/// Length of the LZMA properties block.
const PROPERTIES_SIZE: usize = 5;

/// LZMA decoder.
pub struct LzmaDecoder<R> {
    inner: lzma_rust2::LzmaReader<R>,
}

impl<R> std::fmt::Debug for LzmaDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> LzmaDecoder<R> {
    /// Creates a decoder from raw properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the properties are shorter than 5 bytes or
    /// rejected by the decoder.
    pub fn new(input: R, properties: &[u8], uncompressed_size: u64) -> Result<Self> {
        let Some(props) = properties.get(..PROPERTIES_SIZE) else {
            return Err(Error::InvalidFormat(
                "LZMA properties too short (need 5 bytes)".into(),
            ));
        };

        let props_byte = props[0];
        let dict_size = u32::from_le_bytes([props[1], props[2], props[3], props[4]]);

        let reader = lzma_rust2::LzmaReader::new_with_props(
            input,
            uncompressed_size,
            props_byte,
            dict_size,
            None,
        )
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;

        Ok(Self { inner: reader })
    }

    /// Creates a decoder from an entry body that starts with the ZIP LZMA
    /// header.
    pub fn from_zip_stream(mut input: R, uncompressed_size: u64) -> Result<Self> {
        let mut header = [0u8; 4];
        read_header_part(&mut input, &mut header)?;
        let props_len = u16::from_le_bytes([header[2], header[3]]) as usize;
        if props_len < PROPERTIES_SIZE {
            return Err(Error::InvalidFormat(format!(
                "LZMA properties length {} is too short",
                props_len
            )));
        }

        let mut properties = vec![0u8; props_len];
        read_header_part(&mut input, &mut properties)?;
        Self::new(input, &properties, uncompressed_size)
    }
}

fn read_header_part<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<()> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::InvalidFormat("truncated LZMA header".into())
        } else {
            e.into()
        }
    })
}

impl<R: Read> Read for LzmaDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for LzmaDecoder<R> {
    fn method(&self) -> u16 {
        method::LZMA
    }
}
