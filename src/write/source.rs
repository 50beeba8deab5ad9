//! Payload sources for new file entries.

use std::io::{Cursor, Read};

/// Where a new file entry's bytes come from.
///
/// Ownership of the payload moves into the archive when the entry is added.
/// Byte payloads can be converted from the usual string and byte types:
///
/// ```rust
/// use pkarchive::EntrySource;
///
/// let a: EntrySource = "hello".into();
/// let b: EntrySource = vec![1u8, 2, 3].into();
/// let c = EntrySource::reader(std::io::empty());
/// # let _ = (a, b, c);
/// ```
pub enum EntrySource<'a> {
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// A caller-supplied reader, drained when the entry is written.
    Reader(Box<dyn Read + 'a>),
}

impl<'a> EntrySource<'a> {
    /// Wraps a reader.
    pub fn reader(reader: impl Read + 'a) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Drains the source into memory.
    pub(crate) fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Bytes(data) => Ok(data),
            Self::Reader(mut reader) => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                Ok(data)
            }
        }
    }

    /// Turns the source into a reader.
    pub(crate) fn into_reader(self) -> Box<dyn Read + 'a> {
        match self {
            Self::Bytes(data) => Box::new(Cursor::new(data)),
            Self::Reader(reader) => reader,
        }
    }
}

impl std::fmt::Debug for EntrySource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Reader(_) => f.debug_tuple("Reader").finish_non_exhaustive(),
        }
    }
}

impl From<Vec<u8>> for EntrySource<'_> {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<&[u8]> for EntrySource<'_> {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for EntrySource<'_> {
    fn from(data: &[u8; N]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

impl From<&str> for EntrySource<'_> {
    fn from(data: &str) -> Self {
        Self::Bytes(data.as_bytes().to_vec())
    }
}

impl From<String> for EntrySource<'_> {
    fn from(data: String) -> Self {
        Self::Bytes(data.into_bytes())
    }
}
