//! Extraction through the facade.
//!
//! Entries that are already in the stream are read from the handle. Entries
//! added to a read-write archive but not yet committed are decoded from the
//! writer's in-memory body instead.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{Archive, Strategy};
use crate::read::extraction;
use crate::read::{Entry, ExtractOptions, ExtractResult};
use crate::storage::Storage;
use crate::write::BufferedWriter;
use crate::{Error, Result};

/// Either the backing stream or a pending entry's buffered body.
enum BodyReader<'a, S> {
    Stream(&'a mut S),
    Pending(Cursor<&'a [u8]>),
}

impl<S: Read> Read for BodyReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stream(s) => s.read(buf),
            Self::Pending(c) => c.read(buf),
        }
    }
}

impl<S: Seek> Seek for BodyReader<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Stream(s) => s.seek(pos),
            Self::Pending(c) => c.seek(pos),
        }
    }
}

/// Picks where an entry's body is read from. Pending entries are rebased so
/// their body starts at offset 0 of the buffer.
fn body_reader<'a, 'e, S>(
    handle: &'a mut S,
    pending: Option<&'a BufferedWriter>,
    entry: &'e Entry,
) -> (BodyReader<'a, S>, Cow<'e, Entry>) {
    if entry.persisted {
        return (BodyReader::Stream(handle), Cow::Borrowed(entry));
    }
    let body = pending
        .and_then(|writer| writer.pending_body(&entry.path))
        .unwrap_or_default();
    let mut rebased = entry.clone();
    rebased.position = 0;
    rebased.header_size = 0;
    (BodyReader::Pending(Cursor::new(body)), Cow::Owned(rebased))
}

impl<S: Storage> Archive<S> {
    /// Decodes an entry into memory, verifying its CRC.
    ///
    /// Directory entries yield an empty vector.
    pub fn extract(&mut self, path: &str) -> Result<Vec<u8>> {
        self.ensure_readable("extract")?;
        let entry = self.lookup(path)?;
        let (mut reader, entry) = self.reader_for(&entry)?;
        extraction::read_entry(&mut reader, &entry)
    }

    /// Extracts an entry to a file path. Returns the bytes written.
    ///
    /// Directory entries create the directory. On any failure the partial
    /// file is removed, and unsupported entries are rejected before the
    /// file is created.
    pub fn extract_to(&mut self, path: &str, target: impl AsRef<Path>) -> Result<u64> {
        self.ensure_readable("extract_to")?;
        let target = target.as_ref();
        let entry = self.lookup(path)?;
        if entry.is_directory() {
            fs::create_dir_all(target)?;
            return Ok(0);
        }
        let (mut reader, entry) = self.reader_for(&entry)?;
        extraction::extract_to_path(&mut reader, &entry, target, true)
    }

    /// Streams an entry into `sink`, verifying its CRC. Returns the bytes
    /// written.
    pub fn extract_to_writer<W: Write + ?Sized>(&mut self, path: &str, sink: &mut W) -> Result<u64> {
        self.ensure_readable("extract_to_writer")?;
        let entry = self.lookup(path)?;
        let (mut reader, entry) = self.reader_for(&entry)?;
        extraction::copy_entry(&mut reader, &entry, sink, true)
    }

    /// Recreates the archive's tree under `dest`.
    ///
    /// Every entry path is checked before anything is written; an entry that
    /// would escape `dest` fails with [`Error::PathTraversal`]. Directories
    /// are created before files.
    pub fn extract_all(
        &mut self,
        dest: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        self.ensure_readable("extract_all")?;
        let pending = match &self.strategy {
            Strategy::Buffered(writer) => Some(writer),
            _ => None,
        };
        let handle = self.handle.as_mut().ok_or(Error::Closed)?;
        let verify = options.verify_crc;

        let result = extraction::extract_all(
            &self.entries,
            dest.as_ref(),
            options,
            |entry, target| {
                let (mut reader, entry) = body_reader(&mut *handle, pending, entry);
                extraction::extract_to_path(&mut reader, &entry, target, verify)
            },
        )?;
        log::debug!(
            "extracted {} files and {} directories ({} skipped)",
            result.files,
            result.directories,
            result.skipped
        );
        Ok(result)
    }

    fn lookup(&self, path: &str) -> Result<Entry> {
        self.find(path).cloned().ok_or_else(|| Error::EntryNotFound {
            path: path.to_string(),
        })
    }

    fn reader_for<'e>(&mut self, entry: &'e Entry) -> Result<(BodyReader<'_, S>, Cow<'e, Entry>)> {
        let pending = match &self.strategy {
            Strategy::Buffered(writer) => Some(writer),
            _ => None,
        };
        let handle = self.handle.as_mut().ok_or(Error::Closed)?;
        Ok(body_reader(handle, pending, entry))
    }
}
