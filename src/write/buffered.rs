//! Deferred writer for editable archives.
//!
//! Bodies are compressed and checksummed when an entry is added, then held
//! in memory. Nothing touches the stream until [`BufferedWriter::commit`],
//! which runs once at close:
//!
//! 1. Entries already in the stream are compacted toward offset 0 in
//!    position order. Their bytes are moved verbatim and never re-encoded,
//!    so an entry written in an earlier session is not written twice.
//! 2. Pending entries are appended in table order, with final CRC and sizes
//!    in the local header and no data descriptor.
//! 3. The stream is truncated at the write position and the central
//!    directory and end record are written there.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::{CountingWriter, EntrySource, WriteOptions, local_header, narrow};
use crate::checksum::Crc32Reader;
use crate::codec;
use crate::read::{Entry, EntryTable};
use crate::storage::Storage;
use crate::{Error, READ_BUFFER_SIZE, Result};

/// Compressed bodies of entries that are not in the stream yet.
#[derive(Debug, Default)]
pub(crate) struct BufferedWriter {
    pending: HashMap<String, Vec<u8>>,
}

impl BufferedWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any entry is waiting to be written.
    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The stored (compressed) body of a pending entry.
    pub(crate) fn pending_body(&self, path: &str) -> Option<&[u8]> {
        self.pending.get(path).map(Vec::as_slice)
    }

    pub(crate) fn stage_directory(&mut self, entry: &mut Entry) {
        entry.method = codec::method::STORE;
        entry.crc32 = 0;
        entry.body_size = 0;
        entry.body_size_raw = 0;
        self.stage(entry, Vec::new());
    }

    pub(crate) fn stage_file(
        &mut self,
        entry: &mut Entry,
        source: EntrySource<'_>,
        options: &WriteOptions,
    ) -> Result<()> {
        let mut input = Crc32Reader::new(source.into_reader());
        let mut body = Vec::new();
        {
            let mut encoder = codec::build_encoder(&mut body, options.method, options.level)?;
            io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
        }

        entry.method = options.method.code();
        entry.crc32 = input.crc();
        entry.body_size_raw = narrow(input.bytes_read())?;
        entry.body_size = narrow(body.len() as u64)?;
        log::debug!(
            "staged '{}': {} -> {} bytes",
            entry.path,
            entry.body_size_raw,
            entry.body_size
        );
        self.stage(entry, body);
        Ok(())
    }

    fn stage(&mut self, entry: &mut Entry, body: Vec<u8>) {
        entry.position = 0;
        entry.header_size = local_header(entry).encoded_len() as u32;
        entry.descriptor_size = 0;
        entry.persisted = false;
        self.pending.insert(entry.path.clone(), body);
    }

    /// Drops the body of a pending entry that was removed or replaced.
    pub(crate) fn discard(&mut self, path: &str) {
        self.pending.remove(path);
    }

    /// Compacts, appends, truncates and writes the central directory.
    ///
    /// Returns the final stream length.
    pub(crate) fn commit<S: Storage + ?Sized>(
        &mut self,
        storage: &mut S,
        entries: &mut EntryTable,
        comment: &[u8],
    ) -> Result<u64> {
        let mut write_pos = self.compact(storage, entries)?;

        storage.seek(SeekFrom::Start(write_pos))?;
        {
            let mut out = CountingWriter::starting_at(&mut *storage, write_pos);
            for entry in entries.iter_mut().filter(|e| !e.persisted) {
                let body = self.pending.remove(&entry.path).unwrap_or_default();
                entry.position = out.position();
                local_header(entry).write_to(&mut out)?;
                out.write_all(&body)?;
                entry.persisted = true;
            }
            out.flush()?;
            write_pos = out.position();
        }
        self.pending.clear();

        storage.truncate(write_pos)?;
        storage.seek(SeekFrom::Start(write_pos))?;
        let directory_len = super::write_central_directory(storage, entries, write_pos, comment)?;
        storage.flush()?;
        Ok(write_pos + directory_len)
    }

    /// Slides persisted entries down over gaps left by removals and
    /// replacements. Returns the offset just past the last one.
    fn compact<S: Storage + ?Sized>(&self, storage: &mut S, entries: &mut EntryTable) -> Result<u64> {
        let mut order: Vec<(u64, String)> = entries
            .iter()
            .filter(|e| e.persisted)
            .map(|e| (e.position, e.path.clone()))
            .collect();
        order.sort_unstable();

        let mut write_pos = 0u64;
        for (position, path) in order {
            let Some(entry) = entries.get_mut(&path) else {
                continue;
            };
            if position < write_pos {
                return Err(Error::InvalidFormat(format!(
                    "entry '{}' at offset {} overlaps the previous entry",
                    path, position
                )));
            }
            if position > write_pos {
                log::debug!("moving '{}' from {} to {}", path, position, write_pos);
                move_bytes(storage, position, write_pos, entry.span())?;
                entry.position = write_pos;
            }
            write_pos += entry.span();
        }
        Ok(write_pos)
    }
}

/// Copies `len` bytes from `from` to a lower offset `to`, front to back.
fn move_bytes<S: Storage + ?Sized>(storage: &mut S, from: u64, to: u64, len: u64) -> Result<()> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut done = 0u64;
    while done < len {
        let n = (len - done).min(buf.len() as u64) as usize;
        storage.seek(SeekFrom::Start(from + done))?;
        storage.read_exact(&mut buf[..n])?;
        storage.seek(SeekFrom::Start(to + done))?;
        storage.write_all(&buf[..n])?;
        done += n as u64;
    }
    Ok(())
}
