//! Forward-only entry writer.
//!
//! Every entry is written with bit 3 set and a 12-byte data descriptor
//! after its body. Deflate bodies are compressed on the fly, so the local
//! header carries zeros for CRC and sizes. Stored bodies are buffered first
//! so the header can carry real values; a reader that cannot measure a
//! stored body from the stream alone still finds its end.

use std::io::{self, Write};

use super::{CountingWriter, EntrySource, WriteOptions, local_header, narrow};
use crate::checksum::{Crc32, Crc32Reader};
use crate::codec::{self, CompressionMethod};
use crate::format::{DATA_DESCRIPTOR_SIZE, DataDescriptor, flags};
use crate::read::{Entry, EntryTable};
use crate::{Error, Result};

/// Tracks the output offset across entries for a sink that cannot seek.
///
/// A write that fails after bytes reached the sink leaves a partial entry
/// that cannot be taken back. The writer then refuses further entries and
/// the central directory.
#[derive(Debug, Default)]
pub(crate) struct StreamingWriter {
    position: u64,
    broken: Option<String>,
}

impl StreamingWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Offset of the next byte to be written.
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Writes a directory entry: header plus an all-zero descriptor.
    pub(crate) fn write_directory<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        entry: &mut Entry,
    ) -> Result<()> {
        entry.flags |= flags::DATA_DESCRIPTOR;
        entry.method = codec::method::STORE;
        entry.crc32 = 0;
        entry.body_size = 0;
        entry.body_size_raw = 0;
        self.ensure_intact()?;

        let mut out = CountingWriter::starting_at(sink, self.position);
        entry.position = out.position();
        let header = local_header(entry);
        let result = header
            .write_to(&mut out)
            .and_then(|()| DataDescriptor::default().write_to(&mut out))
            .map(|()| header.encoded_len());
        let end = out.position();
        self.settle(entry, result, end)
    }

    /// Writes a file entry: header, body, descriptor.
    pub(crate) fn write_file<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        entry: &mut Entry,
        source: EntrySource<'_>,
        options: &WriteOptions,
    ) -> Result<()> {
        entry.flags |= flags::DATA_DESCRIPTOR;
        entry.method = options.method.code();
        self.ensure_intact()?;

        let mut out = CountingWriter::starting_at(sink, self.position);
        entry.position = out.position();
        let result = stream_file(&mut out, entry, source, options);
        let end = out.position();
        self.settle(entry, result, end)?;
        log::debug!(
            "streamed '{}': {} -> {} bytes",
            entry.path,
            entry.body_size_raw,
            entry.body_size
        );
        Ok(())
    }

    /// Writes the central directory and end record, then flushes.
    ///
    /// Returns the final stream length.
    pub(crate) fn finish<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        entries: &EntryTable,
        comment: &[u8],
    ) -> Result<u64> {
        self.ensure_intact()?;
        let mut out = CountingWriter::starting_at(sink, self.position);
        super::write_central_directory(&mut out, entries, self.position, comment)?;
        out.flush()?;
        self.position = out.position();
        Ok(self.position)
    }

    fn ensure_intact(&self) -> Result<()> {
        match &self.broken {
            Some(path) => Err(Error::Broken { path: path.clone() }),
            None => Ok(()),
        }
    }

    /// Records a finished entry, or marks the writer broken if a failed
    /// write left bytes in the sink.
    fn settle(&mut self, entry: &mut Entry, result: Result<u64>, end: u64) -> Result<()> {
        match result {
            Ok(header_len) => {
                entry.header_size = header_len as u32;
                entry.descriptor_size = DATA_DESCRIPTOR_SIZE as u32;
                entry.persisted = true;
                self.position = end;
                Ok(())
            }
            Err(e) => {
                if end > self.position {
                    log::warn!(
                        "'{}' failed after {} bytes were written: {}",
                        entry.path,
                        end - self.position,
                        e
                    );
                    self.position = end;
                    self.broken = Some(entry.path.clone());
                }
                Err(e)
            }
        }
    }
}

/// Writes header, body and descriptor. Returns the header length.
fn stream_file<W: Write>(
    out: &mut W,
    entry: &mut Entry,
    source: EntrySource<'_>,
    options: &WriteOptions,
) -> Result<u64> {
    let header_len = match options.method {
        CompressionMethod::Store => {
            let data = source.into_bytes()?;
            entry.crc32 = Crc32::compute(&data);
            entry.body_size = narrow(data.len() as u64)?;
            entry.body_size_raw = entry.body_size;

            let header = local_header(entry);
            header.write_to(&mut *out)?;
            out.write_all(&data)?;
            header.encoded_len()
        }
        method => {
            entry.crc32 = 0;
            entry.body_size = 0;
            entry.body_size_raw = 0;
            let header = local_header(entry);
            header.write_to(&mut *out)?;

            let mut body = CountingWriter::starting_at(&mut *out, 0);
            let mut input = Crc32Reader::new(source.into_reader());
            {
                let mut encoder = codec::build_encoder(&mut body, method, options.level)?;
                io::copy(&mut input, &mut encoder)?;
                encoder.finish()?;
            }
            entry.crc32 = input.crc();
            entry.body_size_raw = narrow(input.bytes_read())?;
            entry.body_size = narrow(body.position())?;
            header.encoded_len()
        }
    };

    DataDescriptor {
        crc32: entry.crc32,
        compressed_size: entry.body_size,
        uncompressed_size: entry.body_size_raw,
    }
    .write_to(&mut *out)?;
    Ok(header_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::{EntryKind, scan};
    use crate::timestamp::DosDateTime;
    use std::io::Cursor;

    fn pending(path: &str, kind: EntryKind) -> Entry {
        Entry::pending(path.into(), kind, DosDateTime::default(), String::new())
    }

    fn build(method: CompressionMethod) -> Vec<u8> {
        let mut sink = Vec::new();
        let mut writer = StreamingWriter::new();
        let mut table = EntryTable::new();
        let options = WriteOptions::new().method(method);

        let mut dir = pending("docs/", EntryKind::Directory);
        writer.write_directory(&mut sink, &mut dir).unwrap();
        table.insert(dir);

        let mut file = pending("docs/readme.txt", EntryKind::File);
        writer
            .write_file(&mut sink, &mut file, "hi there, hi there".into(), &options)
            .unwrap();
        table.insert(file);

        let end = writer.finish(&mut sink, &table, b"").unwrap();
        assert_eq!(end, sink.len() as u64);
        sink
    }

    #[test]
    fn test_deflate_header_has_zero_sizes() {
        let bytes = build(CompressionMethod::Deflate);
        let second = 30 + 5 + 12;
        // flags, crc, compressed size, uncompressed size
        assert_eq!(u16::from_le_bytes([bytes[second + 6], bytes[second + 7]]) & 8, 8);
        assert_eq!(&bytes[second + 14..second + 26], &[0u8; 12]);
    }

    #[test]
    fn test_store_header_has_real_sizes() {
        let bytes = build(CompressionMethod::Store);
        let second = 30 + 5 + 12;
        let compressed = u32::from_le_bytes(bytes[second + 18..second + 22].try_into().unwrap());
        assert_eq!(compressed, 18);
    }

    #[test]
    fn test_output_scans_back() {
        for method in [CompressionMethod::Store, CompressionMethod::Deflate] {
            let bytes = build(method);
            let result = scan(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(result.entries.len(), 2);
            let file = result.entries.get("docs/readme.txt").unwrap();
            assert_eq!(file.body_size_raw, 18);
            assert_eq!(file.crc32, Crc32::compute(b"hi there, hi there"));
            assert!(file.has_data_descriptor());
        }
    }

    #[test]
    fn test_positions_follow_counting() {
        let mut sink = Vec::new();
        let mut writer = StreamingWriter::new();
        let mut a = pending("a", EntryKind::File);
        writer
            .write_file(
                &mut sink,
                &mut a,
                "x".into(),
                &WriteOptions::new().method(CompressionMethod::Store),
            )
            .unwrap();
        let mut b = pending("b", EntryKind::File);
        writer
            .write_file(&mut sink, &mut b, "y".into(), &WriteOptions::new())
            .unwrap();
        assert_eq!(a.position, 0);
        assert_eq!(b.position, a.span());
        assert_eq!(writer.position(), sink.len() as u64);
    }
}
