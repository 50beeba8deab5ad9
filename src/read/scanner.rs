//! Sequential-scan archive reader.
//!
//! The scanner walks the stream front to back, dispatching on each 4-byte
//! magic. Local headers register entries; the first central directory
//! record switches the scanner into merge mode, where each record refines
//! the entry of the same name; the end of central directory record
//! finishes the pass. The only backward seek is the digital signature
//! probe, which restores the cursor when the probe does not match.
//!
//! Entries written with a trailing data descriptor and no sizes in their
//! local header (the shape a streaming writer produces) are handled by
//! inflating the body to find where it ends.

use std::io::{Read, Seek, SeekFrom};

use super::{Entry, EntryTable};
use crate::codec::{deflate, method};
use crate::format::reader::read_full;
use crate::format::{
    CentralDirectoryRecord, DataDescriptor, EndOfCentralDirectory, LocalFileHeader, RecordKind,
    signature,
};
use crate::{Error, Result};

/// Size of the digital signature probe: magic plus 2-byte length.
const SIGNATURE_PROBE_SIZE: usize = 6;

/// What the scanner expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Reading local headers and skipping bodies.
    ScanningLocalHeaders,
    /// Reading central directory records and merging them.
    ScanningCentralDirectory,
    /// End of central directory consumed, or clean EOF.
    Finished,
}

/// Everything a scan learns about an archive.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Entries in stream order.
    pub entries: EntryTable,
    /// Raw archive comment.
    pub comment: Vec<u8>,
    /// Offset where the central directory begins, if one was found.
    pub central_directory_offset: Option<u64>,
    /// Offset just past the last entry's bytes.
    pub data_end: u64,
}

/// Decodes a stored name or comment.
///
/// Names flagged as UTF-8 and names that happen to be valid UTF-8 decode
/// directly; anything else is decoded lossily.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Scans an archive from offset 0.
pub fn scan<R: Read + Seek>(reader: &mut R) -> Result<ScanResult> {
    Scanner::new(reader)?.run()
}

struct Scanner<'a, R> {
    reader: &'a mut R,
    stream_len: u64,
    offset: u64,
    state: ScanState,
    result: ScanResult,
    central_records: usize,
}

impl<'a, R: Read + Seek> Scanner<'a, R> {
    fn new(reader: &'a mut R) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            stream_len,
            offset: 0,
            state: ScanState::ScanningLocalHeaders,
            result: ScanResult::default(),
            central_records: 0,
        })
    }

    fn run(mut self) -> Result<ScanResult> {
        while self.state != ScanState::Finished {
            let mut magic = [0u8; 4];
            let n = read_full(self.reader, &mut magic)?;
            if n == 0 {
                self.finish_at_eof()?;
                break;
            }
            if n < magic.len() {
                return Err(Error::corrupt_record(
                    self.offset,
                    &magic[..n],
                    "truncated record signature",
                ));
            }

            let kind = RecordKind::classify(magic, self.offset)?;
            match (self.state, kind) {
                (ScanState::ScanningLocalHeaders, RecordKind::LocalFileHeader) => {
                    self.read_local_entry()?;
                }
                (_, RecordKind::CentralDirectory) => {
                    if self.state == ScanState::ScanningLocalHeaders {
                        log::debug!("central directory starts at {:#x}", self.offset);
                        self.result.central_directory_offset = Some(self.offset);
                        self.result.data_end = self.offset;
                        self.state = ScanState::ScanningCentralDirectory;
                    }
                    self.read_central_record()?;
                }
                (_, RecordKind::EndOfCentralDirectory) => {
                    if self.state == ScanState::ScanningLocalHeaders {
                        self.result.data_end = self.offset;
                    }
                    self.read_end_record()?;
                    self.state = ScanState::Finished;
                }
                (_, other) => {
                    return Err(Error::corrupt_record(
                        self.offset,
                        &magic,
                        format!("unexpected {:?} record while {:?}", other, self.state),
                    ));
                }
            }
        }

        Ok(self.result)
    }

    fn finish_at_eof(&mut self) -> Result<()> {
        match self.state {
            ScanState::ScanningLocalHeaders => {
                if !self.result.entries.is_empty() {
                    log::warn!(
                        "archive has {} entries but no central directory",
                        self.result.entries.len()
                    );
                }
                self.result.data_end = self.offset;
                self.state = ScanState::Finished;
                Ok(())
            }
            ScanState::ScanningCentralDirectory => Err(Error::InvalidFormat(
                "central directory is not followed by an end record".into(),
            )),
            ScanState::Finished => Ok(()),
        }
    }

    fn read_local_entry(&mut self) -> Result<()> {
        let position = self.offset;
        let header = LocalFileHeader::read_after_signature(self.reader)?;
        let name = decode_text(&header.name);
        let body_start = position + header.encoded_len();
        let mut entry = Entry::from_local_header(name, &header, position);

        let body_len = if header.has_data_descriptor() && header.compressed_size == 0 {
            self.measure_deferred_body(&header, &entry.path)?
        } else {
            header.compressed_size as u64
        };

        let body_end = body_start + body_len;
        if body_end > self.stream_len {
            return Err(Error::InvalidFormat(format!(
                "body of '{}' runs past the end of the archive",
                entry.path
            )));
        }
        self.reader.seek(SeekFrom::Start(body_end))?;
        self.offset = body_end;

        if header.has_data_descriptor() {
            let (descriptor, consumed) = DataDescriptor::read(self.reader)?;
            if header.compressed_size == 0 {
                if descriptor.compressed_size as u64 != body_len {
                    return Err(Error::corrupt_record(
                        body_end,
                        &descriptor.crc32.to_le_bytes(),
                        format!(
                            "data descriptor of '{}' declares {} compressed bytes, stream has {}",
                            entry.path, descriptor.compressed_size, body_len
                        ),
                    ));
                }
                entry.crc32 = descriptor.crc32;
                entry.body_size = descriptor.compressed_size;
                entry.body_size_raw = descriptor.uncompressed_size;
            }
            entry.descriptor_size = consumed as u32;
            self.offset += consumed;
        }

        log::debug!(
            "local header '{}' at {:#x}, {} body bytes",
            entry.path,
            position,
            entry.body_size
        );
        if let Some(previous) = self.result.entries.insert(entry) {
            log::warn!("duplicate entry '{}' in local headers", previous.path);
        }
        Ok(())
    }

    /// Finds the body length of an entry whose sizes are deferred to a data
    /// descriptor. The reader is positioned at the first body byte.
    fn measure_deferred_body(&mut self, header: &LocalFileHeader, path: &str) -> Result<u64> {
        match header.method {
            method::DEFLATE => {
                let extent = deflate::measure_stream(self.reader)?;
                Ok(extent.compressed_size)
            }
            method::STORE => Ok(0),
            other => {
                log::debug!(
                    "cannot locate end of '{}' (method {}) without its sizes",
                    path,
                    other
                );
                Err(Error::UnsupportedFeature {
                    feature: "data descriptor with unknown size for non-deflate entries",
                })
            }
        }
    }

    fn read_central_record(&mut self) -> Result<()> {
        let record = CentralDirectoryRecord::read_after_signature(self.reader)?;
        let name = decode_text(&record.name);
        let comment = decode_text(&record.comment);

        match self.result.entries.get_mut(&name) {
            Some(entry) => {
                if entry.position != record.local_header_offset as u64 {
                    log::debug!(
                        "central directory offset {:#x} for '{}' differs from scanned {:#x}, keeping scanned",
                        record.local_header_offset,
                        name,
                        entry.position
                    );
                }
                entry.merge_central(&record, comment);
            }
            None => {
                return Err(Error::InvalidFormat(format!(
                    "central directory lists '{}' but no local header has that name",
                    name
                )));
            }
        }

        self.central_records += 1;
        self.offset += record.encoded_len();
        self.probe_digital_signature()
    }

    /// Skips an optional digital signature record, or rewinds.
    fn probe_digital_signature(&mut self) -> Result<()> {
        let mut probe = [0u8; SIGNATURE_PROBE_SIZE];
        let n = read_full(self.reader, &mut probe)?;
        if n == SIGNATURE_PROBE_SIZE && probe[..4] == signature::DIGITAL_SIGNATURE {
            let size = u16::from_le_bytes([probe[4], probe[5]]) as u64;
            self.offset += SIGNATURE_PROBE_SIZE as u64 + size;
            log::debug!("skipping {} byte digital signature", size);
        }
        self.reader.seek(SeekFrom::Start(self.offset))?;
        Ok(())
    }

    fn read_end_record(&mut self) -> Result<()> {
        let mut rest = Vec::new();
        self.reader.read_to_end(&mut rest)?;
        let end = EndOfCentralDirectory::parse_after_signature(&rest, self.offset)?;

        if end.total_entries as usize != self.central_records {
            log::warn!(
                "end record declares {} entries, central directory has {}",
                end.total_entries,
                self.central_records
            );
        }

        self.result.comment = end.comment;
        self.offset = self.stream_len;
        Ok(())
    }
}
