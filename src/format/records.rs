//! Encoding and decoding of the four ZIP record types.
//!
//! Each record type exposes `read_after_signature`, which expects the
//! 4-byte magic to have been consumed already (the scanner reads the magic
//! first to decide which record follows), and `write_to`, which emits the
//! complete record including its magic. [`RecordKind::classify`] turns a
//! magic into a record kind or the appropriate error.

use std::io::{self, Read, Write};

use super::reader::{Fields, read_bytes};
use super::{
    CENTRAL_DIRECTORY_RECORD_SIZE, DATA_DESCRIPTOR_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE,
    LOCAL_FILE_HEADER_SIZE, MAX_FIELD_LENGTH, ZIP64_ESCAPE_U16, ZIP64_ESCAPE_U32, flags,
    signature,
};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// The record types a 4-byte magic can introduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `PK\x03\x04`
    LocalFileHeader,
    /// `PK\x01\x02`
    CentralDirectory,
    /// `PK\x05\x06`
    EndOfCentralDirectory,
    /// `PK\x05\x05`
    DigitalSignature,
    /// `PK\x07\x08`
    DataDescriptor,
    /// `PK\x06\x06`
    Zip64EndOfCentralDirectory,
    /// `PK\x06\x07`
    Zip64Locator,
}

impl RecordKind {
    /// Maps a magic to a record kind.
    pub fn from_signature(magic: [u8; 4]) -> Option<Self> {
        match magic {
            signature::LOCAL_FILE_HEADER => Some(Self::LocalFileHeader),
            signature::CENTRAL_DIRECTORY => Some(Self::CentralDirectory),
            signature::END_OF_CENTRAL_DIRECTORY => Some(Self::EndOfCentralDirectory),
            signature::DIGITAL_SIGNATURE => Some(Self::DigitalSignature),
            signature::DATA_DESCRIPTOR => Some(Self::DataDescriptor),
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY => Some(Self::Zip64EndOfCentralDirectory),
            signature::ZIP64_LOCATOR => Some(Self::Zip64Locator),
            _ => None,
        }
    }

    /// Maps a magic found at `offset` to a record kind the reader accepts.
    ///
    /// Zip64 records fail with [`Error::UnsupportedFeature`]; unknown magics
    /// fail with [`Error::CorruptRecord`] carrying the offset and raw bytes.
    pub fn classify(magic: [u8; 4], offset: u64) -> Result<Self> {
        match Self::from_signature(magic) {
            Some(Self::Zip64EndOfCentralDirectory | Self::Zip64Locator) => {
                Err(Error::UnsupportedFeature { feature: "Zip64" })
            }
            Some(kind) => Ok(kind),
            None => Err(Error::corrupt_record(
                offset,
                &magic,
                "unrecognized record signature",
            )),
        }
    }
}

/// Reads a fixed-size record prefix, reporting a short read as a format
/// error rather than a bare I/O error.
fn read_prefix<R: Read, const N: usize>(r: &mut R, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    match r.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(Error::InvalidFormat(format!("truncated {}", what)))
        }
        Err(e) => Err(e.into()),
    }
}

fn read_field<R: Read>(r: &mut R, len: u16, what: &str) -> Result<Vec<u8>> {
    read_bytes(r, len as usize).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::InvalidFormat(format!("truncated {}", what))
        } else {
            e.into()
        }
    })
}

/// Checks that a variable-length field fits its 16-bit length prefix.
pub(crate) fn field_len(what: &'static str, bytes: &[u8]) -> Result<u16> {
    u16::try_from(bytes.len()).map_err(|_| Error::CapacityExceeded {
        what,
        len: bytes.len(),
        max: MAX_FIELD_LENGTH,
    })
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Local file header.
///
/// Precedes each entry body. When [`flags::DATA_DESCRIPTOR`] is set, the
/// CRC and size fields are zero and the real values follow the body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General-purpose bit flags.
    pub flags: u16,
    /// Compression method code.
    pub method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the body as stored.
    pub compressed_size: u32,
    /// Size of the body once decoded.
    pub uncompressed_size: u32,
    /// Raw entry name.
    pub name: Vec<u8>,
    /// Raw extra field.
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    /// Reads a header including its signature.
    pub fn read<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let magic: [u8; 4] = read_prefix(r, "local file header")?;
        if magic != signature::LOCAL_FILE_HEADER {
            return Err(Error::corrupt_record(
                offset,
                &magic,
                "expected local file header",
            ));
        }
        Self::read_after_signature(r)
    }

    /// Reads a header whose signature was already consumed.
    pub fn read_after_signature<R: Read>(r: &mut R) -> Result<Self> {
        let buf: [u8; LOCAL_FILE_HEADER_SIZE - 4] = read_prefix(r, "local file header")?;
        let mut f = Fields::new(&buf, 0);

        let version_needed = f.u16();
        let flags = f.u16();
        let method = f.u16();
        let time = f.u16();
        let date = f.u16();
        let crc32 = f.u32();
        let compressed_size = f.u32();
        let uncompressed_size = f.u32();
        let name_len = f.u16();
        let extra_len = f.u16();

        if compressed_size == ZIP64_ESCAPE_U32 || uncompressed_size == ZIP64_ESCAPE_U32 {
            return Err(Error::UnsupportedFeature { feature: "Zip64" });
        }

        let name = read_field(r, name_len, "entry name")?;
        let extra = read_field(r, extra_len, "extra field")?;

        Ok(Self {
            version_needed,
            flags,
            method,
            modified: DosDateTime::from_parts(time, date),
            crc32,
            compressed_size,
            uncompressed_size,
            name,
            extra,
        })
    }

    /// Total encoded length including signature, name, and extra field.
    pub fn encoded_len(&self) -> u64 {
        (LOCAL_FILE_HEADER_SIZE + self.name.len() + self.extra.len()) as u64
    }

    /// Returns `true` if a data descriptor follows the body.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// Writes the complete header.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let name_len = field_len("entry name", &self.name)?;
        let extra_len = field_len("extra field", &self.extra)?;

        let mut buf = Vec::with_capacity(self.encoded_len() as usize);
        buf.extend_from_slice(&signature::LOCAL_FILE_HEADER);
        put_u16(&mut buf, self.version_needed);
        put_u16(&mut buf, self.flags);
        put_u16(&mut buf, self.method);
        buf.extend_from_slice(&self.modified.to_bytes());
        put_u32(&mut buf, self.crc32);
        put_u32(&mut buf, self.compressed_size);
        put_u32(&mut buf, self.uncompressed_size);
        put_u16(&mut buf, name_len);
        put_u16(&mut buf, extra_len);
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&self.extra);

        w.write_all(&buf)?;
        Ok(())
    }
}

/// Central directory record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CentralDirectoryRecord {
    /// Version made by (host system in the high byte).
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General-purpose bit flags.
    pub flags: u16,
    /// Compression method code.
    pub method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the body as stored.
    pub compressed_size: u32,
    /// Size of the body once decoded.
    pub uncompressed_size: u32,
    /// Disk on which the entry starts; always 0 for single-disk archives.
    pub disk_number_start: u16,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External (host) file attributes.
    pub external_attributes: u32,
    /// Offset of the local file header.
    pub local_header_offset: u32,
    /// Raw entry name.
    pub name: Vec<u8>,
    /// Raw extra field.
    pub extra: Vec<u8>,
    /// Raw entry comment.
    pub comment: Vec<u8>,
}

impl CentralDirectoryRecord {
    /// Reads a record whose signature was already consumed.
    ///
    /// Spanned archives and Zip64 escapes are rejected here.
    pub fn read_after_signature<R: Read>(r: &mut R) -> Result<Self> {
        let buf: [u8; CENTRAL_DIRECTORY_RECORD_SIZE - 4] =
            read_prefix(r, "central directory record")?;
        let mut f = Fields::new(&buf, 0);

        let version_made_by = f.u16();
        let version_needed = f.u16();
        let flags = f.u16();
        let method = f.u16();
        let time = f.u16();
        let date = f.u16();
        let crc32 = f.u32();
        let compressed_size = f.u32();
        let uncompressed_size = f.u32();
        let name_len = f.u16();
        let extra_len = f.u16();
        let comment_len = f.u16();
        let disk_number_start = f.u16();
        let internal_attributes = f.u16();
        let external_attributes = f.u32();
        let local_header_offset = f.u32();

        if disk_number_start != 0 {
            return Err(Error::UnsupportedFeature {
                feature: "multi-disk archives",
            });
        }
        if compressed_size == ZIP64_ESCAPE_U32
            || uncompressed_size == ZIP64_ESCAPE_U32
            || local_header_offset == ZIP64_ESCAPE_U32
        {
            return Err(Error::UnsupportedFeature { feature: "Zip64" });
        }

        let name = read_field(r, name_len, "entry name")?;
        let extra = read_field(r, extra_len, "extra field")?;
        let comment = read_field(r, comment_len, "entry comment")?;

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            modified: DosDateTime::from_parts(time, date),
            crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_attributes,
            external_attributes,
            local_header_offset,
            name,
            extra,
            comment,
        })
    }

    /// Total encoded length including signature and variable fields.
    pub fn encoded_len(&self) -> u64 {
        (CENTRAL_DIRECTORY_RECORD_SIZE + self.name.len() + self.extra.len() + self.comment.len())
            as u64
    }

    /// Writes the complete record.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let name_len = field_len("entry name", &self.name)?;
        let extra_len = field_len("extra field", &self.extra)?;
        let comment_len = field_len("entry comment", &self.comment)?;

        let mut buf = Vec::with_capacity(self.encoded_len() as usize);
        buf.extend_from_slice(&signature::CENTRAL_DIRECTORY);
        put_u16(&mut buf, self.version_made_by);
        put_u16(&mut buf, self.version_needed);
        put_u16(&mut buf, self.flags);
        put_u16(&mut buf, self.method);
        buf.extend_from_slice(&self.modified.to_bytes());
        put_u32(&mut buf, self.crc32);
        put_u32(&mut buf, self.compressed_size);
        put_u32(&mut buf, self.uncompressed_size);
        put_u16(&mut buf, name_len);
        put_u16(&mut buf, extra_len);
        put_u16(&mut buf, comment_len);
        put_u16(&mut buf, self.disk_number_start);
        put_u16(&mut buf, self.internal_attributes);
        put_u32(&mut buf, self.external_attributes);
        put_u32(&mut buf, self.local_header_offset);
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&self.extra);
        buf.extend_from_slice(&self.comment);

        w.write_all(&buf)?;
        Ok(())
    }
}

/// End of central directory record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk on which the central directory starts.
    pub central_directory_disk: u16,
    /// Central directory records on this disk.
    pub entries_on_disk: u16,
    /// Central directory records in total.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub central_directory_size: u32,
    /// Offset of the central directory.
    pub central_directory_offset: u32,
    /// Raw archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Creates a single-disk end record.
    pub fn new(entries: u16, size: u32, offset: u32, comment: Vec<u8>) -> Self {
        Self {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: entries,
            total_entries: entries,
            central_directory_size: size,
            central_directory_offset: offset,
            comment,
        }
    }

    /// Decodes the record from everything that followed its signature.
    ///
    /// The comment is sliced by its declared length; trailing bytes after
    /// it are ignored. `offset` is the position of the signature and is
    /// only used for error reporting.
    pub fn parse_after_signature(rest: &[u8], offset: u64) -> Result<Self> {
        const FIXED: usize = END_OF_CENTRAL_DIRECTORY_SIZE - 4;
        if rest.len() < FIXED {
            return Err(Error::corrupt_record(
                offset,
                &signature::END_OF_CENTRAL_DIRECTORY,
                format!(
                    "end of central directory truncated: {} of {} bytes",
                    rest.len(),
                    FIXED
                ),
            ));
        }

        let mut f = Fields::new(rest, 0);
        let disk_number = f.u16();
        let central_directory_disk = f.u16();
        let entries_on_disk = f.u16();
        let total_entries = f.u16();
        let central_directory_size = f.u32();
        let central_directory_offset = f.u32();
        let comment_len = f.u16() as usize;

        if disk_number != 0 || central_directory_disk != 0 || entries_on_disk != total_entries {
            return Err(Error::UnsupportedFeature {
                feature: "multi-disk archives",
            });
        }
        if total_entries == ZIP64_ESCAPE_U16
            || central_directory_size == ZIP64_ESCAPE_U32
            || central_directory_offset == ZIP64_ESCAPE_U32
        {
            return Err(Error::UnsupportedFeature { feature: "Zip64" });
        }

        let Some(comment) = rest.get(FIXED..FIXED + comment_len) else {
            return Err(Error::corrupt_record(
                offset,
                &signature::END_OF_CENTRAL_DIRECTORY,
                format!(
                    "archive comment declares {} bytes but only {} remain",
                    comment_len,
                    rest.len() - FIXED
                ),
            ));
        };

        Ok(Self {
            disk_number,
            central_directory_disk,
            entries_on_disk,
            total_entries,
            central_directory_size,
            central_directory_offset,
            comment: comment.to_vec(),
        })
    }

    /// Writes the complete record.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let comment_len = field_len("archive comment", &self.comment)?;

        let mut buf = Vec::with_capacity(END_OF_CENTRAL_DIRECTORY_SIZE + self.comment.len());
        buf.extend_from_slice(&signature::END_OF_CENTRAL_DIRECTORY);
        put_u16(&mut buf, self.disk_number);
        put_u16(&mut buf, self.central_directory_disk);
        put_u16(&mut buf, self.entries_on_disk);
        put_u16(&mut buf, self.total_entries);
        put_u32(&mut buf, self.central_directory_size);
        put_u32(&mut buf, self.central_directory_offset);
        put_u16(&mut buf, comment_len);
        buf.extend_from_slice(&self.comment);

        w.write_all(&buf)?;
        Ok(())
    }
}

/// Data descriptor: CRC and sizes written after a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataDescriptor {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the body as stored.
    pub compressed_size: u32,
    /// Size of the body once decoded.
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    /// Reads a descriptor, accepting the optional `PK\x07\x08` prefix.
    ///
    /// Returns the descriptor and the number of bytes consumed (12 or 16).
    pub fn read<R: Read>(r: &mut R) -> Result<(Self, u64)> {
        let first: [u8; 4] = read_prefix(r, "data descriptor")?;
        let (crc_bytes, consumed) = if first == signature::DATA_DESCRIPTOR {
            let crc: [u8; 4] = read_prefix(r, "data descriptor")?;
            (crc, DATA_DESCRIPTOR_SIZE as u64 + 4)
        } else {
            (first, DATA_DESCRIPTOR_SIZE as u64)
        };

        let rest: [u8; 8] = read_prefix(r, "data descriptor")?;
        let mut f = Fields::new(&rest, 0);
        let descriptor = Self {
            crc32: u32::from_le_bytes(crc_bytes),
            compressed_size: f.u32(),
            uncompressed_size: f.u32(),
        };
        Ok((descriptor, consumed))
    }

    /// Writes the descriptor without a signature.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let mut buf = [0u8; DATA_DESCRIPTOR_SIZE];
        buf[0..4].copy_from_slice(&self.crc32.to_le_bytes());
        buf[4..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        w.write_all(&buf)?;
        Ok(())
    }
}
