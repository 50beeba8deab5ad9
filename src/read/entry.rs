//! Archive entry types.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::CompressionMethod;
use crate::format::{CentralDirectoryRecord, LocalFileHeader, attributes, flags};
use crate::timestamp::DosDateTime;

/// Whether an entry holds file content or marks a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file with a (possibly empty) body.
    File,
    /// A directory marker; the path ends with `/` and there is no body.
    Directory,
}

impl EntryKind {
    /// Infers the kind from a stored name.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with('/') {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// An entry in a ZIP archive.
///
/// This struct is marked `#[non_exhaustive]` so fields can be added without
/// breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Entry {
    /// The stored path. Directories end with `/`.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Offset of the local file header; 0 until the entry is written.
    pub position: u64,
    /// Length of the local header including name and extra field.
    pub header_size: u32,
    /// Compressed body size.
    pub body_size: u32,
    /// Uncompressed body size.
    pub body_size_raw: u32,
    /// Last modification time, at 2-second resolution.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed body.
    pub crc32: u32,
    /// Compression method code. Unknown codes are kept as read and only
    /// rejected when the entry is extracted.
    pub method: u16,
    /// General-purpose bit flags.
    pub flags: u16,
    /// External attributes (16 for directories, 32 for files when written
    /// by this crate).
    pub external_attributes: u32,
    /// Entry comment.
    pub comment: String,
    /// Bytes of data descriptor following the body (0, 12 or 16).
    pub(crate) descriptor_size: u32,
    /// Whether the entry's bytes are already in the stream.
    pub(crate) persisted: bool,
}

impl Entry {
    /// Builds an entry from a local file header found at `position`.
    pub(crate) fn from_local_header(path: String, header: &LocalFileHeader, position: u64) -> Self {
        Self {
            kind: EntryKind::from_name(&path),
            path,
            position,
            header_size: header.encoded_len() as u32,
            body_size: header.compressed_size,
            body_size_raw: header.uncompressed_size,
            modified: header.modified,
            crc32: header.crc32,
            method: header.method,
            flags: header.flags,
            external_attributes: 0,
            comment: String::new(),
            descriptor_size: 0,
            persisted: true,
        }
    }

    /// Builds a not-yet-written entry. Sizes, CRC and position are filled in
    /// by the writer.
    pub(crate) fn pending(
        path: String,
        kind: EntryKind,
        modified: DosDateTime,
        comment: String,
    ) -> Self {
        let mut bits = 0;
        if !path.is_ascii() || !comment.is_ascii() {
            bits |= flags::UTF8;
        }
        let external_attributes = match kind {
            EntryKind::File => attributes::FILE,
            EntryKind::Directory => attributes::DIRECTORY,
        };
        Self {
            path,
            kind,
            position: 0,
            header_size: 0,
            body_size: 0,
            body_size_raw: 0,
            modified,
            crc32: 0,
            method: 0,
            flags: bits,
            external_attributes,
            comment,
            descriptor_size: 0,
            persisted: false,
        }
    }

    /// Overwrites local-header guesses with the authoritative central
    /// directory values.
    ///
    /// The position stays where the local header was scanned, since
    /// `header_size` was measured there.
    pub(crate) fn merge_central(&mut self, record: &CentralDirectoryRecord, comment: String) {
        self.body_size = record.compressed_size;
        self.body_size_raw = record.uncompressed_size;
        self.crc32 = record.crc32;
        self.method = record.method;
        self.flags = record.flags;
        self.modified = record.modified;
        self.external_attributes = record.external_attributes;
        self.comment = comment;
    }

    /// Returns the file name (last component of the path).
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Returns true if this is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns true if this is a file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if the entry is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// Returns true if a data descriptor follows the body.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// Returns the compression method, if it is one this crate knows.
    pub fn compression(&self) -> Option<CompressionMethod> {
        CompressionMethod::from_code(self.method)
    }

    /// Returns the modification time as a Unix timestamp.
    pub fn modified_at(&self) -> i64 {
        self.modified.to_unix_secs()
    }

    /// Returns the modification time as a `SystemTime`.
    pub fn modified_time(&self) -> SystemTime {
        let secs = self.modified_at();
        if secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(secs as u64)
        } else {
            UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
        }
    }

    /// Total bytes the entry occupies in the stream: header, body, and any
    /// data descriptor.
    pub fn span(&self) -> u64 {
        self.header_size as u64 + self.body_size as u64 + self.descriptor_size as u64
    }

    /// Offset of the first body byte.
    pub fn body_offset(&self) -> u64 {
        self.position + self.header_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_local_header() {
        let header = LocalFileHeader {
            method: 8,
            compressed_size: 7,
            uncompressed_size: 5,
            name: b"docs/readme.txt".to_vec(),
            ..Default::default()
        };
        let entry = Entry::from_local_header("docs/readme.txt".into(), &header, 100);
        assert!(entry.is_file());
        assert_eq!(entry.name(), "readme.txt");
        assert_eq!(entry.header_size, 30 + 15);
        assert_eq!(entry.body_offset(), 145);
        assert_eq!(entry.span(), 45 + 7);
        assert_eq!(entry.compression(), Some(CompressionMethod::Deflate));
    }

    #[test]
    fn test_directory_kind() {
        assert_eq!(EntryKind::from_name("docs/"), EntryKind::Directory);
        assert_eq!(EntryKind::from_name("docs"), EntryKind::File);
    }

    #[test]
    fn test_merge_central_supersedes() {
        let header = LocalFileHeader {
            flags: flags::DATA_DESCRIPTOR,
            name: b"a".to_vec(),
            ..Default::default()
        };
        let mut entry = Entry::from_local_header("a".into(), &header, 0);
        let record = CentralDirectoryRecord {
            crc32: 9,
            compressed_size: 4,
            uncompressed_size: 8,
            external_attributes: 32,
            local_header_offset: 0,
            ..Default::default()
        };
        entry.merge_central(&record, "note".into());
        assert_eq!(entry.crc32, 9);
        assert_eq!(entry.body_size, 4);
        assert_eq!(entry.body_size_raw, 8);
        assert_eq!(entry.comment, "note");
    }

    #[test]
    fn test_merge_central_keeps_scanned_position() {
        let header = LocalFileHeader {
            name: b"docs/readme.txt".to_vec(),
            ..Default::default()
        };
        let mut entry = Entry::from_local_header("docs/readme.txt".into(), &header, 100);
        let record = CentralDirectoryRecord {
            local_header_offset: 500,
            ..Default::default()
        };
        entry.merge_central(&record, String::new());
        assert_eq!(entry.position, 100);
        assert_eq!(entry.body_offset(), 145);
    }
}
