//! Archive writing.
//!
//! Two strategies share the record encoders in [`crate::format`]:
//!
//! - [`StreamingWriter`] emits each entry as soon as it is added, with bit 3
//!   set and a trailing data descriptor, and never seeks. It works over any
//!   `Write`, including pipes.
//! - [`BufferedWriter`] compresses entries when they are added but holds
//!   them until close, so entries can be replaced or removed. At close it
//!   compacts what is already in the stream, appends what is pending, and
//!   writes the central directory once.
//!
//! Both are driven by [`Archive`](crate::Archive); this module exports the
//! option types callers pass to it.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkarchive::{Archive, EntryOptions, Mode, WriteOptions, CompressionMethod};
//!
//! let mut archive = Archive::open("out.zip", Mode::ReadWrite)?;
//! archive.set_write_options(WriteOptions::new().method(CompressionMethod::Store));
//! archive.add_file_with("notes.txt", "hello", EntryOptions::new().comment("greeting"))?;
//! archive.close()?;
//! # Ok::<(), pkarchive::Error>(())
//! ```

mod buffered;
mod counting;
mod options;
mod source;
mod streaming;

pub(crate) use buffered::BufferedWriter;
pub use counting::CountingWriter;
pub use options::{EntryOptions, WriteOptions, WriteResult};
pub use source::EntrySource;
pub(crate) use streaming::StreamingWriter;

use std::io::Write;

use crate::format::{
    CentralDirectoryRecord, END_OF_CENTRAL_DIRECTORY_SIZE, EndOfCentralDirectory,
    LocalFileHeader, VERSION_MADE_BY, VERSION_NEEDED, ZIP64_ESCAPE_U16, ZIP64_ESCAPE_U32,
};
use crate::read::{Entry, EntryTable};
use crate::{Error, Result};

/// Narrows a size or offset to a 32-bit record field.
///
/// Values at or above the Zip64 escape cannot be represented without Zip64.
pub(crate) fn narrow(value: u64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(v) if v != ZIP64_ESCAPE_U32 => Ok(v),
        _ => Err(Error::UnsupportedFeature {
            feature: "Zip64 (sizes or offsets of 4 GiB or more)",
        }),
    }
}

/// Builds the local header for an entry from its current field values.
pub(crate) fn local_header(entry: &Entry) -> LocalFileHeader {
    LocalFileHeader {
        version_needed: VERSION_NEEDED,
        flags: entry.flags,
        method: entry.method,
        modified: entry.modified,
        crc32: entry.crc32,
        compressed_size: entry.body_size,
        uncompressed_size: entry.body_size_raw,
        name: entry.path.as_bytes().to_vec(),
        extra: Vec::new(),
    }
}

fn central_record(entry: &Entry) -> Result<CentralDirectoryRecord> {
    Ok(CentralDirectoryRecord {
        version_made_by: VERSION_MADE_BY,
        version_needed: VERSION_NEEDED,
        flags: entry.flags,
        method: entry.method,
        modified: entry.modified,
        crc32: entry.crc32,
        compressed_size: entry.body_size,
        uncompressed_size: entry.body_size_raw,
        disk_number_start: 0,
        internal_attributes: 0,
        external_attributes: entry.external_attributes,
        local_header_offset: narrow(entry.position)?,
        name: entry.path.as_bytes().to_vec(),
        extra: Vec::new(),
        comment: entry.comment.as_bytes().to_vec(),
    })
}

/// Writes one central directory record per entry, in table order, followed
/// by the end record. `offset` is where the first record lands.
///
/// Returns the number of bytes written.
pub(crate) fn write_central_directory<W: Write + ?Sized>(
    out: &mut W,
    entries: &EntryTable,
    offset: u64,
    comment: &[u8],
) -> Result<u64> {
    let count = match u16::try_from(entries.len()) {
        Ok(n) if n != ZIP64_ESCAPE_U16 => n,
        _ => {
            return Err(Error::UnsupportedFeature {
                feature: "Zip64 (more than 65534 entries)",
            });
        }
    };

    let mut size = 0u64;
    for entry in entries {
        let record = central_record(entry)?;
        record.write_to(out)?;
        size += record.encoded_len();
    }

    let end = EndOfCentralDirectory::new(count, narrow(size)?, narrow(offset)?, comment.to_vec());
    end.write_to(out)?;
    log::debug!(
        "wrote central directory: {} entries, {} bytes at offset {}",
        count,
        size,
        offset
    );
    Ok(size + END_OF_CENTRAL_DIRECTORY_SIZE as u64 + comment.len() as u64)
}

/// Tallies the finished entry table.
pub(crate) fn summarize(entries: &EntryTable, archive_size: u64) -> WriteResult {
    let mut result = WriteResult {
        archive_size,
        ..Default::default()
    };
    for entry in entries {
        if entry.is_directory() {
            result.directories_written += 1;
        } else {
            result.entries_written += 1;
            result.total_size += entry.body_size_raw as u64;
            result.compressed_size += entry.body_size as u64;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RecordKind;
    use crate::read::EntryKind;
    use crate::timestamp::DosDateTime;

    #[test]
    fn test_narrow_rejects_zip64_range() {
        assert_eq!(narrow(0).unwrap(), 0);
        assert_eq!(narrow(0xFFFF_FFFE).unwrap(), 0xFFFF_FFFE);
        assert!(narrow(0xFFFF_FFFF).unwrap_err().is_unsupported());
        assert!(narrow(1 << 33).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_empty_central_directory_is_bare_end_record() {
        let mut out = Vec::new();
        let n = write_central_directory(&mut out, &EntryTable::new(), 0, b"").unwrap();
        assert_eq!(n, 22);
        assert_eq!(out.len(), 22);
        assert_eq!(
            RecordKind::classify([out[0], out[1], out[2], out[3]], 0).unwrap(),
            RecordKind::EndOfCentralDirectory
        );
    }

    #[test]
    fn test_central_directory_in_table_order() {
        let mut table = EntryTable::new();
        for path in ["z.txt", "a.txt"] {
            let mut entry = Entry::pending(
                path.into(),
                EntryKind::File,
                DosDateTime::default(),
                String::new(),
            );
            entry.position = 7;
            table.insert(entry);
        }
        let mut out = Vec::new();
        let n = write_central_directory(&mut out, &table, 100, b"c").unwrap();
        assert_eq!(n as usize, out.len());
        assert_eq!(&out[46..51], b"z.txt");
        assert_eq!(&out[46 + 51..46 + 51 + 5], b"a.txt");
        assert_eq!(*out.last().unwrap(), b'c');
    }

    #[test]
    fn test_summarize_counts() {
        let mut table = EntryTable::new();
        let dir = Entry::pending(
            "d/".into(),
            EntryKind::Directory,
            DosDateTime::default(),
            String::new(),
        );
        let mut file = Entry::pending(
            "d/f".into(),
            EntryKind::File,
            DosDateTime::default(),
            String::new(),
        );
        file.body_size = 3;
        file.body_size_raw = 10;
        table.insert(dir);
        table.insert(file);
        let result = summarize(&table, 99);
        assert_eq!(result.entries_written, 1);
        assert_eq!(result.directories_written, 1);
        assert_eq!(result.total_size, 10);
        assert_eq!(result.compressed_size, 3);
        assert_eq!(result.archive_size, 99);
    }
}
