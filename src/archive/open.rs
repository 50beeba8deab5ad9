//! Archive constructors.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use super::{Archive, Mode};
use crate::read::{EntryTable, scan};
use crate::storage::{Sink, Storage};
use crate::{Error, Result};

impl Archive<File> {
    /// Opens (or creates) an archive file.
    ///
    /// - [`Mode::ReadOnly`]: the file must exist; a missing path fails with
    ///   [`Error::Io`](crate::Error::Io).
    /// - [`Mode::StreamingWrite`]: the file is created or truncated.
    /// - [`Mode::ReadWrite`]: the file is created if missing; existing
    ///   content is scanned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or, for readable modes,
    /// if the existing content is not a valid archive.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            Mode::ReadOnly => File::open(path)?,
            Mode::StreamingWrite => File::create(path)?,
            Mode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?,
        };
        log::debug!("opened '{}' as {}", path.display(), mode);
        Self::from_storage(file, mode)
    }

    /// Creates a new, empty read-write archive, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Self::from_storage(file, Mode::ReadWrite)
    }
}

impl<W: Write> Archive<Sink<W>> {
    /// Starts a streaming archive over any writer.
    ///
    /// The writer never needs to seek, so pipes and sockets work:
    ///
    /// ```rust
    /// use pkarchive::Archive;
    ///
    /// let mut archive = Archive::streaming(Vec::new());
    /// archive.add_file("a.txt", "hello")?;
    /// let bytes = archive.into_inner()?.into_inner();
    /// assert_eq!(&bytes[..4], b"PK\x03\x04");
    /// # Ok::<(), pkarchive::Error>(())
    /// ```
    pub fn streaming(writer: W) -> Self {
        Self::with_parts(
            Sink::new(writer),
            Mode::StreamingWrite,
            EntryTable::new(),
            Vec::new(),
            false,
        )
    }
}

impl<S: Storage> Archive<S> {
    /// Wraps an already-open stream.
    ///
    /// Readable modes scan the stream from offset 0 if it is non-empty, and
    /// reject write-only storage such as [`Sink`](crate::storage::Sink).
    /// Streaming mode writes from the stream's start without reading it.
    pub fn from_storage(mut storage: S, mode: Mode) -> Result<Self> {
        if mode.is_readable() && !storage.is_seekable() {
            return Err(Error::mode_violation("from_storage", "seekable", mode));
        }
        if !mode.is_readable() {
            return Ok(Self::with_parts(
                storage,
                mode,
                EntryTable::new(),
                Vec::new(),
                false,
            ));
        }

        let len = storage.seek(SeekFrom::End(0))?;
        if len == 0 {
            log::debug!("empty target, nothing to scan");
            return Ok(Self::with_parts(
                storage,
                mode,
                EntryTable::new(),
                Vec::new(),
                true,
            ));
        }

        let result = scan(&mut storage)?;
        log::debug!(
            "scanned {} entries ({} bytes of entry data)",
            result.entries.len(),
            result.data_end
        );
        let dirty = result.central_directory_offset.is_none();
        Ok(Self::with_parts(
            storage,
            mode,
            result.entries,
            result.comment,
            dirty,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_open_missing_read_only_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Archive::open(dir.path().join("missing.zip"), Mode::ReadOnly).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = Archive::from_storage(Cursor::new(b"not a zip file".to_vec()), Mode::ReadOnly)
            .unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_readable_modes_need_seekable_storage() {
        for mode in [Mode::ReadOnly, Mode::ReadWrite] {
            let err = Archive::from_storage(Sink::new(Vec::new()), mode).unwrap_err();
            assert!(matches!(
                err,
                Error::ModeViolation {
                    operation: "from_storage",
                    constraint: "seekable",
                    ..
                }
            ));
        }
        let archive = Archive::from_storage(Sink::new(Vec::new()), Mode::StreamingWrite).unwrap();
        assert!(archive.is_writable());
    }

    #[test]
    fn test_streaming_starts_empty() {
        let archive = Archive::streaming(Vec::new());
        assert_eq!(archive.mode(), Mode::StreamingWrite);
        assert!(!archive.is_seekable());
        assert_eq!(archive.len(), 0);
    }
}
