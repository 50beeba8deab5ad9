//! Adding, replacing and removing entries.

use super::{Archive, Strategy};
use crate::archive_path::{ArchivePath, lookup_key};
use crate::format::records::field_len;
use crate::read::{Entry, EntryKind};
use crate::storage::Storage;
use crate::write::{EntryOptions, EntrySource};
use crate::{Error, Result};

impl<S: Storage> Archive<S> {
    /// Adds a file entry, compressed with the current
    /// [`WriteOptions`](crate::WriteOptions).
    ///
    /// In read-write mode an existing entry at the same path is replaced in
    /// place. In streaming mode the entry is written immediately, and
    /// re-adding a path fails because the first copy cannot be revisited.
    pub fn add_file<'a>(&mut self, path: &str, data: impl Into<EntrySource<'a>>) -> Result<()> {
        self.add_file_with(path, data, EntryOptions::default())
    }

    /// Adds a file entry with a comment and/or explicit modification time.
    pub fn add_file_with<'a>(
        &mut self,
        path: &str,
        data: impl Into<EntrySource<'a>>,
        options: EntryOptions,
    ) -> Result<()> {
        self.ensure_writable("add_file")?;
        let path = ArchivePath::file(path)?;
        self.check_new_entry(&path, &options, "add_file")?;
        self.write_options.validate()?;

        let mut entry = Entry::pending(
            path.into_string(),
            EntryKind::File,
            options.resolved_time(),
            options.comment,
        );
        let write_options = self.write_options;
        match &mut self.strategy {
            Strategy::Streaming(writer) => {
                let handle = self.handle.as_mut().ok_or(Error::Closed)?;
                writer.write_file(handle, &mut entry, data.into(), &write_options)?;
            }
            Strategy::Buffered(writer) => {
                writer.stage_file(&mut entry, data.into(), &write_options)?;
            }
            Strategy::Read => {
                return Err(Error::mode_violation("add_file", "writable", self.mode));
            }
        }
        self.insert(entry);
        Ok(())
    }

    /// Adds a directory entry. A trailing slash is added if missing.
    pub fn add_directory(&mut self, path: &str) -> Result<()> {
        self.add_directory_with(path, EntryOptions::default())
    }

    /// Adds a directory entry with a comment and/or modification time.
    pub fn add_directory_with(&mut self, path: &str, options: EntryOptions) -> Result<()> {
        self.ensure_writable("add_directory")?;
        let path = ArchivePath::directory(path)?;
        self.check_new_entry(&path, &options, "add_directory")?;

        let mut entry = Entry::pending(
            path.into_string(),
            EntryKind::Directory,
            options.resolved_time(),
            options.comment,
        );
        match &mut self.strategy {
            Strategy::Streaming(writer) => {
                let handle = self.handle.as_mut().ok_or(Error::Closed)?;
                writer.write_directory(handle, &mut entry)?;
            }
            Strategy::Buffered(writer) => writer.stage_directory(&mut entry),
            Strategy::Read => {
                return Err(Error::mode_violation(
                    "add_directory",
                    "writable",
                    self.mode,
                ));
            }
        }
        self.insert(entry);
        Ok(())
    }

    /// Removes an entry. Its bytes are reclaimed when the archive is closed.
    ///
    /// Only read-write archives support removal.
    pub fn remove(&mut self, path: &str) -> Result<Entry> {
        self.ensure_writable("remove")?;
        self.ensure_seekable("remove")?;

        let key = match self.find(path) {
            Some(entry) => entry.path.clone(),
            None => {
                return Err(Error::EntryNotFound {
                    path: lookup_key(path),
                });
            }
        };
        let removed = self
            .entries
            .remove(&key)
            .ok_or_else(|| Error::EntryNotFound { path: key.clone() })?;
        if let Strategy::Buffered(writer) = &mut self.strategy {
            writer.discard(&key);
        }
        self.dirty = true;
        log::debug!("removed '{}'", key);
        Ok(removed)
    }

    /// Sets the archive comment (at most 65535 bytes).
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        self.ensure_writable("set_comment")?;
        let comment = comment.into().into_bytes();
        field_len("archive comment", &comment)?;
        self.comment = comment;
        self.dirty = true;
        Ok(())
    }

    fn check_new_entry(
        &self,
        path: &ArchivePath,
        options: &EntryOptions,
        operation: &'static str,
    ) -> Result<()> {
        field_len("entry comment", options.comment.as_bytes())?;
        if !self.mode.is_seekable() && self.entries.contains(path.as_str()) {
            return Err(Error::mode_violation(operation, "seekable", self.mode));
        }
        Ok(())
    }

    fn insert(&mut self, entry: Entry) {
        if let Some(old) = self.entries.insert(entry) {
            log::debug!("replaced '{}'", old.path);
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use crate::{Archive, EntryOptions, Error, Mode};
    use std::io::Cursor;

    fn read_write() -> Archive<Cursor<Vec<u8>>> {
        Archive::from_storage(Cursor::new(Vec::new()), Mode::ReadWrite).unwrap()
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let bytes = read_write().into_inner().unwrap().into_inner();
        let mut archive = Archive::from_storage(Cursor::new(bytes), Mode::ReadOnly).unwrap();
        for result in [
            archive.add_file("a", "x"),
            archive.add_directory("d"),
            archive.set_comment("c"),
        ] {
            assert!(matches!(
                result,
                Err(Error::ModeViolation {
                    constraint: "writable",
                    ..
                })
            ));
        }
        assert!(archive.remove("a").unwrap_err().is_io());
    }

    #[test]
    fn test_streaming_rejects_update_and_remove() {
        let mut archive = Archive::streaming(Vec::new());
        archive.add_file("a.txt", "one").unwrap();
        let err = archive.add_file("a.txt", "two").unwrap_err();
        assert!(matches!(
            err,
            Error::ModeViolation {
                constraint: "seekable",
                ..
            }
        ));
        assert!(archive.remove("a.txt").unwrap_err().is_io());
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut archive = read_write();
        archive.add_file("a", "1").unwrap();
        archive.add_file("b", "2").unwrap();
        archive.add_file("a", "three").unwrap();
        assert_eq!(archive.list_directory("").unwrap(), ["a", "b"]);
        assert_eq!(archive.extract("a").unwrap(), b"three");
    }

    #[test]
    fn test_remove_missing() {
        let mut archive = read_write();
        assert!(matches!(
            archive.remove("nope"),
            Err(Error::EntryNotFound { .. })
        ));
    }

    #[test]
    fn test_comment_capacity() {
        let mut archive = read_write();
        assert!(
            archive
                .set_comment("x".repeat(65_536))
                .unwrap_err()
                .is_capacity()
        );
        archive.set_comment("x".repeat(65_535)).unwrap();
        let long = EntryOptions::new().comment("y".repeat(70_000));
        assert!(archive.add_file_with("f", "", long).unwrap_err().is_capacity());
    }
}
