//! Directory queries.

use super::Archive;
use crate::archive_path::lookup_key;
use crate::read::{Entry, EntryTable, decode_text};
use crate::storage::Storage;
use crate::{Error, Result};

impl<S: Storage> Archive<S> {
    /// Returns `true` if an entry exists at `path`.
    ///
    /// A directory matches with or without its trailing slash, so
    /// `exists("docs")` finds `docs/`.
    pub fn exists(&self, path: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.find(path).is_some())
    }

    /// Returns every entry path that starts with `prefix` as a literal
    /// string, in archive order.
    ///
    /// `list_directory("")` lists everything. The prefix is not normalized:
    /// `list_directory("docs")` also matches `docsx.txt`.
    pub fn list_directory(&self, prefix: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.entries.paths_with_prefix(prefix))
    }

    /// Looks up an entry's metadata.
    pub fn entry(&self, path: &str) -> Result<&Entry> {
        self.ensure_open()?;
        self.find(path).ok_or_else(|| Error::EntryNotFound {
            path: path.to_string(),
        })
    }

    /// All entries, in central directory order.
    pub fn entries(&self) -> &EntryTable {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The archive comment.
    pub fn comment(&self) -> String {
        decode_text(&self.comment)
    }

    pub(super) fn find(&self, path: &str) -> Option<&Entry> {
        let key = lookup_key(path);
        if let Some(entry) = self.entries.get(&key) {
            return Some(entry);
        }
        if key.ends_with('/') {
            self.entries.get(key.trim_end_matches('/'))
        } else {
            self.entries.get(&format!("{key}/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Archive, Mode};
    use std::io::Cursor;

    fn sample() -> Archive<Cursor<Vec<u8>>> {
        let mut archive = Archive::from_storage(Cursor::new(Vec::new()), Mode::ReadWrite).unwrap();
        archive.add_directory("docs").unwrap();
        archive.add_file("docs/readme.txt", "hi").unwrap();
        archive.add_file("docsx.txt", "x").unwrap();
        archive
    }

    #[test]
    fn test_exists_matches_directories_loosely() {
        let archive = sample();
        assert!(archive.exists("docs").unwrap());
        assert!(archive.exists("docs/").unwrap());
        assert!(archive.exists("/docs/readme.txt").unwrap());
        assert!(!archive.exists("readme.txt").unwrap());
    }

    #[test]
    fn test_list_directory_is_literal_prefix() {
        let archive = sample();
        assert_eq!(
            archive.list_directory("docs/").unwrap(),
            ["docs/", "docs/readme.txt"]
        );
        assert_eq!(archive.list_directory("docs").unwrap().len(), 3);
        assert!(archive.list_directory("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_entry_not_found() {
        let archive = sample();
        assert!(archive.entry("missing").unwrap_err().is_format());
        assert_eq!(archive.entry("docs/readme.txt").unwrap().body_size_raw, 2);
    }
}
