//! Insertion-ordered entry table.
//!
//! Entries are kept in a `Vec` in the order they were scanned or added, with
//! a path-to-index map alongside for lookups. The central directory is
//! emitted in vector order, so output never depends on hashing.

use std::collections::HashMap;

use super::Entry;

/// The archive's directory of entries.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl EntryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if an entry with exactly this path exists.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Looks up an entry by exact path.
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Looks up an entry by exact path for modification.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Entry> {
        match self.index.get(path) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    /// Inserts an entry, or replaces an existing one with the same path in
    /// place (keeping its position in the order). Returns the replaced
    /// entry, if any.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        match self.index.get(&entry.path) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            None => {
                self.index.insert(entry.path.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Removes an entry by path, preserving the order of the rest.
    pub fn remove(&mut self, path: &str) -> Option<Entry> {
        let i = self.index.remove(path)?;
        let removed = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Iterates over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Iterates mutably over entries in order.
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    /// Returns the entries as a slice, in order.
    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns every path that starts with `prefix` as a literal string.
    pub fn paths_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.path.starts_with(prefix))
            .map(|e| e.path.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a EntryTable {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
