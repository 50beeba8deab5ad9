//! The archive facade.
//!
//! An [`Archive`] owns one backing stream for its whole life and gates every
//! operation on the [`Mode`] it was opened with:
//!
//! | Mode | readable | writable | seekable |
//! |------|----------|----------|----------|
//! | [`Mode::ReadOnly`] | yes | no | yes |
//! | [`Mode::StreamingWrite`] | no | yes | no |
//! | [`Mode::ReadWrite`] | yes | yes | yes |
//!
//! Streaming archives flush each entry as it is added and can never revisit
//! it. Read-write archives defer all writes to [`Archive::close`], which
//! writes the central directory exactly once. If an archive is dropped
//! without being closed, `Drop` finalizes it and logs any failure; call
//! `close` to see the error instead.

mod edit;
mod extract;
mod open;
mod query;

use std::fmt;
use std::fs::File;
use std::io::Write;

use crate::read::EntryTable;
use crate::storage::Storage;
use crate::write::{BufferedWriter, StreamingWriter, WriteOptions, WriteResult, summarize};
use crate::{Error, Result};

/// How an archive was opened. Fixed for the archive's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Scan an existing archive and extract from it.
    ReadOnly,
    /// Write a new archive front to back without seeking.
    StreamingWrite,
    /// Scan (if non-empty), then add, replace and remove entries; everything
    /// is written at close.
    ReadWrite,
}

impl Mode {
    /// True unless streaming.
    pub fn is_readable(self) -> bool {
        self != Mode::StreamingWrite
    }

    /// True unless read-only.
    pub fn is_writable(self) -> bool {
        self != Mode::ReadOnly
    }

    /// True unless streaming.
    pub fn is_seekable(self) -> bool {
        self != Mode::StreamingWrite
    }

    /// Returns the mode's display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::ReadOnly => "read-only",
            Mode::StreamingWrite => "streaming-write",
            Mode::ReadWrite => "read-write",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write strategy selected by the mode.
#[derive(Debug)]
enum Strategy {
    Read,
    Streaming(StreamingWriter),
    Buffered(BufferedWriter),
}

/// A ZIP archive bound to one backing stream.
///
/// # Example
///
/// ```rust,no_run
/// use pkarchive::{Archive, Mode};
///
/// let mut archive = Archive::open("bundle.zip", Mode::ReadWrite)?;
/// archive.add_directory("docs/")?;
/// archive.add_file("docs/readme.txt", "hi")?;
/// archive.close()?;
///
/// let mut archive = Archive::open("bundle.zip", Mode::ReadOnly)?;
/// assert_eq!(archive.extract("docs/readme.txt")?, b"hi");
/// # Ok::<(), pkarchive::Error>(())
/// ```
pub struct Archive<S: Storage = File> {
    handle: Option<S>,
    mode: Mode,
    entries: EntryTable,
    comment: Vec<u8>,
    strategy: Strategy,
    write_options: WriteOptions,
    /// Whether close must rewrite the central directory.
    dirty: bool,
}

impl<S: Storage> Archive<S> {
    fn with_parts(handle: S, mode: Mode, entries: EntryTable, comment: Vec<u8>, dirty: bool) -> Self {
        let strategy = match mode {
            Mode::ReadOnly => Strategy::Read,
            Mode::StreamingWrite => Strategy::Streaming(StreamingWriter::new()),
            Mode::ReadWrite => Strategy::Buffered(BufferedWriter::new()),
        };
        Self {
            handle: Some(handle),
            mode,
            entries,
            comment,
            strategy,
            write_options: WriteOptions::default(),
            dirty,
        }
    }

    /// The mode the archive was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True unless streaming.
    pub fn is_readable(&self) -> bool {
        self.mode.is_readable()
    }

    /// True unless read-only.
    pub fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// True unless streaming.
    pub fn is_seekable(&self) -> bool {
        self.mode.is_seekable()
    }

    /// Returns `true` once the handle has been released.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Compression settings used by subsequent `add_file` calls.
    pub fn write_options(&self) -> WriteOptions {
        self.write_options
    }

    /// Replaces the compression settings for subsequent `add_file` calls.
    pub fn set_write_options(&mut self, options: WriteOptions) {
        self.write_options = options;
    }

    /// Finalizes the archive and releases the handle.
    ///
    /// For streaming archives this writes the central directory. For
    /// read-write archives it compacts the stream, appends pending entries,
    /// truncates, and writes the central directory. The handle is released
    /// even if finalization fails; later operations return
    /// [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        self.finish_in_place().map(|_| ())
    }

    /// Like [`close`](Self::close), returning totals for what was written.
    pub fn finish(mut self) -> Result<WriteResult> {
        self.finish_in_place()
    }

    /// Finalizes the archive and returns the backing stream.
    pub fn into_inner(mut self) -> Result<S> {
        let result = self.finalize();
        let handle = self.handle.take();
        result?;
        handle.ok_or(Error::Closed)
    }

    fn finish_in_place(&mut self) -> Result<WriteResult> {
        let result = self.finalize();
        self.handle = None;
        result
    }

    fn finalize(&mut self) -> Result<WriteResult> {
        let handle = self.handle.as_mut().ok_or(Error::Closed)?;
        match &mut self.strategy {
            Strategy::Read => Ok(summarize(&self.entries, 0)),
            Strategy::Streaming(writer) => {
                let len = writer.finish(handle, &self.entries, &self.comment)?;
                log::debug!("finished streaming archive: {} entries", self.entries.len());
                Ok(summarize(&self.entries, len))
            }
            Strategy::Buffered(writer) => {
                if !self.dirty && !writer.has_pending() {
                    handle.flush()?;
                    return Ok(summarize(&self.entries, 0));
                }
                let len = writer.commit(handle, &mut self.entries, &self.comment)?;
                self.dirty = false;
                log::debug!(
                    "committed archive: {} entries, {} bytes",
                    self.entries.len(),
                    len
                );
                Ok(summarize(&self.entries, len))
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn ensure_readable(&self, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_readable() {
            return Err(Error::mode_violation(operation, "readable", self.mode));
        }
        Ok(())
    }

    fn ensure_writable(&self, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_writable() {
            return Err(Error::mode_violation(operation, "writable", self.mode));
        }
        Ok(())
    }

    fn ensure_seekable(&self, operation: &'static str) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_seekable() {
            return Err(Error::mode_violation(operation, "seekable", self.mode));
        }
        Ok(())
    }
}

impl<S: Storage> Drop for Archive<S> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.finalize() {
                log::warn!("failed to finalize {} archive on drop: {}", self.mode, e);
            }
            self.handle = None;
        }
    }
}

impl<S: Storage> fmt::Debug for Archive<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
