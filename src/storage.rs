//! Backing streams for an [`Archive`](crate::Archive).

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A stream an archive can own.
///
/// Read-only and read-write archives need all of `Read + Write + Seek`
/// plus [`truncate`](Storage::truncate), which the close protocol uses to
/// drop stale bytes after compaction. Streaming archives only ever call
/// `write` and `flush`, so any `Write` can be used through [`Sink`].
pub trait Storage: Read + Write + Seek {
    /// Shortens (or extends) the stream to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Returns `false` for write-only adapters.
    fn is_seekable(&self) -> bool {
        true
    }
}

impl Storage for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }
}

impl Storage for Cursor<&mut Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate(len)
    }

    fn is_seekable(&self) -> bool {
        (**self).is_seekable()
    }
}

/// Adapts a plain writer (pipe, socket, `Vec<u8>`) for streaming-write
/// archives. Reading and seeking fail with [`io::ErrorKind::Unsupported`].
#[derive(Debug)]
pub struct Sink<W> {
    inner: W,
}

impl<W: Write> Sink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Borrows the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what} is not supported on a write-only sink"),
    )
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Read for Sink<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("reading"))
    }
}

impl<W: Write> Seek for Sink<W> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(unsupported("seeking"))
    }
}

impl<W: Write> Storage for Sink<W> {
    fn truncate(&mut self, _len: u64) -> io::Result<()> {
        Err(unsupported("truncation"))
    }

    fn is_seekable(&self) -> bool {
        false
    }
}
