//! Write options and per-entry metadata.

use std::time::SystemTime;

use crate::codec::CompressionMethod;
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// Compression settings for new entries.
///
/// # Example
///
/// ```rust
/// use pkarchive::{CompressionMethod, WriteOptions};
///
/// let fast = WriteOptions::new().level(1);
/// let stored = WriteOptions::new().method(CompressionMethod::Store);
/// assert_eq!(stored.method, CompressionMethod::Store);
/// assert_eq!(fast.level, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Codec for file bodies. Only Store and Deflate can be written.
    pub method: CompressionMethod,
    /// Deflate level, 0-9.
    pub level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflate,
            level: 6,
        }
    }
}

impl WriteOptions {
    /// Creates options with Deflate at level 6.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the Deflate level, clamped to 9.
    pub fn level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Fails unless the method can be written.
    pub(crate) fn validate(&self) -> Result<()> {
        match self.method {
            CompressionMethod::Store | CompressionMethod::Deflate => Ok(()),
            CompressionMethod::Bzip2 => Err(Error::UnsupportedFeature {
                feature: "BZip2 compression",
            }),
            CompressionMethod::Lzma => Err(Error::UnsupportedFeature {
                feature: "LZMA compression",
            }),
        }
    }
}

/// Metadata for one added entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Entry comment, at most 65535 bytes.
    pub comment: String,
    /// Modification time; `None` means the time the entry is added.
    pub modified: Option<DosDateTime>,
}

impl EntryOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the modification time from a Unix timestamp.
    pub fn modified_at(mut self, unix_secs: i64) -> Self {
        self.modified = Some(DosDateTime::from_unix_secs(unix_secs));
        self
    }

    /// Sets the modification time from a `SystemTime`.
    pub fn modified(mut self, time: SystemTime) -> Self {
        self.modified = Some(DosDateTime::from_system_time(time));
        self
    }

    pub(crate) fn resolved_time(&self) -> DosDateTime {
        self.modified.unwrap_or_else(DosDateTime::now)
    }
}

/// Totals reported when an archive is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// File entries in the central directory.
    pub entries_written: usize,
    /// Directory entries in the central directory.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total compressed bytes.
    pub compressed_size: u64,
    /// Final length of the archive.
    pub archive_size: u64,
}

impl WriteResult {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }
}
