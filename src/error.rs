//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with ZIP archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Classes
//!
//! Every variant belongs to exactly one [`ErrorKind`]:
//!
//! | Class | Variants | Typical Cause |
//! |-------|----------|---------------|
//! | I/O | [`Io`][Error::Io], [`ModeViolation`][Error::ModeViolation], [`Closed`][Error::Closed] | File system failures, calling an operation the open mode forbids |
//! | Format | [`InvalidFormat`][Error::InvalidFormat], [`CorruptRecord`][Error::CorruptRecord], [`CrcMismatch`][Error::CrcMismatch], [`EntryNotFound`][Error::EntryNotFound], [`InvalidArchivePath`][Error::InvalidArchivePath], [`PathTraversal`][Error::PathTraversal] | Malformed or inconsistent archive data |
//! | Unsupported | [`UnsupportedMethod`][Error::UnsupportedMethod], [`UnsupportedFeature`][Error::UnsupportedFeature] | Zip64, multi-disk, encryption, unknown codecs |
//! | Capacity | [`CapacityExceeded`][Error::CapacityExceeded] | Comments or names longer than a 16-bit length field allows |
//!
//! No operation retries or rolls back. A malformed archive aborts the whole
//! read pass, and a failed write leaves the target incomplete; callers that
//! need atomic replacement should write to a temporary path and rename it.
//!
//! ## Using the `?` Operator
//!
//! ```rust,no_run
//! use pkarchive::{Archive, Mode, Result};
//!
//! fn read_manifest(path: &str) -> Result<Vec<u8>> {
//!     let mut archive = Archive::open(path, Mode::ReadOnly)?;
//!     archive.extract("manifest.json")
//! }
//! ```
//!
//! ## Matching on the Error Class
//!
//! ```rust,no_run
//! use pkarchive::{Archive, ErrorKind, Mode};
//!
//! match Archive::open("bundle.zip", Mode::ReadOnly) {
//!     Ok(_) => {}
//!     Err(e) => match e.kind() {
//!         ErrorKind::Io => eprintln!("cannot read bundle: {}", e),
//!         ErrorKind::Format => eprintln!("bundle is damaged: {}", e),
//!         ErrorKind::Unsupported => eprintln!("bundle needs a newer tool: {}", e),
//!         ErrorKind::Capacity => eprintln!("bundle metadata too large: {}", e),
//!     },
//! }
//! ```

use std::io;

use crate::archive::Mode;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The underlying target could not be opened, read or written, the
    /// archive was already closed, or the open mode forbids the operation.
    Io,
    /// The archive data is malformed or internally inconsistent.
    Format,
    /// The archive uses Zip64, spanning, encryption or an unknown codec.
    Unsupported,
    /// A variable-length field exceeds what the format can store.
    Capacity,
}

/// Helper struct for formatting CorruptRecord error messages.
struct CorruptRecordDisplay<'a> {
    offset: u64,
    bytes: &'a [u8],
    reason: &'a str,
}

impl std::fmt::Display for CorruptRecordDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Corrupt record at offset {:#x}: {}", self.offset, self.reason)?;
        if !self.bytes.is_empty() {
            write!(f, " (bytes:")?;
            for b in self.bytes {
                write!(f, " {:02x}", b)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// The main error type for ZIP archive operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred on the underlying target.
    ///
    /// Opening a missing path in [`Mode::ReadOnly`] surfaces here with
    /// [`io::ErrorKind::NotFound`].
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation is not permitted by the archive's open mode.
    ///
    /// Writing to a read-only archive, or deleting/updating entries in a
    /// streaming archive, fails with this error.
    #[error("{operation} requires a {constraint} archive, but it was opened as {mode}")]
    ModeViolation {
        /// The operation that was attempted.
        operation: &'static str,
        /// The capability the operation needs (`readable`, `writable`, `seekable`).
        constraint: &'static str,
        /// The mode the archive was opened with.
        mode: Mode,
    },

    /// The archive has already been closed.
    #[error("archive is closed")]
    Closed,

    /// An earlier streaming write failed after some of its bytes reached the
    /// sink, so the output can no longer be finished correctly.
    #[error("streaming write of '{path}' failed partway; the output is incomplete")]
    Broken {
        /// The entry whose write failed.
        path: String,
    },

    /// The data is not a ZIP archive or violates the format's structure.
    #[error("Invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A record boundary holds bytes that do not decode as a known record.
    ///
    /// Carries the stream offset and the raw bytes found there so that a
    /// damaged archive can be inspected with a hex viewer.
    #[error("{}", CorruptRecordDisplay { offset: *offset, bytes, reason })]
    CorruptRecord {
        /// Offset of the offending record in the stream.
        offset: u64,
        /// Raw bytes found at the offset (usually the 4-byte magic).
        bytes: Vec<u8>,
        /// A description of what went wrong.
        reason: String,
    },

    /// The extracted payload does not match its stored CRC32.
    #[error("CRC mismatch for {path}: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Path of the entry.
        path: String,
        /// CRC32 stored in the archive.
        expected: u32,
        /// CRC32 of the extracted bytes.
        actual: u32,
    },

    /// No entry with the given path exists.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// An entry path is empty, contains NUL bytes or `.`/`..` segments.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// Extracting the entry would write outside the destination directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The offending entry path.
        path: String,
    },

    /// The entry uses a compression method this build cannot handle.
    ///
    /// Known method codes:
    /// - `0`: Store
    /// - `8`: Deflate
    /// - `12`: BZip2 (requires the `bzip2` feature)
    /// - `14`: LZMA (requires the `lzma` feature)
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The numeric method code.
        method: u16,
    },

    /// The archive uses a format extension that is deliberately unsupported.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// A variable-length field does not fit its 16-bit length prefix.
    #[error("{what} is {len} bytes, the format allows at most {max}")]
    CapacityExceeded {
        /// Which field overflowed (e.g. `archive comment`).
        what: &'static str,
        /// The rejected length in bytes.
        len: usize,
        /// The maximum the format can store.
        max: usize,
    },
}

impl Error {
    /// Returns the class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::ModeViolation { .. } | Error::Closed | Error::Broken { .. } => {
                ErrorKind::Io
            }
            Error::UnsupportedMethod { .. } | Error::UnsupportedFeature { .. } => {
                ErrorKind::Unsupported
            }
            Error::CapacityExceeded { .. } => ErrorKind::Capacity,
            Error::InvalidFormat(_)
            | Error::CorruptRecord { .. }
            | Error::CrcMismatch { .. }
            | Error::EntryNotFound { .. }
            | Error::InvalidArchivePath(_)
            | Error::PathTraversal { .. } => ErrorKind::Format,
        }
    }

    /// Returns `true` for I/O-class errors, including mode violations.
    pub fn is_io(&self) -> bool {
        self.kind() == ErrorKind::Io
    }

    /// Returns `true` for malformed or inconsistent archive data.
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Returns `true` if this error is related to unsupported features or methods.
    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unsupported
    }

    /// Returns `true` if a field exceeded the format's capacity.
    pub fn is_capacity(&self) -> bool {
        self.kind() == ErrorKind::Capacity
    }

    /// Returns the entry path associated with this error, if any.
    pub fn entry_path(&self) -> Option<&str> {
        match self {
            Error::CrcMismatch { path, .. }
            | Error::EntryNotFound { path }
            | Error::PathTraversal { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Returns the method code if this is an unsupported method error.
    pub fn method(&self) -> Option<u16> {
        match self {
            Error::UnsupportedMethod { method } => Some(*method),
            _ => None,
        }
    }

    /// Creates a CorruptRecord error.
    pub fn corrupt_record(offset: u64, bytes: &[u8], reason: impl Into<String>) -> Self {
        Error::CorruptRecord {
            offset,
            bytes: bytes.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mode_violation(
        operation: &'static str,
        constraint: &'static str,
        mode: Mode,
    ) -> Self {
        Error::ModeViolation {
            operation,
            constraint,
            mode,
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
