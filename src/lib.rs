//! # pkarchive
//!
//! A pure-Rust engine for reading and writing ZIP archives (PKWARE APPNOTE
//! 4.5, without Zip64 or spanning).
//!
//! An [`Archive`] owns one backing stream and is opened in one of three
//! [`Mode`]s:
//!
//! - [`Mode::ReadOnly`]: the stream is scanned front to back and entries can
//!   be extracted.
//! - [`Mode::StreamingWrite`]: each entry is written as soon as it is added,
//!   followed by a data descriptor. The stream is never read or sought, so a
//!   pipe or socket works.
//! - [`Mode::ReadWrite`]: existing entries are scanned; additions,
//!   replacements and removals are held until [`Archive::close`], which
//!   writes everything and the central directory once.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use pkarchive::{Archive, EntryOptions, Mode, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open("bundle.zip", Mode::ReadWrite)?;
//!     archive.add_directory("docs/")?;
//!     archive.add_file("docs/readme.txt", "hi")?;
//!     archive.add_file_with(
//!         "manifest.json",
//!         r#"{"name": "demo"}"#,
//!         EntryOptions::new().comment("package metadata"),
//!     )?;
//!     archive.set_comment("release v1")?;
//!     archive.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Extracting an Archive
//!
//! ```rust,no_run
//! use pkarchive::{Archive, ExtractOptions, Mode, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open("bundle.zip", Mode::ReadOnly)?;
//!     if archive.exists("manifest.json")? {
//!         let manifest = archive.extract("manifest.json")?;
//!         println!("{}", String::from_utf8_lossy(&manifest));
//!     }
//!     archive.extract_all("./install", &ExtractOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! ### Streaming to a Pipe
//!
//! ```rust,no_run
//! use pkarchive::{Archive, EntrySource, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::streaming(std::io::stdout().lock());
//!     archive.add_file("log.txt", EntrySource::reader(std::io::stdin()))?;
//!     archive.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Errors fall into four classes,
//! reported by [`Error::kind`]:
//!
//! ```rust,no_run
//! use pkarchive::{Archive, ErrorKind, Mode};
//!
//! match Archive::open("bundle.zip", Mode::ReadOnly) {
//!     Ok(archive) => println!("{} entries", archive.len()),
//!     Err(e) if e.kind() == ErrorKind::Io => eprintln!("cannot open: {}", e),
//!     Err(e) if e.kind() == ErrorKind::Format => eprintln!("not a valid ZIP: {}", e),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `bzip2` | Yes | BZip2 decompression (method 12) |
//! | `lzma` | Yes | LZMA decompression (method 14) |
//! | `cli` | No | The `pkarchive` command-line tool |
//!
//! Store and Deflate are always available and are the only methods the
//! writer produces.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Buffer size for measuring deflate bodies and for moving entries during
/// compaction (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

mod archive;
pub mod archive_path;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod format;
pub mod read;
pub mod storage;
pub mod timestamp;
pub mod write;

pub use archive::{Archive, Mode};
pub use archive_path::ArchivePath;
pub use codec::CompressionMethod;
pub use error::{Error, ErrorKind, Result};
pub use read::{Entry, EntryKind, EntryTable, ExtractOptions, ExtractResult, OverwritePolicy};
pub use storage::{Sink, Storage};
pub use timestamp::DosDateTime;
pub use write::{EntryOptions, EntrySource, WriteOptions, WriteResult};
