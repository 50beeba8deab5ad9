//! Archive reading: the entry model, the sequential scanner, and
//! extraction.
//!
//! The facade in [`crate::archive`] drives these pieces; they are public so
//! that tools can scan a stream without going through an [`Archive`](crate::Archive).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::fs::File;
//! use pkarchive::read::scan;
//!
//! let mut file = File::open("bundle.zip")?;
//! let result = scan(&mut file)?;
//! for entry in &result.entries {
//!     println!("{} ({} bytes)", entry.path, entry.body_size_raw);
//! }
//! # Ok::<(), pkarchive::Error>(())
//! ```

mod entries;
mod entry;
pub(crate) mod extraction;
mod options;
mod scanner;

pub use entries::EntryTable;
pub use entry::{Entry, EntryKind};
pub use extraction::ExtractResult;
pub use options::{ExtractOptions, OverwritePolicy};
pub use scanner::{ScanResult, ScanState, scan};

pub(crate) use scanner::decode_text;
