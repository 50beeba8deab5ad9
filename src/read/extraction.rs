//! Entry extraction.
//!
//! These functions work on any `Read + Seek` stream plus an [`Entry`]
//! describing where the body lives. The archive facade checks the open mode
//! and then delegates here.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use super::{Entry, EntryTable, ExtractOptions, OverwritePolicy};
use crate::checksum::{Crc32, Crc32Writer, verify_crc32};
use crate::codec::{self, CompressionMethod};
use crate::{Error, Result};

/// Counts of what [`extract_all`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Directories created (explicit directory entries only).
    pub directories: usize,
    /// Files written.
    pub files: usize,
    /// Files left alone because they already existed.
    pub skipped: usize,
    /// Decompressed bytes written.
    pub bytes: u64,
}

/// Fails if the entry cannot be decoded by this build.
///
/// Runs before any output is created so that an unsupported entry never
/// leaves a partial file behind.
pub(crate) fn check_extractable(entry: &Entry) -> Result<()> {
    if entry.is_encrypted() {
        return Err(Error::UnsupportedFeature {
            feature: "encrypted entries",
        });
    }
    let method = CompressionMethod::try_from(entry.method)?;
    if !method.is_available() {
        return Err(Error::UnsupportedFeature {
            feature: "compression method not compiled into this build",
        });
    }
    Ok(())
}

/// Decodes an entry fully into memory and verifies its CRC.
pub(crate) fn read_entry<R: Read + Seek>(reader: &mut R, entry: &Entry) -> Result<Vec<u8>> {
    check_extractable(entry)?;
    if entry.is_directory() {
        return Ok(Vec::new());
    }

    reader.seek(SeekFrom::Start(entry.body_offset()))?;
    let data = codec::decompress_buffered(
        reader,
        entry.method,
        entry.body_size as u64,
        entry.body_size_raw as u64,
    )?;

    if data.len() as u64 != entry.body_size_raw as u64 {
        return Err(Error::InvalidFormat(format!(
            "'{}' decoded to {} bytes, expected {}",
            entry.path,
            data.len(),
            entry.body_size_raw
        )));
    }
    verify_crc32(&entry.path, entry.crc32, Crc32::compute(&data))?;
    Ok(data)
}

/// Streams an entry into `sink` in fixed-size blocks.
///
/// Returns the number of bytes written.
pub(crate) fn copy_entry<R: Read + Seek, W: Write + ?Sized>(
    reader: &mut R,
    entry: &Entry,
    sink: &mut W,
    verify: bool,
) -> Result<u64> {
    check_extractable(entry)?;
    if entry.is_directory() {
        return Ok(0);
    }

    reader.seek(SeekFrom::Start(entry.body_offset()))?;
    let mut out = Crc32Writer::new(sink);
    let complete = codec::decompress_streamed(
        reader.by_ref().take(entry.body_size as u64),
        entry.method,
        entry.body_size_raw as u64,
        &mut out,
    )?;
    out.flush()?;

    if !complete {
        return Err(Error::InvalidFormat(format!(
            "'{}' is truncated: decoded {} of {} bytes",
            entry.path,
            out.bytes_written(),
            entry.body_size_raw
        )));
    }
    if verify {
        verify_crc32(&entry.path, entry.crc32, out.crc())?;
    }
    Ok(out.bytes_written())
}

/// Extracts one entry to a file at `target`.
///
/// The partial file is removed if decoding or verification fails.
pub(crate) fn extract_to_path<R: Read + Seek>(
    reader: &mut R,
    entry: &Entry,
    target: &Path,
    verify: bool,
) -> Result<u64> {
    check_extractable(entry)?;

    let file = File::create(target)?;
    let mut writer = BufWriter::new(file);
    let result = copy_entry(reader, entry, &mut writer, verify).and_then(|n| {
        writer.flush()?;
        Ok(n)
    });

    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(target) {
            log::warn!(
                "Failed to clean up partial file '{}': {}",
                target.display(),
                e
            );
        }
    }
    result
}

/// Resolves an entry path under `dest`, rejecting anything that would
/// escape it.
pub(crate) fn safe_destination(dest: &Path, entry_path: &str) -> Result<PathBuf> {
    let traversal = || Error::PathTraversal {
        path: entry_path.to_string(),
    };

    if entry_path.starts_with('/') || entry_path.starts_with('\\') || entry_path.contains('\0') {
        return Err(traversal());
    }

    let mut out = dest.to_path_buf();
    for segment in entry_path.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => out.push(name),
            _ => return Err(traversal()),
        }
    }
    Ok(out)
}

fn create_dir(path: &Path, mode: Option<u32>) -> Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}

/// Recreates the archive's tree under `dest`.
///
/// Every path is validated before anything is written. Directory entries
/// are created first, then files in archive order. `extract_file` writes
/// one file entry to its resolved target and returns the bytes written.
pub(crate) fn extract_all<F>(
    entries: &EntryTable,
    dest: &Path,
    options: &ExtractOptions,
    mut extract_file: F,
) -> Result<ExtractResult>
where
    F: FnMut(&Entry, &Path) -> Result<u64>,
{
    let mut plan = Vec::with_capacity(entries.len());
    for entry in entries {
        let target = safe_destination(dest, &entry.path)?;
        if entry.is_file() {
            check_extractable(entry)?;
        }
        plan.push((entry, target));
    }

    let mut result = ExtractResult::default();
    create_dir(dest, None)?;

    for (entry, target) in plan.iter().filter(|(e, _)| e.is_directory()) {
        log::debug!("creating directory '{}'", entry.path);
        create_dir(target, options.dir_permissions)?;
        result.directories += 1;
    }

    for (entry, target) in plan.iter().filter(|(e, _)| e.is_file()) {
        if target.exists() {
            match options.overwrite {
                OverwritePolicy::Error => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("'{}' already exists", target.display()),
                    )));
                }
                OverwritePolicy::Skip => {
                    result.skipped += 1;
                    continue;
                }
                OverwritePolicy::Overwrite => {}
            }
        }
        if let Some(parent) = target.parent() {
            create_dir(parent, None)?;
        }
        log::debug!("extracting '{}'", entry.path);
        result.bytes += extract_file(entry, target)?;
        result.files += 1;
    }

    Ok(result)
}
