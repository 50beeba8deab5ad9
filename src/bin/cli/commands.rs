//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use pkarchive::{
    Archive, CompressionMethod, EntryOptions, EntrySource, Error, ExtractOptions, Mode,
    OverwritePolicy, WriteOptions,
};

use crate::OverwriteMode;
use crate::exit_codes::{ExitCode, error_to_exit_code};

/// Configuration for the create command.
pub struct CreateConfig<'a> {
    pub archive_path: &'a Path,
    pub files: &'a [PathBuf],
    pub streaming: bool,
    pub level: u32,
    pub store: bool,
    pub comment: Option<&'a str>,
    pub quiet: bool,
}

fn report(error: &Error) -> ExitCode {
    eprintln!("Error: {}", error);
    error_to_exit_code(error)
}

fn open_archive(path: &Path) -> Result<Archive, ExitCode> {
    Archive::open(path, Mode::ReadOnly).map_err(|e| {
        eprintln!("Error opening '{}': {}", path.display(), e);
        error_to_exit_code(&e)
    })
}

/// List command implementation
pub fn list(archive_path: &Path, prefix: &str) -> ExitCode {
    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    println!(
        "{:>19}  {:>12}  {:>12}  {:<8}  Name",
        "Modified", "Size", "Compressed", "Method"
    );
    let mut total = 0u64;
    let mut count = 0usize;
    for entry in archive.entries().iter().filter(|e| e.path.starts_with(prefix)) {
        let (year, month, day) = entry.modified.date_parts();
        let (hour, minute, second) = entry.modified.time_parts();
        let method = entry
            .compression()
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| format!("#{}", entry.method));
        println!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}  {:>12}  {:>12}  {:<8}  {}",
            year,
            month,
            day,
            hour,
            minute,
            second,
            entry.body_size_raw,
            entry.body_size,
            method,
            entry.path
        );
        total += entry.body_size_raw as u64;
        count += 1;
    }
    println!("{} entries, {} bytes", count, total);

    let comment = archive.comment();
    if !comment.is_empty() {
        println!("Comment: {}", comment);
    }
    ExitCode::Success
}

/// Extract command implementation
pub fn extract(
    archive_path: &Path,
    output_dir: &Path,
    overwrite: OverwriteMode,
    verify: bool,
    quiet: bool,
) -> ExitCode {
    let mut archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let policy = match overwrite {
        OverwriteMode::Always => OverwritePolicy::Overwrite,
        OverwriteMode::Never => OverwritePolicy::Skip,
        OverwriteMode::Error => OverwritePolicy::Error,
    };
    let options = ExtractOptions::new().overwrite(policy).verify_crc(verify);

    match archive.extract_all(output_dir, &options) {
        Ok(result) => {
            if !quiet {
                println!(
                    "Extracted {} files and {} directories ({} bytes, {} skipped) to {}",
                    result.files,
                    result.directories,
                    result.bytes,
                    result.skipped,
                    output_dir.display()
                );
            }
            ExitCode::Success
        }
        Err(e) => report(&e),
    }
}

/// Test command implementation
pub fn test(archive_path: &Path, quiet: bool) -> ExitCode {
    let mut archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let paths: Vec<String> = archive
        .entries()
        .iter()
        .filter(|e| e.is_file())
        .map(|e| e.path.clone())
        .collect();

    let mut failures = 0usize;
    let mut worst = ExitCode::Success;
    for path in &paths {
        match archive.extract_to_writer(path, &mut io::sink()) {
            Ok(_) => {
                if !quiet {
                    println!("OK      {}", path);
                }
            }
            Err(e) => {
                println!("FAILED  {}: {}", path, e);
                failures += 1;
                worst = error_to_exit_code(&e);
            }
        }
    }

    if failures == 0 {
        if !quiet {
            println!("All {} files OK", paths.len());
        }
    } else {
        eprintln!("{} of {} files failed", failures, paths.len());
    }
    worst
}

/// Walks the inputs, returning (source, archive name, is_dir) triples in
/// the order they should be added.
fn collect_inputs(files: &[PathBuf]) -> Result<Vec<(PathBuf, String, bool)>, Error> {
    let mut inputs = Vec::new();
    for root in files {
        let base = root.parent().unwrap_or_else(|| Path::new(""));
        for item in WalkDir::new(root).sort_by_file_name() {
            let item = item.map_err(|e| Error::Io(io::Error::other(e)))?;
            let relative = item.path().strip_prefix(base).unwrap_or(item.path());
            let name = relative.to_string_lossy().replace('\\', "/");
            if name.is_empty() {
                continue;
            }
            inputs.push((
                item.path().to_path_buf(),
                name,
                item.file_type().is_dir(),
            ));
        }
    }
    Ok(inputs)
}

/// Create command implementation
pub fn create(config: &CreateConfig<'_>) -> ExitCode {
    let inputs = match collect_inputs(config.files) {
        Ok(inputs) => inputs,
        Err(e) => return report(&e),
    };

    let mode = if config.streaming {
        Mode::StreamingWrite
    } else {
        Mode::ReadWrite
    };
    let result = Archive::open(config.archive_path, mode).and_then(|mut archive| {
        if mode == Mode::ReadWrite && !archive.is_empty() {
            announce_update(config.archive_path, archive.len(), config.quiet);
        }
        let method = if config.store {
            CompressionMethod::Store
        } else {
            CompressionMethod::Deflate
        };
        archive.set_write_options(WriteOptions::new().method(method).level(config.level));
        if let Some(comment) = config.comment {
            archive.set_comment(comment)?;
        }

        for (source, name, is_dir) in &inputs {
            let modified = std::fs::metadata(source)
                .and_then(|m| m.modified())
                .ok();
            let mut options = EntryOptions::new();
            if let Some(time) = modified {
                options = options.modified(time);
            }
            if *is_dir {
                archive.add_directory_with(name, options)?;
            } else {
                let file = BufReader::new(File::open(source)?);
                archive.add_file_with(name, EntrySource::reader(file), options)?;
            }
            if !config.quiet {
                println!("  adding: {}", name);
            }
        }
        archive.finish()
    });

    match result {
        Ok(written) => {
            if !config.quiet {
                println!(
                    "Created {} ({} files, {} directories, {:.1}% of original size)",
                    config.archive_path.display(),
                    written.entries_written,
                    written.directories_written,
                    written.compression_ratio() * 100.0
                );
            }
            ExitCode::Success
        }
        Err(e) => report(&e),
    }
}

fn announce_update(path: &Path, existing: usize, quiet: bool) {
    if !quiet {
        println!(
            "Updating {} ({} existing entries)",
            path.display(),
            existing
        );
    }
}
