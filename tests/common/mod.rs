//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Cursor;

use pkarchive::format::{
    CentralDirectoryRecord, EndOfCentralDirectory, LocalFileHeader, VERSION_MADE_BY,
    VERSION_NEEDED, attributes,
};
use pkarchive::{Archive, DosDateTime, Mode, WriteOptions, WriteResult};

/// Builds an in-memory archive through the read-write facade.
///
/// Names ending in `/` are added as directories, everything else as files.
pub fn create_archive_with_result(
    options: Option<WriteOptions>,
    entries: &[(&str, &[u8])],
) -> pkarchive::Result<(Vec<u8>, WriteResult)> {
    let mut bytes = Vec::new();
    let result = {
        let mut archive = Archive::from_storage(Cursor::new(&mut bytes), Mode::ReadWrite)?;
        if let Some(options) = options {
            archive.set_write_options(options);
        }
        for (name, data) in entries {
            if name.ends_with('/') {
                archive.add_directory(name)?;
            } else {
                archive.add_file(name, *data)?;
            }
        }
        archive.finish()?
    };
    Ok((bytes, result))
}

/// Builds an in-memory archive with default options.
pub fn create_archive(entries: &[(&str, &[u8])]) -> pkarchive::Result<Vec<u8>> {
    create_archive_with_result(None, entries).map(|(bytes, _)| bytes)
}

/// Builds an in-memory archive through the streaming writer.
pub fn create_streamed_archive(
    options: Option<WriteOptions>,
    entries: &[(&str, &[u8])],
) -> pkarchive::Result<Vec<u8>> {
    let mut archive = Archive::streaming(Vec::new());
    if let Some(options) = options {
        archive.set_write_options(options);
    }
    for (name, data) in entries {
        if name.ends_with('/') {
            archive.add_directory(name)?;
        } else {
            archive.add_file(name, *data)?;
        }
    }
    Ok(archive.into_inner()?.into_inner())
}

/// Opens archive bytes read-only.
pub fn open(bytes: &[u8]) -> Archive<Cursor<Vec<u8>>> {
    Archive::from_storage(Cursor::new(bytes.to_vec()), Mode::ReadOnly)
        .expect("Failed to open archive")
}

/// Opens the archive and checks every listed file decodes to its data.
pub fn verify_archive_contents(bytes: &[u8], expected: &[(&str, &[u8])]) {
    let mut archive = open(bytes);
    assert_eq!(archive.len(), expected.len(), "entry count mismatch");
    for (name, data) in expected {
        if name.ends_with('/') {
            assert!(archive.entry(name).unwrap().is_directory());
        } else {
            let extracted = archive
                .extract(name)
                .unwrap_or_else(|e| panic!("Failed to extract {}: {}", name, e));
            assert_eq!(&extracted, data, "content mismatch for {}", name);
        }
    }
}

/// Hand-assembles a single-entry archive around an already-encoded body.
///
/// Used for methods the writer does not produce and for deliberately
/// inconsistent records.
pub fn raw_archive(name: &str, method: u16, body: &[u8], crc32: u32, size: u32) -> Vec<u8> {
    let modified = DosDateTime::from_unix_secs(1_718_454_644);
    let local = LocalFileHeader {
        version_needed: VERSION_NEEDED,
        flags: 0,
        method,
        modified,
        crc32,
        compressed_size: body.len() as u32,
        uncompressed_size: size,
        name: name.as_bytes().to_vec(),
        extra: Vec::new(),
    };
    let central = CentralDirectoryRecord {
        version_made_by: VERSION_MADE_BY,
        version_needed: VERSION_NEEDED,
        flags: 0,
        method,
        modified,
        crc32,
        compressed_size: body.len() as u32,
        uncompressed_size: size,
        external_attributes: attributes::FILE,
        local_header_offset: 0,
        name: name.as_bytes().to_vec(),
        ..Default::default()
    };

    let mut out = Vec::new();
    local.write_to(&mut out).unwrap();
    out.extend_from_slice(body);
    let cd_offset = out.len() as u32;
    central.write_to(&mut out).unwrap();
    let cd_size = out.len() as u32 - cd_offset;
    EndOfCentralDirectory::new(1, cd_size, cd_offset, Vec::new())
        .write_to(&mut out)
        .unwrap();
    out
}

/// Deterministic pseudo-random bytes.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    use rand::{Rng, SeedableRng, rngs::StdRng};
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.r#gen::<u8>()).collect()
}
