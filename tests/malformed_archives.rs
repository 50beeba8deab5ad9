//! Tests for malformed and unsupported archive handling.
//!
//! These tests verify that the scanner rejects damaged input with the
//! right error class, and that entries it cannot decode fail cleanly at
//! extraction time without leaving partial files behind.

mod common;

use std::io::Cursor;

use pkarchive::checksum::Crc32;
use pkarchive::format::signature;
use pkarchive::{Archive, Error, ErrorKind, ExtractOptions, Mode};

fn open_bytes(bytes: Vec<u8>) -> pkarchive::Result<Archive<Cursor<Vec<u8>>>> {
    Archive::from_storage(Cursor::new(bytes), Mode::ReadOnly)
}

#[test]
fn test_random_bytes_are_corrupt_record() {
    let err = open_bytes(b"this is not a zip archive".to_vec()).unwrap_err();
    match err {
        Error::CorruptRecord { offset, bytes, .. } => {
            assert_eq!(offset, 0);
            assert_eq!(bytes, b"this");
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
}

#[test]
fn test_garbage_after_entry_reports_offset() {
    let mut bytes = common::create_archive(&[("a.txt", b"hello")]).unwrap();
    let cd_offset = {
        let archive = common::open(&bytes);
        let entry = archive.entry("a.txt").unwrap();
        (entry.position + entry.span()) as usize
    };
    bytes[cd_offset..cd_offset + 4].copy_from_slice(b"JUNK");

    let err = open_bytes(bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err, Error::CorruptRecord { offset, .. } if offset == cd_offset as u64));
}

#[test]
fn test_zip64_end_record_is_unsupported() {
    let mut bytes = signature::ZIP64_END_OF_CENTRAL_DIRECTORY.to_vec();
    bytes.extend_from_slice(&[0u8; 52]);

    let err = open_bytes(bytes).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFeature { .. }));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_zip64_size_escape_is_unsupported() {
    let mut bytes = common::raw_archive("big.bin", 0, b"", 0, 0);
    // Compressed size field of the local header.
    bytes[18..22].copy_from_slice(&u32::MAX.to_le_bytes());

    let err = open_bytes(bytes).unwrap_err();
    assert!(err.is_unsupported(), "got {:?}", err);
}

#[test]
fn test_multi_disk_is_unsupported() {
    let mut bytes = common::create_archive(&[("a.txt", b"hello")]).unwrap();
    let eocd = bytes.len() - 22;
    // Number of this disk.
    bytes[eocd + 4..eocd + 6].copy_from_slice(&1u16.to_le_bytes());

    let err = open_bytes(bytes).unwrap_err();
    assert!(err.is_unsupported(), "got {:?}", err);
}

#[test]
fn test_truncated_end_record() {
    let mut bytes = common::create_archive(&[("a.txt", b"hello")]).unwrap();
    bytes.truncate(bytes.len() - 10);

    let err = open_bytes(bytes).unwrap_err();
    assert!(err.is_format(), "got {:?}", err);
}

#[test]
fn test_body_past_end_of_stream() {
    let mut bytes = common::raw_archive("a.txt", 0, b"hello", Crc32::compute(b"hello"), 5);
    // Claim a larger stored body than the archive holds.
    bytes[18..22].copy_from_slice(&10_000u32.to_le_bytes());

    let err = open_bytes(bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)), "got {:?}", err);
}

#[test]
fn test_oversized_deflate_body_stops_at_declared_size() {
    use std::io::Write;

    let data = vec![0u8; 16 * 1024 * 1024];
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(&data).unwrap();
    let body = encoder.finish().unwrap();

    let bytes = common::raw_archive("manifest.json", 8, &body, Crc32::compute(&data), 5);
    let mut archive = open_bytes(bytes).unwrap();
    let err = archive.extract("manifest.json").unwrap_err();
    assert!(err.is_format(), "got {:?}", err);
    assert!(err.to_string().contains("declared size of 5 bytes"));

    // The streaming path writes no more than the declared size either.
    let mut sink = Vec::new();
    assert!(archive.extract_to_writer("manifest.json", &mut sink).is_err());
    assert!(sink.len() <= 5);
}

#[test]
fn test_central_offset_mismatch_uses_scanned_header() {
    let body = b"hello";
    let mut bytes = common::raw_archive("a.txt", 0, body, Crc32::compute(body), 5);
    let eocd = bytes.len() - 22;
    let cd = u32::from_le_bytes(bytes[eocd + 16..eocd + 20].try_into().unwrap()) as usize;
    // Local header offset field of the central record.
    bytes[cd + 42..cd + 46].copy_from_slice(&7u32.to_le_bytes());

    let mut archive = open_bytes(bytes).unwrap();
    assert_eq!(archive.entry("a.txt").unwrap().position, 0);
    assert_eq!(archive.extract("a.txt").unwrap(), body);
}

#[test]
fn test_unknown_method_lists_but_does_not_extract() {
    let body = b"opaque";
    let bytes = common::raw_archive("mystery.bin", 99, body, Crc32::compute(body), 6);

    let mut archive = open_bytes(bytes).unwrap();
    assert_eq!(archive.len(), 1);
    let entry = archive.entry("mystery.bin").unwrap();
    assert_eq!(entry.method, 99);
    assert!(entry.compression().is_none());

    let err = archive.extract("mystery.bin").unwrap_err();
    assert!(matches!(err, Error::UnsupportedMethod { method: 99 }));
    assert!(err.is_unsupported());
}

#[test]
fn test_unknown_method_leaves_no_partial_file() {
    let body = b"opaque";
    let bytes = common::raw_archive("mystery.bin", 99, body, Crc32::compute(body), 6);
    let mut archive = open_bytes(bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("mystery.bin");
    assert!(archive.extract_to("mystery.bin", &target).is_err());
    assert!(!target.exists());

    let out = dir.path().join("all");
    assert!(
        archive
            .extract_all(&out, &ExtractOptions::default())
            .is_err()
    );
    assert!(!out.join("mystery.bin").exists());
}

#[test]
fn test_crc_mismatch_detected() {
    let body = b"payload";
    let bytes = common::raw_archive("a.txt", 0, body, 0xDEAD_BEEF, 7);
    let mut archive = open_bytes(bytes).unwrap();

    let err = archive.extract("a.txt").unwrap_err();
    match err {
        Error::CrcMismatch {
            path,
            expected,
            actual,
        } => {
            assert_eq!(path, "a.txt");
            assert_eq!(expected, 0xDEAD_BEEF);
            assert_eq!(actual, Crc32::compute(body));
        }
        other => panic!("expected CrcMismatch, got {:?}", other),
    }

    // Verification can be disabled for bulk extraction.
    let dir = tempfile::tempdir().unwrap();
    let result = archive
        .extract_all(dir.path(), &ExtractOptions::new().verify_crc(false))
        .unwrap();
    assert_eq!(result.files, 1);
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), body);
}

#[test]
fn test_encrypted_entry_is_unsupported() {
    let body = b"ciphertext";
    let mut bytes = common::raw_archive("secret.txt", 0, body, 0, 10);
    // Set bit 0 in the local header and central directory flags.
    bytes[6] |= 1;
    let eocd = bytes.len() - 22;
    let cd = u32::from_le_bytes(bytes[eocd + 16..eocd + 20].try_into().unwrap()) as usize;
    bytes[cd + 8] |= 1;

    let mut archive = open_bytes(bytes).unwrap();
    assert!(archive.entry("secret.txt").unwrap().is_encrypted());
    let err = archive.extract("secret.txt").unwrap_err();
    assert!(matches!(err, Error::UnsupportedFeature { .. }));
}

#[test]
fn test_path_traversal_rejected_before_writing() {
    let body = b"escape";
    let bytes = common::raw_archive("../evil.txt", 0, body, Crc32::compute(body), 6);
    let mut archive = open_bytes(bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("inner");
    let err = archive
        .extract_all(&dest, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }));
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn test_local_entries_without_central_directory() {
    let bytes = common::create_archive(&[("a.txt", b"hello")]).unwrap();
    let archive = common::open(&bytes);
    let end = archive.entry("a.txt").unwrap().span() as usize;
    drop(archive);

    // Cut the central directory and end record off entirely.
    let mut archive = open_bytes(bytes[..end].to_vec()).unwrap();
    assert_eq!(archive.extract("a.txt").unwrap(), b"hello");
}
