//! Streaming-write integration tests.
//!
//! A streaming archive is written front to back without seeking, every
//! entry followed by a data descriptor. These tests write into a plain
//! `Vec<u8>` (which cannot be read back or sought through the archive) and
//! then reopen the bytes with the sequential scanner.

mod common;

use std::io::{Cursor, Read};

use pkarchive::format::{DATA_DESCRIPTOR_SIZE, flags};
use pkarchive::{Archive, CompressionMethod, EntrySource, Error, Mode, WriteOptions};

#[test]
fn test_streamed_archive_reopens() {
    let entries: [(&str, &[u8]); 3] = [
        ("logs/", b""),
        ("logs/app.log", b"started\nrunning\nstopped\n"),
        ("empty.txt", b""),
    ];
    let bytes = common::create_streamed_archive(None, &entries).unwrap();
    common::verify_archive_contents(&bytes, &entries);
}

#[test]
fn test_every_entry_has_data_descriptor() {
    let bytes = common::create_streamed_archive(
        Some(WriteOptions::new().method(CompressionMethod::Store)),
        &[("dir/", b""), ("stored.txt", b"stored body")],
    )
    .unwrap();
    let archive = common::open(&bytes);
    for entry in archive.entries() {
        assert!(entry.has_data_descriptor(), "{} lacks bit 3", entry.path);
        assert_ne!(entry.flags & flags::DATA_DESCRIPTOR, 0);
    }
    // Stored bodies still carry their real sizes in the local header.
    let stored = archive.entry("stored.txt").unwrap();
    assert_eq!(stored.body_size, 11);
    assert_eq!(stored.body_size_raw, 11);
}

#[test]
fn test_deflate_sizes_come_from_descriptor() {
    let data = "streamed and deflated\n".repeat(200);
    let bytes = common::create_streamed_archive(None, &[("big.txt", data.as_bytes())]).unwrap();

    // Local header CRC and sizes are zero; the descriptor holds them.
    assert_eq!(&bytes[14..26], &[0u8; 12]);

    let mut archive = common::open(&bytes);
    let entry = archive.entry("big.txt").unwrap();
    assert_eq!(entry.body_size_raw as usize, data.len());
    assert!((entry.body_size as usize) < data.len());
    assert_eq!(archive.extract("big.txt").unwrap(), data.as_bytes());
}

#[test]
fn test_streaming_from_reader() {
    let data = common::noise(50_000, 11);
    let mut archive = Archive::streaming(Vec::new());
    archive
        .add_file("noise.bin", EntrySource::reader(Cursor::new(data.clone())))
        .unwrap();
    let result = archive.finish().unwrap();
    assert_eq!(result.entries_written, 1);
    assert_eq!(result.total_size, data.len() as u64);
}

/// Yields `limit` bytes of noise, then fails.
struct FailingReader {
    data: Cursor<Vec<u8>>,
}

impl FailingReader {
    fn new(limit: usize) -> Self {
        Self {
            data: Cursor::new(common::noise(limit, 5)),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(std::io::Error::other("source broke")),
            n => Ok(n),
        }
    }
}

#[test]
fn test_failed_stream_write_stops_the_archive() {
    let mut archive = Archive::streaming(Vec::new());
    archive.add_file("first.txt", "kept").unwrap();

    let err = archive
        .add_file("broken.bin", EntrySource::reader(FailingReader::new(100_000)))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!archive.exists("broken.bin").unwrap());

    let err = archive.add_file("ok.txt", "hello").unwrap_err();
    assert!(matches!(err, Error::Broken { ref path } if path == "broken.bin"));
    assert!(err.is_io());
    assert!(matches!(archive.add_directory("d"), Err(Error::Broken { .. })));
    assert!(matches!(archive.close(), Err(Error::Broken { .. })));
}

#[test]
fn test_stored_source_failure_before_output_is_recoverable() {
    let mut archive = Archive::streaming(Vec::new());
    archive.set_write_options(WriteOptions::new().method(CompressionMethod::Store));
    archive.add_file("first.txt", "kept").unwrap();

    // Stored bodies are read fully before the header is written.
    assert!(
        archive
            .add_file("broken.bin", EntrySource::reader(FailingReader::new(1000)))
            .is_err()
    );
    archive.add_file("ok.txt", "hello").unwrap();
    let bytes = archive.into_inner().unwrap().into_inner();

    common::verify_archive_contents(&bytes, &[("first.txt", b"kept"), ("ok.txt", b"hello")]);
}

#[test]
fn test_streaming_archive_size_matches_output() {
    let mut archive = Archive::streaming(Vec::new());
    archive.add_file("a.txt", "hello").unwrap();
    archive.add_directory("d").unwrap();
    archive.set_comment("streamed").unwrap();
    let bytes = archive.into_inner().unwrap().into_inner();

    let reopened = common::open(&bytes);
    assert_eq!(reopened.comment(), "streamed");
    assert_eq!(reopened.len(), 2);
    assert!(reopened.exists("d/").unwrap());

    // Header + "a.txt" + body + descriptor comes first.
    let first = reopened.entry("a.txt").unwrap();
    assert_eq!(first.position, 0);
    assert!(bytes.len() > 30 + 5 + DATA_DESCRIPTOR_SIZE);
}

#[test]
fn test_streaming_rejects_reads_and_removal() {
    let mut archive = Archive::streaming(Vec::new());
    archive.add_file("a.txt", "hello").unwrap();

    assert!(matches!(
        archive.extract("a.txt"),
        Err(Error::ModeViolation {
            constraint: "readable",
            ..
        })
    ));
    assert!(matches!(
        archive.remove("a.txt"),
        Err(Error::ModeViolation {
            constraint: "seekable",
            ..
        })
    ));
    assert!(matches!(
        archive.add_file("a.txt", "again"),
        Err(Error::ModeViolation {
            constraint: "seekable",
            ..
        })
    ));
}

#[test]
fn test_streaming_rejects_read_only_methods() {
    let mut archive = Archive::streaming(Vec::new());
    archive.set_write_options(WriteOptions::new().method(CompressionMethod::Bzip2));
    let err = archive.add_file("a.txt", "x").unwrap_err();
    assert!(err.is_unsupported());
    assert!(archive.is_empty());
}

#[test]
fn test_streaming_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.zip");

    let mut archive = Archive::open(&path, Mode::StreamingWrite).unwrap();
    assert!(!archive.is_readable());
    archive.add_file("a.txt", "hello").unwrap();
    archive.close().unwrap();

    let mut raw = Vec::new();
    std::fs::File::open(&path)
        .unwrap()
        .read_to_end(&mut raw)
        .unwrap();
    common::verify_archive_contents(&raw, &[("a.txt", b"hello")]);
}
