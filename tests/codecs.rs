//! Decoding entries written by other tools with BZip2 and LZMA.
//!
//! The writer only produces Store and Deflate, so these archives are
//! assembled by hand around bodies encoded with the codec crates directly.

mod common;

use pkarchive::checksum::Crc32;
use pkarchive::codec::method;
use pkarchive::{CompressionMethod, ExtractOptions};

fn sample() -> Vec<u8> {
    "BZip2 and LZMA bodies are decode-only.\n"
        .repeat(64)
        .into_bytes()
}

#[cfg(feature = "bzip2")]
#[test]
fn test_bzip2_entry_extracts() {
    use bzip2::Compression;
    use bzip2::write::BzEncoder;
    use std::io::Write;

    let data = sample();
    let mut encoder = BzEncoder::new(Vec::new(), Compression::new(9));
    encoder.write_all(&data).unwrap();
    let body = encoder.finish().unwrap();

    let bytes = common::raw_archive(
        "text.bz2.txt",
        method::BZIP2,
        &body,
        Crc32::compute(&data),
        data.len() as u32,
    );
    let mut archive = common::open(&bytes);
    let entry = archive.entry("text.bz2.txt").unwrap();
    assert_eq!(entry.compression(), Some(CompressionMethod::Bzip2));
    assert_eq!(archive.extract("text.bz2.txt").unwrap(), data);

    let mut sink = Vec::new();
    let written = archive
        .extract_to_writer("text.bz2.txt", &mut sink)
        .unwrap();
    assert_eq!(written, data.len() as u64);
    assert_eq!(sink, data);
}

#[cfg(feature = "lzma")]
#[test]
fn test_lzma_entry_extracts() {
    use std::io::Write;

    let data = sample();
    let options = lzma_rust2::LzmaOptions::with_preset(6);

    // ZIP LZMA header: encoder version, properties length, properties.
    let mut body = vec![9u8, 20, 5, 0, options.get_props()];
    body.extend_from_slice(&options.dict_size.to_le_bytes());
    let mut stream = Vec::new();
    {
        let mut writer = lzma_rust2::LzmaWriter::new_no_header(&mut stream, &options, true).unwrap();
        writer.write_all(&data).unwrap();
        writer.finish().unwrap();
    }
    body.extend_from_slice(&stream);

    let bytes = common::raw_archive(
        "text.lzma.txt",
        method::LZMA,
        &body,
        Crc32::compute(&data),
        data.len() as u32,
    );
    let mut archive = common::open(&bytes);
    assert_eq!(
        archive.entry("text.lzma.txt").unwrap().compression(),
        Some(CompressionMethod::Lzma)
    );
    assert_eq!(archive.extract("text.lzma.txt").unwrap(), data);

    let dir = tempfile::tempdir().unwrap();
    let result = archive
        .extract_all(dir.path(), &ExtractOptions::default())
        .unwrap();
    assert_eq!(result.bytes, data.len() as u64);
}

#[test]
fn test_store_and_deflate_always_available() {
    assert!(CompressionMethod::Store.is_available());
    assert!(CompressionMethod::Deflate.is_available());
    assert!(pkarchive::codec::is_available(method::DEFLATE));
    assert!(!pkarchive::codec::is_available(99));
}
