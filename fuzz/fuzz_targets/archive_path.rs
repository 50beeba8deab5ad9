//! Fuzz target for ArchivePath normalization.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked on every accepted path:
//! - no `.` or `..` segments
//! - no leading slash or backslash
//! - no NUL bytes
//! - directories end with exactly one slash

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(path) = pkarchive::ArchivePath::file(input) {
        let normalized = path.as_str();
        assert!(!normalized.starts_with('/'), "absolute path accepted: {:?}", normalized);
        assert!(!normalized.contains('\\'), "backslash kept: {:?}", normalized);
        assert!(!normalized.contains('\0'), "NUL byte kept: {:?}", normalized);
        assert!(
            !normalized.split('/').any(|s| s == "." || s == ".."),
            "dot segment kept: {:?}",
            normalized
        );
    }

    if let Ok(path) = pkarchive::ArchivePath::directory(input) {
        let normalized = path.as_str();
        assert!(normalized.ends_with('/') && !normalized.ends_with("//"));
    }
});
