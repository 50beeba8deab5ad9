//! Extraction options.

/// Policy for handling existing files during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Return an error if the file exists.
    Error,
    /// Skip files that already exist.
    Skip,
    /// Overwrite existing files.
    #[default]
    Overwrite,
}

/// Options for [`Archive::extract_all`](crate::Archive::extract_all).
///
/// # Example
///
/// ```rust
/// use pkarchive::{ExtractOptions, OverwritePolicy};
///
/// let options = ExtractOptions::new()
///     .overwrite(OverwritePolicy::Skip)
///     .dir_permissions(0o750);
/// assert!(options.verify_crc);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Policy for handling existing files.
    pub overwrite: OverwritePolicy,
    /// Unix permission bits for created directories. `None` uses the
    /// process umask; ignored on other platforms.
    pub dir_permissions: Option<u32>,
    /// Check each file's CRC-32 after writing it.
    pub verify_crc: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwritePolicy::default(),
            dir_permissions: None,
            verify_crc: true,
        }
    }
}

impl ExtractOptions {
    /// Creates extraction options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overwrite policy.
    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Sets the permission bits for created directories.
    pub fn dir_permissions(mut self, mode: u32) -> Self {
        self.dir_permissions = Some(mode);
        self
    }

    /// Enables or disables CRC verification.
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }
}
