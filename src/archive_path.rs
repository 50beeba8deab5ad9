//! Normalized entry paths.
//!
//! Entry names inside a ZIP archive are forward-slash separated and carry no
//! leading slash; directory entries end with exactly one trailing slash. The
//! writer passes every caller-supplied path through [`ArchivePath`] so that
//! the names it stores follow those rules regardless of the host platform.

use std::fmt;

use crate::format::MAX_FIELD_LENGTH;
use crate::{Error, Result};

/// A validated, normalized entry path.
///
/// Normalization converts backslashes to forward slashes, strips leading
/// slashes, and for directories ensures exactly one trailing slash. Paths
/// that are empty after normalization, contain NUL bytes, contain empty
/// segments, or contain `.`/`..` segments are rejected.
///
/// # Examples
///
/// ```
/// use pkarchive::ArchivePath;
///
/// let file = ArchivePath::file("\\docs\\readme.txt").unwrap();
/// assert_eq!(file.as_str(), "docs/readme.txt");
///
/// let dir = ArchivePath::directory("docs").unwrap();
/// assert_eq!(dir.as_str(), "docs/");
///
/// assert!(ArchivePath::file("../secret").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Normalizes a file entry path.
    ///
    /// Trailing slashes are removed.
    pub fn file(s: &str) -> Result<Self> {
        let body = normalize(s)?;
        Self::checked(body)
    }

    /// Normalizes a directory entry path, ending it with one `/`.
    pub fn directory(s: &str) -> Result<Self> {
        let mut body = normalize(s)?;
        body.push('/');
        Self::checked(body)
    }

    fn checked(path: String) -> Result<Self> {
        if path.len() > MAX_FIELD_LENGTH {
            return Err(Error::CapacityExceeded {
                what: "entry name",
                len: path.len(),
                max: MAX_FIELD_LENGTH,
            });
        }
        Ok(Self(path))
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` for directory paths.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the last segment, without any trailing slash.
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Returns the enclosing directory path (with its trailing slash), if any.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.0.trim_end_matches('/');
        trimmed
            .rfind('/')
            .map(|idx| Self(trimmed[..=idx].to_string()))
    }
}

/// Shared normalization: slashes, leading separators, segment checks.
///
/// Returns the path without any trailing slash.
fn normalize(s: &str) -> Result<String> {
    if s.contains('\0') {
        return Err(Error::InvalidArchivePath("contains NUL byte".into()));
    }

    let unified = s.replace('\\', "/");
    let trimmed = unified.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidArchivePath(format!(
            "'{}' is empty after normalization",
            s
        )));
    }

    for segment in trimmed.split('/') {
        match segment {
            "" => {
                return Err(Error::InvalidArchivePath(format!(
                    "'{}' contains an empty segment",
                    s
                )));
            }
            "." | ".." => {
                return Err(Error::InvalidArchivePath(format!(
                    "'{}' contains a '{}' segment",
                    s, segment
                )));
            }
            _ => {}
        }
    }

    Ok(trimmed.to_string())
}

/// Lightweight normalization for lookups of stored names.
///
/// Lookups must still find entries written by other tools, so this only
/// unifies separators and strips leading slashes.
pub(crate) fn lookup_key(s: &str) -> String {
    s.replace('\\', "/").trim_start_matches('/').to_string()
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    /// A trailing slash selects [`ArchivePath::directory`].
    fn try_from(s: &str) -> Result<Self> {
        if s.ends_with('/') || s.ends_with('\\') {
            Self::directory(s)
        } else {
            Self::file(s)
        }
    }
}
