//! Exit codes for the CLI tool.

use pkarchive::{Error, ErrorKind};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive format error
pub const BAD_ARCHIVE: i32 = 3;
/// Archive uses an unsupported method or feature
pub const UNSUPPORTED: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    Unsupported,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::Unsupported => UNSUPPORTED,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a library error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::InvalidArchivePath(_) => ExitCode::BadArgs,
        Error::PathTraversal { .. } => ExitCode::FatalError,
        _ => match error.kind() {
            ErrorKind::Io => ExitCode::IoError,
            ErrorKind::Format => ExitCode::BadArchive,
            ErrorKind::Unsupported => ExitCode::Unsupported,
            ErrorKind::Capacity => ExitCode::BadArgs,
        },
    }
}
