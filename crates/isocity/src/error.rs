//! Crate-wide error taxonomy.
//!
//! A plain enum implementing `Display`/`Error` by hand rather than reaching
//! for `thiserror`.

use std::fmt;

#[derive(Debug)]
pub enum IsoCityError {
    /// Invalid CLI input, non-positive dimensions, malformed ranges.
    Config(String),
    /// Corner grid size mismatch, empty world, non-finite heights, etc.
    InvalidInput(String),
    /// Failure to create a parent directory, open a file, or write to it.
    Io(std::io::Error),
    /// Save file version is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Corrupt or invalid save data.
    Decode(String),
}

impl fmt::Display for IsoCityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsoCityError::Config(msg) => write!(f, "configuration error: {msg}"),
            IsoCityError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            IsoCityError::Io(e) => write!(f, "I/O error: {e}"),
            IsoCityError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "version mismatch: save is v{found}, but this build only supports up to v{expected_max}"
            ),
            IsoCityError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for IsoCityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IsoCityError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IsoCityError {
    fn from(e: std::io::Error) -> Self {
        IsoCityError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, IsoCityError>;
