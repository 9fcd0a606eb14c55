//! Error types for glyphcaret.
//!
//! The editing engine clamps offsets instead of failing, so the only errors
//! that exist come from the shaping seam: reading the text to shape and the
//! shaper itself.

use std::fmt;
use std::io;

/// Result type alias for glyphcaret operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for glyphcaret operations.
#[derive(Debug)]
pub enum Error {
    /// I/O error while streaming text to a shaper.
    Io(io::Error),
    /// A shaper was handed bytes that do not decode as UTF-8.
    InvalidUtf8 { offset: usize },
    /// The shaper could not lay out the text.
    Shaping(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 in shaper input at byte {offset}")
            }
            Self::Shaping(msg) => write!(f, "shaping failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: e.utf8_error().valid_up_to(),
        }
    }
}
