//! Error types for mesh I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised while reading or writing meshes.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Content is not a recognizable STL.
    #[error("invalid STL content: {message}")]
    InvalidContent {
        /// What was wrong.
        message: String,
    },

    /// Binary STL shorter than its declared triangle count.
    #[error("truncated binary STL: header declares {expected} triangles, data holds {got}")]
    Truncated {
        /// Triangles declared in the header.
        expected: u32,
        /// Complete triangles present.
        got: u32,
    },

    /// A coordinate in an ASCII STL failed to parse.
    #[error("line {line}: cannot parse coordinate {token:?}")]
    BadNumber {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// The mesh has more faces than binary STL can count.
    #[error("mesh has {faces} faces, binary STL holds at most u32::MAX")]
    TooManyFaces {
        /// Face count of the mesh.
        faces: usize,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}
