//! Error types for path generation.

use thiserror::Error;

/// Errors raised while building tabs, paths and cutter outlines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    /// A tab description is unusable as given.
    #[error("invalid tab: {details}")]
    InvalidTab {
        /// What is wrong with it.
        details: String,
    },

    /// The tabs cannot be laid out along the split line.
    #[error("tab sizing: {details}")]
    Sizing {
        /// Why the layout failed.
        details: String,
    },

    /// The joint tolerance destroys a required feature.
    #[error("tolerance {tolerance} mm: {details}")]
    Tolerance {
        /// Requested tolerance.
        tolerance: f64,
        /// What collapsed.
        details: String,
    },

    /// Polygon offsetting failed.
    #[error("offset by {distance} failed: {details}")]
    Offset {
        /// Signed offset distance.
        distance: f64,
        /// Failure description.
        details: String,
    },
}

impl PathError {
    pub(crate) fn sizing(details: impl Into<String>) -> Self {
        Self::Sizing {
            details: details.into(),
        }
    }
}

/// Result type for path generation.
pub type PathResult<T> = Result<T, PathError>;
