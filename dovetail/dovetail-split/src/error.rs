//! Error types for the split pipeline.

use dovetail_path::PathError;
use mesh_boolean::BooleanError;
use mesh_io::IoError;
use thiserror::Error;

use crate::stage::Stage;

/// Invalid split parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter lies outside its accepted range.
    #[error("{name} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// A configuration file could not be parsed.
    #[error("cannot parse parameters: {details}")]
    Parse {
        /// Parser message.
        details: String,
    },
}

/// Errors that end a split run.
///
/// Every pipeline variant records the stage whose work failed.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The uploaded bytes are not a readable mesh.
    #[error("unreadable mesh: {source}")]
    Io {
        /// Parser error.
        #[from]
        source: IoError,
    },

    /// Parameters were rejected before the run started.
    #[error("invalid parameters: {0}")]
    Config(#[from] ConfigError),

    /// The mesh is not closed, even after repair.
    #[error("{stage}: mesh error: {details}")]
    Mesh {
        /// Failing stage.
        stage: Stage,
        /// What is wrong with the mesh.
        details: String,
    },

    /// The mid-height section has too many separate loops.
    #[error("{stage}: cross-section has {contours} contours, limit is {limit}")]
    Complexity {
        /// Failing stage.
        stage: Stage,
        /// Loops found.
        contours: usize,
        /// Largest accepted count.
        limit: usize,
    },

    /// Tabs cannot be laid out.
    #[error("{stage}: {source}")]
    Sizing {
        /// Failing stage.
        stage: Stage,
        /// Layout failure.
        source: PathError,
    },

    /// The tolerance destroys the joint.
    #[error("{stage}: {source}")]
    Tolerance {
        /// Failing stage.
        stage: Stage,
        /// Offset failure.
        source: PathError,
    },

    /// A boolean operation failed.
    #[error("{stage}: boolean {label} failed: {source}")]
    BooleanOp {
        /// Failing stage.
        stage: Stage,
        /// Which operation.
        label: String,
        /// Clip failure.
        source: BooleanError,
    },

    /// Debris removal would discard the main piece.
    #[error("{stage}: sanitizing {part} failed: {details}")]
    Sanitization {
        /// Failing stage.
        stage: Stage,
        /// Part being cleaned.
        part: String,
        /// What went wrong.
        details: String,
    },

    /// Writing the archive failed.
    #[error("packaging failed: {0}")]
    Package(#[from] zip::result::ZipError),

    /// Encoding output failed.
    #[error("encoding failed: {details}")]
    Encode {
        /// Encoder message.
        details: String,
    },
}

impl SplitError {
    /// Stage the run failed in, `None` for errors raised outside a run.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Io { .. } => Some(Stage::Uploaded),
            Self::Mesh { stage, .. }
            | Self::Complexity { stage, .. }
            | Self::Sizing { stage, .. }
            | Self::Tolerance { stage, .. }
            | Self::BooleanOp { stage, .. }
            | Self::Sanitization { stage, .. } => Some(*stage),
            Self::Config(_) | Self::Package(_) | Self::Encode { .. } => None,
        }
    }

    /// Wrap a path error, keeping sizing and tolerance failures apart.
    pub(crate) fn from_path(stage: Stage, source: PathError) -> Self {
        match source {
            PathError::Tolerance { .. } | PathError::Offset { .. } => Self::Tolerance { stage, source },
            PathError::Sizing { .. } | PathError::InvalidTab { .. } => Self::Sizing { stage, source },
        }
    }
}

/// Result type for the split pipeline.
pub type SplitResult<T> = Result<T, SplitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_is_reported() {
        let err = SplitError::Complexity {
            stage: Stage::Validated,
            contours: 15,
            limit: 10,
        };
        assert_eq!(err.stage(), Some(Stage::Validated));
        assert!(err.to_string().contains("15 contours"));

        let err = SplitError::from_path(
            Stage::Validated,
            PathError::Tolerance {
                tolerance: 0.5,
                details: "neck".into(),
            },
        );
        assert!(matches!(err, SplitError::Tolerance { .. }));
        assert_eq!(SplitError::Config(ConfigError::Parse { details: String::new() }).stage(), None);
    }
}
