//! Error types for measurement operations.

use thiserror::Error;

/// Result type alias for measurement operations.
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Errors that can occur during measurement operations.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Input mesh has no faces.
    #[error("input mesh is empty")]
    EmptyMesh,

    /// Section height is NaN or infinite.
    #[error("section height {height} is not finite")]
    InvalidHeight {
        /// The rejected height.
        height: f64,
    },
}
