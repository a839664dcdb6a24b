//! Error types for mesh repair.

use thiserror::Error;

/// Errors raised by repair operations.
#[derive(Debug, Error)]
pub enum RepairError {
    /// The mesh has no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("face references vertex {index} but mesh has {vertex_count} vertices")]
    InvalidIndex {
        /// Offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// The mesh has coordinates that are NaN or infinite.
    #[error("mesh has {count} non-finite vertices")]
    NonFinite {
        /// How many vertices are affected.
        count: usize,
    },

    /// A hole could not be triangulated.
    #[error("hole fill failed: {reason}")]
    HoleFillFailed {
        /// Why the hole was skipped.
        reason: String,
    },
}

/// Result alias for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;
