//! Error types for boolean operations.

use thiserror::Error;

/// Errors that can occur during prism clipping.
#[derive(Debug, Error)]
pub enum BooleanError {
    /// The input mesh has no faces.
    #[error("empty mesh: {details}")]
    EmptyMesh {
        /// What was empty.
        details: String,
    },

    /// The cutting polygon is unusable.
    #[error("invalid prism: {details}")]
    InvalidPrism {
        /// What is wrong with it.
        details: String,
    },

    /// The prism does not span the mesh vertically.
    #[error("prism z range [{prism_min}, {prism_max}] does not contain mesh range [{mesh_min}, {mesh_max}]")]
    PrismTooShort {
        /// Prism bottom.
        prism_min: f64,
        /// Prism top.
        prism_max: f64,
        /// Mesh bottom.
        mesh_min: f64,
        /// Mesh top.
        mesh_max: f64,
    },

    /// The input mesh has boundary edges.
    #[error("input mesh is open ({boundary_edges} boundary edges)")]
    OpenInput {
        /// Boundary edge count.
        boundary_edges: usize,
    },

    /// Every corner of the prism lies over the mesh, so the wall cannot be
    /// unrolled from a point outside it.
    #[error("prism has no corner outside the mesh footprint")]
    SeamInsideMesh,

    /// Geometry stayed degenerate after all retries.
    #[error("numerical error after {attempts} attempts: {details}")]
    NumericalError {
        /// Last failure.
        details: String,
        /// Attempts made.
        attempts: usize,
    },

    /// The result failed the closed-manifold check.
    #[error("result is not watertight ({boundary_edges} boundary, {non_manifold_edges} non-manifold edges)")]
    NotWatertight {
        /// Edges with one face.
        boundary_edges: usize,
        /// Edges with three or more faces.
        non_manifold_edges: usize,
    },
}

impl BooleanError {
    pub(crate) fn degenerate(details: impl Into<String>) -> Self {
        Self::NumericalError {
            details: details.into(),
            attempts: 1,
        }
    }
}

/// Result type for boolean operations.
pub type BooleanResult<T> = Result<T, BooleanError>;
