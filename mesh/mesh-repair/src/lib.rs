//! Mesh validation and repair.
//!
//! Uploaded STL files are usually triangle soups with duplicated vertices,
//! the odd flipped face and sometimes small holes. This crate turns them into
//! closed, consistently wound solids or reports why it cannot:
//!
//! - [`validate_mesh`] - watertight, manifold and orientation report
//! - [`repair_mesh`] - weld, clean, fill holes and fix winding in one call
//! - [`find_connected_components`] and [`component_stats`] - per-part analysis
//! - [`MeshAdjacency`] - edge-to-face lookup shared by the passes
//!
//! # Layer 0
//!
//! Depends only on `mesh-types`; no I/O.
//!
//! # Example
//!
//! ```
//! use mesh_repair::{count_inconsistent_faces, repair_mesh, validate_mesh, RepairParams};
//! use mesh_types::unit_cube;
//!
//! let mut mesh = unit_cube();
//! mesh.faces[3].swap(1, 2);
//! assert!(count_inconsistent_faces(&mesh) > 0);
//!
//! let summary = repair_mesh(&mut mesh, &RepairParams::default());
//! assert!(summary.is_ok());
//! assert!(validate_mesh(&mesh).is_printable());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
pub mod components;
mod error;
pub mod holes;
mod repair;
mod validate;
pub mod winding;

pub use adjacency::{normalize_edge, MeshAdjacency};
pub use error::{RepairError, RepairResult};
pub use repair::{
    check_mesh_sanity, remove_degenerate_triangles, remove_duplicate_faces,
    remove_unreferenced_vertices, repair_mesh, weld_vertices, RepairParams, RepairSummary,
};
pub use validate::{validate_mesh, MeshReport};

pub use components::{
    component_stats, extract_faces, find_connected_components, keep_largest_component,
    remove_small_components, split_into_components, ComponentAnalysis, ComponentStats,
};
pub use holes::{detect_holes, fill_holes, BoundaryLoop};
pub use winding::{count_inconsistent_faces, fix_winding_order, orient_consistently};
