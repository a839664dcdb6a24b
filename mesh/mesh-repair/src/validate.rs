//! Mesh health report.

use std::fmt;

use mesh_types::{IndexedMesh, MeshTopology};

use crate::adjacency::MeshAdjacency;
use crate::holes::detect_holes;

/// Topology and orientation summary of a mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshReport {
    /// Vertex count.
    pub vertex_count: usize,
    /// Face count.
    pub face_count: usize,
    /// Edges used by exactly one face.
    pub boundary_edge_count: usize,
    /// Edges used by three or more faces.
    pub non_manifold_edge_count: usize,
    /// Closed boundary loops.
    pub hole_count: usize,
    /// Faces with area below `1e-12`.
    pub degenerate_face_count: usize,
    /// Signed enclosed volume. Only meaningful for closed meshes.
    pub signed_volume: f64,
    /// No boundary edges.
    pub is_watertight: bool,
    /// No edge shared by more than two faces.
    pub is_manifold: bool,
    /// Negative signed volume.
    pub is_inside_out: bool,
}

impl MeshReport {
    /// Closed, manifold and outward-facing.
    #[must_use]
    pub fn is_printable(&self) -> bool {
        self.is_watertight && self.is_manifold && !self.is_inside_out
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        writeln!(f, "{} vertices, {} faces", self.vertex_count, self.face_count)?;
        writeln!(f, "watertight: {}", yes_no(self.is_watertight))?;
        writeln!(f, "manifold: {}", yes_no(self.is_manifold))?;
        write!(f, "volume: {:.3}", self.signed_volume)?;
        if self.hole_count > 0 {
            write!(f, "\nholes: {} ({} boundary edges)", self.hole_count, self.boundary_edge_count)?;
        }
        if self.non_manifold_edge_count > 0 {
            write!(f, "\nnon-manifold edges: {}", self.non_manifold_edge_count)?;
        }
        if self.degenerate_face_count > 0 {
            write!(f, "\ndegenerate faces: {}", self.degenerate_face_count)?;
        }
        Ok(())
    }
}

/// Inspect a mesh without modifying it.
///
/// # Example
///
/// ```
/// use mesh_repair::validate_mesh;
/// use mesh_types::unit_cube;
///
/// let report = validate_mesh(&unit_cube());
/// assert!(report.is_printable());
/// assert_eq!(report.hole_count, 0);
/// ```
#[must_use]
pub fn validate_mesh(mesh: &IndexedMesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let signed_volume = mesh.signed_volume();
    MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        boundary_edge_count: adjacency.boundary_edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        hole_count: detect_holes(mesh, &adjacency).len(),
        degenerate_face_count: mesh.triangles().filter(|t| t.area() < 1e-12).count(),
        signed_volume,
        is_watertight: adjacency.is_watertight(),
        is_manifold: adjacency.is_manifold(),
        is_inside_out: signed_volume < 0.0,
    }
}
