//! Read-only mesh access traits.

use crate::{Aabb, Triangle, Vertex};
use nalgebra::Point3;

/// Topology queries shared by mesh representations.
pub trait MeshTopology {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of triangular faces.
    fn face_count(&self) -> usize;

    /// True when there is nothing to render or cut.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Vertex by index, `None` when out of range.
    fn vertex(&self, index: usize) -> Option<&Vertex>;

    /// Face by index, `None` when out of range.
    fn face(&self, index: usize) -> Option<[u32; 3]>;

    /// Face resolved to positions, `None` when the face or one of its
    /// vertices is out of range.
    fn triangle(&self, face_index: usize) -> Option<Triangle>;

    /// All vertices.
    fn vertices(&self) -> impl Iterator<Item = &Vertex>;

    /// All faces.
    fn faces(&self) -> impl Iterator<Item = [u32; 3]>;

    /// All faces resolved to positions.
    fn triangles(&self) -> impl Iterator<Item = Triangle>;
}

/// Bounding box queries.
pub trait MeshBounds {
    /// Axis-aligned bounds (empty box when there are no vertices).
    fn bounds(&self) -> Aabb;

    /// Bounds, `None` when empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }

    /// Center of the bounds.
    fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }
}
