//! Indexed triangle mesh.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Aabb, MeshBounds, MeshTopology, Triangle, Vertex};

/// A triangle mesh with shared vertices.
///
/// Faces index into `vertices` and are wound counter-clockwise when viewed
/// from outside. Pipeline stages never edit a mesh they received; they build
/// a new one, so a value can be handed between stages without locking.
///
/// # Example
///
/// ```
/// use mesh_types::{cuboid, MeshTopology, Point3};
///
/// let block = cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 4.0));
/// assert_eq!(block.face_count(), 12);
/// assert!((block.volume() - 24.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex storage.
    pub vertices: Vec<Vertex>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Empty mesh with reserved storage.
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Build from existing buffers.
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Position of vertex `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[inline]
    #[must_use]
    pub fn position(&self, i: u32) -> Point3<f64> {
        self.vertices[i as usize].position
    }

    /// Whether every face index points at an existing vertex.
    #[must_use]
    pub fn indices_valid(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .all(|f| f.iter().all(|&i| (i as usize) < n))
    }

    /// Translate every vertex.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            v.position += offset;
        }
    }

    /// Copy moved so the XY bounding-box center sits at the origin and the
    /// lowest point at `z = 0`.
    ///
    /// Returns the mesh together with the translation that was applied.
    #[must_use]
    pub fn normalized(&self) -> (Self, Vector3<f64>) {
        let Some(b) = self.bounds_opt() else {
            return (self.clone(), Vector3::zeros());
        };
        let c = b.center();
        let offset = Vector3::new(-c.x, -c.y, -b.min.z);
        let mut out = self.clone();
        out.translate(offset);
        (out, offset)
    }

    /// Signed volume by the divergence theorem.
    ///
    /// Positive for a closed mesh with outward winding.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|t| t.signed_volume_term()).sum()
    }

    /// Absolute enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// True when the faces are wound inward.
    #[must_use]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Total face area.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }

    /// Reverse the winding of every face.
    pub fn flip_normals(&mut self) {
        for f in &mut self.faces {
            f.swap(1, 2);
        }
    }

    /// Append another mesh, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &Self) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
    }
}

impl MeshTopology for IndexedMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    fn face(&self, index: usize) -> Option<[u32; 3]> {
        self.faces.get(index).copied()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [a, b, c] = self.face(face_index)?;
        Some(Triangle::new(
            self.vertices.get(a as usize)?.position,
            self.vertices.get(b as usize)?.position,
            self.vertices.get(c as usize)?.position,
        ))
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    fn faces(&self) -> impl Iterator<Item = [u32; 3]> {
        self.faces.iter().copied()
    }

    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.faces.len()).filter_map(|i| self.triangle(i))
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

/// Closed box between two corners, wound outward.
#[must_use]
pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> IndexedMesh {
    let b = Aabb::new(min, max);
    let (lo, hi) = (b.min, b.max);
    let vertices = vec![
        Vertex::from_coords(lo.x, lo.y, lo.z),
        Vertex::from_coords(hi.x, lo.y, lo.z),
        Vertex::from_coords(hi.x, hi.y, lo.z),
        Vertex::from_coords(lo.x, hi.y, lo.z),
        Vertex::from_coords(lo.x, lo.y, hi.z),
        Vertex::from_coords(hi.x, lo.y, hi.z),
        Vertex::from_coords(hi.x, hi.y, hi.z),
        Vertex::from_coords(lo.x, hi.y, hi.z),
    ];
    let faces = vec![
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [3, 7, 6],
        [3, 6, 2],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
    ];
    IndexedMesh::from_parts(vertices, faces)
}

/// Unit cube from the origin to `(1, 1, 1)`.
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_mesh() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds_opt().is_none());
        assert_relative_eq!(mesh.volume(), 0.0);
    }

    #[test]
    fn cube_measures() {
        let cube = unit_cube();
        assert_relative_eq!(cube.signed_volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cube.surface_area(), 6.0, epsilon = 1e-12);
        assert!(!cube.is_inside_out());
        assert!(cube.indices_valid());
    }

    #[test]
    fn flipped_cube_is_inside_out() {
        let mut cube = unit_cube();
        cube.flip_normals();
        assert!(cube.is_inside_out());
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalized_centers_and_grounds() {
        let block = cuboid(Point3::new(10.0, 20.0, 5.0), Point3::new(30.0, 60.0, 15.0));
        let (norm, offset) = block.normalized();
        let b = norm.bounds();
        assert_relative_eq!(b.min.x, -10.0);
        assert_relative_eq!(b.max.y, 20.0);
        assert_relative_eq!(b.min.z, 0.0);
        assert_relative_eq!(offset.x, -20.0);
        assert_relative_eq!(offset.z, -5.0);
        // Input untouched.
        assert_relative_eq!(block.bounds().min.x, 10.0);
    }

    #[test]
    fn merge_offsets_indices() {
        let mut a = unit_cube();
        let mut b = unit_cube();
        b.translate(Vector3::new(3.0, 0.0, 0.0));
        a.merge(&b);
        assert_eq!(a.vertex_count(), 16);
        assert_eq!(a.face_count(), 24);
        assert!(a.indices_valid());
        assert_relative_eq!(a.volume(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn triangle_lookup_out_of_range() {
        let mut mesh = unit_cube();
        assert!(mesh.triangle(12).is_none());
        mesh.faces.push([0, 1, 99]);
        assert!(mesh.triangle(12).is_none());
        assert!(!mesh.indices_valid());
    }
}
