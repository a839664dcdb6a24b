//! Edge and vertex incidence tables.

use hashbrown::HashMap;
use smallvec::SmallVec;

/// Faces touching one undirected edge. Two in a manifold mesh.
pub type EdgeFaces = SmallVec<[usize; 2]>;

/// Incidence lookups for an indexed face list.
///
/// Edges are stored undirected with the smaller index first.
///
/// # Example
///
/// ```
/// use mesh_repair::MeshAdjacency;
///
/// let faces = vec![[0, 1, 2], [0, 2, 3]];
/// let adj = MeshAdjacency::build(&faces);
/// assert_eq!(adj.boundary_edge_count(), 4);
/// assert_eq!(adj.faces_for_edge(2, 0).map(<[usize]>::len), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    edge_to_faces: HashMap<(u32, u32), EdgeFaces>,
    vertex_to_faces: HashMap<u32, SmallVec<[usize; 6]>>,
}

impl MeshAdjacency {
    /// Build the tables for `faces`.
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), EdgeFaces> =
            HashMap::with_capacity(faces.len() * 3 / 2);
        let mut vertex_to_faces: HashMap<u32, SmallVec<[usize; 6]>> =
            HashMap::with_capacity(faces.len() / 2);

        for (fi, face) in faces.iter().enumerate() {
            for &v in face {
                vertex_to_faces.entry(v).or_default().push(fi);
            }
            for k in 0..3 {
                let edge = normalize_edge(face[k], face[(k + 1) % 3]);
                edge_to_faces.entry(edge).or_default().push(fi);
            }
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
        }
    }

    /// Faces using the edge `v0`-`v1` in either direction.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(SmallVec::as_slice)
    }

    /// Faces using vertex `v`.
    #[must_use]
    pub fn faces_for_vertex(&self, v: u32) -> &[usize] {
        self.vertex_to_faces.get(&v).map_or(&[], SmallVec::as_slice)
    }

    /// Faces sharing an edge with face `fi` of `faces`.
    pub fn face_neighbors<'a>(
        &'a self,
        faces: &'a [[u32; 3]],
        fi: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        let face = faces[fi];
        (0..3).flat_map(move |k| {
            self.faces_for_edge(face[k], face[(k + 1) % 3])
                .unwrap_or(&[])
                .iter()
                .copied()
                .filter(move |&other| other != fi)
        })
    }

    /// Edges used by exactly one face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, f)| f.len() == 1)
            .map(|(&e, _)| e)
    }

    /// Number of boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() == 1).count()
    }

    /// Number of edges used by more than two faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() > 2).count()
    }

    /// No edge is used by more than two faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|f| f.len() <= 2)
    }

    /// Every edge is used by at least two faces.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|f| f.len() >= 2)
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Number of vertices referenced by at least one face.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_to_faces.len()
    }
}

/// Undirected edge key.
#[inline]
#[must_use]
pub fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_and_boundary_edges() {
        let faces = vec![[0, 1, 2], [1, 3, 2]];
        let adj = MeshAdjacency::build(&faces);
        assert_eq!(adj.edge_count(), 5);
        assert_eq!(adj.faces_for_edge(2, 1).map(<[usize]>::len), Some(2));
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(adj.is_manifold());
        assert!(!adj.is_watertight());
        assert!(adj.faces_for_edge(0, 3).is_none());
    }

    #[test]
    fn fan_of_three_is_non_manifold() {
        let faces = vec![[0, 1, 2], [0, 1, 3], [0, 1, 4]];
        let adj = MeshAdjacency::build(&faces);
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert!(!adj.is_manifold());
    }

    #[test]
    fn tetrahedron_is_closed() {
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
        let adj = MeshAdjacency::build(&faces);
        assert!(adj.is_watertight());
        assert!(adj.is_manifold());
        assert_eq!(adj.faces_for_vertex(3).len(), 3);
        let neighbors: Vec<usize> = adj.face_neighbors(&faces, 0).collect();
        assert_eq!(neighbors.len(), 3);
    }
}
