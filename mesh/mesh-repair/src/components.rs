//! Connected component analysis.
//!
//! Faces belong to the same component when they share an edge. Touching at a
//! single vertex does not connect two components.

use std::collections::VecDeque;

use hashbrown::HashMap;
use mesh_types::{Aabb, IndexedMesh, MeshBounds};
use tracing::debug;

use crate::adjacency::MeshAdjacency;

/// Groups of faces connected through shared edges, each in BFS order.
pub(crate) fn edge_patches(faces: &[[u32; 3]], adj: &MeshAdjacency) -> Vec<Vec<usize>> {
    let mut seen = vec![false; faces.len()];
    let mut patches = Vec::new();
    for seed in 0..faces.len() {
        if seen[seed] {
            continue;
        }
        seen[seed] = true;
        let mut patch = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(f) = queue.pop_front() {
            for g in adj.face_neighbors(faces, f) {
                if !seen[g] {
                    seen[g] = true;
                    patch.push(g);
                    queue.push_back(g);
                }
            }
        }
        patches.push(patch);
    }
    patches
}

/// Result of [`find_connected_components`].
#[derive(Debug, Clone)]
pub struct ComponentAnalysis {
    /// Face indices of each component.
    pub components: Vec<Vec<usize>>,
}

impl ComponentAnalysis {
    /// Number of components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Index of the component with the most faces.
    #[must_use]
    pub fn largest(&self) -> Option<usize> {
        self.components
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| c.len())
            .map(|(i, _)| i)
    }
}

/// Find the edge-connected components of a mesh.
#[must_use]
pub fn find_connected_components(mesh: &IndexedMesh) -> ComponentAnalysis {
    let adj = MeshAdjacency::build(&mesh.faces);
    let components = edge_patches(&mesh.faces, &adj);
    debug!(count = components.len(), "found connected components");
    ComponentAnalysis { components }
}

/// Build a standalone mesh from a subset of faces, compacting vertices.
///
/// Face order follows `faces`; vertices are numbered by first use.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn extract_faces(mesh: &IndexedMesh, faces: &[usize]) -> IndexedMesh {
    let mut remap: HashMap<u32, u32> = HashMap::with_capacity(faces.len());
    let mut out = IndexedMesh::with_capacity(faces.len() / 2 + 2, faces.len());
    for &fi in faces {
        let mut new_face = [0u32; 3];
        for (slot, &v) in new_face.iter_mut().zip(mesh.faces[fi].iter()) {
            *slot = *remap.entry(v).or_insert_with(|| {
                out.vertices.push(mesh.vertices[v as usize]);
                (out.vertices.len() - 1) as u32
            });
        }
        out.faces.push(new_face);
    }
    out
}

/// Split a mesh into one mesh per component.
#[must_use]
pub fn split_into_components(mesh: &IndexedMesh) -> Vec<IndexedMesh> {
    find_connected_components(mesh)
        .components
        .iter()
        .map(|faces| extract_faces(mesh, faces))
        .collect()
}

/// Keep only the component with the most faces.
#[must_use]
pub fn keep_largest_component(mesh: &IndexedMesh) -> IndexedMesh {
    let analysis = find_connected_components(mesh);
    analysis
        .largest()
        .map_or_else(IndexedMesh::new, |i| extract_faces(mesh, &analysis.components[i]))
}

/// Drop components with fewer than `min_faces` faces.
///
/// Returns the cleaned mesh and the number of removed components.
#[must_use]
pub fn remove_small_components(mesh: &IndexedMesh, min_faces: usize) -> (IndexedMesh, usize) {
    let analysis = find_connected_components(mesh);
    let mut kept = Vec::new();
    let mut removed = 0;
    for c in &analysis.components {
        if c.len() >= min_faces {
            kept.extend_from_slice(c);
        } else {
            removed += 1;
        }
    }
    kept.sort_unstable();
    (extract_faces(mesh, &kept), removed)
}

/// Volume and extent of one component.
#[derive(Debug, Clone)]
pub struct ComponentStats {
    /// Face indices in the source mesh.
    pub faces: Vec<usize>,
    /// Absolute enclosed volume.
    pub volume: f64,
    /// Bounding box.
    pub bounds: Aabb,
}

/// Per-component volume and bounds.
#[must_use]
pub fn component_stats(mesh: &IndexedMesh) -> Vec<ComponentStats> {
    find_connected_components(mesh)
        .components
        .into_iter()
        .map(|faces| {
            let part = extract_faces(mesh, &faces);
            ComponentStats {
                faces,
                volume: part.volume(),
                bounds: part.bounds(),
            }
        })
        .collect()
}
