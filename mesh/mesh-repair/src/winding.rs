//! Winding order repair.
//!
//! Orientation is propagated face to face across shared edges: two faces
//! agree when they traverse their common edge in opposite directions. Each
//! edge-connected patch is then flipped as a whole if its signed volume is
//! negative.

use std::collections::VecDeque;

use mesh_types::{IndexedMesh, MeshTopology};
use tracing::debug;

use crate::adjacency::MeshAdjacency;
use crate::components::edge_patches;
use crate::error::{RepairError, RepairResult};

fn has_directed_edge(face: [u32; 3], a: u32, b: u32) -> bool {
    (0..3).any(|k| face[k] == a && face[(k + 1) % 3] == b)
}

/// Flip faces so that neighbours agree with the first face of each patch.
///
/// Returns the number of flipped faces.
pub fn orient_consistently(mesh: &mut IndexedMesh) -> usize {
    let adj = MeshAdjacency::build(&mesh.faces);
    let mut visited = vec![false; mesh.faces.len()];
    let mut flipped = 0;

    for seed in 0..mesh.faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(f) = queue.pop_front() {
            let face = mesh.faces[f];
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                let Some(others) = adj.faces_for_edge(a, b) else {
                    continue;
                };
                for &g in others {
                    if g == f || visited[g] {
                        continue;
                    }
                    visited[g] = true;
                    if has_directed_edge(mesh.faces[g], a, b) {
                        mesh.faces[g].swap(1, 2);
                        flipped += 1;
                    }
                    queue.push_back(g);
                }
            }
        }
    }

    if flipped > 0 {
        debug!(flipped, "propagated consistent winding");
    }
    flipped
}

/// Make winding consistent and outward-facing.
///
/// Each edge-connected patch whose signed volume is negative is reversed.
/// Returns the total number of flipped faces.
///
/// # Errors
///
/// [`RepairError::EmptyMesh`] when there are no faces.
///
/// # Example
///
/// ```
/// use mesh_repair::fix_winding_order;
/// use mesh_types::unit_cube;
///
/// let mut cube = unit_cube();
/// cube.flip_normals();
/// let flipped = fix_winding_order(&mut cube).unwrap_or(0);
/// assert_eq!(flipped, 12);
/// assert!(cube.signed_volume() > 0.0);
/// ```
pub fn fix_winding_order(mesh: &mut IndexedMesh) -> RepairResult<usize> {
    if mesh.faces.is_empty() {
        return Err(RepairError::EmptyMesh);
    }
    let mut flipped = orient_consistently(mesh);

    let adj = MeshAdjacency::build(&mesh.faces);
    for patch in edge_patches(&mesh.faces, &adj) {
        let volume: f64 = patch
            .iter()
            .filter_map(|&f| mesh.triangle(f))
            .map(|t| t.signed_volume_term())
            .sum();
        if volume < 0.0 {
            for &f in &patch {
                mesh.faces[f].swap(1, 2);
            }
            flipped += patch.len();
        }
    }

    Ok(flipped)
}

/// Count shared edges that both faces traverse in the same direction.
#[must_use]
pub fn count_inconsistent_faces(mesh: &IndexedMesh) -> usize {
    let adj = MeshAdjacency::build(&mesh.faces);
    let mut count = 0;
    for (fi, &face) in mesh.faces.iter().enumerate() {
        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            if let Some(others) = adj.faces_for_edge(a, b) {
                count += others
                    .iter()
                    .filter(|&&g| g > fi && has_directed_edge(mesh.faces[g], a, b))
                    .count();
            }
        }
    }
    count
}
