//! Hole detection and filling.
//!
//! A hole is a closed chain of boundary edges. Chains are traced along the
//! direction the owning faces traverse them, so the fill triangles can be
//! wound to match their neighbours.

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vector3};
use tracing::{debug, info, warn};

use crate::adjacency::MeshAdjacency;
use crate::error::{RepairError, RepairResult};

/// One closed chain of boundary edges.
///
/// `vertices[i] -> vertices[i + 1]` is the direction the adjacent face
/// traverses the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    /// Loop vertices in traversal order, without repeating the first.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Trace every boundary loop of the mesh.
///
/// Chains that do not close (non-manifold boundary vertices with several
/// outgoing edges) are reported only as far as they can be followed and
/// dropped if they never return to their start.
///
/// # Example
///
/// ```
/// use mesh_repair::{detect_holes, MeshAdjacency};
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// let holes = detect_holes(&mesh, &MeshAdjacency::build(&mesh.faces));
/// assert_eq!(holes.len(), 1);
/// assert_eq!(holes[0].edge_count(), 3);
/// ```
#[must_use]
pub fn detect_holes(mesh: &IndexedMesh, adjacency: &MeshAdjacency) -> Vec<BoundaryLoop> {
    let mut next: HashMap<u32, Vec<u32>> = HashMap::new();
    for (a, b) in adjacency.boundary_edges() {
        let Some(&[fi]) = adjacency.faces_for_edge(a, b) else {
            continue;
        };
        let face = mesh.faces[fi];
        let forward = (0..3).any(|k| face[k] == a && face[(k + 1) % 3] == b);
        let (from, to) = if forward { (a, b) } else { (b, a) };
        next.entry(from).or_default().push(to);
    }

    let mut starts: Vec<u32> = next.keys().copied().collect();
    starts.sort_unstable();

    let mut loops = Vec::new();
    for start in starts {
        while next.get(&start).is_some_and(|v| !v.is_empty()) {
            let mut chain = vec![start];
            let mut current = start;
            let closed = loop {
                let Some(to) = next.get_mut(&current).and_then(Vec::pop) else {
                    break false;
                };
                if to == start {
                    break true;
                }
                chain.push(to);
                current = to;
                if chain.len() > adjacency.edge_count() {
                    break false;
                }
            };
            if closed && chain.len() >= 3 {
                loops.push(BoundaryLoop { vertices: chain });
            } else {
                debug!(len = chain.len(), "dropping open boundary chain");
            }
        }
    }
    loops
}

/// Triangulate one hole by ear clipping in its best-fit plane.
///
/// The returned faces traverse each loop edge opposite to the existing face,
/// so the patched mesh is consistently wound. Returns an empty list when no
/// ear can be found (self-overlapping loop).
#[must_use]
pub fn fill_hole_ear_clipping(mesh: &IndexedMesh, boundary: &BoundaryLoop) -> Vec<[u32; 3]> {
    // Walk the loop backwards: fill faces must run against the boundary.
    let ring: Vec<u32> = boundary.vertices.iter().rev().copied().collect();
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[ring[0], ring[1], ring[2]]];
    }

    let positions: Vec<Point3<f64>> = ring.iter().map(|&i| mesh.position(i)).collect();
    let normal = newell_normal(&positions);
    let (u, v) = plane_basis(&normal);
    let flat: Vec<(f64, f64)> = positions
        .iter()
        .map(|p| (p.coords.dot(&u), p.coords.dot(&v)))
        .collect();

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);
    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (a, b, c) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            is_ear(&flat, &remaining, a, b, c)
        });
        let Some(i) = ear else {
            warn!(remaining = remaining.len(), "ear clipping found no ear");
            return Vec::new();
        };
        let (a, b, c) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
        triangles.push([ring[a], ring[b], ring[c]]);
        remaining.remove(i);
    }
    triangles.push([ring[remaining[0]], ring[remaining[1]], ring[remaining[2]]]);
    triangles
}

fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z)
}

fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if normal.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u);
    (u, v)
}

fn cross2(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn is_ear(flat: &[(f64, f64)], remaining: &[usize], a: usize, b: usize, c: usize) -> bool {
    let (pa, pb, pc) = (flat[a], flat[b], flat[c]);
    if cross2(pa, pb, pc) <= 0.0 {
        return false;
    }
    remaining.iter().all(|&k| {
        if k == a || k == b || k == c {
            return true;
        }
        let p = flat[k];
        !(cross2(pa, pb, p) >= 0.0 && cross2(pb, pc, p) >= 0.0 && cross2(pc, pa, p) >= 0.0)
    })
}

/// Fill every hole with at most `max_hole_edges` edges.
///
/// Returns the number of filled holes. Larger holes are left open and
/// logged.
///
/// # Errors
///
/// [`RepairError::HoleFillFailed`] when a hole within the size limit cannot
/// be triangulated.
pub fn fill_holes(mesh: &mut IndexedMesh, max_hole_edges: usize) -> RepairResult<usize> {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let holes = detect_holes(mesh, &adjacency);
    if holes.is_empty() {
        return Ok(0);
    }

    let mut filled = 0;
    for hole in &holes {
        if hole.edge_count() > max_hole_edges {
            warn!(edges = hole.edge_count(), max_hole_edges, "hole too large to fill");
            continue;
        }
        let triangles = fill_hole_ear_clipping(mesh, hole);
        if triangles.is_empty() {
            return Err(RepairError::HoleFillFailed {
                reason: format!("no triangulation for hole with {} edges", hole.edge_count()),
            });
        }
        mesh.faces.extend(triangles);
        filled += 1;
    }

    if filled > 0 {
        info!(filled, "filled holes");
    }
    Ok(filled)
}
