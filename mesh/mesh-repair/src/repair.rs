//! Cleanup passes: welding, degenerate and duplicate faces, unused vertices.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, MeshTopology, Point3};
use tracing::{debug, info, warn};

use crate::error::{RepairError, RepairResult};
use crate::holes::fill_holes;
use crate::winding::{fix_winding_order, orient_consistently};

/// Parameters for [`repair_mesh`].
///
/// # Example
///
/// ```
/// use mesh_repair::RepairParams;
///
/// let params = RepairParams::for_scans().with_max_hole_edges(500);
/// assert_eq!(params.max_hole_edges, 500);
/// ```
#[derive(Debug, Clone)]
pub struct RepairParams {
    /// Vertices closer than this are merged (mm).
    pub weld_epsilon: f64,
    /// Faces with a smaller area are dropped (mm²).
    pub degenerate_area_threshold: f64,
    /// Holes with more boundary edges are left open.
    pub max_hole_edges: usize,
    /// Fill boundary loops.
    pub fill_holes: bool,
    /// Make winding consistent and outward.
    pub fix_winding: bool,
    /// Drop vertices no face references.
    pub remove_unreferenced: bool,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-6,
            degenerate_area_threshold: 1e-12,
            max_hole_edges: 256,
            fill_holes: true,
            fix_winding: true,
            remove_unreferenced: true,
        }
    }
}

impl RepairParams {
    /// Looser weld for noisy scan exports.
    #[must_use]
    pub fn for_scans() -> Self {
        Self {
            weld_epsilon: 1e-3,
            degenerate_area_threshold: 1e-9,
            max_hole_edges: 1024,
            ..Self::default()
        }
    }

    /// Tight settings for exact CAD exports; no hole filling.
    #[must_use]
    pub fn for_cad() -> Self {
        Self {
            weld_epsilon: 1e-9,
            degenerate_area_threshold: 1e-14,
            fill_holes: false,
            ..Self::default()
        }
    }

    /// Set the weld distance.
    #[must_use]
    pub const fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the largest hole to fill.
    #[must_use]
    pub const fn with_max_hole_edges(mut self, edges: usize) -> Self {
        self.max_hole_edges = edges;
        self
    }

    /// Enable or disable hole filling.
    #[must_use]
    pub const fn with_fill_holes(mut self, fill: bool) -> Self {
        self.fill_holes = fill;
        self
    }

    /// Enable or disable winding repair.
    #[must_use]
    pub const fn with_fix_winding(mut self, fix: bool) -> Self {
        self.fix_winding = fix;
        self
    }
}

/// What [`repair_mesh`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Vertices merged into another.
    pub vertices_welded: usize,
    /// Zero-area faces removed.
    pub degenerates_removed: usize,
    /// Repeated faces removed.
    pub duplicates_removed: usize,
    /// Holes closed.
    pub holes_filled: usize,
    /// Faces whose winding was reversed.
    pub faces_flipped: usize,
    /// Vertices dropped as unused.
    pub unreferenced_removed: usize,
}

impl RepairSummary {
    /// True when any pass changed the mesh.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        *self != Self::default()
    }
}

impl fmt::Display for RepairSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "welded {} vertices, removed {} degenerate and {} duplicate faces, \
             filled {} holes, flipped {} faces, dropped {} unused vertices",
            self.vertices_welded,
            self.degenerates_removed,
            self.duplicates_removed,
            self.holes_filled,
            self.faces_flipped,
            self.unreferenced_removed
        )
    }
}

/// Merge vertices closer than `epsilon`.
///
/// Uses a spatial hash with cells of twice the weld distance and scans the
/// 27 neighbouring cells. Faces that collapse are removed. Returns the number
/// of merged vertices.
#[allow(clippy::cast_possible_truncation)]
pub fn weld_vertices(mesh: &mut IndexedMesh, epsilon: f64) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }
    let cell_size = epsilon * 2.0;

    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (i, v) in mesh.vertices.iter().enumerate() {
        grid.entry(cell_of(&v.position, cell_size))
            .or_default()
            .push(i as u32);
    }

    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut merged = 0;

    for (i, v) in mesh.vertices.iter().enumerate() {
        let i = i as u32;
        if remap[i as usize] != i {
            continue;
        }
        let (cx, cy, cz) = cell_of(&v.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        if j <= i || remap[j as usize] != j {
                            continue;
                        }
                        if (mesh.vertices[j as usize].position - v.position).norm() < epsilon {
                            remap[j as usize] = i;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    for f in &mut mesh.faces {
        for idx in f.iter_mut() {
            *idx = remap[*idx as usize];
        }
    }
    mesh.faces.retain(|&[a, b, c]| a != b && b != c && a != c);
    debug!(merged, epsilon, "welded vertices");
    merged
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3<f64>, cell: f64) -> (i64, i64, i64) {
    (
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    )
}

/// Remove faces whose area is below `area_threshold` or that repeat an index.
pub fn remove_degenerate_triangles(mesh: &mut IndexedMesh, area_threshold: f64) -> usize {
    let before = mesh.faces.len();
    let vertices = &mesh.vertices;
    mesh.faces.retain(|&[a, b, c]| {
        if a == b || b == c || a == c {
            return false;
        }
        let (pa, pb, pc) = (
            vertices[a as usize].position,
            vertices[b as usize].position,
            vertices[c as usize].position,
        );
        (pb - pa).cross(&(pc - pa)).norm() * 0.5 >= area_threshold
    });
    before - mesh.faces.len()
}

/// Remove faces that use the same three vertices as an earlier face, in any
/// order or winding.
pub fn remove_duplicate_faces(mesh: &mut IndexedMesh) -> usize {
    let before = mesh.faces.len();
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(before);
    mesh.faces.retain(|&f| seen.insert(sorted_face(f)));
    before - mesh.faces.len()
}

fn sorted_face(mut f: [u32; 3]) -> [u32; 3] {
    f.sort_unstable();
    f
}

/// Drop vertices no face references and compact the index space.
#[allow(clippy::cast_possible_truncation)]
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    let mut used = vec![false; mesh.vertices.len()];
    for f in &mesh.faces {
        for &i in f {
            used[i as usize] = true;
        }
    }
    let unused = used.iter().filter(|&&u| !u).count();
    if unused == 0 {
        return 0;
    }

    let mut remap = vec![u32::MAX; mesh.vertices.len()];
    let mut kept = Vec::with_capacity(mesh.vertices.len() - unused);
    for (i, v) in mesh.vertices.iter().enumerate() {
        if used[i] {
            remap[i] = kept.len() as u32;
            kept.push(*v);
        }
    }
    mesh.vertices = kept;
    for f in &mut mesh.faces {
        for idx in f.iter_mut() {
            *idx = remap[*idx as usize];
        }
    }
    unused
}

/// Check indices and coordinates before any pass touches the mesh.
///
/// # Errors
///
/// [`RepairError::EmptyMesh`], [`RepairError::InvalidIndex`] or
/// [`RepairError::NonFinite`].
pub fn check_mesh_sanity(mesh: &IndexedMesh) -> RepairResult<()> {
    if mesh.faces.is_empty() {
        return Err(RepairError::EmptyMesh);
    }
    let n = mesh.vertices.len();
    if let Some(&index) = mesh.faces.iter().flatten().find(|&&i| i as usize >= n) {
        return Err(RepairError::InvalidIndex {
            index,
            vertex_count: n,
        });
    }
    let count = mesh.vertices().filter(|v| !v.is_finite()).count();
    if count > 0 {
        return Err(RepairError::NonFinite { count });
    }
    Ok(())
}

/// Run every enabled pass in order: weld, degenerate and duplicate removal,
/// hole filling, winding repair, unused-vertex removal.
///
/// # Errors
///
/// Fails when [`check_mesh_sanity`] rejects the mesh or winding repair
/// cannot orient a component. A hole that cannot be filled is logged and
/// left open; the caller decides whether an open mesh is acceptable.
pub fn repair_mesh(mesh: &mut IndexedMesh, params: &RepairParams) -> RepairResult<RepairSummary> {
    check_mesh_sanity(mesh)?;
    let mut summary = RepairSummary {
        vertices_welded: weld_vertices(mesh, params.weld_epsilon),
        ..RepairSummary::default()
    };
    summary.degenerates_removed = remove_degenerate_triangles(mesh, params.degenerate_area_threshold);
    summary.duplicates_removed = remove_duplicate_faces(mesh);

    // Hole loops are traced along directed edges, so orientation has to be
    // consistent before filling.
    if params.fix_winding {
        summary.faces_flipped = orient_consistently(mesh);
    }
    if params.fill_holes {
        match fill_holes(mesh, params.max_hole_edges) {
            Ok(filled) => summary.holes_filled = filled,
            Err(e) => warn!(error = %e, "hole filling incomplete"),
        }
    }
    if params.fix_winding {
        summary.faces_flipped += fix_winding_order(mesh)?;
    }
    if params.remove_unreferenced {
        summary.unreferenced_removed = remove_unreferenced_vertices(mesh);
    }

    if summary.had_changes() {
        info!(%summary, "mesh repaired");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeshAdjacency;
    use mesh_types::{unit_cube, Vertex};

    /// Cube as a triangle soup: every face owns its three vertices.
    fn cube_soup() -> IndexedMesh {
        let cube = unit_cube();
        let mut soup = IndexedMesh::new();
        for t in cube.triangles() {
            let base = soup.vertices.len() as u32;
            soup.vertices.push(Vertex::new(t.v0));
            soup.vertices.push(Vertex::new(t.v1));
            soup.vertices.push(Vertex::new(t.v2));
            soup.faces.push([base, base + 1, base + 2]);
        }
        soup
    }

    #[test]
    fn weld_soup_closes_cube() {
        let mut soup = cube_soup();
        assert!(!MeshAdjacency::build(&soup.faces).is_watertight());
        let merged = weld_vertices(&mut soup, 1e-6);
        assert_eq!(merged, 36 - 8);
        remove_unreferenced_vertices(&mut soup);
        assert_eq!(soup.vertices.len(), 8);
        assert!(MeshAdjacency::build(&soup.faces).is_watertight());
    }

    #[test]
    fn weld_respects_distance() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1e-4, 0.0, 0.0));
        assert_eq!(weld_vertices(&mut mesh, 1e-6), 0);
        assert_eq!(weld_vertices(&mut mesh, 1e-3), 1);
    }

    #[test]
    fn degenerate_and_duplicate_faces() {
        let mut mesh = unit_cube();
        mesh.vertices.push(Vertex::from_coords(0.5, 0.0, 0.0));
        mesh.faces.push([0, 1, 8]); // collinear
        mesh.faces.push([0, 0, 1]); // repeated index
        mesh.faces.push([2, 0, 3]); // rotated copy of face 1, reversed
        assert_eq!(remove_degenerate_triangles(&mut mesh, 1e-12), 2);
        assert_eq!(remove_duplicate_faces(&mut mesh), 1);
        assert_eq!(mesh.faces.len(), 12);
    }

    #[test]
    fn unreferenced_vertices_compact() {
        let mut mesh = unit_cube();
        mesh.vertices.insert(0, Vertex::from_coords(9.0, 9.0, 9.0));
        for f in &mut mesh.faces {
            for i in f.iter_mut() {
                *i += 1;
            }
        }
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 1);
        assert_eq!(mesh.vertices.len(), 8);
        assert!((mesh.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sanity_rejects_bad_input() {
        assert!(matches!(
            check_mesh_sanity(&IndexedMesh::new()),
            Err(RepairError::EmptyMesh)
        ));
        let mut mesh = unit_cube();
        mesh.faces.push([0, 1, 42]);
        assert!(matches!(
            check_mesh_sanity(&mesh),
            Err(RepairError::InvalidIndex { index: 42, .. })
        ));
        let mut mesh = unit_cube();
        mesh.vertices[0].position.x = f64::NAN;
        assert!(matches!(
            check_mesh_sanity(&mesh),
            Err(RepairError::NonFinite { count: 1 })
        ));
    }

    #[test]
    fn full_repair_of_soup_with_hole_and_flip() {
        let mut soup = cube_soup();
        soup.faces.remove(2); // open the top
        soup.faces[0].swap(1, 2); // one face wound inward
        let summary = repair_mesh(&mut soup, &RepairParams::default());
        let Ok(summary) = summary else {
            panic!("repair failed: {summary:?}");
        };
        assert!(summary.had_changes());
        assert_eq!(summary.holes_filled, 1);
        let adj = MeshAdjacency::build(&soup.faces);
        assert!(adj.is_watertight());
        assert!((soup.signed_volume() - 1.0).abs() < 1e-9);
        assert!(summary.to_string().contains("filled 1 holes"));
    }

    #[test]
    fn presets_differ() {
        assert!(RepairParams::for_scans().weld_epsilon > RepairParams::default().weld_epsilon);
        assert!(!RepairParams::for_cad().fill_holes);
        let p = RepairParams::default().with_fill_holes(false).with_fix_winding(false);
        assert!(!p.fill_holes && !p.fix_winding);
    }
}
