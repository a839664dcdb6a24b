//! Closing a clipped mesh with faces on the prism wall.
//!
//! The wall is unrolled into the plane `(s, z)`, cut open at a polygon
//! corner that lies outside the mesh. The open boundary left by clipping
//! becomes a set of closed loops in that plane, which are triangulated with
//! their edges as constraints. Polygon corners that pass through the mesh
//! add vertical constraints so no cap face folds around a corner.

use hashbrown::HashMap;
use mesh_repair::MeshAdjacency;
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Triangulation as _};
use tracing::debug;

use crate::clip::{spade_point, WallVertices};
use crate::config::Side;
use crate::error::{BooleanError, BooleanResult};
use crate::index::{Segment2, SlabIndex};
use crate::prism::Prism;

/// Where the wall is cut open: the polygon corner farthest outside the
/// mesh footprint `[min, max]`.
///
/// # Errors
///
/// [`BooleanError::SeamInsideMesh`] when no corner lies strictly outside.
pub(crate) fn seam(prism: &Prism, min: [f64; 2], max: [f64; 2]) -> BooleanResult<f64> {
    let mut best: Option<(f64, usize)> = None;
    for (k, p) in prism.polygon().iter().enumerate() {
        let outside = (min[0] - p.x).max(p.x - max[0]).max(min[1] - p.y).max(p.y - max[1]);
        if outside > 0.0 && best.map_or(true, |(d, _)| outside > d) {
            best = Some((outside, k));
        }
    }
    best.map(|(_, k)| prism.wall_s(k, 0.0))
        .ok_or(BooleanError::SeamInsideMesh)
}

/// Cap faces for the open boundary of `faces`.
///
/// Every boundary vertex must lie on the wall. Faces are wound outward for
/// the kept `side`.
pub(crate) fn cap_faces(
    faces: &[[u32; 3]],
    wall: &WallVertices,
    prism: &Prism,
    side: Side,
    seam: f64,
) -> BooleanResult<Vec<[u32; 3]>> {
    let adjacency = MeshAdjacency::build(faces);
    let mut edges: Vec<(u32, u32)> = adjacency.boundary_edges().collect();
    if edges.is_empty() {
        return Ok(Vec::new());
    }
    edges.sort_unstable();

    let mut vertices: Vec<u32> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();
    vertices.sort_unstable();
    vertices.dedup();

    let perimeter = prism.perimeter();
    let mut unrolled: HashMap<u32, [f64; 2]> = HashMap::with_capacity(vertices.len());
    for &v in &vertices {
        let i = wall
            .get(v)
            .ok_or_else(|| BooleanError::degenerate(format!("open edge at vertex {v} off the prism wall")))?;
        unrolled.insert(v, [(wall.s[i] - seam).rem_euclid(perimeter), wall.positions[i].z]);
    }

    let mut cdt: ConstrainedDelaunayTriangulation<spade::Point2<f64>> = ConstrainedDelaunayTriangulation::new();
    let mut handles: HashMap<u32, FixedVertexHandle> = HashMap::with_capacity(vertices.len());
    for &v in &vertices {
        let [s, z] = unrolled[&v];
        let h = cdt
            .insert(spade_point(s, z))
            .map_err(|e| BooleanError::degenerate(format!("cap insert: {e:?}")))?;
        if h.index() != handles.len() {
            return Err(BooleanError::degenerate("coincident cap vertices"));
        }
        handles.insert(v, h);
    }

    for &(a, b) in &edges {
        cdt.add_constraint_and_split(handles[&a], handles[&b], |p| p);
    }

    // Columns where the wall turns a polygon corner.
    let mut columns: Vec<(u32, f64, u32)> = vertices
        .iter()
        .filter_map(|&v| {
            let i = wall.get(v)?;
            wall.corner[i].map(|k| (k, wall.positions[i].z, v))
        })
        .collect();
    columns.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.total_cmp(&y.1)));
    for pair in columns.windows(2) {
        if pair[0].0 == pair[1].0 {
            cdt.add_constraint_and_split(handles[&pair[0].2], handles[&pair[1].2], |p| p);
        }
    }

    if cdt.num_vertices() != vertices.len() {
        return Err(BooleanError::degenerate("cap boundary intersects itself"));
    }

    let loops: Vec<Segment2> = edges.iter().map(|(a, b)| [unrolled[a], unrolled[b]]).collect();
    let region = SlabIndex::new(loops);

    let mut caps = Vec::with_capacity(edges.len());
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        let pos = vs.map(|v| v.position());
        let centroid = [(pos[0].x + pos[1].x + pos[2].x) / 3.0, (pos[0].y + pos[1].y + pos[2].y) / 3.0];
        if !region.contains(centroid) {
            continue;
        }
        let ids = vs.map(|v| vertices[v.fix().index()]);
        caps.push(match side {
            Side::Inside => [ids[0], ids[1], ids[2]],
            Side::Outside => [ids[0], ids[2], ids[1]],
        });
    }
    debug!(boundary_edges = edges.len(), cap_faces = caps.len(), "capped wall");
    Ok(caps)
}
