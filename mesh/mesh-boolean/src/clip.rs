//! Splitting mesh triangles along the prism wall.
//!
//! Every crossing between a mesh edge and a polygon segment is computed once,
//! keyed by the undirected edge, and becomes one shared output vertex. Each
//! triangle touched by the wall is then re-triangulated with a constrained
//! Delaunay triangulation whose constraints are its own (split) edges plus
//! the pieces of the polygon that run through it. Sub-triangles are kept or
//! dropped by which side of the wall their centroid falls on.

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vector3};
use nalgebra::Point2;
use rayon::prelude::*;
use smallvec::SmallVec;
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Triangulation as _};

use crate::config::{BooleanConfig, Side};
use crate::error::{BooleanError, BooleanResult};
use crate::prism::Prism;

type Cdt = ConstrainedDelaunayTriangulation<spade::Point2<f64>>;

/// Undirected mesh edge, lower index first.
pub(crate) type EdgeKey = (u32, u32);

pub(crate) fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// One wall crossing on a mesh edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeCrossing {
    /// Parameter along the edge, from its lower-indexed endpoint.
    pub t: f64,
    /// Polygon segment crossed.
    pub segment: u32,
    /// Parameter along the segment.
    pub u: f64,
    /// Output vertex.
    pub vertex: u32,
}

/// Vertices created on the wall, numbered after the input vertices.
#[derive(Debug, Default)]
pub(crate) struct WallVertices {
    pub base: u32,
    pub positions: Vec<Point3<f64>>,
    /// Arc-length wall coordinate of each vertex.
    pub s: Vec<f64>,
    /// Polygon corner a vertex was lifted from, if any.
    pub corner: Vec<Option<u32>>,
}

impl WallVertices {
    #[allow(clippy::cast_possible_truncation)]
    fn push(&mut self, position: Point3<f64>, s: f64, corner: Option<u32>) -> u32 {
        self.positions.push(position);
        self.s.push(s);
        self.corner.push(corner);
        self.base + (self.positions.len() - 1) as u32
    }

    pub(crate) fn get(&self, vertex: u32) -> Option<usize> {
        let i = vertex.checked_sub(self.base)? as usize;
        (i < self.positions.len()).then_some(i)
    }
}

fn xy(p: &Point3<f64>) -> [f64; 2] {
    [p.x, p.y]
}

fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn point_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p[0] - a[0] - t * dx).hypot(p[1] - a[1] - t * dy)
}

fn pt(p: Point2<f64>) -> [f64; 2] {
    [p.x, p.y]
}

/// Crossings of every mesh edge with the prism wall.
pub(crate) struct CrossingTable {
    pub edges: HashMap<EdgeKey, SmallVec<[EdgeCrossing; 2]>>,
}

impl CrossingTable {
    /// Compute all crossings and append their vertices to `wall`.
    ///
    /// Fails with a numerical error when a mesh vertex comes within the
    /// contact tolerance of the wall or a polygon corner comes within it of
    /// a mesh edge; the caller nudges the prism and retries.
    pub(crate) fn build(
        mesh: &IndexedMesh,
        prism: &Prism,
        config: &BooleanConfig,
        wall: &mut WallVertices,
    ) -> BooleanResult<Self> {
        let tol = config.contact_tolerance;

        let vertex_contact = |p: &Point3<f64>| {
            let q = xy(p);
            prism
                .candidates([q[0] - tol, q[1] - tol], [q[0] + tol, q[1] + tol])
                .iter()
                .any(|&k| {
                    let (a, b) = prism.segment(k as usize);
                    point_segment_distance(q, pt(a), pt(b)) < tol
                })
        };
        let touching = if config.parallel {
            mesh.vertices.par_iter().any(|v| vertex_contact(&v.position))
        } else {
            mesh.vertices.iter().any(|v| vertex_contact(&v.position))
        };
        if touching {
            return Err(BooleanError::degenerate("mesh vertex on prism wall"));
        }

        let mut keys: Vec<EdgeKey> = mesh
            .faces
            .iter()
            .flat_map(|f| [edge_key(f[0], f[1]), edge_key(f[1], f[2]), edge_key(f[2], f[0])])
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let compute = |&(a, b): &EdgeKey| edge_crossings(mesh, prism, a, b, tol);
        let found: Vec<SmallVec<[(f64, u32, f64); 2]>> = if config.parallel {
            keys.par_iter().map(compute).collect::<BooleanResult<_>>()?
        } else {
            keys.iter().map(compute).collect::<BooleanResult<_>>()?
        };

        let mut edges = HashMap::with_capacity(keys.len() / 8 + 1);
        for ((a, b), list) in keys.into_iter().zip(found) {
            if list.is_empty() {
                continue;
            }
            let (pa, pb) = (mesh.position(a), mesh.position(b));
            let crossings = list
                .into_iter()
                .map(|(t, segment, u)| EdgeCrossing {
                    t,
                    segment,
                    u,
                    vertex: wall.push(
                        pa + (pb - pa) * t,
                        prism.wall_s(segment as usize, u),
                        None,
                    ),
                })
                .collect();
            edges.insert((a, b), crossings);
        }
        Ok(Self { edges })
    }

    fn on_edge(&self, a: u32, b: u32) -> &[EdgeCrossing] {
        self.edges.get(&edge_key(a, b)).map_or(&[], |v| v.as_slice())
    }
}

/// Proper crossings of edge `a`-`b` (with `a < b`) in XY, sorted along the
/// edge as `(t, segment, u)`.
fn edge_crossings(
    mesh: &IndexedMesh,
    prism: &Prism,
    a: u32,
    b: u32,
    tol: f64,
) -> BooleanResult<SmallVec<[(f64, u32, f64); 2]>> {
    let (pa, pb) = (xy(&mesh.position(a)), xy(&mesh.position(b)));
    let min = [pa[0].min(pb[0]) - tol, pa[1].min(pb[1]) - tol];
    let max = [pa[0].max(pb[0]) + tol, pa[1].max(pb[1]) + tol];

    let mut out = SmallVec::new();
    for k in prism.candidates(min, max) {
        let (q0, q1) = prism.segment(k as usize);
        let (q0, q1) = (pt(q0), pt(q1));
        if point_segment_distance(q0, pa, pb) < tol || point_segment_distance(q1, pa, pb) < tol {
            return Err(BooleanError::degenerate("prism corner on mesh edge"));
        }
        let d1 = orient(q0, q1, pa);
        let d2 = orient(q0, q1, pb);
        if (d1 > 0.0) == (d2 > 0.0) {
            continue;
        }
        let d3 = orient(pa, pb, q0);
        let d4 = orient(pa, pb, q1);
        if (d3 > 0.0) == (d4 > 0.0) {
            continue;
        }
        out.push((d1 / (d1 - d2), k, d3 / (d3 - d4)));
    }
    out.sort_by(|x: &(f64, u32, f64), y| x.0.total_cmp(&y.0));
    Ok(out)
}

/// Output vertex of a sub-triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VRef {
    /// Input vertex or shared crossing vertex.
    Mesh(u32),
    /// Polygon corner lifted into this triangle (index into `Piece::lifted`).
    Lifted(u32),
}

/// What survives of one input triangle.
#[derive(Debug, Default)]
pub(crate) struct Piece {
    pub faces: SmallVec<[[VRef; 3]; 4]>,
    /// Polygon corner and its position on the triangle's plane.
    pub lifted: SmallVec<[(u32, Point3<f64>); 1]>,
    pub split: bool,
}

/// Per-clip shared state.
pub(crate) struct Clipper<'a> {
    pub mesh: &'a IndexedMesh,
    pub prism: &'a Prism,
    pub side: Side,
    pub table: &'a CrossingTable,
    pub wall: &'a WallVertices,
    pub config: &'a BooleanConfig,
}

/// Point inserted into a per-triangle triangulation.
#[derive(Clone, Copy)]
struct Slot {
    vref: VRef,
    /// Bit `k` set when the point lies on triangle edge `k`.
    edges: u8,
}

/// Corner `k` lies on edges `k` and `k - 1`.
fn corner_slot(face: [u32; 3], k: usize) -> Slot {
    Slot {
        vref: VRef::Mesh(face[k]),
        edges: (1 << k) | (1 << ((k + 2) % 3)),
    }
}

/// Triangulation point with sub-normal coordinates flushed to zero, which
/// spade rejects.
pub(crate) fn spade_point(x: f64, y: f64) -> spade::Point2<f64> {
    let flush = |v: f64| if v.abs() <= spade::MIN_ALLOWED_VALUE { 0.0 } else { v };
    spade::Point2::new(flush(x), flush(y))
}

fn insert(cdt: &mut Cdt, slots: &mut Vec<Slot>, p: [f64; 2], slot: Slot) -> BooleanResult<FixedVertexHandle> {
    let handle = cdt
        .insert(spade_point(p[0], p[1]))
        .map_err(|e| BooleanError::degenerate(format!("triangulation insert: {e:?}")))?;
    if handle.index() != slots.len() {
        return Err(BooleanError::degenerate("coincident points in triangle split"));
    }
    slots.push(slot);
    Ok(handle)
}

fn insert_corners(
    cdt: &mut Cdt,
    slots: &mut Vec<Slot>,
    face: [u32; 3],
    at: [[f64; 2]; 3],
) -> BooleanResult<[FixedVertexHandle; 3]> {
    let a = insert(cdt, slots, at[0], corner_slot(face, 0))?;
    let b = insert(cdt, slots, at[1], corner_slot(face, 1))?;
    let c = insert(cdt, slots, at[2], corner_slot(face, 2))?;
    Ok([a, b, c])
}

fn constrain(cdt: &mut Cdt, a: FixedVertexHandle, b: FixedVertexHandle) {
    cdt.add_constraint_and_split(a, b, |p| p);
}

impl Clipper<'_> {
    fn keeps(&self, x: f64, y: f64) -> bool {
        self.prism.contains_xy(x, y) == (self.side == Side::Inside)
    }

    /// Clip every face, in face order.
    pub(crate) fn run(&self) -> BooleanResult<Vec<Piece>> {
        let count = self.mesh.faces.len();
        if self.config.parallel {
            (0..count).into_par_iter().map(|f| self.clip_face(f)).collect()
        } else {
            (0..count).map(|f| self.clip_face(f)).collect()
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn clip_face(&self, f: usize) -> BooleanResult<Piece> {
        let face = self.mesh.faces[f];
        let p = face.map(|i| self.mesh.position(i));

        // Crossings of each triangle edge, ordered from corner k to k + 1.
        let mut chains: [SmallVec<[(f64, EdgeCrossing); 2]>; 3] = Default::default();
        for (k, chain) in chains.iter_mut().enumerate() {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            for &c in self.table.on_edge(a, b) {
                chain.push((if a < b { c.t } else { 1.0 - c.t }, c));
            }
            chain.sort_by(|x, y| x.0.total_cmp(&y.0));
        }

        let normal: Vector3<f64> = (p[1] - p[0]).cross(&(p[2] - p[0]));
        let vertical = normal.z.abs() <= self.config.vertical_tolerance * normal.norm();
        let corners: SmallVec<[u32; 2]> = if vertical {
            SmallVec::new()
        } else {
            self.interior_corners(&p, normal.z)
        };

        if chains.iter().all(SmallVec::is_empty) && corners.is_empty() {
            let c = (p[0].coords + p[1].coords + p[2].coords) / 3.0;
            let mut piece = Piece::default();
            if self.keeps(c.x, c.y) {
                piece.faces.push(face.map(VRef::Mesh));
            }
            return Ok(piece);
        }
        if normal.norm() == 0.0 {
            return Err(BooleanError::degenerate(format!("zero-area face {f} on the wall")));
        }

        if vertical {
            self.split_vertical(face, &p, &chains)
        } else {
            self.split_planar(face, &p, normal, &chains, &corners)
        }
    }

    /// Polygon corners strictly inside the triangle's XY projection.
    #[allow(clippy::cast_possible_truncation)]
    fn interior_corners(&self, p: &[Point3<f64>; 3], nz: f64) -> SmallVec<[u32; 2]> {
        let q = p.map(|v| xy(&v));
        let min = [q[0][0].min(q[1][0]).min(q[2][0]), q[0][1].min(q[1][1]).min(q[2][1])];
        let max = [q[0][0].max(q[1][0]).max(q[2][0]), q[0][1].max(q[1][1]).max(q[2][1])];
        let sign = nz.signum();
        self.prism
            .candidates(min, max)
            .into_iter()
            .filter(|&k| {
                let c = pt(self.prism.vertex(k as usize));
                (0..3).all(|i| orient(q[i], q[(i + 1) % 3], c) * sign > 0.0)
            })
            .collect()
    }

    fn split_planar(
        &self,
        face: [u32; 3],
        p: &[Point3<f64>; 3],
        normal: Vector3<f64>,
        chains: &[SmallVec<[(f64, EdgeCrossing); 2]>; 3],
        corners: &[u32],
    ) -> BooleanResult<Piece> {
        let origin = xy(&p[0]);
        let local = |q: [f64; 2]| [q[0] - origin[0], q[1] - origin[1]];
        let n = self.prism.vertex_count();

        let mut cdt = Cdt::new();
        let mut slots = Vec::with_capacity(8);
        let mut piece = Piece {
            split: true,
            ..Piece::default()
        };

        let corner_handles = insert_corners(&mut cdt, &mut slots, face, p.map(|v| local(xy(&v))))?;

        // Points where polygon segments meet the triangle, as (segment, u).
        let mut events: SmallVec<[(u32, f64, FixedVertexHandle); 8]> = SmallVec::new();
        let mut chain_handles: [SmallVec<[FixedVertexHandle; 4]>; 3] = Default::default();
        for k in 0..3 {
            chain_handles[k].push(corner_handles[k]);
            for &(_, c) in &chains[k] {
                let pos = self.position(c.vertex);
                let h = insert(&mut cdt, &mut slots, local(xy(&pos)), Slot { vref: VRef::Mesh(c.vertex), edges: 1 << k })?;
                chain_handles[k].push(h);
                events.push((c.segment, c.u, h));
            }
            chain_handles[k].push(corner_handles[(k + 1) % 3]);
        }

        for &k in corners {
            let c = self.prism.vertex(k as usize);
            let z = p[0].z - (normal.x * (c.x - p[0].x) + normal.y * (c.y - p[0].y)) / normal.z;
            let lifted = piece.lifted.len() as u32;
            piece.lifted.push((k, Point3::new(c.x, c.y, z)));
            let h = insert(&mut cdt, &mut slots, local(pt(c)), Slot { vref: VRef::Lifted(lifted), edges: 0 })?;
            events.push((k, 0.0, h));
            events.push((((k as usize + n - 1) % n) as u32, 1.0, h));
        }

        for chain in &chain_handles {
            for w in chain.windows(2) {
                constrain(&mut cdt, w[0], w[1]);
            }
        }

        let q = p.map(|v| xy(&v));
        let sign = normal.z.signum();
        let inside_triangle = |c: [f64; 2]| (0..3).all(|i| orient(q[i], q[(i + 1) % 3], c) * sign > 0.0);
        events.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.total_cmp(&y.1)));
        for w in events.windows(2) {
            let ((j, u0, h0), (k, u1, h1)) = (w[0], w[1]);
            if j != k {
                continue;
            }
            let (a, b) = self.prism.segment(j as usize);
            let m = (u0 + u1) * 0.5;
            if inside_triangle([a.x + (b.x - a.x) * m, a.y + (b.y - a.y) * m]) {
                constrain(&mut cdt, h0, h1);
            }
        }

        if cdt.num_vertices() != slots.len() {
            return Err(BooleanError::degenerate("wall piece crosses a triangle edge"));
        }
        self.collect_faces(&cdt, &slots, &mut piece, sign < 0.0, |c| [c[0] + origin[0], c[1] + origin[1]]);
        Ok(piece)
    }

    /// Split a triangle standing upright: work in its own plane, with
    /// coordinates (distance along its XY line, z).
    fn split_vertical(
        &self,
        face: [u32; 3],
        p: &[Point3<f64>; 3],
        chains: &[SmallVec<[(f64, EdgeCrossing); 2]>; 3],
    ) -> BooleanResult<Piece> {
        let q = p.map(|v| xy(&v));
        let (mut best, mut dir) = (0.0, [0.0; 2]);
        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let d = [q[j][0] - q[i][0], q[j][1] - q[i][1]];
            let len = d[0].hypot(d[1]);
            if len > best {
                best = len;
                dir = [d[0] / len, d[1] / len];
            }
        }
        if best == 0.0 {
            return Err(BooleanError::degenerate("upright triangle with no XY extent"));
        }
        let origin = q[0];
        let z0 = p[0].z;
        let local = |v: &Point3<f64>| {
            [(v.x - origin[0]) * dir[0] + (v.y - origin[1]) * dir[1], v.z - z0]
        };

        let mut cdt = Cdt::new();
        let mut slots = Vec::with_capacity(8);
        let mut piece = Piece {
            split: true,
            ..Piece::default()
        };

        let corner_handles = insert_corners(&mut cdt, &mut slots, face, p.map(|v| local(&v)))?;

        let mut by_segment: SmallVec<[(u32, FixedVertexHandle); 4]> = SmallVec::new();
        let mut chain_handles: [SmallVec<[FixedVertexHandle; 4]>; 3] = Default::default();
        for k in 0..3 {
            chain_handles[k].push(corner_handles[k]);
            for &(_, c) in &chains[k] {
                let h = insert(&mut cdt, &mut slots, local(&self.position(c.vertex)), Slot { vref: VRef::Mesh(c.vertex), edges: 1 << k })?;
                chain_handles[k].push(h);
                by_segment.push((c.segment, h));
            }
            chain_handles[k].push(corner_handles[(k + 1) % 3]);
        }
        for chain in &chain_handles {
            for w in chain.windows(2) {
                constrain(&mut cdt, w[0], w[1]);
            }
        }
        by_segment.sort_by_key(|e| e.0);
        for group in by_segment.chunk_by(|x, y| x.0 == y.0) {
            let [(_, a), (_, b)] = group else {
                return Err(BooleanError::degenerate("segment crosses upright triangle an odd number of times"));
            };
            constrain(&mut cdt, *a, *b);
        }

        if cdt.num_vertices() != slots.len() {
            return Err(BooleanError::degenerate("wall piece crosses an upright triangle edge"));
        }
        let l = p.map(|v| local(&v));
        let flipped = orient(l[0], l[1], l[2]) < 0.0;
        self.collect_faces(&cdt, &slots, &mut piece, flipped, |c| {
            [origin[0] + dir[0] * c[0], origin[1] + dir[1] * c[0]]
        });
        Ok(piece)
    }

    /// Keep sub-triangles on the wanted side, dropping slivers whose corners
    /// all lie on one input edge.
    fn collect_faces(
        &self,
        cdt: &Cdt,
        slots: &[Slot],
        piece: &mut Piece,
        flipped: bool,
        to_xy: impl Fn([f64; 2]) -> [f64; 2],
    ) {
        for face in cdt.inner_faces() {
            let vs = face.vertices();
            let s = vs.map(|v| slots[v.fix().index()]);
            if s[0].edges & s[1].edges & s[2].edges != 0 {
                continue;
            }
            let pos = vs.map(|v| v.position());
            let c = [(pos[0].x + pos[1].x + pos[2].x) / 3.0, (pos[0].y + pos[1].y + pos[2].y) / 3.0];
            let c = to_xy(c);
            if !self.keeps(c[0], c[1]) {
                continue;
            }
            piece.faces.push(if flipped {
                [s[0].vref, s[2].vref, s[1].vref]
            } else {
                [s[0].vref, s[1].vref, s[2].vref]
            });
        }
    }

    fn position(&self, vertex: u32) -> Point3<f64> {
        match self.wall.get(vertex) {
            Some(i) => self.wall.positions[i],
            None => self.mesh.position(vertex),
        }
    }
}

/// Faces of the clipped surface plus counts for reporting.
#[derive(Debug, Default)]
pub(crate) struct Merged {
    pub faces: Vec<[u32; 3]>,
    pub faces_split: usize,
    pub faces_dropped: usize,
}

/// Concatenate pieces in face order, numbering lifted corners as new wall
/// vertices.
pub(crate) fn merge(pieces: Vec<Piece>, prism: &Prism, wall: &mut WallVertices) -> Merged {
    let mut out = Merged {
        faces: Vec::with_capacity(pieces.len()),
        ..Merged::default()
    };
    for piece in pieces {
        if piece.split {
            out.faces_split += 1;
        } else if piece.faces.is_empty() {
            out.faces_dropped += 1;
        }
        let lifted: SmallVec<[u32; 1]> = piece
            .lifted
            .iter()
            .map(|&(k, p)| wall.push(p, prism.wall_s(k as usize, 0.0), Some(k)))
            .collect();
        out.faces.extend(piece.faces.iter().map(|f| {
            f.map(|r| match r {
                VRef::Mesh(i) => i,
                VRef::Lifted(j) => lifted[j as usize],
            })
        }));
    }
    out
}
