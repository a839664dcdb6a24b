//! Horizontal cross-sections.
//!
//! Contours are chained topologically: a crossing point is identified by the
//! mesh edge it lies on, so two faces that share an edge share the crossing
//! exactly and no distance tolerance is involved. On a closed manifold mesh
//! every contour closes.

#![allow(clippy::cast_precision_loss)]

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, MeshBounds, Point3};
use tracing::debug;

use crate::error::{MeasureError, MeasureResult};

/// One chain of section points.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Points in chain order, all at the section height. A closed contour
    /// does not repeat its first point.
    pub points: Vec<Point3<f64>>,
    /// Whether the chain returned to its start.
    pub closed: bool,
}

impl Contour {
    /// Shoelace area in XY. Positive when the contour runs counter-clockwise
    /// seen from above, which for an outward-wound mesh means it bounds
    /// material; holes come out negative.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        if !self.closed {
            return 0.0;
        }
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let (p, q) = (self.points[i], self.points[(i + 1) % n]);
                p.x * q.y - q.x * p.y
            })
            .sum();
        twice * 0.5
    }

    /// Length of the chain, including the closing edge when closed.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let open: f64 = self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + (first - last).norm(),
            _ => open,
        }
    }
}

/// Intersection of a mesh with the plane `z = height`.
#[derive(Debug, Clone, Default)]
pub struct CrossSection {
    /// Section height.
    pub height: f64,
    /// All chains found.
    pub contours: Vec<Contour>,
}

impl CrossSection {
    /// True when the plane misses the mesh.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Number of closed contours, outer boundaries and holes alike.
    #[must_use]
    pub fn contour_count(&self) -> usize {
        self.contours.iter().filter(|c| c.closed).count()
    }

    /// Chains that did not close (the mesh has boundary edges at this height).
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.contours.len() - self.contour_count()
    }

    /// Net enclosed area: outer contours minus holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.contours.iter().map(Contour::signed_area).sum()
    }

    /// Total length of all chains.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.contours.iter().map(Contour::perimeter).sum()
    }
}

/// Slice a mesh with the horizontal plane `z = height`.
///
/// A vertex lying exactly on the plane counts as above it, so the section at
/// `height` is the section just below it. A plane through a top face returns
/// that face's outline; one through a bottom face returns nothing.
///
/// # Errors
///
/// [`MeasureError::EmptyMesh`] when the mesh has no faces and
/// [`MeasureError::InvalidHeight`] when `height` is not finite.
///
/// # Example
///
/// ```
/// use mesh_measure::cross_section;
/// use mesh_types::unit_cube;
///
/// let section = cross_section(&unit_cube(), 0.5)?;
/// assert_eq!(section.contour_count(), 1);
/// assert!((section.area() - 1.0).abs() < 1e-12);
/// # Ok::<(), mesh_measure::MeasureError>(())
/// ```
pub fn cross_section(mesh: &IndexedMesh, height: f64) -> MeasureResult<CrossSection> {
    if mesh.faces.is_empty() {
        return Err(MeasureError::EmptyMesh);
    }
    if !height.is_finite() {
        return Err(MeasureError::InvalidHeight { height });
    }

    let above: Vec<bool> = mesh.vertices.iter().map(|v| v.position.z >= height).collect();
    let crossing = |a: u32, b: u32| -> Point3<f64> {
        // Interpolate from the lower index so both faces get identical bits.
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (p, q) = (mesh.position(lo), mesh.position(hi));
        let t = (height - p.z) / (q.z - p.z);
        Point3::new(p.x + (q.x - p.x) * t, p.y + (q.y - p.y) * t, height)
    };

    // Directed segment per face: from the crossing on the edge that goes
    // down through the plane to the one that goes up. Keys are undirected
    // edges.
    let mut next: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
    let mut points: HashMap<(u32, u32), Point3<f64>> = HashMap::new();
    for face in &mesh.faces {
        let mut down = None;
        let mut up = None;
        for k in 0..3 {
            let (a, b) = (face[k], face[(k + 1) % 3]);
            match (above[a as usize], above[b as usize]) {
                (true, false) => down = Some((a, b)),
                (false, true) => up = Some((a, b)),
                _ => {}
            }
        }
        let (Some((a0, b0)), Some((a1, b1))) = (down, up) else {
            continue;
        };
        let from = edge_key(a0, b0);
        let to = edge_key(a1, b1);
        points.entry(from).or_insert_with(|| crossing(a0, b0));
        points.entry(to).or_insert_with(|| crossing(a1, b1));
        next.insert(from, to);
    }

    let contours = chain(&next, &points);
    debug!(height, contours = contours.len(), "sliced mesh");
    Ok(CrossSection { height, contours })
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

fn chain(
    next: &HashMap<(u32, u32), (u32, u32)>,
    points: &HashMap<(u32, u32), Point3<f64>>,
) -> Vec<Contour> {
    let has_incoming: HashSet<(u32, u32)> = next.values().copied().collect();

    // Open chains first, from their heads, then whatever closed loops remain.
    let mut starts: Vec<(u32, u32)> = next
        .keys()
        .filter(|k| !has_incoming.contains(*k))
        .copied()
        .collect();
    starts.sort_unstable();
    let mut rest: Vec<(u32, u32)> = next.keys().copied().collect();
    rest.sort_unstable();
    starts.extend(rest);

    let mut used: HashSet<(u32, u32)> = HashSet::with_capacity(next.len());
    let mut contours = Vec::new();
    for start in starts {
        if used.contains(&start) {
            continue;
        }
        let mut keys = vec![start];
        used.insert(start);
        let mut current = start;
        let closed = loop {
            match next.get(&current) {
                Some(&to) if to == start => break true,
                Some(&to) if used.insert(to) => {
                    keys.push(to);
                    current = to;
                }
                _ => break false,
            }
        };
        let pts = keys.iter().filter_map(|k| points.get(k).copied()).collect();
        contours.push(Contour {
            points: pts,
            closed,
        });
    }
    contours
}

/// Section through the middle of the mesh's Z extent.
///
/// # Errors
///
/// Same as [`cross_section`].
pub fn mid_height_section(mesh: &IndexedMesh) -> MeasureResult<CrossSection> {
    let bounds = mesh.bounds_opt().ok_or(MeasureError::EmptyMesh)?;
    cross_section(mesh, (bounds.min.z + bounds.max.z) * 0.5)
}

/// Evenly spaced sections strictly inside the Z extent.
///
/// # Errors
///
/// Same as [`cross_section`].
pub fn cross_sections(mesh: &IndexedMesh, count: usize) -> MeasureResult<Vec<CrossSection>> {
    let bounds = mesh.bounds_opt().ok_or(MeasureError::EmptyMesh)?;
    let step = (bounds.max.z - bounds.min.z) / (count + 1) as f64;
    (1..=count)
        .map(|i| cross_section(mesh, bounds.min.z + step * i as f64))
        .collect()
}

/// Net section area at `height`.
///
/// # Errors
///
/// Same as [`cross_section`].
pub fn area_at_height(mesh: &IndexedMesh, height: f64) -> MeasureResult<f64> {
    Ok(cross_section(mesh, height)?.area())
}
