//! Boolean operations between a closed mesh and a vertical prism.

use mesh_repair::{remove_unreferenced_vertices, MeshAdjacency};
use mesh_types::{IndexedMesh, MeshBounds, Vertex};
use tracing::{debug, info};

use crate::cap::{cap_faces, seam};
use crate::clip::{merge, Clipper, CrossingTable, WallVertices};
use crate::config::{BooleanConfig, BooleanOp, Side};
use crate::error::{BooleanError, BooleanResult};
use crate::prism::Prism;

/// Direction of successive nudges. Irrational ratio, so repeated shifts
/// never line up with an axis-aligned feature again.
const NUDGE_DIRECTION: (f64, f64) = (0.786_151_377_757_423_3, 0.618_033_988_749_894_8);

/// Statistics from a boolean operation.
#[derive(Debug, Clone, Default)]
pub struct BooleanStats {
    /// Input faces cut by the wall.
    pub faces_split: usize,
    /// Input faces discarded whole.
    pub faces_dropped: usize,
    /// Vertices created on the wall.
    pub new_vertices: usize,
    /// Faces added to close the cut.
    pub cap_faces: usize,
    /// Nudged retries before the clip succeeded.
    pub nudges: usize,
}

/// Result of a boolean operation.
#[derive(Debug)]
pub struct BooleanOperationResult {
    /// The resulting mesh, closed and manifold. Empty when nothing of the
    /// input lies on the kept side.
    pub mesh: IndexedMesh,
    /// Statistics about the operation.
    pub stats: BooleanStats,
}

/// Clip a closed mesh against a prism.
///
/// The prism must span the mesh vertically. Contacts between mesh features
/// and the prism wall closer than `config.contact_tolerance` are resolved by
/// translating the prism by a few multiples of `config.nudge`.
///
/// # Errors
///
/// - [`BooleanError::EmptyMesh`] when the mesh has no faces.
/// - [`BooleanError::OpenInput`] when it has boundary edges.
/// - [`BooleanError::PrismTooShort`] when the prism does not span it.
/// - [`BooleanError::SeamInsideMesh`] when every polygon corner lies over
///   the mesh footprint.
/// - [`BooleanError::NumericalError`] when every nudged attempt hit
///   degenerate geometry.
///
/// # Example
///
/// ```
/// use mesh_boolean::{boolean_operation, BooleanConfig, BooleanOp, Prism};
/// use mesh_types::{cuboid, Point3};
/// use nalgebra::Point2;
///
/// let block = cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
/// let half = Prism::new(
///     vec![
///         Point2::new(-5.0, -5.0),
///         Point2::new(5.3, -5.0),
///         Point2::new(5.3, 15.0),
///         Point2::new(-5.0, 15.0),
///     ],
///     -1.0,
///     11.0,
/// )?;
/// let left = boolean_operation(&block, &half, BooleanOp::Intersection, &BooleanConfig::default())?;
/// assert!((left.mesh.volume() - 530.0).abs() < 1e-6);
/// # Ok::<(), mesh_boolean::BooleanError>(())
/// ```
pub fn boolean_operation(
    mesh: &IndexedMesh,
    prism: &Prism,
    operation: BooleanOp,
    config: &BooleanConfig,
) -> BooleanResult<BooleanOperationResult> {
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(BooleanError::EmptyMesh {
            details: "mesh has no faces".to_string(),
        });
    }

    let bounds = mesh.bounds();
    if prism.z_min() >= bounds.min.z || prism.z_max() <= bounds.max.z {
        return Err(BooleanError::PrismTooShort {
            prism_min: prism.z_min(),
            prism_max: prism.z_max(),
            mesh_min: bounds.min.z,
            mesh_max: bounds.max.z,
        });
    }

    let adjacency = MeshAdjacency::build(&mesh.faces);
    let boundary_edges = adjacency.boundary_edge_count();
    if boundary_edges > 0 {
        return Err(BooleanError::OpenInput { boundary_edges });
    }

    let side = operation.side();
    let footprint = ([bounds.min.x, bounds.min.y], [bounds.max.x, bounds.max.y]);
    let mut last = String::new();
    for attempt in 0..=config.max_nudges {
        let shifted;
        let current = if attempt == 0 {
            prism
        } else {
            #[allow(clippy::cast_precision_loss)]
            let step = config.nudge * attempt as f64;
            shifted = prism.translated(step * NUDGE_DIRECTION.0, step * NUDGE_DIRECTION.1);
            &shifted
        };

        match clip_once(mesh, current, side, footprint, config) {
            Ok(mut result) => {
                result.stats.nudges = attempt;
                info!(
                    ?operation,
                    faces = result.mesh.faces.len(),
                    split = result.stats.faces_split,
                    caps = result.stats.cap_faces,
                    nudges = attempt,
                    "prism clip complete"
                );
                return Ok(result);
            }
            Err(BooleanError::NumericalError { details, .. }) => {
                debug!(attempt, %details, "degenerate contact, nudging prism");
                last = details;
            }
            Err(BooleanError::NotWatertight {
                boundary_edges,
                non_manifold_edges,
            }) => {
                debug!(attempt, boundary_edges, non_manifold_edges, "open result, nudging prism");
                last = format!("{boundary_edges} boundary and {non_manifold_edges} non-manifold edges");
            }
            Err(e) => return Err(e),
        }
    }
    Err(BooleanError::NumericalError {
        details: last,
        attempts: config.max_nudges + 1,
    })
}

fn clip_once(
    mesh: &IndexedMesh,
    prism: &Prism,
    side: Side,
    footprint: ([f64; 2], [f64; 2]),
    config: &BooleanConfig,
) -> BooleanResult<BooleanOperationResult> {
    let seam_s = seam(prism, footprint.0, footprint.1)?;

    #[allow(clippy::cast_possible_truncation)]
    let mut wall = WallVertices {
        base: mesh.vertices.len() as u32,
        ..WallVertices::default()
    };
    let table = CrossingTable::build(mesh, prism, config, &mut wall)?;
    let pieces = Clipper {
        mesh,
        prism,
        side,
        table: &table,
        wall: &wall,
        config,
    }
    .run()?;
    let merged = merge(pieces, prism, &mut wall);
    let caps = cap_faces(&merged.faces, &wall, prism, side, seam_s)?;

    let mut vertices = Vec::with_capacity(mesh.vertices.len() + wall.positions.len());
    vertices.extend_from_slice(&mesh.vertices);
    vertices.extend(wall.positions.iter().copied().map(Vertex::new));
    let cap_count = caps.len();
    let mut faces = merged.faces;
    faces.extend(caps);
    let mut out = IndexedMesh::from_parts(vertices, faces);
    remove_unreferenced_vertices(&mut out);

    let adjacency = MeshAdjacency::build(&out.faces);
    if !(adjacency.is_watertight() && adjacency.is_manifold()) {
        return Err(BooleanError::NotWatertight {
            boundary_edges: adjacency.boundary_edge_count(),
            non_manifold_edges: adjacency.non_manifold_edge_count(),
        });
    }

    Ok(BooleanOperationResult {
        mesh: out,
        stats: BooleanStats {
            faces_split: merged.faces_split,
            faces_dropped: merged.faces_dropped,
            new_vertices: wall.positions.len(),
            cap_faces: cap_count,
            nudges: 0,
        },
    })
}

/// Keep the part of `mesh` inside `prism`, with default settings.
///
/// # Errors
///
/// See [`boolean_operation`].
pub fn intersect_prism(mesh: &IndexedMesh, prism: &Prism) -> BooleanResult<IndexedMesh> {
    boolean_operation(mesh, prism, BooleanOp::Intersection, &BooleanConfig::default()).map(|r| r.mesh)
}

/// Keep the part of `mesh` outside `prism`, with default settings.
///
/// # Errors
///
/// See [`boolean_operation`].
pub fn subtract_prism(mesh: &IndexedMesh, prism: &Prism) -> BooleanResult<IndexedMesh> {
    boolean_operation(mesh, prism, BooleanOp::Difference, &BooleanConfig::default()).map(|r| r.mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{cuboid, Point3};
    use nalgebra::Point2;

    fn prism(points: &[(f64, f64)], z_min: f64, z_max: f64) -> Prism {
        let ring = points.iter().map(|&(x, y)| Point2::new(x, y)).collect();
        match Prism::new(ring, z_min, z_max) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    fn block() -> IndexedMesh {
        cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0))
    }

    fn closed(mesh: &IndexedMesh) -> bool {
        let adj = MeshAdjacency::build(&mesh.faces);
        adj.is_watertight() && adj.is_manifold()
    }

    fn run(mesh: &IndexedMesh, p: &Prism, op: BooleanOp) -> BooleanOperationResult {
        match boolean_operation(mesh, p, op, &BooleanConfig::default()) {
            Ok(r) => r,
            Err(e) => panic!("{op:?} failed: {e}"),
        }
    }

    #[test]
    fn half_plane_cut() {
        let p = prism(&[(-5.0, -5.0), (4.3, -5.0), (4.3, 15.0), (-5.0, 15.0)], -1.0, 11.0);
        let inside = run(&block(), &p, BooleanOp::Intersection);
        let outside = run(&block(), &p, BooleanOp::Difference);
        assert!(closed(&inside.mesh) && closed(&outside.mesh));
        assert_relative_eq!(inside.mesh.volume(), 430.0, epsilon = 1e-6);
        assert_relative_eq!(outside.mesh.volume(), 570.0, epsilon = 1e-6);
        assert!(inside.stats.faces_split > 0);
        assert!(inside.stats.cap_faces >= 2);
    }

    #[test]
    fn corner_inside_mesh() {
        // L-shaped notch whose reflex corner lies over the block.
        let p = prism(
            &[(-5.0, -5.0), (15.0, -5.0), (15.0, 3.7), (6.1, 3.7), (6.1, 15.0), (-5.0, 15.0)],
            -1.0,
            11.0,
        );
        let inside = run(&block(), &p, BooleanOp::Intersection);
        let outside = run(&block(), &p, BooleanOp::Difference);
        assert!(closed(&inside.mesh) && closed(&outside.mesh));
        let notch = (10.0 - 6.1) * (10.0 - 3.7) * 10.0;
        assert_relative_eq!(outside.mesh.volume(), notch, epsilon = 1e-6);
        assert_relative_eq!(inside.mesh.volume(), 1000.0 - notch, epsilon = 1e-6);
        assert!(inside.mesh.vertices.iter().any(|v| {
            (v.position.x - 6.1).abs() < 1e-9 && (v.position.y - 3.7).abs() < 1e-9
        }));
    }

    #[test]
    fn disjoint_prism_keeps_all_or_nothing() {
        let p = prism(&[(20.0, 20.0), (30.0, 20.0), (30.0, 30.0)], -1.0, 11.0);
        let inside = run(&block(), &p, BooleanOp::Intersection);
        let outside = run(&block(), &p, BooleanOp::Difference);
        assert!(inside.mesh.faces.is_empty());
        assert_eq!(outside.mesh.faces.len(), 12);
        assert_eq!(outside.stats.cap_faces, 0);
    }

    #[test]
    fn wall_through_vertices_is_nudged() {
        // Two separate blocks; the first has its +X face exactly on the wall.
        let mut mesh = cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 10.0, 10.0));
        mesh.merge(&cuboid(Point3::new(6.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0)));
        let p = prism(&[(-5.0, -5.0), (5.0, -5.0), (5.0, 15.0), (-5.0, 15.0)], -1.0, 11.0);

        let result = run(&mesh, &p, BooleanOp::Intersection);
        assert!(result.stats.nudges >= 1);
        assert!(closed(&result.mesh));
        assert_relative_eq!(result.mesh.volume(), 500.0, epsilon = 1e-6);

        let strict = BooleanConfig::default().with_max_nudges(0);
        assert!(matches!(
            boolean_operation(&mesh, &p, BooleanOp::Intersection, &strict),
            Err(BooleanError::NumericalError { attempts: 1, .. })
        ));
    }

    #[test]
    fn rejects_bad_inputs() {
        let p = prism(&[(-5.0, -5.0), (4.3, -5.0), (4.3, 15.0), (-5.0, 15.0)], 1.0, 11.0);
        assert!(matches!(
            boolean_operation(&block(), &p, BooleanOp::Intersection, &BooleanConfig::default()),
            Err(BooleanError::PrismTooShort { .. })
        ));

        let mut open = block();
        open.faces.pop();
        let tall = prism(&[(-5.0, -5.0), (4.3, -5.0), (4.3, 15.0), (-5.0, 15.0)], -1.0, 11.0);
        assert!(matches!(
            boolean_operation(&open, &tall, BooleanOp::Intersection, &BooleanConfig::default()),
            Err(BooleanError::OpenInput { boundary_edges: 3 })
        ));

        let covered = prism(&[(1.0, 1.0), (9.0, 1.0), (9.0, 9.0), (1.0, 9.0)], -1.0, 11.0);
        assert!(matches!(
            boolean_operation(&block(), &covered, BooleanOp::Intersection, &BooleanConfig::default()),
            Err(BooleanError::SeamInsideMesh)
        ));

        assert!(matches!(
            intersect_prism(&IndexedMesh::new(), &tall),
            Err(BooleanError::EmptyMesh { .. })
        ));
    }
}
