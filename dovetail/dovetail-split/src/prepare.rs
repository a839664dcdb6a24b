//! Normalization and pre-cut checks.

use mesh_measure::mid_height_section;
use mesh_repair::{repair_mesh, validate_mesh, RepairParams, RepairSummary};
use mesh_types::{IndexedMesh, Vector3};
use tracing::{debug, info};

use crate::error::{SplitError, SplitResult};
use crate::stage::Stage;

/// Most closed loops the mid-height section may have.
pub const MAX_SECTION_CONTOURS: usize = 10;

/// Centre a mesh in XY and rest it on `z = 0`.
///
/// Returns the moved copy and the translation that was applied.
#[must_use]
pub fn normalize(mesh: &IndexedMesh) -> (IndexedMesh, Vector3<f64>) {
    let (moved, offset) = mesh.normalized();
    debug!(dx = offset.x, dy = offset.y, dz = offset.z, "normalized");
    (moved, offset)
}

/// Make sure a mesh is closed, repairing it once if it is not.
///
/// Returns the repair summary when a repair pass ran.
///
/// # Errors
///
/// [`SplitError::Mesh`] when the mesh is empty, the repair pass fails, or the
/// mesh is still open or non-manifold afterwards.
pub fn ensure_watertight(mesh: &mut IndexedMesh) -> SplitResult<Option<RepairSummary>> {
    let fail = |details: String| SplitError::Mesh {
        stage: Stage::Validated,
        details,
    };
    if mesh.faces.is_empty() {
        return Err(fail("mesh has no faces".to_string()));
    }
    let report = validate_mesh(mesh);
    if report.is_printable() {
        return Ok(None);
    }

    info!(
        boundary_edges = report.boundary_edge_count,
        non_manifold_edges = report.non_manifold_edge_count,
        "mesh not closed, repairing"
    );
    let summary = repair_mesh(mesh, &RepairParams::default()).map_err(|e| fail(e.to_string()))?;
    let report = validate_mesh(mesh);
    if !(report.is_watertight && report.is_manifold) {
        return Err(fail(format!(
            "not watertight after repair: {} boundary edges, {} non-manifold edges",
            report.boundary_edge_count, report.non_manifold_edge_count
        )));
    }
    Ok(Some(summary))
}

/// Count the loops of the mid-height section and reject busy meshes.
///
/// # Errors
///
/// [`SplitError::Complexity`] above [`MAX_SECTION_CONTOURS`] loops,
/// [`SplitError::Mesh`] when the section cannot be taken.
pub fn check_complexity(mesh: &IndexedMesh) -> SplitResult<usize> {
    let section = mid_height_section(mesh).map_err(|e| SplitError::Mesh {
        stage: Stage::Validated,
        details: e.to_string(),
    })?;
    let contours = section.contour_count();
    debug!(contours, height = section.height, "mid-height section");
    if contours > MAX_SECTION_CONTOURS {
        return Err(SplitError::Complexity {
            stage: Stage::Validated,
            contours,
            limit: MAX_SECTION_CONTOURS,
        });
    }
    Ok(contours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{cuboid, MeshBounds, Point3};

    #[test]
    fn normalize_centres_and_grounds() {
        let mesh = cuboid(Point3::new(10.0, 20.0, 5.0), Point3::new(30.0, 60.0, 15.0));
        let (moved, offset) = normalize(&mesh);
        let b = moved.bounds();
        assert!((b.min.x + 10.0).abs() < 1e-12 && (b.max.y - 20.0).abs() < 1e-12);
        assert!(b.min.z.abs() < 1e-12);
        assert_eq!(offset, Vector3::new(-20.0, -40.0, -5.0));
    }

    #[test]
    fn closed_mesh_needs_no_repair() {
        let mut mesh = cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(matches!(ensure_watertight(&mut mesh), Ok(None)));
    }

    #[test]
    fn small_hole_is_repaired() {
        let mut mesh = cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        mesh.faces.remove(0);
        let repaired = ensure_watertight(&mut mesh);
        assert!(matches!(repaired, Ok(Some(ref s)) if s.holes_filled == 1));
        assert_eq!(mesh.faces.len(), 12);
    }

    #[test]
    fn unrepairable_mesh_is_a_mesh_error() {
        // A fin hanging off one cube edge: open, and the edge has three faces.
        let mut mesh = cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let [a, b, _] = mesh.faces[0];
        mesh.vertices.push(mesh_types::Vertex::from_coords(0.5, 0.5, -2.0));
        let tip = u32::try_from(mesh.vertices.len() - 1).unwrap_or(u32::MAX);
        mesh.faces.push([a, b, tip]);
        assert!(matches!(
            ensure_watertight(&mut mesh),
            Err(SplitError::Mesh {
                stage: Stage::Validated,
                ..
            })
        ));
    }

    #[test]
    fn busy_section_is_rejected() {
        let mut mesh = IndexedMesh::new();
        for i in 0..12 {
            let x = f64::from(i) * 3.0;
            mesh.merge(&cuboid(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0)));
        }
        assert!(matches!(
            check_complexity(&mesh),
            Err(SplitError::Complexity { contours: 12, limit: 10, .. })
        ));
        assert!(matches!(check_complexity(&cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))), Ok(1)));
    }

    #[test]
    fn section_on_a_step_counts_the_lower_outline() {
        // Mid-height is z = 10, exactly the top of the base and the foot of both posts.
        let mut mesh = cuboid(Point3::origin(), Point3::new(30.0, 30.0, 10.0));
        mesh.merge(&cuboid(Point3::new(2.0, 2.0, 10.0), Point3::new(8.0, 8.0, 20.0)));
        mesh.merge(&cuboid(Point3::new(20.0, 20.0, 10.0), Point3::new(28.0, 28.0, 20.0)));
        assert!(matches!(check_complexity(&mesh), Ok(1)));
    }
}
