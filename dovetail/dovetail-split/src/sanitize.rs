//! Debris removal after the booleans.

use mesh_repair::{component_stats, extract_faces};
use mesh_types::IndexedMesh;
use tracing::{debug, info};

use crate::error::{SplitError, SplitResult};
use crate::stage::Stage;

/// Default share of the total volume below which a component is debris.
pub const DEBRIS_THRESHOLD: f64 = 0.01;

/// Drop small disconnected fragments from a mesh.
///
/// Components whose volume is below `threshold` times the total volume are
/// removed. A mesh with a single component, or with nothing to remove, comes
/// back unchanged.
///
/// # Errors
///
/// [`SplitError::Sanitization`] when the mesh is empty or when the piece
/// with the largest bounding box would be removed.
///
/// # Example
///
/// ```
/// use dovetail_split::{sanitize, DEBRIS_THRESHOLD};
/// use mesh_types::{cuboid, Point3};
///
/// let mut mesh = cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
/// mesh.merge(&cuboid(Point3::new(20.0, 0.0, 0.0), Point3::new(20.5, 0.5, 0.5)));
/// let clean = sanitize(&mesh, DEBRIS_THRESHOLD)?;
/// assert_eq!(clean.faces.len(), 12);
/// # Ok::<(), dovetail_split::SplitError>(())
/// ```
pub fn sanitize(mesh: &IndexedMesh, threshold: f64) -> SplitResult<IndexedMesh> {
    remove_debris(mesh, threshold, "mesh").map(|(clean, _)| clean)
}

/// [`sanitize`] for a named part, also returning how many components went.
pub(crate) fn remove_debris(mesh: &IndexedMesh, threshold: f64, part: &str) -> SplitResult<(IndexedMesh, usize)> {
    let fail = |details: String| SplitError::Sanitization {
        stage: Stage::Sanitized,
        part: part.to_string(),
        details,
    };
    if mesh.faces.is_empty() {
        return Err(fail("no geometry left after cutting".to_string()));
    }

    let stats = component_stats(mesh);
    if stats.len() <= 1 {
        return Ok((mesh.clone(), 0));
    }
    let total: f64 = stats.iter().map(|c| c.volume).sum();
    let cutoff = threshold * total;
    let main = stats
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.bounds.diagonal().total_cmp(&b.bounds.diagonal()))
        .map_or(0, |(i, _)| i);
    if stats[main].volume < cutoff {
        return Err(fail(format!(
            "main piece of volume {:.3} is below the debris cutoff {cutoff:.3}",
            stats[main].volume
        )));
    }

    let mut kept = Vec::new();
    let mut removed = 0;
    for c in &stats {
        if c.volume >= cutoff {
            kept.extend_from_slice(&c.faces);
        } else {
            debug!(part, volume = c.volume, faces = c.faces.len(), "debris");
            removed += 1;
        }
    }
    if removed == 0 {
        return Ok((mesh.clone(), 0));
    }
    kept.sort_unstable();
    info!(part, removed, kept = stats.len() - removed, "removed debris");
    Ok((extract_faces(mesh, &kept), removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{cuboid, Point3};

    fn block_with_chip() -> IndexedMesh {
        let mut mesh = cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        mesh.merge(&cuboid(Point3::new(12.0, 0.0, 0.0), Point3::new(13.0, 1.0, 1.0)));
        mesh
    }

    #[test]
    fn chip_is_removed() {
        let Ok((clean, removed)) = remove_debris(&block_with_chip(), DEBRIS_THRESHOLD, "TL") else {
            panic!("sanitize failed");
        };
        assert_eq!(removed, 1);
        assert_eq!(clean.faces.len(), 12);
        assert!((clean.volume() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let Ok(once) = sanitize(&block_with_chip(), DEBRIS_THRESHOLD) else {
            panic!("sanitize failed");
        };
        let Ok(twice) = sanitize(&once, DEBRIS_THRESHOLD) else {
            panic!("sanitize failed");
        };
        assert_eq!(once, twice);
    }

    #[test]
    fn large_pieces_survive() {
        let mut mesh = cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        mesh.merge(&cuboid(Point3::new(12.0, 0.0, 0.0), Point3::new(17.0, 5.0, 5.0)));
        let Ok((clean, removed)) = remove_debris(&mesh, DEBRIS_THRESHOLD, "BR") else {
            panic!("sanitize failed");
        };
        assert_eq!(removed, 0);
        assert_eq!(clean, mesh);
    }

    #[test]
    fn losing_the_main_piece_is_an_error() {
        // A long thin sliver has the largest box but almost no volume.
        let mut mesh = cuboid(Point3::origin(), Point3::new(5.0, 5.0, 5.0));
        mesh.merge(&cuboid(Point3::new(10.0, 0.0, 0.0), Point3::new(60.0, 0.01, 0.01)));
        assert!(matches!(
            sanitize(&mesh, DEBRIS_THRESHOLD),
            Err(SplitError::Sanitization {
                stage: Stage::Sanitized,
                ..
            })
        ));
        assert!(matches!(
            sanitize(&IndexedMesh::new(), DEBRIS_THRESHOLD),
            Err(SplitError::Sanitization { .. })
        ));
    }
}
