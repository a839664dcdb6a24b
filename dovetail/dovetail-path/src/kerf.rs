//! Kerf compensation: turning a cutting path into cutter outlines.
//!
//! The nominal region lies on the negative side of the path (below an X
//! path, left of a Y path) and reaches one cutter width deep. The male
//! outline is that region shrunk by half the tolerance, the female outline
//! the region grown by the same amount, so mating faces end up exactly one
//! tolerance apart.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembler::{Axis, CuttingPath};
use crate::error::{PathError, PathResult};
use crate::geometry::{make_ccw, signed_area};
use crate::offset::{offset_polygon, OffsetOptions};
use crate::tab::{MAX_LIP_CLEARANCE, MIN_NECK_WIDTH};

/// Distance the cutter reaches below the mesh, in mm.
pub const CUTTER_Z_MARGIN: f64 = 10.0;

/// Cutter height relative to the mesh height.
pub const CUTTER_HEIGHT_FACTOR: f64 = 1.5;

/// Which side of the joint a cutter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Undersized region; its pieces carry the tabs.
    Male,
    /// Oversized region; removing it leaves the sockets.
    Female,
}

impl Role {
    /// Offset direction: shrink for male, grow for female.
    #[must_use]
    pub fn offset_sign(self) -> f64 {
        match self {
            Self::Male => -1.0,
            Self::Female => 1.0,
        }
    }
}

/// The closed region on the negative side of a cutting path.
#[must_use]
pub fn nominal_region(path: &CuttingPath) -> Vec<Point2<f64>> {
    let depth = path.cutter_width;
    let half = path.cutter_width / 2.0;
    let mut ring = path.points.clone();
    match path.axis {
        Axis::X => {
            ring.push(Point2::new(half, -depth));
            ring.push(Point2::new(-half, -depth));
        }
        Axis::Y => {
            ring.push(Point2::new(-depth, half));
            ring.push(Point2::new(-depth, -half));
        }
    }
    make_ccw(&mut ring);
    ring
}

/// Male or female outline of a cutting path for a joint tolerance.
///
/// # Errors
///
/// [`PathError::Tolerance`] when the tolerance is not a positive number,
/// when eroding the neck by it leaves less than [`MIN_NECK_WIDTH`], when
/// the flank play it causes takes more than [`MAX_LIP_CLEARANCE`] of the
/// tab's locking lip, or when the offset does not produce exactly one
/// region.
///
/// # Example
///
/// ```
/// use dovetail_path::{apply_tolerance, assemble_path, nominal_region, signed_area, Axis, PathParams, Role};
///
/// let path = assemble_path(Axis::X, 100.0, 150.0, &PathParams::from_scale(10.0, 1, 1.0, 15.0, 0.2))?;
/// let male = apply_tolerance(&path, 0.2, Role::Male)?;
/// let female = apply_tolerance(&path, 0.2, Role::Female)?;
/// let nominal = signed_area(&nominal_region(&path));
/// assert!(signed_area(&male) < nominal && nominal < signed_area(&female));
/// # Ok::<(), dovetail_path::PathError>(())
/// ```
pub fn apply_tolerance(path: &CuttingPath, tolerance: f64, role: Role) -> PathResult<Vec<Point2<f64>>> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(PathError::Tolerance {
            tolerance,
            details: "tolerance must be a positive number".to_string(),
        });
    }
    if let Some(neck) = path.neck_width() {
        if neck - tolerance < MIN_NECK_WIDTH {
            return Err(PathError::Tolerance {
                tolerance,
                details: format!(
                    "neck {neck:.3} mm eroded to {:.3} mm, below {MIN_NECK_WIDTH} mm",
                    neck - tolerance
                ),
            });
        }
    }
    if let Some(tab) = path.tabs.first() {
        let (lip, play) = (tab.lip(), tab.flank_play(tolerance));
        if play > MAX_LIP_CLEARANCE * lip {
            return Err(PathError::Tolerance {
                tolerance,
                details: format!("flank play {play:.3} mm leaves too little of the {lip:.3} mm locking lip"),
            });
        }
    }

    let distance = role.offset_sign() * tolerance / 2.0;
    let mut rings = offset_polygon(&nominal_region(path), distance, &OffsetOptions::default()).map_err(|e| {
        PathError::Tolerance {
            tolerance,
            details: e.to_string(),
        }
    })?;
    if rings.len() != 1 {
        return Err(PathError::Tolerance {
            tolerance,
            details: format!("{role:?} outline split into {} regions", rings.len()),
        });
    }
    let ring = rings.remove(0);
    debug!(axis = %path.axis, ?role, distance, vertices = ring.len(), area = signed_area(&ring), "cutter outline");
    Ok(ring)
}

/// A cutter outline extruded between two heights.
#[derive(Debug, Clone, PartialEq)]
pub struct CutterVolume {
    /// Split line the cutter belongs to.
    pub axis: Axis,
    /// Male or female side.
    pub role: Role,
    /// Counter-clockwise outline.
    pub polygon: Vec<Point2<f64>>,
    /// Bottom of the extrusion.
    pub z_min: f64,
    /// Top of the extrusion.
    pub z_max: f64,
}

impl CutterVolume {
    /// Cutter for a mesh spanning `[mesh_z_min, mesh_z_max]`.
    ///
    /// Starts [`CUTTER_Z_MARGIN`] below the mesh and is
    /// [`CUTTER_HEIGHT_FACTOR`] times as tall as it, never ending less than
    /// the same margin above it.
    ///
    /// # Errors
    ///
    /// See [`apply_tolerance`].
    pub fn for_mesh(
        path: &CuttingPath,
        tolerance: f64,
        role: Role,
        mesh_z_min: f64,
        mesh_z_max: f64,
    ) -> PathResult<Self> {
        let height = mesh_z_max - mesh_z_min;
        let z_min = mesh_z_min - CUTTER_Z_MARGIN;
        let z_max = (z_min + CUTTER_HEIGHT_FACTOR * height).max(mesh_z_max + CUTTER_Z_MARGIN);
        Ok(Self {
            axis: path.axis,
            role,
            polygon: apply_tolerance(path, tolerance, role)?,
            z_min,
            z_max,
        })
    }

    /// Extrusion height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.z_max - self.z_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{assemble_path, PathParams};
    use crate::geometry::{distance_to_ring, is_simple_ring};
    use approx::assert_relative_eq;

    fn path(axis: Axis, scale: f64, tabs: usize, radius: f64) -> CuttingPath {
        let params = PathParams::from_scale(scale, tabs, radius, 15.0, 0.2);
        match assemble_path(axis, 100.0, 150.0, &params) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn nominal_region_side() {
        let x = nominal_region(&path(Axis::X, 10.0, 1, 0.0));
        assert!(signed_area(&x) > 0.0);
        assert!(x.iter().any(|p| p.y == -150.0));
        let y = nominal_region(&path(Axis::Y, 10.0, 1, 0.0));
        assert!(y.iter().any(|p| p.x == -150.0));
        // Straight cut through the centre: half of a 150 x 150 square each side.
        assert_relative_eq!(signed_area(&x), 150.0 * 150.0, epsilon = 1e-6);
    }

    /// Midpoints of edges longer than `min_len`; arc chords are shorter.
    fn straight_midpoints(ring: &[Point2<f64>], min_len: f64) -> Vec<Point2<f64>> {
        let n = ring.len();
        (0..n)
            .map(|i| (ring[i], ring[(i + 1) % n]))
            .filter(|(a, b)| (b - a).norm() > min_len)
            .map(|(a, b)| nalgebra::center(&a, &b))
            .collect()
    }

    #[test]
    fn male_and_female_are_one_tolerance_apart() {
        let cut = path(Axis::X, 12.0, 2, 1.0);
        let (Ok(male), Ok(female)) = (
            apply_tolerance(&cut, 0.3, Role::Male),
            apply_tolerance(&cut, 0.3, Role::Female),
        ) else {
            panic!("offset failed");
        };
        assert!(is_simple_ring(&male) && is_simple_ring(&female));
        for p in &male {
            let gap = distance_to_ring(p, &female);
            assert!(gap >= 0.3 * 0.999, "gap {gap} at {p}");
        }
        let facing = straight_midpoints(&male, 1.0);
        assert!(facing.len() >= 10);
        for p in &facing {
            let gap = distance_to_ring(p, &female);
            assert!((gap - 0.3).abs() <= 0.3e-3, "gap {gap} at {p}");
        }
    }

    #[test]
    fn clearance_cannot_use_up_the_lip() {
        // Neck 6 mm survives 0.5 mm, but the rounded lip does not.
        let cut = path(Axis::X, 10.0, 1, 2.0);
        assert!(cut.neck_width().is_some_and(|neck| neck - 0.5 >= MIN_NECK_WIDTH));
        let err = apply_tolerance(&cut, 0.5, Role::Male);
        assert!(
            matches!(&err, Err(PathError::Tolerance { details, .. }) if details.contains("lip")),
            "{err:?}"
        );
        assert!(apply_tolerance(&cut, 0.2, Role::Male).is_ok());
        assert!(apply_tolerance(&path(Axis::Y, 20.0, 1, 2.0), 0.5, Role::Female).is_ok());
    }

    #[test]
    fn tolerance_errors() {
        let cut = path(Axis::X, 10.0, 2, 0.0);
        for t in [0.0, -0.1, f64::NAN] {
            assert!(matches!(
                apply_tolerance(&cut, t, Role::Male),
                Err(PathError::Tolerance { .. })
            ));
        }
        // Neck 6 mm eroded by 3.5 mm.
        assert!(matches!(
            apply_tolerance(&cut, 3.5, Role::Female),
            Err(PathError::Tolerance { .. })
        ));
    }

    #[test]
    fn cutter_spans_the_mesh() {
        let cut = path(Axis::Y, 10.0, 1, 0.0);
        let Ok(tall) = CutterVolume::for_mesh(&cut, 0.2, Role::Male, 0.0, 100.0) else {
            panic!("cutter failed");
        };
        assert_relative_eq!(tall.z_min, -10.0);
        assert_relative_eq!(tall.height(), 150.0);

        let Ok(flat) = CutterVolume::for_mesh(&cut, 0.2, Role::Female, 0.0, 4.0) else {
            panic!("cutter failed");
        };
        assert_relative_eq!(flat.z_max, 14.0);
        assert_eq!(flat.role, Role::Female);
    }
}
