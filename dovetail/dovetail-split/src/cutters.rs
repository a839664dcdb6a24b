//! Cutter planning: paths and kerf-compensated prisms for both split lines.

use dovetail_path::{assemble_path, Axis, CutterVolume, CuttingPath, Role};
use mesh_boolean::Prism;
use mesh_types::Aabb;
use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::params::SplitParams;
use crate::stage::Stage;

/// Cutter width relative to the larger XY extent of the mesh.
pub const CUTTER_WIDTH_FACTOR: f64 = 1.5;

/// Paths for both split lines.
#[derive(Debug, Clone)]
pub struct SplitPaths {
    /// Path along X, separating bottom from top.
    pub x: CuttingPath,
    /// Path along Y, separating left from right.
    pub y: CuttingPath,
}

impl SplitPaths {
    /// Lay out both paths for a mesh footprint.
    ///
    /// # Errors
    ///
    /// [`SplitError::Sizing`] when either path cannot be laid out.
    pub fn plan(bounds: &Aabb, params: &SplitParams) -> SplitResult<Self> {
        let size = bounds.size();
        let width = CUTTER_WIDTH_FACTOR * size.x.max(size.y);
        let path_params = params.path_params();
        let layout = |axis: Axis, length: f64| {
            assemble_path(axis, length, width, &path_params).map_err(|e| SplitError::from_path(Stage::Validated, e))
        };
        Ok(Self {
            x: layout(Axis::X, size.x)?,
            y: layout(Axis::Y, size.y)?,
        })
    }

    /// Both paths, X first.
    #[must_use]
    pub fn both(&self) -> [&CuttingPath; 2] {
        [&self.x, &self.y]
    }
}

/// The four cutter prisms of a split.
#[derive(Debug, Clone)]
pub struct CutterSet {
    /// X line, undersized.
    pub x_male: Prism,
    /// X line, oversized.
    pub x_female: Prism,
    /// Y line, undersized.
    pub y_male: Prism,
    /// Y line, oversized.
    pub y_female: Prism,
}

impl CutterSet {
    /// Extrude male and female outlines of both paths through a mesh.
    ///
    /// # Errors
    ///
    /// [`SplitError::Tolerance`] when an outline collapses,
    /// [`SplitError::BooleanOp`] when an outline is not a valid prism.
    pub fn build(paths: &SplitPaths, tolerance: f64, bounds: &Aabb) -> SplitResult<Self> {
        let prism = |path: &CuttingPath, role: Role| -> SplitResult<Prism> {
            let volume = CutterVolume::for_mesh(path, tolerance, role, bounds.min.z, bounds.max.z)
                .map_err(|e| SplitError::from_path(Stage::Validated, e))?;
            debug!(
                axis = %volume.axis,
                ?role,
                vertices = volume.polygon.len(),
                z_min = volume.z_min,
                z_max = volume.z_max,
                "cutter"
            );
            Prism::new(volume.polygon, volume.z_min, volume.z_max).map_err(|source| SplitError::BooleanOp {
                stage: Stage::Validated,
                label: format!("{} {role:?} prism", path.axis),
                source,
            })
        };
        Ok(Self {
            x_male: prism(&paths.x, Role::Male)?,
            x_female: prism(&paths.x, Role::Female)?,
            y_male: prism(&paths.y, Role::Male)?,
            y_female: prism(&paths.y, Role::Female)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::Point3;

    fn block(x: f64, y: f64, z: f64) -> Aabb {
        Aabb::new(Point3::new(-x / 2.0, -y / 2.0, 0.0), Point3::new(x / 2.0, y / 2.0, z))
    }

    #[test]
    fn plans_both_axes() {
        // Four 15 mm tabs fit in 85 mm of X arm but not in 45 mm of Y arm.
        let params = SplitParams::default().with_tabs_per_arm(4);
        let Ok(paths) = SplitPaths::plan(&block(200.0, 120.0, 30.0), &params) else {
            panic!("planning failed");
        };
        assert_eq!(paths.x.axis, Axis::X);
        assert_eq!(paths.y.axis, Axis::Y);
        assert!((paths.x.cutter_width - 300.0).abs() < 1e-12);
        assert!((paths.x.arm - 100.0).abs() < 1e-12 && (paths.y.arm - 60.0).abs() < 1e-12);
        assert!(!paths.x.auto_scaled && paths.y.auto_scaled);
    }

    #[test]
    fn tolerance_collapse_stops_before_extrusion() {
        // 52 mm block, scale 10, two tabs: necks shrink to 3.23 mm.
        let params = SplitParams::default()
            .with_scale(10.0)
            .with_tabs_per_arm(2)
            .with_tolerance(0.5);
        let bounds = block(52.0, 52.0, 20.0);
        let Ok(paths) = SplitPaths::plan(&bounds, &params) else {
            panic!("planning failed");
        };
        assert!(paths.x.auto_scaled);
        assert!(matches!(
            CutterSet::build(&paths, 0.5, &bounds),
            Err(SplitError::Tolerance { stage: Stage::Validated, .. })
        ));
        assert!(CutterSet::build(&paths, 0.2, &bounds).is_ok());
    }
}
