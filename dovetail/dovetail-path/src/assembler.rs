//! Cutting path along one split line.
//!
//! Each split line is the baseline through the mesh centre. Its two arms run
//! from the centre to the mesh edge; tabs fill each arm outside the central
//! safe zone, where the other axis crosses.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PathError, PathResult};
use crate::geometry::{is_simple_polyline, simplify_polyline};
use crate::tab::{generate_tab_with_resolution, TabSpec, DEFAULT_SEGMENTS_PER_CORNER, MIN_NECK_WIDTH, NECK_RATIO};

/// Largest number of tabs on one arm.
pub const MAX_TABS_PER_ARM: usize = 5;

/// Shrink factor applied when tabs are scaled down to fit an arm.
const FIT_MARGIN: f64 = 0.98;

/// Arms shorter than this carry no tabs.
const MIN_ARM_SPACE: f64 = 1.0;

/// Split line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Baseline along X; separates bottom from top.
    X,
    /// Baseline along Y; separates left from right.
    Y,
}

impl Axis {
    /// Map a point built along the X baseline onto this axis.
    #[must_use]
    pub fn orient(self, p: Point2<f64>) -> Point2<f64> {
        match self {
            Self::X => p,
            Self::Y => Point2::new(p.y, p.x),
        }
    }

    fn direction_sign(self) -> i8 {
        match self {
            Self::X => 1,
            Self::Y => -1,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::Y => f.write_str("Y"),
        }
    }
}

/// Tab layout request for one split line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    /// Nominal tab width.
    pub tab_width: f64,
    /// Tab height.
    pub tab_height: f64,
    /// Requested corner radius.
    pub radius: f64,
    /// Half-width of the tab-free zone around the centre.
    pub safe_zone: f64,
    /// Tabs on each arm.
    pub tabs_per_arm: usize,
    /// Joint tolerance the path will be cut with.
    pub tolerance: f64,
    /// Arc resolution per rounded corner.
    pub segments_per_corner: usize,
}

impl Default for PathParams {
    fn default() -> Self {
        Self::from_scale(15.0, 1, 2.0, 15.0, 0.2)
    }
}

impl PathParams {
    /// Parameters from a dovetail scale: tabs `scale` wide and half as tall.
    #[must_use]
    pub fn from_scale(scale: f64, tabs_per_arm: usize, radius: f64, safe_zone: f64, tolerance: f64) -> Self {
        Self {
            tab_width: scale,
            tab_height: scale / 2.0,
            radius,
            safe_zone,
            tabs_per_arm,
            tolerance,
            segments_per_corner: DEFAULT_SEGMENTS_PER_CORNER,
        }
    }

    /// Set the arc resolution.
    #[must_use]
    pub fn with_segments_per_corner(mut self, segments: usize) -> Self {
        self.segments_per_corner = segments;
        self
    }
}

/// Polyline for one split line together with the tabs it is made of.
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingPath {
    /// Split line direction.
    pub axis: Axis,
    /// Open polyline across the whole cutter width.
    pub points: Vec<Point2<f64>>,
    /// Tabs in baseline order, before the axis transform.
    pub tabs: Vec<TabSpec>,
    /// Requested tab width.
    pub nominal_width: f64,
    /// Tab width after fitting to the arms.
    pub effective_width: f64,
    /// Tab height.
    pub tab_height: f64,
    /// Length of each arm from the centre.
    pub arm: f64,
    /// Length of the whole path.
    pub cutter_width: f64,
    /// Whether tabs were narrowed to fit.
    pub auto_scaled: bool,
}

impl CuttingPath {
    /// Effective neck width, `None` when the path has no tabs.
    #[must_use]
    pub fn neck_width(&self) -> Option<f64> {
        (!self.tabs.is_empty()).then(|| self.effective_width * NECK_RATIO)
    }

    /// Points as plain coordinate pairs.
    #[must_use]
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }
}

/// Lay out the cutting path for a split line.
///
/// `mesh_length` is the mesh extent along the axis and `cutter_width` the
/// length of the whole path; both arms run `mesh_length / 2` from the
/// centre. The safe zone is carved out first; tabs that still do not fit
/// are narrowed to share the remaining space.
///
/// # Errors
///
/// [`PathError::Sizing`] when the tab count is outside `1..=5`, the safe zone
/// is not wider than tab height plus tolerance, the narrowed neck drops
/// below [`MIN_NECK_WIDTH`], the cutter is shorter than the mesh, or the
/// resulting polyline is not simple. Tab errors are passed through.
///
/// # Example
///
/// ```
/// use dovetail_path::{assemble_path, Axis, PathParams};
///
/// let params = PathParams::from_scale(10.0, 2, 0.0, 15.0, 0.2);
/// let path = assemble_path(Axis::X, 100.0, 150.0, &params)?;
/// assert_eq!(path.tabs.len(), 4);
/// assert!(!path.auto_scaled);
/// assert_eq!(path.points[0].x, -75.0);
/// # Ok::<(), dovetail_path::PathError>(())
/// ```
pub fn assemble_path(axis: Axis, mesh_length: f64, cutter_width: f64, params: &PathParams) -> PathResult<CuttingPath> {
    let n = params.tabs_per_arm;
    if n == 0 || n > MAX_TABS_PER_ARM {
        return Err(PathError::sizing(format!(
            "{n} tabs per arm, expected 1 to {MAX_TABS_PER_ARM}"
        )));
    }
    if !(mesh_length.is_finite() && mesh_length > 0.0) {
        return Err(PathError::sizing(format!("split line length {mesh_length}")));
    }
    let arm = mesh_length / 2.0;
    if cutter_width.is_nan() || cutter_width / 2.0 <= arm {
        return Err(PathError::sizing(format!(
            "cutter width {cutter_width} does not cover the split line {mesh_length}"
        )));
    }
    if params.safe_zone <= params.tab_height + params.tolerance {
        return Err(PathError::sizing(format!(
            "safe zone {} must exceed tab height {} plus tolerance {}",
            params.safe_zone, params.tab_height, params.tolerance
        )));
    }

    let available = arm - params.safe_zone;
    #[allow(clippy::cast_precision_loss)]
    let count = n as f64;
    let (tabs_per_arm, width, auto_scaled) = if available < MIN_ARM_SPACE {
        (0, params.tab_width, false)
    } else if count * params.tab_width > available {
        (n, available / count * FIT_MARGIN, true)
    } else {
        (n, params.tab_width, false)
    };

    if tabs_per_arm > 0 && width * NECK_RATIO < MIN_NECK_WIDTH {
        return Err(PathError::sizing(format!(
            "neck {:.3} mm below {MIN_NECK_WIDTH} mm after fitting {n} tabs into {available:.3} mm",
            width * NECK_RATIO
        )));
    }
    if auto_scaled {
        warn!(%axis, nominal = params.tab_width, effective = width, "tabs scaled down to fit");
    }

    #[allow(clippy::cast_precision_loss)]
    let gap = (available - tabs_per_arm as f64 * width) / (tabs_per_arm as f64 + 1.0);
    let half = cutter_width / 2.0;
    let sign = axis.direction_sign();
    let mut tabs = Vec::with_capacity(2 * tabs_per_arm);
    let mut points = vec![Point2::new(-half, 0.0)];

    let mut arm_tabs = |start: f64, even: i8, points: &mut Vec<Point2<f64>>| -> PathResult<()> {
        let mut x = start;
        for i in 0..tabs_per_arm {
            let direction = (if i % 2 == 0 { even } else { -even }) * sign;
            let spec = TabSpec::new(x + gap, width, params.tab_height, params.radius, direction);
            points.extend(generate_tab_with_resolution(&spec, params.segments_per_corner)?);
            x = spec.end_x();
            tabs.push(spec);
        }
        Ok(())
    };

    points.push(Point2::new(-arm, 0.0));
    arm_tabs(-arm, 1, &mut points)?;
    points.push(Point2::new(-params.safe_zone, 0.0));
    points.push(Point2::new(params.safe_zone, 0.0));
    arm_tabs(params.safe_zone, -1, &mut points)?;
    points.push(Point2::new(arm, 0.0));
    points.push(Point2::new(half, 0.0));

    let points: Vec<Point2<f64>> = simplify_polyline(&points).into_iter().map(|p| axis.orient(p)).collect();
    if !is_simple_polyline(&points) {
        return Err(PathError::sizing(format!(
            "{axis} path intersects itself; tabs {width:.3} mm wide overlap"
        )));
    }

    debug!(
        %axis,
        tabs = tabs.len(),
        width,
        gap,
        vertices = points.len(),
        "assembled cutting path"
    );
    Ok(CuttingPath {
        axis,
        points,
        tabs,
        nominal_width: params.tab_width,
        effective_width: width,
        tab_height: params.tab_height,
        arm,
        cutter_width,
        auto_scaled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sharp(scale: f64, tabs: usize, safe: f64) -> PathParams {
        PathParams::from_scale(scale, tabs, 0.0, safe, 0.2)
    }

    #[test]
    fn tabs_fit_without_scaling() {
        let Ok(path) = assemble_path(Axis::X, 100.0, 150.0, &sharp(10.0, 2, 15.0)) else {
            panic!("assembly failed");
        };
        assert!(!path.auto_scaled);
        assert_relative_eq!(path.effective_width, 10.0);
        // Arm 50, 35 available, gap (35 - 20) / 3.
        assert_relative_eq!(path.tabs[0].start_x, -50.0 + 5.0);
        assert_relative_eq!(path.tabs[2].start_x, 15.0 + 5.0);
        let directions: Vec<i8> = path.tabs.iter().map(|t| t.direction).collect();
        assert_eq!(directions, vec![1, -1, -1, 1]);
        assert_eq!(path.points[0], Point2::new(-75.0, 0.0));
        assert_eq!(path.points[path.points.len() - 1], Point2::new(75.0, 0.0));
        // Path ends plus the four off-baseline corners of each tab.
        assert_eq!(path.points.len(), 2 + 4 * 4);
    }

    #[test]
    fn crowded_tabs_are_narrowed() {
        let Ok(path) = assemble_path(Axis::X, 52.0, 78.0, &sharp(10.0, 2, 15.0)) else {
            panic!("assembly failed");
        };
        assert!(path.auto_scaled);
        assert_relative_eq!(path.effective_width, 11.0 / 2.0 * 0.98);
        assert_relative_eq!(path.nominal_width, 10.0);
        assert!(path.neck_width().is_some_and(|n| n > MIN_NECK_WIDTH));
    }

    #[test]
    fn narrow_neck_is_rejected() {
        // 5 mm available for three tabs: neck 0.98 mm.
        let err = assemble_path(Axis::X, 40.0, 60.0, &sharp(10.0, 3, 15.0));
        assert!(matches!(err, Err(PathError::Sizing { .. })));
    }

    #[test]
    fn short_arm_has_no_tabs() {
        let Ok(path) = assemble_path(Axis::X, 30.5, 60.0, &sharp(10.0, 1, 15.0)) else {
            panic!("assembly failed");
        };
        assert!(path.tabs.is_empty());
        assert!(path.neck_width().is_none());
        assert_eq!(path.points, vec![Point2::new(-30.0, 0.0), Point2::new(30.0, 0.0)]);
    }

    #[test]
    fn y_axis_swaps_and_flips() {
        let params = sharp(10.0, 1, 15.0);
        let (Ok(x), Ok(y)) = (
            assemble_path(Axis::X, 100.0, 150.0, &params),
            assemble_path(Axis::Y, 100.0, 150.0, &params),
        ) else {
            panic!("assembly failed");
        };
        assert_eq!(x.points.len(), y.points.len());
        for (a, b) in x.points.iter().zip(&y.points) {
            assert_relative_eq!(a.x, b.y);
            assert_relative_eq!(a.y, -b.x);
        }
        assert_eq!(y.tabs[0].direction, -1);
    }

    #[test]
    fn layout_errors() {
        for (tabs, safe) in [(0, 15.0), (6, 15.0), (1, 5.0)] {
            let err = assemble_path(Axis::X, 100.0, 150.0, &sharp(10.0, tabs, safe));
            assert!(matches!(err, Err(PathError::Sizing { .. })), "{tabs} tabs, safe {safe}");
        }
        let err = assemble_path(Axis::X, 100.0, 90.0, &sharp(10.0, 1, 15.0));
        assert!(matches!(err, Err(PathError::Sizing { .. })));
    }

    #[test]
    fn rounded_path_is_simple() {
        let params = PathParams::from_scale(15.0, 4, 1.0, 15.0, 0.2);
        let Ok(path) = assemble_path(Axis::Y, 100.0, 150.0, &params) else {
            panic!("assembly failed");
        };
        assert!(path.auto_scaled);
        assert!(is_simple_polyline(&path.points));
        assert!(path.points.iter().all(|p| p.y.abs() <= 75.0 + 1e-9));
    }
}
