//! Single dovetail tab profile.
//!
//! A tab is a trapezoid standing on the baseline `y = 0`: a narrow neck
//! where it leaves the baseline and a wider head at full height. Corners are
//! rounded morphologically on the region under the profile.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{PathError, PathResult};
use crate::geometry::{bounds, simplify_polyline};
use crate::offset::{close_polygon, open_polygon, OffsetOptions};

/// Neck width relative to the tab width.
pub const NECK_RATIO: f64 = 0.6;

/// Head width relative to the tab width, before the flank rule applies.
pub const HEAD_RATIO: f64 = 0.9;

/// Smallest flank angle against the baseline, in degrees.
pub const MIN_FLANK_ANGLE_DEG: f64 = 75.0;

/// Narrowest neck that survives printing and handling, in mm.
pub const MIN_NECK_WIDTH: f64 = 3.0;

/// Largest share of the locking lip that flank play may take up.
pub const MAX_LIP_CLEARANCE: f64 = 0.5;

/// Default arc resolution per rounded corner.
pub const DEFAULT_SEGMENTS_PER_CORNER: usize = 16;

/// Footprint of one dovetail tab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabSpec {
    /// Baseline x where the tab footprint begins.
    pub start_x: f64,
    /// Footprint width along the baseline.
    pub width: f64,
    /// Distance from the baseline to the head.
    pub height: f64,
    /// Requested corner radius; zero or less keeps sharp corners.
    pub radius: f64,
    /// Side of the baseline the head points to, `1` or `-1`.
    pub direction: i8,
}

impl TabSpec {
    /// Describe a tab.
    #[must_use]
    pub const fn new(start_x: f64, width: f64, height: f64, radius: f64, direction: i8) -> Self {
        Self {
            start_x,
            width,
            height,
            radius,
            direction,
        }
    }

    /// Check the description is usable.
    ///
    /// # Errors
    ///
    /// [`PathError::InvalidTab`] for non-finite values, a non-positive
    /// width, a zero height or a direction other than `±1`.
    pub fn validate(&self) -> PathResult<()> {
        let invalid = |details: String| Err(PathError::InvalidTab { details });
        if ![self.start_x, self.width, self.height, self.radius]
            .iter()
            .all(|v| v.is_finite())
        {
            return invalid(format!("non-finite value in {self:?}"));
        }
        if self.width <= 0.0 {
            return invalid(format!("width {} must be positive", self.width));
        }
        if self.height == 0.0 {
            return invalid("height must be non-zero".to_string());
        }
        if self.direction != 1 && self.direction != -1 {
            return invalid(format!("direction {} must be 1 or -1", self.direction));
        }
        Ok(())
    }

    /// Baseline x where the footprint ends.
    #[must_use]
    pub fn end_x(&self) -> f64 {
        self.start_x + self.width
    }

    /// Width where the tab leaves the baseline.
    #[must_use]
    pub fn neck_width(&self) -> f64 {
        self.width * NECK_RATIO
    }

    /// Head width relative to the tab width.
    ///
    /// [`HEAD_RATIO`] unless that would make the flanks shallower than
    /// [`MIN_FLANK_ANGLE_DEG`], in which case the head narrows until the
    /// flanks sit exactly at the limit.
    #[must_use]
    pub fn head_ratio(&self) -> f64 {
        let steepest = NECK_RATIO + 2.0 * self.height.abs() / (self.width * MIN_FLANK_ANGLE_DEG.to_radians().tan());
        HEAD_RATIO.min(steepest)
    }

    /// Width of the head.
    #[must_use]
    pub fn head_width(&self) -> f64 {
        self.width * self.head_ratio()
    }

    /// Flank angle against the baseline, in degrees.
    #[must_use]
    pub fn flank_angle(&self) -> f64 {
        let run = (self.head_width() - self.neck_width()) / 2.0;
        self.height.abs().atan2(run).to_degrees()
    }

    /// Overhang of the head past the neck on each side, after rounding.
    ///
    /// Rounding a corner whose angle equals the flank angle `a` takes
    /// `r (cot(a/2) - 1)` off the head and adds as much to the neck.
    #[must_use]
    pub fn lip(&self) -> f64 {
        let run = (self.head_width() - self.neck_width()) / 2.0;
        let half = self.flank_angle().to_radians() / 2.0;
        let rounding = self.effective_radius().max(0.0) * (1.0 / half.tan() - 1.0);
        (run - 2.0 * rounding).max(0.0)
    }

    /// Sideways play between flanks that sit `clearance` apart.
    #[must_use]
    pub fn flank_play(&self, clearance: f64) -> f64 {
        clearance / self.flank_angle().to_radians().sin()
    }

    /// Corner radius actually applied.
    #[must_use]
    pub fn effective_radius(&self) -> f64 {
        self.radius.min(self.width / 8.0).min(self.height.abs() / 4.0)
    }

    fn sign(&self) -> f64 {
        f64::from(self.direction) * self.height.signum()
    }

    /// Baseline entry, neck, head, neck, baseline exit, with the head on the
    /// positive side.
    fn canonical_corners(&self) -> [Point2<f64>; 6] {
        let center = self.start_x + self.width / 2.0;
        let (neck, head, h) = (self.neck_width() / 2.0, self.head_width() / 2.0, self.height.abs());
        [
            Point2::new(self.start_x, 0.0),
            Point2::new(center - neck, 0.0),
            Point2::new(center - head, h),
            Point2::new(center + head, h),
            Point2::new(center + neck, 0.0),
            Point2::new(self.end_x(), 0.0),
        ]
    }

    /// The six trapezoid vertices, head on the side given by `direction`.
    #[must_use]
    pub fn corners(&self) -> [Point2<f64>; 6] {
        let sign = self.sign();
        self.canonical_corners().map(|p| Point2::new(p.x, p.y * sign))
    }
}

/// Profile of one tab with the default arc resolution.
///
/// # Errors
///
/// See [`generate_tab_with_resolution`].
///
/// # Example
///
/// ```
/// use dovetail_path::generate_tab;
///
/// let sharp = generate_tab(0.0, 10.0, 5.0, 0.0, 1)?;
/// assert_eq!(sharp.len(), 6);
/// let rounded = generate_tab(0.0, 10.0, 5.0, 1.0, -1)?;
/// assert!(rounded.len() > 6);
/// assert!(rounded.iter().all(|p| p.y <= 1e-9));
/// # Ok::<(), dovetail_path::PathError>(())
/// ```
pub fn generate_tab(start_x: f64, width: f64, height: f64, radius: f64, direction: i8) -> PathResult<Vec<Point2<f64>>> {
    generate_tab_with_resolution(
        &TabSpec::new(start_x, width, height, radius, direction),
        DEFAULT_SEGMENTS_PER_CORNER,
    )
}

/// Profile of one tab, left to right from baseline entry to baseline exit.
///
/// With a radius of zero or less the six trapezoid vertices come back as
/// they are. Otherwise every corner is rounded with the effective radius
/// and at least `segments_per_corner` segments.
///
/// # Errors
///
/// [`PathError::InvalidTab`] when the spec fails [`TabSpec::validate`],
/// [`PathError::Offset`] when rounding does not produce a single region.
pub fn generate_tab_with_resolution(spec: &TabSpec, segments_per_corner: usize) -> PathResult<Vec<Point2<f64>>> {
    spec.validate()?;
    let r = spec.effective_radius();
    if r <= 0.0 {
        return Ok(spec.corners().to_vec());
    }

    let corners = spec.canonical_corners();
    let [p1, p2, p3, p4, p5, p6] = corners;
    let margin = 4.0 * r;
    // Tab plus a slab under the baseline so the baseline ends stay put.
    let region = vec![
        Point2::new(p1.x - margin, -margin),
        Point2::new(p6.x + margin, -margin),
        Point2::new(p6.x + margin, 0.0),
        p6,
        p5,
        p4,
        p3,
        p2,
        p1,
        Point2::new(p1.x - margin, 0.0),
    ];

    let options = OffsetOptions::round(segments_per_corner);
    let closed = close_polygon(&region, r, &options)?;
    let mut rounded = open_polygon(&closed, r, &options)?;

    let Some(lowest) = rounded
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
    else {
        return Err(PathError::Offset {
            distance: r,
            details: "rounding produced an empty ring".to_string(),
        });
    };
    rounded.rotate_left(lowest);

    let mut profile: Vec<Point2<f64>> = rounded
        .into_iter()
        .filter(|p| p.y >= -1e-7 && p.x > p1.x && p.x < p6.x)
        .collect();
    profile.reverse();
    profile.insert(0, p1);
    profile.push(p6);

    let sign = spec.sign();
    let profile: Vec<Point2<f64>> = simplify_polyline(&profile)
        .into_iter()
        .map(|p| Point2::new(p.x, p.y.max(0.0) * sign))
        .collect();
    trace!(
        start_x = spec.start_x,
        radius = r,
        vertices = profile.len(),
        extent = ?bounds(&profile),
        "tab profile"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::is_simple_polyline;
    use approx::assert_relative_eq;

    #[test]
    fn sharp_tab_corners() {
        // Tall enough that the flank rule leaves the head alone.
        let Ok(points) = generate_tab(2.0, 20.0, 12.0, 0.0, 1) else {
            panic!("tab failed");
        };
        let expected = [(2.0, 0.0), (6.0, 0.0), (3.0, 12.0), (21.0, 12.0), (18.0, 0.0), (22.0, 0.0)];
        assert_eq!(points.len(), 6);
        for (p, (x, y)) in points.iter().zip(expected) {
            assert_relative_eq!(p.x, x, epsilon = 1e-12);
            assert_relative_eq!(p.y, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn negative_direction_mirrors() {
        let up = generate_tab(0.0, 20.0, 5.0, 1.5, 1);
        let down = generate_tab(0.0, 20.0, 5.0, 1.5, -1);
        let (Ok(up), Ok(down)) = (up, down) else {
            panic!("tab failed");
        };
        assert_eq!(up.len(), down.len());
        for (a, b) in up.iter().zip(&down) {
            assert_relative_eq!(a.x, b.x);
            assert_relative_eq!(a.y, -b.y);
        }
    }

    #[test]
    fn flank_rule_narrows_head() {
        let wide = TabSpec::new(0.0, 20.0, 12.0, 0.0, 1);
        assert_relative_eq!(wide.head_ratio(), HEAD_RATIO);
        assert!(wide.flank_angle() > MIN_FLANK_ANGLE_DEG);

        let squat = TabSpec::new(0.0, 15.0, 7.5, 0.0, 1);
        assert!(squat.head_ratio() < HEAD_RATIO);
        assert_relative_eq!(squat.flank_angle(), MIN_FLANK_ANGLE_DEG, epsilon = 1e-9);
        assert_relative_eq!(squat.neck_width(), 9.0);
    }

    #[test]
    fn rounded_tab_keeps_silhouette() {
        let spec = TabSpec::new(-10.0, 20.0, 8.0, 1.5, 1);
        let Ok(points) = generate_tab_with_resolution(&spec, 16) else {
            panic!("tab failed");
        };
        assert!(is_simple_polyline(&points));
        assert_eq!(points[0], Point2::new(-10.0, 0.0));
        assert_eq!(points[points.len() - 1], Point2::new(10.0, 0.0));
        let top = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(top, 8.0, epsilon = 1e-6);
        assert!(points.iter().all(|p| p.y >= 0.0));
        // Four rounded corners of at least 16 segments each.
        assert!(points.len() >= 4 * 17);
    }

    #[test]
    fn radius_is_clamped() {
        let spec = TabSpec::new(0.0, 16.0, 4.0, 5.0, 1);
        assert_relative_eq!(spec.effective_radius(), 1.0);
        let spec = TabSpec::new(0.0, 16.0, 40.0, 5.0, 1);
        assert_relative_eq!(spec.effective_radius(), 2.0);
    }

    #[test]
    fn lip_shrinks_with_rounding() {
        let sharp = TabSpec::new(0.0, 10.0, 5.0, 0.0, 1);
        assert_relative_eq!(sharp.lip(), (sharp.head_width() - sharp.neck_width()) / 2.0);
        assert_relative_eq!(sharp.flank_play(0.5), 0.5 / 75f64.to_radians().sin(), epsilon = 1e-9);

        // Radius 2 clamps to 1.25 on a 10 mm tab.
        let rounded = TabSpec::new(0.0, 10.0, 5.0, 2.0, 1);
        let loss = 2.0 * 1.25 * (1.0 / 37.5f64.to_radians().tan() - 1.0);
        assert_relative_eq!(rounded.lip(), sharp.lip() - loss, epsilon = 1e-9);
        assert!(rounded.flank_play(0.5) > MAX_LIP_CLEARANCE * rounded.lip());
        assert!(rounded.flank_play(0.2) < MAX_LIP_CLEARANCE * rounded.lip());
    }

    #[test]
    fn rejects_invalid_specs() {
        for spec in [
            TabSpec::new(0.0, 0.0, 5.0, 1.0, 1),
            TabSpec::new(0.0, 10.0, 0.0, 1.0, 1),
            TabSpec::new(0.0, 10.0, 5.0, 1.0, 0),
            TabSpec::new(f64::NAN, 10.0, 5.0, 1.0, 1),
            TabSpec::new(0.0, 10.0, 5.0, f64::INFINITY, 1),
        ] {
            assert!(matches!(
                generate_tab_with_resolution(&spec, 16),
                Err(PathError::InvalidTab { .. })
            ));
        }
    }
}
