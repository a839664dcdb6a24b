//! Path preview for plotting, computed without any boolean.

use dovetail_path::{Axis, TabSpec};
use mesh_types::Aabb;
use serde::{Deserialize, Serialize};

use crate::cutters::SplitPaths;
use crate::error::{SplitError, SplitResult};
use crate::params::SplitParams;

/// Objects larger than this many beds may not fit even after splitting.
pub const OVERSIZE_FACTOR: f64 = 2.0;

/// One split line, ready to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewLine {
    /// Split line direction.
    pub axis: Axis,
    /// Polyline vertices in mesh coordinates.
    pub points: Vec<[f64; 2]>,
    /// Tabs in baseline order.
    pub tabs: Vec<TabSpec>,
    /// Tab width after fitting.
    pub effective_width: f64,
    /// Whether tabs were narrowed to fit.
    pub auto_scaled: bool,
}

/// Both split lines over a mesh footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPreview {
    /// Footprint width and depth.
    pub footprint: [f64; 2],
    /// Path along X.
    pub x: PreviewLine,
    /// Path along Y.
    pub y: PreviewLine,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl PathPreview {
    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`SplitError::Encode`] if serialization fails.
    pub fn to_json(&self) -> SplitResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SplitError::Encode { details: e.to_string() })
    }
}

/// Lay out both split lines for a mesh bounding box.
///
/// The box is taken as is; pass the bounds of a normalized mesh to get
/// coordinates centred on the split lines.
///
/// # Errors
///
/// [`SplitError::Config`] for invalid parameters, [`SplitError::Sizing`]
/// when tabs cannot be laid out.
///
/// # Example
///
/// ```
/// use dovetail_split::{preview_path, SplitParams};
/// use mesh_types::{Aabb, Point3};
///
/// let bounds = Aabb::new(Point3::new(-60.0, -40.0, 0.0), Point3::new(60.0, 40.0, 30.0));
/// let preview = preview_path(&bounds, &SplitParams::default())?;
/// assert_eq!(preview.x.tabs.len(), 2);
/// assert!(preview.to_json()?.contains("\"axis\": \"y\""));
/// # Ok::<(), dovetail_split::SplitError>(())
/// ```
pub fn preview_path(bounds: &Aabb, params: &SplitParams) -> SplitResult<PathPreview> {
    params.validate()?;
    let paths = SplitPaths::plan(bounds, params)?;
    let size = bounds.size();
    let mut warnings = oversize_warnings(bounds, params);
    warnings.extend(scaling_warnings(&paths));
    let lines = paths.both().map(|path| PreviewLine {
        axis: path.axis,
        points: path.coordinates(),
        tabs: path.tabs.clone(),
        effective_width: path.effective_width,
        auto_scaled: path.auto_scaled,
    });
    let [x, y] = lines;
    Ok(PathPreview {
        footprint: [size.x, size.y],
        x,
        y,
        warnings,
    })
}

/// Warnings for split lines whose tabs were narrowed.
pub(crate) fn scaling_warnings(paths: &SplitPaths) -> Vec<String> {
    paths
        .both()
        .into_iter()
        .filter(|path| path.auto_scaled)
        .map(|path| {
            format!(
                "{} tabs narrowed from {:.2} mm to {:.2} mm",
                path.axis, path.nominal_width, path.effective_width
            )
        })
        .collect()
}

/// Warnings for footprints too large for four beds.
pub(crate) fn oversize_warnings(bounds: &Aabb, params: &SplitParams) -> Vec<String> {
    let size = bounds.size();
    let limit = OVERSIZE_FACTOR * params.bed_size_mm;
    [("X", size.x), ("Y", size.y)]
        .into_iter()
        .filter(|&(_, extent)| extent > limit)
        .map(|(axis, extent)| {
            format!("object is {extent:.1} mm in {axis}, more than twice the {} mm bed", params.bed_size_mm)
        })
        .collect()
}
