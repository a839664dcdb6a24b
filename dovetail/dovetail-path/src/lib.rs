//! Planar geometry of dovetail joints.
//!
//! Everything here happens in the XY plane before any mesh is touched:
//!
//! - [`generate_tab`] draws one trapezoidal tab, optionally with
//!   morphologically rounded corners
//! - [`assemble_path`] tiles tabs along a split line around a central safe
//!   zone, narrowing them when they do not fit
//! - [`apply_tolerance`] turns a path into the male or female cutter
//!   outline, half a tolerance inside or outside the nominal region
//! - [`offset_polygon`] is the polygon offset both of the above rely on
//!
//! # Layer 0
//!
//! Pure geometry; no mesh types, no I/O.
//!
//! # Example
//!
//! ```
//! use dovetail_path::{assemble_path, Axis, CutterVolume, PathParams, Role};
//!
//! let params = PathParams::from_scale(15.0, 2, 1.0, 15.0, 0.2);
//! let path = assemble_path(Axis::X, 120.0, 180.0, &params)?;
//! let cutter = CutterVolume::for_mesh(&path, params.tolerance, Role::Male, 0.0, 30.0)?;
//! assert_eq!(cutter.axis, Axis::X);
//! assert!(cutter.polygon.len() > path.points.len());
//! # Ok::<(), dovetail_path::PathError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod assembler;
mod error;
mod geometry;
mod kerf;
mod offset;
mod tab;

pub use assembler::{assemble_path, Axis, CuttingPath, PathParams, MAX_TABS_PER_ARM};
pub use error::{PathError, PathResult};
pub use geometry::{
    bounds, contains, distance_to_ring, is_simple_polyline, is_simple_ring, make_ccw, polyline_length,
    signed_area, simplify_polyline, simplify_ring, winding_number,
};
pub use kerf::{apply_tolerance, nominal_region, CutterVolume, Role, CUTTER_HEIGHT_FACTOR, CUTTER_Z_MARGIN};
pub use offset::{close_polygon, offset_polygon, open_polygon, JoinStyle, OffsetOptions};
pub use tab::{
    generate_tab, generate_tab_with_resolution, TabSpec, DEFAULT_SEGMENTS_PER_CORNER, HEAD_RATIO,
    MAX_LIP_CLEARANCE, MIN_FLANK_ANGLE_DEG, MIN_NECK_WIDTH, NECK_RATIO,
};

/// Planar point type used throughout.
pub type Point2D = nalgebra::Point2<f64>;
