//! Boolean operations between a closed triangle mesh and a vertical prism.
//!
//! A prism is a simple polygon in XY extruded along Z. Cutting a mesh with
//! one is the only solid operation the splitter needs: every cutter it
//! builds is a planar outline swept through the full height of the part.
//! Restricting the second operand this way makes the operation exact in
//! structure:
//!
//! - each mesh edge is tested against the polygon once, in 2D
//! - each crossing becomes one vertex shared by both neighbouring faces
//! - cut faces are re-triangulated with [`spade`] constrained Delaunay
//!   triangulations, in XY or, for upright faces, in their own plane
//! - the opening left on the wall is closed by triangulating the unrolled
//!   wall in `(arc length, z)`
//!
//! so the output is closed and manifold whenever the input is. Contacts
//! closer than the configured tolerance (a vertex on the wall, a polygon
//! corner on an edge) are resolved by nudging the prism a few nanometres
//! and retrying.
//!
//! # Layer 0
//!
//! Depends on `mesh-types` and `mesh-repair`; no I/O.
//!
//! # Example
//!
//! ```
//! use mesh_boolean::{intersect_prism, subtract_prism, Prism};
//! use mesh_types::{cuboid, Point3};
//! use nalgebra::Point2;
//!
//! let block = cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 4.0));
//! let corner = Prism::new(
//!     vec![
//!         Point2::new(-1.0, -1.0),
//!         Point2::new(6.5, -1.0),
//!         Point2::new(6.5, 3.5),
//!         Point2::new(-1.0, 3.5),
//!     ],
//!     -1.0,
//!     5.0,
//! )?;
//!
//! let inside = intersect_prism(&block, &corner)?;
//! let rest = subtract_prism(&block, &corner)?;
//! assert!((inside.volume() - 6.5 * 3.5 * 4.0).abs() < 1e-6);
//! assert!((inside.volume() + rest.volume() - block.volume()).abs() < 1e-6);
//! # Ok::<(), mesh_boolean::BooleanError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cap;
mod clip;
mod config;
mod error;
mod index;
mod operation;
mod prism;

pub use config::{BooleanConfig, BooleanOp, Side};
pub use error::{BooleanError, BooleanResult};
pub use operation::{
    boolean_operation, intersect_prism, subtract_prism, BooleanOperationResult, BooleanStats,
};
pub use prism::Prism;
