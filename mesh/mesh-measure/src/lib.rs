//! Cross-section measurement for triangle meshes.
//!
//! The splitter slices each upload at mid-height before cutting and refuses
//! meshes whose section falls apart into too many loops. [`cross_section`]
//! provides that slice with exact, edge-keyed contour chaining.
//!
//! # Layer 0 Crate
//!
//! Depends only on `mesh-types`.
//!
//! # Example
//!
//! ```
//! use mesh_measure::mid_height_section;
//! use mesh_types::{cuboid, Point3};
//!
//! let block = cuboid(Point3::origin(), Point3::new(20.0, 10.0, 4.0));
//! let section = mid_height_section(&block)?;
//! assert_eq!(section.contour_count(), 1);
//! assert!((section.area() - 200.0).abs() < 1e-9);
//! # Ok::<(), mesh_measure::MeasureError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cross_section;
mod error;

pub use cross_section::{
    area_at_height, cross_section, cross_sections, mid_height_section, Contour, CrossSection,
};
pub use error::{MeasureError, MeasureResult};
