//! Split a closed mesh into four quadrants joined by dovetail tabs.
//!
//! A run takes STL bytes through a fixed sequence of [`Stage`]s:
//!
//! 1. parse and centre the mesh, resting it on `z = 0`
//! 2. repair small defects, reject meshes that stay open or whose
//!    mid-height section is too busy, and plan the cutters
//! 3. clip along the X line, then along the Y line
//! 4. drop debris and encode the four parts as binary STL
//!
//! Each split line carries dovetail tabs on both sides of a central safe
//! zone. Male and female cutters are offset from the same path by half the
//! joint tolerance each, so mating faces end up exactly one tolerance apart.
//!
//! # Layer 1
//!
//! Depends on the mesh crates and `dovetail-path`. Everything stays in
//! memory; packaging writes a ZIP into a buffer.
//!
//! # Example
//!
//! ```
//! use dovetail_split::{generate_parts, pack_zip, Quadrant, SplitParams};
//! use mesh_io::to_binary_stl;
//! use mesh_types::{cuboid, Point3};
//!
//! let block = cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(100.0, 80.0, 10.0));
//! let bytes = to_binary_stl(&block)?;
//!
//! let output = generate_parts(&bytes, &SplitParams::default())?;
//! assert_eq!(output.part(Quadrant::TL).name, "TL.stl");
//! assert!(output.total_volume() < block.volume());
//!
//! let archive = pack_zip(&output)?;
//! assert!(archive.starts_with(b"PK"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cache;
mod cutters;
mod error;
mod output;
mod params;
mod pipeline;
mod prepare;
mod preview;
mod quadrant;
mod sanitize;
mod stage;

pub use cache::{PartsCache, DEFAULT_CACHE_CAPACITY};
pub use cutters::{CutterSet, SplitPaths, CUTTER_WIDTH_FACTOR};
pub use error::{ConfigError, SplitError, SplitResult};
pub use output::{pack_zip, QuadrantPart, SplitOutput, SplitReport, SOFT_BUDGET};
pub use params::SplitParams;
pub use pipeline::{generate_parts, generate_parts_cached, generate_parts_with_observer, split_mesh};
pub use prepare::{check_complexity, ensure_watertight, normalize, MAX_SECTION_CONTOURS};
pub use preview::{preview_path, PathPreview, PreviewLine, OVERSIZE_FACTOR};
pub use quadrant::{Halves, Quadrant, Quadrants};
pub use sanitize::{sanitize, DEBRIS_THRESHOLD};
pub use stage::{NoopObserver, Stage, StageEvent, StageLog, StageObserver};
