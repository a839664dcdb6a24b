//! Mesh file I/O for the dovetail splitter.
//!
//! Only STL is supported: ASCII and binary on input, binary (or ASCII on
//! request) on output. Uploads arrive as byte buffers, so the primary entry
//! points work in memory:
//!
//! ```
//! use mesh_io::{parse_stl, to_binary_stl};
//! use mesh_types::unit_cube;
//!
//! let bytes = to_binary_stl(&unit_cube())?;
//! let mesh = parse_stl(&bytes)?;
//! assert_eq!(mesh.faces.len(), 12);
//! # Ok::<(), mesh_io::IoError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! Depends only on `mesh-types`. The path-based helpers [`load_stl`] and
//! [`save_stl`] exist for the command-line tool.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod stl;

pub use error::{IoError, IoResult};
pub use stl::{
    load_stl, parse_stl, save_stl, to_binary_stl, write_ascii_stl, write_binary_stl, StlFormat,
};
