//! Core mesh types for the dovetail splitter.
//!
//! - [`Vertex`] - a point in 3D space
//! - [`IndexedMesh`] - a triangle mesh with shared vertices
//! - [`Triangle`] - a triangle with resolved positions
//! - [`Aabb`] - axis-aligned bounding box
//!
//! # Layer 0 Crate
//!
//! No I/O and no dependencies beyond `nalgebra`. Every other crate in the
//! workspace builds on these types.
//!
//! # Units and Orientation
//!
//! Coordinates are `f64` millimeters in a right-handed frame with Z up.
//! Faces are wound counter-clockwise when viewed from outside, so the signed
//! volume of a closed mesh is positive.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, MeshTopology, Vertex};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//! assert_eq!(mesh.face_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod bounds;
mod mesh;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use mesh::{cuboid, unit_cube, IndexedMesh};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::Vertex;

pub use nalgebra::{Point3, Vector3};
