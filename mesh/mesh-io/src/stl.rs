//! STL (Stereolithography) reading and writing.
//!
//! Both ASCII and binary STL are read; output is always binary, which is what
//! slicers expect and what the quadrant archive contains.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    header (ignored)
//! UINT32       number of triangles
//! foreach triangle
//!     REAL32[3] normal (recomputed on write, ignored on read)
//!     REAL32[3] vertex 1
//!     REAL32[3] vertex 2
//!     REAL32[3] vertex 3
//!     UINT16    attribute byte count
//! end
//! ```
//!
//! # Vertex Sharing
//!
//! STL stores every triangle with its own corners. The reader merges corners
//! with bit-identical coordinates so adjacent faces share indices; near-equal
//! corners are left to the repair crate's welding pass.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one binary triangle record.
const TRIANGLE_SIZE: usize = 50;

/// Encoding used by [`save_stl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlFormat {
    /// 50 bytes per triangle.
    #[default]
    Binary,
    /// Human-readable text.
    Ascii,
}

/// Merges corners with identical coordinates into shared vertices.
struct Indexer {
    lookup: HashMap<[u32; 3], u32>,
    mesh: IndexedMesh,
}

impl Indexer {
    fn with_capacity(faces: usize) -> Self {
        Self {
            lookup: HashMap::with_capacity(faces / 2 + 3),
            mesh: IndexedMesh::with_capacity(faces / 2 + 3, faces),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn vertex(&mut self, p: [f32; 3]) -> u32 {
        // -0.0 and 0.0 are the same corner.
        let key = p.map(|c| if c == 0.0 { 0 } else { c.to_bits() });
        let vertices = &mut self.mesh.vertices;
        *self.lookup.entry(key).or_insert_with(|| {
            vertices.push(Vertex::from_coords(
                f64::from(p[0]),
                f64::from(p[1]),
                f64::from(p[2]),
            ));
            (vertices.len() - 1) as u32
        })
    }

    fn push(&mut self, corners: [[f32; 3]; 3]) {
        let face = corners.map(|c| self.vertex(c));
        self.mesh.faces.push(face);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

/// Parse an STL file held in memory.
///
/// The format is detected from the content: a buffer whose length matches
/// the binary layout for its declared triangle count is binary, otherwise a
/// buffer starting with `solid` is ASCII. Binary files whose header happens
/// to begin with `solid` are handled by the length check.
///
/// # Errors
///
/// [`IoError::InvalidContent`] for unrecognizable or empty data,
/// [`IoError::Truncated`] for short binary data and [`IoError::BadNumber`]
/// for malformed ASCII coordinates.
///
/// # Example
///
/// ```
/// use mesh_io::{parse_stl, to_binary_stl};
/// use mesh_types::{unit_cube, MeshTopology};
///
/// let bytes = to_binary_stl(&unit_cube()).unwrap_or_default();
/// let mesh = parse_stl(&bytes).unwrap_or_default();
/// assert_eq!(mesh.face_count(), 12);
/// assert_eq!(mesh.vertex_count(), 8);
/// ```
pub fn parse_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if let Some(count) = binary_triangle_count(bytes) {
        if bytes.len() == HEADER_SIZE + 4 + count as usize * TRIANGLE_SIZE {
            return parse_binary(bytes, count);
        }
    }
    if looks_ascii(bytes) {
        return parse_ascii(bytes);
    }
    match binary_triangle_count(bytes) {
        Some(count) => parse_binary(bytes, count),
        None => Err(IoError::invalid_content("data too short for binary STL")),
    }
}

fn binary_triangle_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn looks_ascii(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    text.trim_start().starts_with("solid")
}

#[allow(clippy::cast_possible_truncation)]
fn parse_binary(bytes: &[u8], count: u32) -> IoResult<IndexedMesh> {
    let body = &bytes[HEADER_SIZE + 4..];
    let available = (body.len() / TRIANGLE_SIZE) as u32;
    if available < count {
        return Err(IoError::Truncated {
            expected: count,
            got: available,
        });
    }
    if count == 0 {
        return Err(IoError::invalid_content("binary STL declares zero triangles"));
    }

    let mut indexer = Indexer::with_capacity(count as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(count as usize) {
        // Skip the stored normal.
        let corners = [
            read_point(&record[12..24]),
            read_point(&record[24..36]),
            read_point(&record[36..48]),
        ];
        indexer.push(corners);
    }
    let mesh = indexer.finish();
    debug!(faces = mesh.faces.len(), vertices = mesh.vertices.len(), "parsed binary STL");
    Ok(mesh)
}

fn read_point(buf: &[u8]) -> [f32; 3] {
    let f = |i: usize| f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    [f(0), f(4), f(8)]
}

#[allow(clippy::cast_possible_truncation)]
fn parse_ascii(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let text = String::from_utf8_lossy(bytes);
    let mut indexer = Indexer::with_capacity(bytes.len() / 256);
    let mut corners: Vec<[f32; 3]> = Vec::with_capacity(3);

    for (n, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "outer" => corners.clear(),
            "vertex" => {
                let mut p = [0.0f32; 3];
                for slot in &mut p {
                    let token = tokens.next().unwrap_or_default();
                    let value: f64 = token.parse().map_err(|_| IoError::BadNumber {
                        line: n + 1,
                        token: token.to_string(),
                    })?;
                    *slot = value as f32;
                }
                corners.push(p);
            }
            "endfacet" => {
                if let [a, b, c] = corners[..] {
                    indexer.push([a, b, c]);
                }
                corners.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    let mesh = indexer.finish();
    if mesh.faces.is_empty() {
        return Err(IoError::invalid_content("ASCII STL contains no facets"));
    }
    debug!(faces = mesh.faces.len(), vertices = mesh.vertices.len(), "parsed ASCII STL");
    Ok(mesh)
}

/// Unit normal of a face, zero for degenerate faces.
fn face_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> [f64; 3] {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len > f64::EPSILON {
        [n.x / len, n.y / len, n.z / len]
    } else {
        [0.0; 3]
    }
}

/// Write a mesh as binary STL.
///
/// # Errors
///
/// [`IoError::TooManyFaces`] when the face count does not fit in `u32`,
/// [`IoError::Io`] when the writer fails.
#[allow(clippy::cast_possible_truncation)]
pub fn write_binary_stl<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    let count = u32::try_from(mesh.faces.len()).map_err(|_| IoError::TooManyFaces {
        faces: mesh.faces.len(),
    })?;

    let mut header = [b' '; HEADER_SIZE];
    let text = b"binary STL written by dovetail mesh-io";
    header[..text.len()].copy_from_slice(text);
    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = [0u8; TRIANGLE_SIZE];
    for &[i0, i1, i2] in &mesh.faces {
        let (a, b, c) = (mesh.position(i0), mesh.position(i1), mesh.position(i2));
        let normal = face_normal(&a, &b, &c);
        let values = [
            normal,
            [a.x, a.y, a.z],
            [b.x, b.y, b.z],
            [c.x, c.y, c.z],
        ];
        for (k, v) in values.iter().flatten().enumerate() {
            record[k * 4..k * 4 + 4].copy_from_slice(&(*v as f32).to_le_bytes());
        }
        record[48..50].copy_from_slice(&0u16.to_le_bytes());
        writer.write_all(&record)?;
    }
    Ok(())
}

/// Encode a mesh as binary STL in memory.
///
/// # Errors
///
/// [`IoError::TooManyFaces`] when the face count does not fit in `u32`.
pub fn to_binary_stl(mesh: &IndexedMesh) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + mesh.faces.len() * TRIANGLE_SIZE);
    write_binary_stl(mesh, &mut out)?;
    Ok(out)
}

/// Write a mesh as ASCII STL.
///
/// # Errors
///
/// [`IoError::Io`] when the writer fails.
pub fn write_ascii_stl<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    writeln!(writer, "solid dovetail")?;
    for &[i0, i1, i2] in &mesh.faces {
        let (a, b, c) = (mesh.position(i0), mesh.position(i1), mesh.position(i2));
        let [nx, ny, nz] = face_normal(&a, &b, &c);
        writeln!(writer, "  facet normal {nx:.6e} {ny:.6e} {nz:.6e}")?;
        writeln!(writer, "    outer loop")?;
        for p in [a, b, c] {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid dovetail")?;
    Ok(())
}

/// Load an STL file from disk.
///
/// # Errors
///
/// [`IoError::FileNotFound`], [`IoError::Io`] or any [`parse_stl`] error.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let mesh = load_stl("model.stl")?;
/// println!("loaded {} faces", mesh.faces.len());
/// # Ok::<(), mesh_io::IoError>(())
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;
    parse_stl(&bytes)
}

/// Save a mesh to an STL file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, format: StlFormat) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        StlFormat::Binary => write_binary_stl(mesh, &mut writer)?,
        StlFormat::Ascii => write_ascii_stl(mesh, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}
