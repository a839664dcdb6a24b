//! Triangle with resolved vertex positions.

use nalgebra::{Point3, Vector3};

/// A triangle with concrete vertex positions.
///
/// Vertex order is counter-clockwise when seen from outside the solid, so
/// [`Triangle::normal`] points outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Cross product of the two edges leaving `v0`.
    ///
    /// Its length is twice the triangle area.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit normal, or `None` for a degenerate triangle.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len = n.norm();
        (len > f64::EPSILON).then(|| n / len)
    }

    /// Triangle area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Centroid.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Signed volume of the tetrahedron spanned with the origin.
    ///
    /// Summing this over a closed, outward-wound surface gives its volume.
    #[must_use]
    pub fn signed_volume_term(&self) -> f64 {
        self.v0.coords.dot(&self.v1.coords.cross(&self.v2.coords)) / 6.0
    }

    /// Signed area of the XY projection (positive when CCW from above).
    #[must_use]
    pub fn signed_area_xy(&self) -> f64 {
        0.5 * ((self.v1.x - self.v0.x) * (self.v2.y - self.v0.y)
            - (self.v2.x - self.v0.x) * (self.v1.y - self.v0.y))
    }

    /// Degenerate when the area falls below `epsilon`.
    #[must_use]
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() < epsilon
    }

    /// Same triangle with opposite winding.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        Self::new(self.v0, self.v2, self.v1)
    }
}
