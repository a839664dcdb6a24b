//! Vertical prism: a simple polygon in XY extruded between two heights.

use nalgebra::Point2;

use crate::error::{BooleanError, BooleanResult};
use crate::index::{Segment2, SegmentGrid, SlabIndex};

/// Extrusion of a simple polygon along Z.
///
/// The polygon is stored counter-clockwise; clockwise input is reversed.
/// Consecutive duplicate vertices are dropped. Walls are addressed by their
/// arc-length coordinate `s`, measured along the polygon from vertex 0.
#[derive(Debug, Clone)]
pub struct Prism {
    polygon: Vec<Point2<f64>>,
    z_min: f64,
    z_max: f64,
    cumulative: Vec<f64>,
    inside: SlabIndex,
    grid: SegmentGrid,
}

impl Prism {
    /// Build a prism from a simple polygon and a height range.
    ///
    /// # Errors
    ///
    /// [`BooleanError::InvalidPrism`] for fewer than three distinct
    /// vertices, non-finite coordinates, zero area or an empty height range.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_boolean::Prism;
    /// use nalgebra::Point2;
    ///
    /// let square = vec![
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(0.0, 2.0),
    ///     Point2::new(2.0, 2.0),
    ///     Point2::new(2.0, 0.0),
    /// ];
    /// let prism = Prism::new(square, -1.0, 1.0)?;
    /// assert!(prism.contains_xy(1.0, 1.0));
    /// assert!((prism.perimeter() - 8.0).abs() < 1e-12);
    /// # Ok::<(), mesh_boolean::BooleanError>(())
    /// ```
    pub fn new(polygon: Vec<Point2<f64>>, z_min: f64, z_max: f64) -> BooleanResult<Self> {
        if !(z_min.is_finite() && z_max.is_finite() && z_min < z_max) {
            return Err(BooleanError::InvalidPrism {
                details: format!("bad height range [{z_min}, {z_max}]"),
            });
        }
        if polygon.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(BooleanError::InvalidPrism {
                details: "non-finite polygon vertex".to_string(),
            });
        }

        let mut ring: Vec<Point2<f64>> = Vec::with_capacity(polygon.len());
        for p in polygon {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(BooleanError::InvalidPrism {
                details: format!("{} distinct vertices", ring.len()),
            });
        }

        let area = signed_area(&ring);
        if area.abs() <= f64::EPSILON {
            return Err(BooleanError::InvalidPrism {
                details: "polygon has zero area".to_string(),
            });
        }
        if area < 0.0 {
            ring.reverse();
        }

        let segments = segments_of(&ring);
        let mut cumulative = Vec::with_capacity(ring.len() + 1);
        let mut s = 0.0;
        cumulative.push(0.0);
        for [a, b] in &segments {
            s += (b[0] - a[0]).hypot(b[1] - a[1]);
            cumulative.push(s);
        }

        Ok(Self {
            grid: SegmentGrid::new(&segments),
            inside: SlabIndex::new(segments),
            polygon: ring,
            z_min,
            z_max,
            cumulative,
        })
    }

    /// Counter-clockwise polygon.
    #[must_use]
    pub fn polygon(&self) -> &[Point2<f64>] {
        &self.polygon
    }

    /// Bottom of the extrusion.
    #[must_use]
    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    /// Top of the extrusion.
    #[must_use]
    pub fn z_max(&self) -> f64 {
        self.z_max
    }

    /// Polygon length.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.cumulative[self.polygon.len()]
    }

    /// Enclosed area of the polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.polygon)
    }

    /// Whether `(x, y)` lies inside the polygon.
    #[must_use]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.inside.contains([x, y])
    }

    /// Copy shifted in XY.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let shifted = self
            .polygon
            .iter()
            .map(|p| Point2::new(p.x + dx, p.y + dy))
            .collect::<Vec<_>>();
        let segments = segments_of(&shifted);
        Self {
            grid: SegmentGrid::new(&segments),
            inside: SlabIndex::new(segments),
            polygon: shifted,
            z_min: self.z_min,
            z_max: self.z_max,
            cumulative: self.cumulative.clone(),
        }
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.polygon.len()
    }

    pub(crate) fn vertex(&self, k: usize) -> Point2<f64> {
        self.polygon[k % self.polygon.len()]
    }

    /// Segment `k` runs from vertex `k` to vertex `k + 1`.
    pub(crate) fn segment(&self, k: usize) -> (Point2<f64>, Point2<f64>) {
        (self.vertex(k), self.vertex(k + 1))
    }

    /// Wall coordinate of parameter `u` on segment `k`.
    pub(crate) fn wall_s(&self, k: usize, u: f64) -> f64 {
        let (s0, s1) = (self.cumulative[k], self.cumulative[k + 1]);
        s0 + (s1 - s0) * u
    }

    /// Segments whose grid cells overlap the box.
    pub(crate) fn candidates(&self, min: [f64; 2], max: [f64; 2]) -> smallvec::SmallVec<[u32; 16]> {
        self.grid.query(min, max)
    }
}

fn segments_of(ring: &[Point2<f64>]) -> Vec<Segment2> {
    (0..ring.len())
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
            [[a.x, a.y], [b.x, b.y]]
        })
        .collect()
}

fn signed_area(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (p, q) = (ring[i], ring[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum::<f64>()
        * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Vec<Point2<f64>> {
        [(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (1.0, 1.0), (1.0, 4.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| Point2::new(x, y))
            .collect()
    }

    #[test]
    fn clockwise_input_is_reversed() {
        let mut cw = l_shape();
        cw.reverse();
        let prism = Prism::new(cw, 0.0, 1.0);
        assert!(prism.as_ref().is_ok_and(|p| (p.area() - 7.0).abs() < 1e-12));
        assert!(prism.is_ok_and(|p| p.contains_xy(3.0, 0.5) && !p.contains_xy(3.0, 3.0)));
    }

    #[test]
    fn wall_coordinates() {
        let Ok(prism) = Prism::new(l_shape(), 0.0, 1.0) else {
            panic!("valid prism rejected");
        };
        assert!((prism.perimeter() - 16.0).abs() < 1e-12);
        assert!((prism.wall_s(1, 0.5) - 4.5).abs() < 1e-12);
        assert!((prism.wall_s(5, 1.0) - 16.0).abs() < 1e-12);
        let moved = prism.translated(1.0, 0.0);
        assert!(moved.contains_xy(4.5, 0.5));
        assert!((moved.perimeter() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(Prism::new(line, 0.0, 1.0).is_err());
        assert!(Prism::new(l_shape(), 1.0, 1.0).is_err());
        let mut dup = l_shape();
        dup.push(dup[0]);
        assert!(Prism::new(dup, 0.0, 1.0).is_ok_and(|p| p.vertex_count() == 6));
    }
}
