//! Polygon offsetting.
//!
//! Offsetting runs in two passes. The raw pass moves every edge along its
//! outward normal and joins neighbours with an arc (or mitre) where the
//! moved edges separate, or through the original vertex where they overlap.
//! The raw curve loops back on itself at every overlapping join and wherever
//! a feature narrower than twice the distance collapses. The cleanup pass
//! splits the raw curve at its self-crossings and keeps only the pieces with
//! positive winding on their left and none on their right, which are then
//! chained into the result rings.

use hashbrown::HashMap;
use nalgebra::{Point2, Vector2};
use smallvec::SmallVec;
use std::f64::consts::TAU;
use tracing::trace;

use crate::error::{PathError, PathResult};
use crate::geometry::{bounds, make_ccw, segment_crossing, signed_area, simplify_ring, winding_number, EPSILON};

/// Corner treatment where offset edges separate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinStyle {
    /// Circular arc around the original vertex.
    Round,
    /// Extend both edges to their intersection, bevelled past `limit`
    /// multiples of the distance.
    Mitre {
        /// Maximum mitre length relative to the offset distance.
        limit: f64,
    },
}

/// Configuration for polygon offsetting.
#[derive(Debug, Clone)]
pub struct OffsetOptions {
    /// Corner treatment.
    pub join: JoinStyle,
    /// Arc resolution for a full turn.
    pub segments_per_circle: usize,
    /// Minimum number of segments in any arc.
    pub min_arc_segments: usize,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            join: JoinStyle::Round,
            segments_per_circle: 64,
            min_arc_segments: 2,
        }
    }
}

impl OffsetOptions {
    /// Sharp corners, bevelled beyond four times the distance.
    #[must_use]
    pub fn mitre() -> Self {
        Self {
            join: JoinStyle::Mitre { limit: 4.0 },
            ..Self::default()
        }
    }

    /// Round joins with at least `segments` segments per arc.
    #[must_use]
    pub fn round(segments: usize) -> Self {
        Self {
            join: JoinStyle::Round,
            segments_per_circle: segments.max(1) * 4,
            min_arc_segments: segments.max(1),
        }
    }
}

/// Offset a counter-clockwise ring by `distance` (positive grows it).
///
/// Returns every ring of the result, counter-clockwise; holes are not
/// produced by the shapes this crate offsets and are dropped. An offset that
/// erases the polygon returns an empty list.
///
/// # Errors
///
/// [`PathError::Offset`] for a non-finite distance or a ring with fewer than
/// three vertices.
///
/// # Example
///
/// ```
/// use dovetail_path::{offset_polygon, signed_area, OffsetOptions};
/// use nalgebra::Point2;
///
/// let square = vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(10.0, 0.0),
///     Point2::new(10.0, 10.0),
///     Point2::new(0.0, 10.0),
/// ];
/// let shrunk = offset_polygon(&square, -1.0, &OffsetOptions::default())?;
/// assert_eq!(shrunk.len(), 1);
/// assert!((signed_area(&shrunk[0]) - 64.0).abs() < 1e-9);
/// # Ok::<(), dovetail_path::PathError>(())
/// ```
pub fn offset_polygon(
    ring: &[Point2<f64>],
    distance: f64,
    options: &OffsetOptions,
) -> PathResult<Vec<Vec<Point2<f64>>>> {
    if !distance.is_finite() {
        return Err(PathError::Offset {
            distance,
            details: "distance is not finite".to_string(),
        });
    }
    let mut base = simplify_ring(ring);
    if base.len() < 3 {
        return Err(PathError::Offset {
            distance,
            details: format!("ring has {} usable vertices", base.len()),
        });
    }
    make_ccw(&mut base);
    if distance.abs() <= EPSILON {
        return Ok(vec![base]);
    }

    let raw = raw_offset(&base, distance, options);
    let scale = bounds(&raw).map_or(1.0, |(lo, hi)| (hi - lo).norm().max(1.0));
    let rings = cleanup(&raw, scale);
    trace!(distance, raw = raw.len(), rings = rings.len(), "offset polygon");
    Ok(rings)
}

/// Morphological closing: grow by `r`, then shrink by `r`. Rounds reflex
/// corners and leaves convex corners sharp.
///
/// The first pass uses mitre joins so that no arc has to collapse back onto
/// its centre in the second.
///
/// # Errors
///
/// [`PathError::Offset`] when either pass fails or does not yield one ring.
pub fn close_polygon(ring: &[Point2<f64>], r: f64, options: &OffsetOptions) -> PathResult<Vec<Point2<f64>>> {
    let grown = single(offset_polygon(ring, r, &sharp(options))?, r)?;
    single(offset_polygon(&grown, -r, options)?, -r)
}

/// Morphological opening: shrink by `r`, then grow by `r`. Rounds convex
/// corners and leaves reflex corners as they were.
///
/// # Errors
///
/// [`PathError::Offset`] when either pass fails or does not yield one ring.
pub fn open_polygon(ring: &[Point2<f64>], r: f64, options: &OffsetOptions) -> PathResult<Vec<Point2<f64>>> {
    let shrunk = single(offset_polygon(ring, -r, &sharp(options))?, -r)?;
    single(offset_polygon(&shrunk, r, options)?, r)
}

fn sharp(options: &OffsetOptions) -> OffsetOptions {
    OffsetOptions {
        join: JoinStyle::Mitre { limit: 16.0 },
        ..options.clone()
    }
}

fn single(mut rings: Vec<Vec<Point2<f64>>>, distance: f64) -> PathResult<Vec<Point2<f64>>> {
    if rings.len() == 1 {
        return Ok(rings.remove(0));
    }
    Err(PathError::Offset {
        distance,
        details: format!("expected one ring, got {}", rings.len()),
    })
}

fn unit_normal(a: &Point2<f64>, b: &Point2<f64>) -> Vector2<f64> {
    let e = (b - a).normalize();
    Vector2::new(e.y, -e.x)
}

fn raw_offset(ring: &[Point2<f64>], distance: f64, options: &OffsetOptions) -> Vec<Point2<f64>> {
    let n = ring.len();
    let normals: Vec<Vector2<f64>> = (0..n).map(|i| unit_normal(&ring[i], &ring[(i + 1) % n])).collect();
    let mut out = Vec::with_capacity(n * 4);

    for i in 0..n {
        let p = ring[i];
        let (n0, n1) = (normals[(i + n - 1) % n], normals[i]);
        let turn = n0.perp(&n1);
        let from = p + n0 * distance;
        let to = p + n1 * distance;

        if turn.abs() <= 1e-12 && n0.dot(&n1) > 0.0 {
            out.push(to);
        } else if turn * distance > 0.0 {
            // Edges separate: fill the gap.
            match options.join {
                JoinStyle::Round => {
                    let sweep = turn.atan2(n0.dot(&n1));
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                    let steps = ((sweep.abs() / TAU * options.segments_per_circle as f64).ceil() as usize)
                        .max(options.min_arc_segments)
                        .max(1);
                    let start = n0.y.atan2(n0.x);
                    #[allow(clippy::cast_precision_loss)]
                    for k in 0..=steps {
                        let a = start + sweep * k as f64 / steps as f64;
                        out.push(p + Vector2::new(a.cos(), a.sin()) * distance);
                    }
                }
                JoinStyle::Mitre { limit } => {
                    let bisector = n0 + n1;
                    let cos_half = (bisector.norm() * 0.5).max(1e-12);
                    let reach = 1.0 / cos_half;
                    if reach <= limit {
                        out.push(p + bisector.normalize() * distance * reach);
                    } else {
                        out.push(from);
                        out.push(to);
                    }
                }
            }
        } else {
            // Edges overlap: route through the vertex so the loop it forms
            // carries the right winding.
            out.push(from);
            out.push(p);
            out.push(to);
        }
    }
    out
}

/// A crossing shared by two raw segments.
#[derive(Clone, Copy)]
struct Cut {
    t: f64,
    point: Point2<f64>,
}

type Key = (u64, u64);

fn key(p: &Point2<f64>) -> Key {
    // -0.0 and 0.0 must meet.
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

fn cleanup(raw: &[Point2<f64>], scale: f64) -> Vec<Vec<Point2<f64>>> {
    let n = raw.len();
    let mut cuts: Vec<SmallVec<[Cut; 2]>> = vec![SmallVec::new(); n];

    let seg = |i: usize| (raw[i], raw[(i + 1) % n]);
    let mut order: Vec<usize> = (0..n).collect();
    let min_x = |i: usize| raw[i].x.min(raw[(i + 1) % n].x);
    order.sort_by(|&i, &j| min_x(i).total_cmp(&min_x(j)));
    for (k, &i) in order.iter().enumerate() {
        let (a, b) = seg(i);
        let max_x = a.x.max(b.x);
        for &j in &order[k + 1..] {
            if min_x(j) > max_x {
                break;
            }
            let (c, d) = seg(j);
            if let Some((t, u)) = segment_crossing(&a, &b, &c, &d) {
                let point = a + (b - a) * t;
                cuts[i].push(Cut { t, point });
                cuts[j].push(Cut { t: u, point });
            }
        }
    }

    let eps = 1e-7 * scale;
    let mut kept: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();
    for i in 0..n {
        let (a, b) = seg(i);
        let mut stops: SmallVec<[Cut; 4]> = SmallVec::new();
        stops.push(Cut { t: 0.0, point: a });
        let mut inner = cuts[i].clone();
        inner.sort_by(|x, y| x.t.total_cmp(&y.t));
        stops.extend(inner);
        stops.push(Cut { t: 1.0, point: b });

        for w in stops.windows(2) {
            let (p, q) = (w[0].point, w[1].point);
            let d = q - p;
            let len = d.norm();
            if len <= EPSILON {
                continue;
            }
            let mid = p + d * 0.5;
            let left = Vector2::new(-d.y, d.x) / len * eps;
            if winding_number(&(mid + left), raw) > 0 && winding_number(&(mid - left), raw) <= 0 {
                kept.push((p, q));
            }
        }
    }
    chain(&kept, scale)
}

fn chain(edges: &[(Point2<f64>, Point2<f64>)], scale: f64) -> Vec<Vec<Point2<f64>>> {
    let mut starts: HashMap<Key, SmallVec<[usize; 2]>> = HashMap::with_capacity(edges.len());
    for (i, (a, _)) in edges.iter().enumerate() {
        starts.entry(key(a)).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        let origin = key(&edges[first].0);
        let mut ring = Vec::new();
        let mut current = first;
        loop {
            used[current] = true;
            let (a, b) = edges[current];
            ring.push(a);
            if key(&b) == origin {
                break;
            }
            let next = starts
                .get(&key(&b))
                .and_then(|list| list.iter().copied().find(|&e| !used[e]));
            match next {
                Some(e) => current = e,
                None => {
                    ring.clear();
                    break;
                }
            }
        }

        let ring = simplify_ring(&ring);
        if ring.len() >= 3 && signed_area(&ring) > 1e-9 * scale * scale {
            rings.push(ring);
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{distance_to_ring, is_simple_ring};
    use approx::assert_relative_eq;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2<f64>> {
        raw.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn square() -> Vec<Point2<f64>> {
        pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    #[test]
    fn grow_square_round() {
        let rings = offset_polygon(&square(), 1.0, &OffsetOptions::default());
        let Ok(rings) = rings else { panic!("offset failed") };
        assert_eq!(rings.len(), 1);
        // 10x10 + four 10x1 strips + a full circle of radius 1.
        let expected = 100.0 + 40.0 + std::f64::consts::PI;
        assert_relative_eq!(signed_area(&rings[0]), expected, epsilon = 0.02);
        assert!(is_simple_ring(&rings[0]));
    }

    #[test]
    fn grow_square_mitre() {
        let rings = offset_polygon(&square(), 1.0, &OffsetOptions::mitre());
        assert!(rings.is_ok_and(|r| r.len() == 1 && (signed_area(&r[0]) - 144.0).abs() < 1e-9));
    }

    #[test]
    fn shrink_l_shape_keeps_reflex_round() {
        let l = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (4.0, 4.0), (4.0, 10.0), (0.0, 10.0)]);
        let Ok(rings) = offset_polygon(&l, -1.0, &OffsetOptions::default()) else {
            panic!("offset failed");
        };
        assert_eq!(rings.len(), 1);
        // Every vertex sits exactly one unit inside.
        for p in &rings[0] {
            assert_relative_eq!(distance_to_ring(p, &l), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn narrow_neck_splits() {
        // Two 10x10 squares joined by a 1 mm bridge.
        let dumbbell = pts(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 4.5),
            (15.0, 4.5),
            (15.0, 0.0),
            (25.0, 0.0),
            (25.0, 10.0),
            (15.0, 10.0),
            (15.0, 5.5),
            (10.0, 5.5),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        let rings = offset_polygon(&dumbbell, -1.0, &OffsetOptions::default());
        assert!(rings.is_ok_and(|r| r.len() == 2));
    }

    #[test]
    fn collapse_to_nothing() {
        let rings = offset_polygon(&square(), -6.0, &OffsetOptions::default());
        assert!(rings.is_ok_and(|r| r.is_empty()));
    }

    #[test]
    fn opening_rounds_convex_corners() {
        let Ok(opened) = open_polygon(&square(), 2.0, &OffsetOptions::round(16)) else {
            panic!("opening failed");
        };
        // Each corner loses (4 - pi) r^2.
        let expected = 100.0 - (4.0 - std::f64::consts::PI) * 4.0;
        assert_relative_eq!(signed_area(&opened), expected, epsilon = 0.05);
        assert!(opened.len() > 4 * 16);

        let Ok(closed) = close_polygon(&square(), 2.0, &OffsetOptions::round(16)) else {
            panic!("closing failed");
        };
        assert_relative_eq!(signed_area(&closed), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(offset_polygon(&square(), f64::NAN, &OffsetOptions::default()).is_err());
        assert!(offset_polygon(&square()[..2], 1.0, &OffsetOptions::default()).is_err());
    }
}
