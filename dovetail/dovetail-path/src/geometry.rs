//! Planar polygon helpers.
//!
//! Rings are stored without a duplicated closing vertex. Regions are
//! counter-clockwise.

use nalgebra::{Point2, Vector2};

/// Distance below which two points are treated as one.
pub const EPSILON: f64 = 1e-9;

/// Twice the signed area of the triangle `a b c`; positive when it turns left.
#[inline]
#[must_use]
pub fn orient(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Shoelace area, positive for counter-clockwise rings.
#[must_use]
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let (p, q) = (ring[i], ring[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum::<f64>()
        * 0.5
}

/// Reverse a ring in place if it is clockwise.
pub fn make_ccw(ring: &mut [Point2<f64>]) {
    if signed_area(ring) < 0.0 {
        ring.reverse();
    }
}

/// Total length of an open polyline.
#[must_use]
pub fn polyline_length(points: &[Point2<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Axis-aligned bounds as `(min, max)`, `None` for no points.
#[must_use]
pub fn bounds(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(lo, hi), p| {
        (
            Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
            Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
        )
    }))
}

/// Distance from `p` to the segment `a b`.
#[must_use]
pub fn point_segment_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Distance from `p` to the closest edge of a closed ring.
#[must_use]
pub fn distance_to_ring(p: &Point2<f64>, ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| point_segment_distance(p, &ring[i], &ring[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Winding number of a closed ring around `p`.
#[must_use]
pub fn winding_number(p: &Point2<f64>, ring: &[Point2<f64>]) -> i32 {
    let n = ring.len();
    let mut w = 0;
    for i in 0..n {
        let (a, b) = (&ring[i], &ring[(i + 1) % n]);
        if a.y <= p.y {
            if b.y > p.y && orient(a, b, p) > 0.0 {
                w += 1;
            }
        } else if b.y <= p.y && orient(a, b, p) < 0.0 {
            w -= 1;
        }
    }
    w
}

/// Whether `p` lies inside a ring (non-zero winding).
#[must_use]
pub fn contains(ring: &[Point2<f64>], p: &Point2<f64>) -> bool {
    winding_number(p, ring) != 0
}

/// Parameters `(t, u)` of the proper crossing of `a b` with `c d`, if any.
///
/// Touching at an endpoint and collinear overlap do not count.
#[must_use]
pub fn segment_crossing(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> Option<(f64, f64)> {
    let r: Vector2<f64> = b - a;
    let s: Vector2<f64> = d - c;
    let denom = r.perp(&s);
    if denom.abs() <= f64::EPSILON * r.norm() * s.norm() {
        return None;
    }
    let ac = c - a;
    let t = ac.perp(&s) / denom;
    let u = ac.perp(&r) / denom;
    let inside = |v: f64| v > 1e-12 && v < 1.0 - 1e-12;
    (inside(t) && inside(u)).then_some((t, u))
}

/// Drop repeated points and vertices in the middle of straight runs.
///
/// Works on open polylines; the endpoints are always kept.
#[must_use]
pub fn simplify_polyline(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|q| (p - q).norm() <= EPSILON) {
            continue;
        }
        while out.len() >= 2 {
            let (a, b) = (out[out.len() - 2], out[out.len() - 1]);
            let (ab, bp) = (b - a, p - b);
            let straight = ab.perp(&bp).abs() <= EPSILON * ab.norm().max(bp.norm()) && ab.dot(&bp) > 0.0;
            if straight {
                out.pop();
            } else {
                break;
            }
        }
        out.push(p);
    }
    out
}

/// [`simplify_polyline`] for closed rings, including the seam vertex.
#[must_use]
pub fn simplify_ring(ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut out = simplify_polyline(ring);
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() <= EPSILON {
        out.pop();
    }
    loop {
        let n = out.len();
        if n < 3 {
            return out;
        }
        let mut removed = false;
        for i in 0..n {
            let (a, b, c) = (out[(i + n - 1) % n], out[i], out[(i + 1) % n]);
            let (ab, bc) = (b - a, c - b);
            if ab.perp(&bc).abs() <= EPSILON * ab.norm().max(bc.norm()) && ab.dot(&bc) > 0.0 {
                out.remove(i);
                removed = true;
                break;
            }
        }
        if !removed {
            return out;
        }
    }
}

fn segments_cross(points: &[Point2<f64>], closed: bool) -> bool {
    let n = points.len();
    let count = if closed { n } else { n.saturating_sub(1) };
    let seg = |i: usize| (points[i], points[(i + 1) % n]);

    // Sweep over x to skip pairs whose extents cannot overlap.
    let mut order: Vec<usize> = (0..count).collect();
    let min_x = |i: usize| {
        let (a, b) = seg(i);
        a.x.min(b.x)
    };
    order.sort_by(|&i, &j| min_x(i).total_cmp(&min_x(j)));

    for (k, &i) in order.iter().enumerate() {
        let (a, b) = seg(i);
        let max_x = a.x.max(b.x);
        for &j in &order[k + 1..] {
            if min_x(j) > max_x + EPSILON {
                break;
            }
            let adjacent = i.abs_diff(j) == 1 || (closed && i.abs_diff(j) == count - 1);
            let (c, d) = seg(j);
            if adjacent {
                // Neighbours may only meet at their shared vertex; folding
                // back onto each other is an overlap.
                let (ab, cd) = (b - a, d - c);
                if ab.perp(&cd).abs() <= EPSILON * ab.norm() * cd.norm() && ab.dot(&cd) < 0.0 {
                    return true;
                }
                continue;
            }
            if segment_crossing(&a, &b, &c, &d).is_some() {
                return true;
            }
            // Touching counts as a self-intersection too.
            let touch = point_segment_distance(&a, &c, &d).min(point_segment_distance(&b, &c, &d));
            let touch = touch.min(point_segment_distance(&c, &a, &b)).min(point_segment_distance(&d, &a, &b));
            if touch <= EPSILON {
                return true;
            }
        }
    }
    false
}

/// Whether an open polyline never crosses or touches itself.
#[must_use]
pub fn is_simple_polyline(points: &[Point2<f64>]) -> bool {
    !segments_cross(points, false)
}

/// Whether a closed ring never crosses or touches itself.
#[must_use]
pub fn is_simple_ring(ring: &[Point2<f64>]) -> bool {
    ring.len() >= 3 && !segments_cross(ring, true)
}
