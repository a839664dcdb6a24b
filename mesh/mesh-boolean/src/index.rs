//! Spatial lookups over 2D segment sets.

use smallvec::SmallVec;

/// 2D segment as `[start, end]`.
pub(crate) type Segment2 = [[f64; 2]; 2];

/// Segments bucketed into horizontal bands for even-odd ray casting.
#[derive(Debug, Clone)]
pub(crate) struct SlabIndex {
    segments: Vec<Segment2>,
    y_min: f64,
    y_max: f64,
    band: f64,
    bands: Vec<Vec<u32>>,
}

impl SlabIndex {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub(crate) fn new(segments: Vec<Segment2>) -> Self {
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for [a, b] in &segments {
            y_min = y_min.min(a[1].min(b[1]));
            y_max = y_max.max(a[1].max(b[1]));
        }
        let count = if y_max > y_min {
            ((segments.len() as f64).sqrt().ceil() as usize).clamp(1, 4096)
        } else {
            1
        };
        let band = if y_max > y_min { (y_max - y_min) / count as f64 } else { 1.0 };

        let mut index = Self {
            segments,
            y_min,
            y_max,
            band,
            bands: vec![Vec::new(); count],
        };
        for (i, [a, b]) in index.segments.iter().enumerate() {
            let lo = index.band_of(a[1].min(b[1]));
            let hi = index.band_of(a[1].max(b[1]));
            for slot in &mut index.bands[lo..=hi] {
                slot.push(i as u32);
            }
        }
        index
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn band_of(&self, y: f64) -> usize {
        let k = ((y - self.y_min) / self.band).floor();
        if k <= 0.0 {
            0
        } else {
            (k as usize).min(self.bands.len() - 1)
        }
    }

    /// Even-odd containment: parity of crossings on the ray towards +x.
    pub(crate) fn contains(&self, p: [f64; 2]) -> bool {
        if self.segments.is_empty() || p[1] < self.y_min || p[1] > self.y_max {
            return false;
        }
        let mut inside = false;
        for &i in &self.bands[self.band_of(p[1])] {
            let [a, b] = self.segments[i as usize];
            if (a[1] > p[1]) != (b[1] > p[1]) {
                let x = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                if x > p[0] {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Uniform grid over segment bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct SegmentGrid {
    origin: [f64; 2],
    cell: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl SegmentGrid {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub(crate) fn new(segments: &[Segment2]) -> Self {
        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        for seg in segments {
            for p in seg {
                for k in 0..2 {
                    lo[k] = lo[k].min(p[k]);
                    hi[k] = hi[k].max(p[k]);
                }
            }
        }
        let extent = (hi[0] - lo[0]).max(hi[1] - lo[1]).max(1e-9);
        let per_side = ((segments.len() as f64).sqrt().ceil() as usize).clamp(1, 512);
        let cell = extent / per_side as f64;
        let cols = (((hi[0] - lo[0]) / cell).floor() as usize + 1).min(per_side + 1);
        let rows = (((hi[1] - lo[1]) / cell).floor() as usize + 1).min(per_side + 1);

        let mut grid = Self {
            origin: lo,
            cell,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        };
        for (i, [a, b]) in segments.iter().enumerate() {
            let min = [a[0].min(b[0]), a[1].min(b[1])];
            let max = [a[0].max(b[0]), a[1].max(b[1])];
            if let Some((c0, c1, r0, r1)) = grid.cell_range(min, max) {
                for r in r0..=r1 {
                    for c in c0..=c1 {
                        grid.cells[r * grid.cols + c].push(i as u32);
                    }
                }
            }
        }
        grid
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn cell_range(&self, min: [f64; 2], max: [f64; 2]) -> Option<(usize, usize, usize, usize)> {
        let to_cell = |v: f64, o: f64| ((v - o) / self.cell).floor();
        let (c0, c1) = (to_cell(min[0], self.origin[0]), to_cell(max[0], self.origin[0]));
        let (r0, r1) = (to_cell(min[1], self.origin[1]), to_cell(max[1], self.origin[1]));
        if c1 < 0.0 || r1 < 0.0 || c0 >= self.cols as f64 || r0 >= self.rows as f64 {
            return None;
        }
        let clamp = |v: f64, n: usize| (v.max(0.0) as usize).min(n - 1);
        Some((
            clamp(c0, self.cols),
            clamp(c1, self.cols),
            clamp(r0, self.rows),
            clamp(r1, self.rows),
        ))
    }

    /// Indices of segments whose cells overlap the box, sorted, no repeats.
    pub(crate) fn query(&self, min: [f64; 2], max: [f64; 2]) -> SmallVec<[u32; 16]> {
        let mut out = SmallVec::new();
        if let Some((c0, c1, r0, r1)) = self.cell_range(min, max) {
            for r in r0..=r1 {
                for c in c0..=c1 {
                    out.extend_from_slice(&self.cells[r * self.cols + c]);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lo: f64, hi: f64) -> Vec<Segment2> {
        let p = [[lo, lo], [hi, lo], [hi, hi], [lo, hi]];
        (0..4).map(|i| [p[i], p[(i + 1) % 4]]).collect()
    }

    #[test]
    fn slab_parity() {
        let mut segs = square(0.0, 10.0);
        segs.extend(square(4.0, 6.0));
        let index = SlabIndex::new(segs);
        assert!(index.contains([1.0, 1.0]));
        assert!(!index.contains([5.0, 5.0]));
        assert!(index.contains([9.0, 5.5]));
        assert!(!index.contains([11.0, 5.0]));
        assert!(!index.contains([5.0, -1.0]));
    }

    #[test]
    fn grid_query_finds_overlaps() {
        let segs = square(0.0, 10.0);
        let grid = SegmentGrid::new(&segs);
        let hits = grid.query([-1.0, -1.0], [1.0, 1.0]);
        assert!(hits.contains(&0) && hits.contains(&3));
        assert!(grid.query([20.0, 20.0], [30.0, 30.0]).is_empty());
        assert_eq!(grid.query([-5.0, -5.0], [15.0, 15.0]).len(), 4);
    }
}
