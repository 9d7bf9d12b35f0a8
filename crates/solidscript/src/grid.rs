//! Geometry snap grid: welds near-coincident vertices emitted by independent
//! tessellation calls so adjoining primitives share vertex indices.

use ahash::AHashMap;

/// Quantization resolution; two points within `res` of each other (measured
/// per-axis, i.e. Chebyshev distance) snap to the same grid cell.
pub const DEFAULT_RESOLUTION: f64 = 1e-3;

fn cell(v: f64, res: f64) -> i64 {
    (v / res).round() as i64
}

/// Deduplicates 3D points: `align` returns the index of an existing point
/// within `res` of the query if one was seen before, inserting a new entry
/// otherwise. Grid-cell lookup means the check is O(1) rather than O(n).
pub struct SnapGrid {
    res: f64,
    points: Vec<[f64; 3]>,
    cells: AHashMap<(i64, i64, i64), Vec<usize>>,
}

impl Default for SnapGrid {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl SnapGrid {
    #[must_use]
    pub fn new(res: f64) -> Self {
        Self {
            res,
            points: Vec::new(),
            cells: AHashMap::new(),
        }
    }

    /// Returns the index to use for `p`: an existing nearby point's index,
    /// or a freshly allocated one. Ties among multiple existing candidates
    /// within `res` break by insertion order (the first one found, which is
    /// also the first one ever inserted into that cell's bucket).
    pub fn align(&mut self, p: [f64; 3]) -> usize {
        let c = (cell(p[0], self.res), cell(p[1], self.res), cell(p[2], self.res));
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (c.0 + dx, c.1 + dy, c.2 + dz);
                    if let Some(candidates) = self.cells.get(&neighbor) {
                        for &idx in candidates {
                            let q = self.points[idx];
                            let within = (p[0] - q[0]).abs() <= self.res
                                && (p[1] - q[1]).abs() <= self.res
                                && (p[2] - q[2]).abs() <= self.res;
                            if within {
                                return idx;
                            }
                        }
                    }
                }
            }
        }
        let idx = self.points.len();
        self.points.push(p);
        self.cells.entry(c).or_default().push(idx);
        idx
    }

    #[must_use]
    pub fn point(&self, idx: usize) -> [f64; 3] {
        self.points[idx]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
