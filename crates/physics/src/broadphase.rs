use std::collections::{BTreeSet, HashMap};

use framecore_common::Aabb;
use glam::Vec3;

/// Bodies spanning more cells than this skip the grid and are tested
/// against everything (large static floors, mostly).
const MAX_CELLS_PER_BODY: i64 = 512;

/// A 3D cell coordinate in the broad-phase grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Uniform spatial hash over world-space AABBs.
///
/// Rebuilt every sub-step. Candidate pairs come back as a sorted set of
/// `(low, high)` body indices, so the narrow phase visits them in the same
/// order on every run regardless of hash iteration order.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<usize>>,
    oversized: Vec<usize>,
    bounds: Vec<Option<Aabb>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
            bounds: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.bounds.clear();
    }

    pub fn position_to_cell(&self, pos: Vec3) -> CellCoord {
        let c = (pos / self.cell_size).floor();
        CellCoord::new(c.x as i32, c.y as i32, c.z as i32)
    }

    /// Insert body `index` with world bounds `aabb`.
    pub fn insert(&mut self, index: usize, aabb: Aabb) {
        if self.bounds.len() <= index {
            self.bounds.resize(index + 1, None);
        }
        self.bounds[index] = Some(aabb);

        let lo = self.position_to_cell(aabb.min);
        let hi = self.position_to_cell(aabb.max);
        let span = |a: i32, b: i32| i64::from(b) - i64::from(a) + 1;
        // Huge but finite bounds overflow the product; they count as oversized.
        let cells = span(lo.x, hi.x)
            .saturating_mul(span(lo.y, hi.y))
            .saturating_mul(span(lo.z, hi.z));
        if cells > MAX_CELLS_PER_BODY {
            self.oversized.push(index);
            return;
        }
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    self.cells.entry(CellCoord::new(x, y, z)).or_default().push(index);
                }
            }
        }
    }

    /// Every pair of inserted bodies whose bounds overlap.
    pub fn pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut result = BTreeSet::new();
        for members in self.cells.values() {
            for (n, &i) in members.iter().enumerate() {
                for &j in &members[n + 1..] {
                    self.push_if_overlapping(&mut result, i, j);
                }
            }
        }
        for &big in &self.oversized {
            for other in 0..self.bounds.len() {
                self.push_if_overlapping(&mut result, big, other);
            }
        }
        result
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    fn push_if_overlapping(&self, out: &mut BTreeSet<(usize, usize)>, i: usize, j: usize) {
        if i == j {
            return;
        }
        let (Some(Some(a)), Some(Some(b))) = (self.bounds.get(i), self.bounds.get(j)) else {
            return;
        };
        if a.overlaps(b) {
            out.insert((i.min(j), i.max(j)));
        }
    }
}
