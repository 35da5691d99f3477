//! Uniform Spatial Grid
//!
//! Neighbor acceleration for the particle system. Particles are hashed into
//! square cells one interaction diameter wide, so all interacting pairs lie
//! in the same cell or an adjacent one. Cells live in a `BTreeMap` and are
//! visited in key order, which keeps pair enumeration deterministic.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::math::{Fix64, Vec2Fix};

/// Forward half of the 8-neighborhood; visiting only these per cell yields
/// every adjacent-cell pair exactly once.
const FORWARD_NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Uniform grid keyed by integer cell coordinates.
pub(crate) struct SpatialGrid {
    cell_size: Fix64,
    cells: BTreeMap<(i32, i32), Vec<u32>>,
}

impl SpatialGrid {
    pub(crate) fn new(cell_size: Fix64) -> Self {
        Self {
            cell_size,
            cells: BTreeMap::new(),
        }
    }

    fn cell_of(&self, p: Vec2Fix) -> (i32, i32) {
        let x = (p.x / self.cell_size).floor_int() as i32;
        let y = (p.y / self.cell_size).floor_int() as i32;
        (x, y)
    }

    /// Rebuild the grid from scratch. Insertion order inside a cell follows
    /// particle index order.
    pub(crate) fn rebuild(&mut self, positions: &[Vec2Fix]) {
        self.cells.clear();
        for (i, &p) in positions.iter().enumerate() {
            let key = self.cell_of(p);
            self.cells.entry(key).or_default().push(i as u32);
        }
    }

    /// Visit every candidate pair (a < b not guaranteed; a != b is) whose
    /// members share a cell or sit in adjacent cells.
    pub(crate) fn for_each_candidate_pair<F>(&self, mut callback: F)
    where
        F: FnMut(u32, u32),
    {
        for (&(cx, cy), members) in &self.cells {
            // Pairs within the cell
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    callback(members[i], members[j]);
                }
            }
            // Pairs against forward neighbor cells
            for &(dx, dy) in &FORWARD_NEIGHBORS {
                if let Some(other) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &a in members {
                        for &b in other {
                            callback(a, b);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_cover_neighbors() {
        let positions = [
            Vec2Fix::from_int(0, 0),
            Vec2Fix::new(Fix64::HALF, Fix64::ZERO), // same cell as 0
            Vec2Fix::from_int(1, 0),                // adjacent cell
            Vec2Fix::from_int(10, 10),              // far away
        ];
        let mut grid = SpatialGrid::new(Fix64::ONE);
        grid.rebuild(&positions);

        let mut pairs = Vec::new();
        grid.for_each_candidate_pair(|a, b| {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            pairs.push((lo, hi));
        });
        pairs.sort_unstable();
        pairs.dedup();

        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(0, 2)));
        assert!(pairs.contains(&(1, 2)));
        assert!(!pairs.iter().any(|&(a, b)| a == 3 || b == 3));
    }

    #[test]
    fn test_deterministic_enumeration() {
        let positions: Vec<Vec2Fix> = (0..20)
            .map(|i| Vec2Fix::new(Fix64::from_ratio(i, 3), Fix64::from_ratio(i, 7)))
            .collect();
        let mut grid = SpatialGrid::new(Fix64::ONE);
        grid.rebuild(&positions);
        let mut run1 = Vec::new();
        grid.for_each_candidate_pair(|a, b| run1.push((a, b)));
        grid.rebuild(&positions);
        let mut run2 = Vec::new();
        grid.for_each_candidate_pair(|a, b| run2.push((a, b)));
        assert_eq!(run1, run2);
    }
}
