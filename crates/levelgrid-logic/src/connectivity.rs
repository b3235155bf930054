//! Flood-fill reachability over walkable cells.
//!
//! `flood_fill` is a plain BFS with 4-directional moves. The result is a
//! dense membership mask rather than a hash set: lookups during edge checks
//! and pocket sealing are O(1) and the mask is never larger than the grid.

use std::collections::VecDeque;

use crate::grid::{Coord, Grid};

/// Set of cells reachable from a seed. Derived data, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachableSet {
    rows: usize,
    cols: usize,
    mask: Vec<bool>,
    count: usize,
}

impl ReachableSet {
    fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            mask: vec![false; rows * cols],
            count: 0,
        }
    }

    /// Insert a cell; returns true if it was not already present.
    fn insert(&mut self, at: Coord) -> bool {
        let idx = at.row * self.cols + at.col;
        if self.mask[idx] {
            return false;
        }
        self.mask[idx] = true;
        self.count += 1;
        true
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.rows && at.col < self.cols && self.mask[at.row * self.cols + at.col]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Members in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        let cols = self.cols.max(1);
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &hit)| hit)
            .map(move |(idx, _)| Coord::new(idx / cols, idx % cols))
    }

    /// How many of `cells` are in the set.
    pub fn count_in(&self, cells: &[Coord]) -> usize {
        cells.iter().filter(|c| self.contains(**c)).count()
    }
}

/// BFS flood fill from `seed` through walkable cells.
///
/// The seed is expected to be walkable; a blocked or out-of-bounds seed
/// yields an empty set.
pub fn flood_fill(grid: &Grid, seed: Coord) -> ReachableSet {
    let mut reachable = ReachableSet::empty(grid.rows(), grid.cols());
    if !grid.is_walkable(seed) {
        return reachable;
    }

    let mut queue = VecDeque::new();
    reachable.insert(seed);
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        for next in grid.neighbors4(current) {
            if grid.is_walkable(next) && reachable.insert(next) {
                queue.push_back(next);
            }
        }
    }

    reachable
}

/// Closest walkable cell to `origin`, searching square rings of growing radius.
///
/// Within a ring, cells are scanned row by row from the top-left. Returns
/// `None` if the grid has no walkable cell at all.
pub fn nearest_walkable(grid: &Grid, origin: Coord) -> Option<Coord> {
    if grid.is_walkable(origin) {
        return Some(origin);
    }
    let max_radius = grid.rows().max(grid.cols()) as isize;
    let (or, oc) = (origin.row as isize, origin.col as isize);

    for radius in 1..max_radius {
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dr.abs() != radius && dc.abs() != radius {
                    continue; // interior already scanned at a smaller radius
                }
                let (r, c) = (or + dr, oc + dc);
                if r < 0 || c < 0 {
                    continue;
                }
                let at = Coord::new(r as usize, c as usize);
                if grid.is_walkable(at) {
                    return Some(at);
                }
            }
        }
    }
    None
}
