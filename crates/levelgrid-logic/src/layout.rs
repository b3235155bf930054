//! Runtime collision layout built from a sanitized grid.
//!
//! This is the consumer side of a repaired grid: it finds the connected
//! region around the spawn, optionally seals walkable pockets that the
//! region can't reach, answers walkability queries in world units, picks
//! enemy entry cells on the edges, and merges blocked cells into the
//! rectangles used as static colliders.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::connectivity::{flood_fill, nearest_walkable, ReachableSet};
use crate::grid::{Cell, Coord, Edge, Grid};

/// Fallback order for entry cells after the preferred edge.
const ENTRY_EDGE_ORDER: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

/// World-space size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl CellSize {
    /// Cell size for a playfield of `field_width × field_height` split into the grid.
    pub fn for_field(field_width: f32, field_height: f32, rows: usize, cols: usize) -> Self {
        Self {
            width: field_width / cols.max(1) as f32,
            height: field_height / rows.max(1) as f32,
        }
    }

    /// Grid cell under a world position. Negative or non-finite positions
    /// have no cell.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<Coord> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        Some(Coord::new(
            (y / self.height).floor() as usize,
            (x / self.width).floor() as usize,
        ))
    }

    /// World position of a cell's center.
    pub fn center_of(&self, at: Coord) -> (f32, f32) {
        (
            at.col as f32 * self.width + self.width / 2.0,
            at.row as f32 * self.height + self.height / 2.0,
        )
    }
}

/// A run of blocked cells merged into one axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallRect {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

/// Sanitized grid plus the region connected to the spawn.
#[derive(Debug, Clone)]
pub struct CollisionLayout {
    grid: Grid,
    seed: Option<Coord>,
    connected: ReachableSet,
    sealed: usize,
}

impl CollisionLayout {
    /// Build the layout. With `seal_pockets`, walkable cells not connected to
    /// the spawn region are turned into walls.
    pub fn build(mut grid: Grid, seal_pockets: bool) -> Self {
        let seed = nearest_walkable(&grid, grid.center());
        let connected = match seed {
            Some(at) => flood_fill(&grid, at),
            None => flood_fill(&grid, grid.center()),
        };
        let sealed = if seal_pockets {
            seal_isolated_pockets(&mut grid, &connected)
        } else {
            0
        };
        if sealed > 0 {
            log::info!("Sealed {} isolated walkable cells as walls", sealed);
        }
        Self {
            grid,
            seed,
            connected,
            sealed,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Walkable cell the connected region was grown from.
    pub fn seed(&self) -> Option<Coord> {
        self.seed
    }

    pub fn connected(&self) -> &ReachableSet {
        &self.connected
    }

    /// Cells converted to walls by pocket sealing.
    pub fn sealed(&self) -> usize {
        self.sealed
    }

    pub fn is_walkable(&self, at: Coord) -> bool {
        self.grid.is_walkable(at)
    }

    /// Walkability of a world position; outside the grid counts as blocked.
    pub fn is_walkable_at(&self, x: f32, y: f32, cell: CellSize) -> bool {
        cell.cell_at(x, y).is_some_and(|at| self.grid.is_walkable(at))
    }

    /// Walkable edge cells inside the connected region.
    pub fn connected_edge_cells(&self, edge: Edge) -> Vec<Coord> {
        self.grid
            .edge_cells(edge)
            .into_iter()
            .filter(|c| self.grid.is_walkable(*c) && self.connected.contains(*c))
            .collect()
    }

    /// Random connected cell on `preferred`, falling back to the other edges
    /// (top, right, bottom, left). `None` means no edge is reachable and the
    /// caller should fall back to the center.
    pub fn entry_cell<R: Rng + ?Sized>(&self, preferred: Edge, rng: &mut R) -> Option<Coord> {
        let order = std::iter::once(preferred)
            .chain(ENTRY_EDGE_ORDER.into_iter().filter(|e| *e != preferred));
        for edge in order {
            let cells = self.connected_edge_cells(edge);
            if !cells.is_empty() {
                return Some(cells[rng.gen_range(0..cells.len())]);
            }
        }
        None
    }

    /// `at` itself if connected, else the Manhattan-closest connected cell
    /// (first in row-major order on ties).
    pub fn nearest_connected(&self, at: Coord) -> Option<Coord> {
        if self.connected.contains(at) {
            return Some(at);
        }
        self.connected.iter().min_by_key(|c| c.manhattan(at))
    }

    pub fn wall_rects(&self) -> Vec<WallRect> {
        merge_wall_rects(&self.grid)
    }
}

/// Turn every walkable cell outside `connected` into a wall.
/// Returns the number of cells sealed.
pub fn seal_isolated_pockets(grid: &mut Grid, connected: &ReachableSet) -> usize {
    let pockets: Vec<Coord> = grid
        .coords()
        .filter(|c| grid.is_walkable(*c) && !connected.contains(*c))
        .collect();
    for at in &pockets {
        grid.set(*at, Cell::Blocked);
    }
    pockets.len()
}

/// Greedy merge of blocked cells into rectangles: from each unclaimed wall
/// cell, extend right as far as possible, then extend down while the whole
/// row span is unclaimed wall. Every blocked cell lands in exactly one rect.
pub fn merge_wall_rects(grid: &Grid) -> Vec<WallRect> {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut claimed = vec![false; rows * cols];
    let is_free_wall = |claimed: &[bool], r: usize, c: usize| {
        grid.get(Coord::new(r, c)) == Some(Cell::Blocked) && !claimed[r * cols + c]
    };

    let mut rects = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if !is_free_wall(&claimed, row, col) {
                continue;
            }
            let mut width = 0;
            while col + width < cols && is_free_wall(&claimed, row, col + width) {
                width += 1;
            }
            let mut height = 1;
            while row + height < rows
                && (col..col + width).all(|c| is_free_wall(&claimed, row + height, c))
            {
                height += 1;
            }
            for r in row..row + height {
                for c in col..col + width {
                    claimed[r * cols + c] = true;
                }
            }
            rects.push(WallRect {
                row,
                col,
                width,
                height,
            });
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pocket_grid() -> Grid {
        Grid::from_ascii(&[
            ".....#...", //
            ".....#.#.",
            ".....####",
            ".........",
            "#########",
        ])
        .unwrap()
    }

    #[test]
    fn test_seals_unreachable_pocket() {
        let layout = CollisionLayout::build(pocket_grid(), true);
        // top-right pocket: (0,6..9), (1,6), (1,8)
        assert_eq!(layout.sealed(), 5);
        assert!(!layout.is_walkable(Coord::new(0, 7)));
        assert!(layout.is_walkable(Coord::new(3, 8)));
    }

    #[test]
    fn test_without_sealing_grid_unchanged() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        assert_eq!(layout.sealed(), 0);
        assert_eq!(layout.grid(), &pocket_grid());
        assert!(!layout.connected().contains(Coord::new(0, 7)));
    }

    #[test]
    fn test_seed_searches_from_blocked_center() {
        let grid = Grid::from_ascii(&[
            "...", //
            ".#.",
            "...",
        ])
        .unwrap();
        let layout = CollisionLayout::build(grid, true);
        assert_eq!(layout.seed(), Some(Coord::new(0, 0)));
        assert_eq!(layout.connected().len(), 8);
        assert_eq!(layout.sealed(), 0);
    }

    #[test]
    fn test_connected_edge_cells() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        let top = layout.connected_edge_cells(Edge::Top);
        assert_eq!(top.len(), 5); // (0,0..5); right pocket excluded
        assert!(layout.connected_edge_cells(Edge::Bottom).is_empty());
        assert_eq!(layout.connected_edge_cells(Edge::Left).len(), 4);
    }

    #[test]
    fn test_entry_cell_falls_back() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        let mut rng = StdRng::seed_from_u64(11);
        // Bottom edge is all wall: falls back to top first
        let cell = layout.entry_cell(Edge::Bottom, &mut rng).unwrap();
        assert_eq!(cell.row, 0);
        assert!(cell.col < 5);
        let cell = layout.entry_cell(Edge::Left, &mut rng).unwrap();
        assert_eq!(cell.col, 0);
    }

    #[test]
    fn test_entry_cell_none_when_isolated() {
        let grid = Grid::from_ascii(&[
            "#####", //
            "#...#",
            "#####",
        ])
        .unwrap();
        let layout = CollisionLayout::build(grid, false);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(layout.entry_cell(Edge::Top, &mut rng), None);
    }

    #[test]
    fn test_nearest_connected() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        assert_eq!(
            layout.nearest_connected(Coord::new(3, 3)),
            Some(Coord::new(3, 3))
        );
        // Wall cell below row 3 snaps straight up
        assert_eq!(
            layout.nearest_connected(Coord::new(4, 2)),
            Some(Coord::new(3, 2))
        );
    }

    #[test]
    fn test_world_queries() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        let cell = CellSize::for_field(360.0, 200.0, 5, 9);
        assert_eq!(cell.width, 40.0);
        assert_eq!(cell.height, 40.0);
        assert!(layout.is_walkable_at(10.0, 10.0, cell));
        assert!(!layout.is_walkable_at(210.0, 10.0, cell)); // (0,5) wall
        assert!(!layout.is_walkable_at(-1.0, 10.0, cell));
        assert!(!layout.is_walkable_at(10.0, 500.0, cell));
        assert_eq!(cell.center_of(Coord::new(1, 2)), (100.0, 60.0));
    }

    #[test]
    fn test_non_finite_position_has_no_cell() {
        let layout = CollisionLayout::build(pocket_grid(), false);
        let cell = CellSize::for_field(360.0, 200.0, 5, 9);
        assert_eq!(cell.cell_at(f32::NAN, 10.0), None);
        assert_eq!(cell.cell_at(10.0, f32::INFINITY), None);
        assert!(!layout.is_walkable_at(f32::NAN, f32::NAN, cell));
        assert_eq!(cell.cell_at(10.0, 10.0), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_merge_covers_each_wall_once() {
        let grid = pocket_grid();
        let rects = merge_wall_rects(&grid);
        let covered: usize = rects.iter().map(|r| r.width * r.height).sum();
        assert_eq!(covered, grid.blocked_count());
        let mut seen = vec![false; grid.cell_count()];
        for r in &rects {
            for row in r.row..r.row + r.height {
                for col in r.col..r.col + r.width {
                    let at = Coord::new(row, col);
                    assert_eq!(grid.get(at), Some(Cell::Blocked));
                    assert!(!seen[row * grid.cols() + col], "{at:?} covered twice");
                    seen[row * grid.cols() + col] = true;
                }
            }
        }
    }

    #[test]
    fn test_merge_full_block_is_one_rect() {
        let grid = Grid::filled(3, 4, Cell::Blocked);
        assert_eq!(
            merge_wall_rects(&grid),
            vec![WallRect {
                row: 0,
                col: 0,
                width: 4,
                height: 3
            }]
        );
        assert!(merge_wall_rects(&Grid::open(3, 4)).is_empty());
    }
}
