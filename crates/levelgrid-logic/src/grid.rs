//! Occupancy grid model: cells, coordinates, edges.
//!
//! A `Grid` is a dense row-major matrix of `Cell`s. The `{0,1}` encoding used
//! by collision-map documents (0 = walkable, 1 = blocked) is handled by
//! `Cell::from_bit` / `Cell::bit`; everything else works on the typed cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Traversal state of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Walkable,
    Blocked,
}

impl Cell {
    /// Decode a document cell value. Anything other than 0/1 is rejected.
    pub fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Cell::Walkable),
            1 => Some(Cell::Blocked),
            _ => None,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Cell::Walkable => 0,
            Cell::Blocked => 1,
        }
    }

    pub fn is_walkable(self) -> bool {
        self == Cell::Walkable
    }
}

/// A (row, col) position. Row 0 is the top of the level, col 0 the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// One of the four level boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Order in which the sanitizer checks edges.
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    pub fn name(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
            Edge::Right => "right",
        }
    }
}

/// Rectangular walkability grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid with every cell set to `cell`.
    pub fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: vec![cell; rows * cols],
        }
    }

    /// Fully walkable grid. Fallback when no usable source grid exists.
    pub fn open(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, Cell::Walkable)
    }

    /// Build from row-major cells. Returns `None` if the length doesn't match.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Option<Self> {
        if cells.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, cells })
    }

    /// Build from ASCII art: `#` is blocked, anything else walkable.
    /// Returns `None` for ragged input.
    pub fn from_ascii(lines: &[&str]) -> Option<Self> {
        let rows = lines.len();
        let cols = lines.first().map(|l| l.chars().count()).unwrap_or(0);
        let mut cells = Vec::with_capacity(rows * cols);
        for line in lines {
            if line.chars().count() != cols {
                return None;
            }
            cells.extend(line.chars().map(|ch| {
                if ch == '#' {
                    Cell::Blocked
                } else {
                    Cell::Walkable
                }
            }));
        }
        Self::from_cells(rows, cols, cells)
    }

    /// Encode as `{0,1}` rows for documents.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|c| c.bit()).collect())
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.rows && at.col < self.cols
    }

    fn index(&self, at: Coord) -> usize {
        at.row * self.cols + at.col
    }

    pub fn get(&self, at: Coord) -> Option<Cell> {
        if self.contains(at) {
            Some(self.cells[self.index(at)])
        } else {
            None
        }
    }

    /// Out-of-bounds positions are never walkable.
    pub fn is_walkable(&self, at: Coord) -> bool {
        self.get(at).is_some_and(Cell::is_walkable)
    }

    /// Set a cell. Returns true if the state actually changed.
    /// Out-of-bounds writes are ignored.
    pub fn set(&mut self, at: Coord, cell: Cell) -> bool {
        if !self.contains(at) {
            return false;
        }
        let idx = self.index(at);
        let changed = self.cells[idx] != cell;
        self.cells[idx] = cell;
        changed
    }

    /// Mark a cell walkable, returning true if it was blocked.
    pub fn open_cell(&mut self, at: Coord) -> bool {
        self.set(at, Cell::Walkable)
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Blocked).count()
    }

    pub fn walkable_count(&self) -> usize {
        self.cell_count() - self.blocked_count()
    }

    /// Blocked cells as a fraction of all cells (0.0 for an empty grid).
    pub fn blocked_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.blocked_count() as f64 / self.cell_count() as f64
    }

    /// True for cells on the outer ring (first/last row, first/last column).
    pub fn is_border(&self, at: Coord) -> bool {
        at.row == 0 || at.col == 0 || at.row + 1 == self.rows || at.col + 1 == self.cols
    }

    /// Center cell `(rows/2, cols/2)`.
    pub fn center(&self) -> Coord {
        Coord::new(self.rows / 2, self.cols / 2)
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Coord::new(r, c)))
    }

    /// In-bounds 4-neighbors (up, down, left, right).
    pub fn neighbors4(&self, at: Coord) -> impl Iterator<Item = Coord> + '_ {
        let up = at.row.checked_sub(1).map(|r| Coord::new(r, at.col));
        let down = Some(Coord::new(at.row + 1, at.col));
        let left = at.col.checked_sub(1).map(|c| Coord::new(at.row, c));
        let right = Some(Coord::new(at.row, at.col + 1));
        [up, down, left, right]
            .into_iter()
            .flatten()
            .filter(move |n| self.contains(*n))
    }

    /// Ordered cells of one boundary: left→right for rows, top→bottom for columns.
    pub fn edge_cells(&self, edge: Edge) -> Vec<Coord> {
        if self.is_empty() {
            return Vec::new();
        }
        match edge {
            Edge::Top => (0..self.cols).map(|c| Coord::new(0, c)).collect(),
            Edge::Bottom => (0..self.cols)
                .map(|c| Coord::new(self.rows - 1, c))
                .collect(),
            Edge::Left => (0..self.rows).map(|r| Coord::new(r, 0)).collect(),
            Edge::Right => (0..self.rows)
                .map(|r| Coord::new(r, self.cols - 1))
                .collect(),
        }
    }

    /// Middle cell of an edge (`cells[len / 2]`). `None` for an empty grid.
    pub fn edge_midpoint(&self, edge: Edge) -> Option<Coord> {
        let cells = self.edge_cells(edge);
        cells.get(cells.len() / 2).copied()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols.max(1)).take(self.rows) {
            for cell in row {
                let ch = match cell {
                    Cell::Walkable => '.',
                    Cell::Blocked => '#',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_bits() {
        assert_eq!(Cell::from_bit(0), Some(Cell::Walkable));
        assert_eq!(Cell::from_bit(1), Some(Cell::Blocked));
        assert_eq!(Cell::from_bit(2), None);
        assert_eq!(Cell::Blocked.bit(), 1);
    }

    #[test]
    fn test_from_ascii_and_counts() {
        let grid = Grid::from_ascii(&["#..", ".#.", "..#"]).unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.blocked_count(), 3);
        assert_eq!(grid.walkable_count(), 6);
        assert!((grid.blocked_fraction() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ragged_ascii_rejected() {
        assert!(Grid::from_ascii(&["...", ".."]).is_none());
    }

    #[test]
    fn test_to_rows_encoding() {
        let grid = Grid::from_ascii(&["#.", ".#"]).unwrap();
        assert_eq!(grid.to_rows(), vec![vec![1, 0], vec![0, 1]]);
    }

    #[test]
    fn test_set_reports_change() {
        let mut grid = Grid::open(2, 2);
        assert!(grid.set(Coord::new(1, 1), Cell::Blocked));
        assert!(!grid.set(Coord::new(1, 1), Cell::Blocked));
        assert!(!grid.set(Coord::new(5, 5), Cell::Blocked)); // out of bounds
        assert_eq!(grid.blocked_count(), 1);
    }

    #[test]
    fn test_border_detection() {
        let grid = Grid::open(4, 5);
        assert!(grid.is_border(Coord::new(0, 2)));
        assert!(grid.is_border(Coord::new(3, 2)));
        assert!(grid.is_border(Coord::new(2, 0)));
        assert!(grid.is_border(Coord::new(2, 4)));
        assert!(!grid.is_border(Coord::new(1, 1)));
        assert!(!grid.is_border(Coord::new(2, 3)));
    }

    #[test]
    fn test_neighbors_at_corner() {
        let grid = Grid::open(3, 3);
        let n: Vec<_> = grid.neighbors4(Coord::new(0, 0)).collect();
        assert_eq!(n, vec![Coord::new(1, 0), Coord::new(0, 1)]);
        assert_eq!(grid.neighbors4(Coord::new(1, 1)).count(), 4);
    }

    #[test]
    fn test_edge_midpoints() {
        let grid = Grid::open(15, 20);
        assert_eq!(grid.edge_midpoint(Edge::Top), Some(Coord::new(0, 10)));
        assert_eq!(grid.edge_midpoint(Edge::Bottom), Some(Coord::new(14, 10)));
        assert_eq!(grid.edge_midpoint(Edge::Left), Some(Coord::new(7, 0)));
        assert_eq!(grid.edge_midpoint(Edge::Right), Some(Coord::new(7, 19)));
        assert_eq!(grid.edge_cells(Edge::Left).len(), 15);
    }

    #[test]
    fn test_empty_grid_edges() {
        let grid = Grid::open(0, 0);
        assert!(grid.edge_cells(Edge::Top).is_empty());
        assert_eq!(grid.edge_midpoint(Edge::Right), None);
        assert_eq!(grid.blocked_fraction(), 0.0);
    }

    #[test]
    fn test_display_roundtrips_ascii() {
        let lines = ["#.#", "..."];
        let grid = Grid::from_ascii(&lines).unwrap();
        assert_eq!(grid.to_string(), "#.#\n...\n");
    }
}
