//! Path carving: open a walkable corridor between two cells.
//!
//! The corridor is a monotone staircase: each step moves one cell along the
//! row axis (if rows still differ) and then one cell along the column axis
//! (if columns still differ). Every intermediate cell is opened, so the path
//! is 4-connected and always takes exactly `|Δrow| + |Δcol|` steps.

use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Grid};

/// What a carve did to the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarveReport {
    /// Single-axis moves taken from `from` to `to`.
    pub steps: usize,
    /// Cells that went from blocked to walkable (path and destination radius).
    pub opened: usize,
}

/// Carve a walkable staircase from `from` to `to`, then clear every cell
/// within Manhattan `radius` of `to`.
///
/// Never fails. Coordinates outside the grid are skipped when opening.
pub fn carve_path(grid: &mut Grid, from: Coord, to: Coord, radius: usize) -> CarveReport {
    let mut report = CarveReport::default();
    let mut current = from;
    if grid.open_cell(current) {
        report.opened += 1;
    }

    while current != to {
        if current.row != to.row {
            current.row = step_toward(current.row, to.row);
            report.steps += 1;
            if grid.open_cell(current) {
                report.opened += 1;
            }
        }
        if current.col != to.col {
            current.col = step_toward(current.col, to.col);
            report.steps += 1;
            if grid.open_cell(current) {
                report.opened += 1;
            }
        }
    }

    report.opened += clear_radius(grid, to, radius);
    report
}

fn step_toward(value: usize, target: usize) -> usize {
    if value < target {
        value + 1
    } else {
        value - 1
    }
}

/// Open every in-bounds cell within Manhattan `radius` of `center`.
/// Returns how many cells changed.
pub fn clear_radius(grid: &mut Grid, center: Coord, radius: usize) -> usize {
    let row_lo = center.row.saturating_sub(radius);
    let row_hi = (center.row + radius).min(grid.rows().saturating_sub(1));
    let col_lo = center.col.saturating_sub(radius);
    let col_hi = (center.col + radius).min(grid.cols().saturating_sub(1));

    let mut opened = 0;
    for row in row_lo..=row_hi {
        for col in col_lo..=col_hi {
            let at = Coord::new(row, col);
            if at.manhattan(center) <= radius && grid.open_cell(at) {
                opened += 1;
            }
        }
    }
    opened
}

/// Open the members of `cells` within Manhattan `radius` of `center`.
/// Used to widen an edge opening along the edge itself.
pub fn clear_cells_near(grid: &mut Grid, cells: &[Coord], center: Coord, radius: usize) -> usize {
    cells
        .iter()
        .filter(|c| c.manhattan(center) <= radius)
        .filter(|c| grid.open_cell(**c))
        .count()
}
