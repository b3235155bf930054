//! Stage collision-map documents.
//!
//! A stage document holds one `{0,1}` grid per area:
//!
//! ```json
//! { "stageId": "stage_1", "areas": [ { "areaIndex": 0, "areaName": "Gate", "grid": [[0, 1], [0, 0]] } ] }
//! ```
//!
//! Source grids come from an image classifier and are often slightly off.
//! `normalize_rows` pads short rows with walkable cells and truncates long
//! ones; anything worse (wrong row count, values other than 0/1) is an error,
//! and `grid_or_default` recovers from it with a fully walkable grid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SanitizerConfig;
use crate::grid::{Cell, Grid};
use crate::sanitizer::{GridSanitizer, SanitizeReport};

/// Collision grids for every area of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCollisionMap {
    pub stage_id: String,
    pub areas: Vec<AreaCollision>,
}

/// One area's raw grid, as stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCollision {
    pub area_index: u32,
    #[serde(default)]
    pub area_name: String,
    pub grid: Vec<Vec<u8>>,
}

impl AreaCollision {
    /// Fully walkable area, used when no source grid exists at all.
    pub fn open(area_index: u32, area_name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            area_index,
            area_name: area_name.into(),
            grid: Grid::open(rows, cols).to_rows(),
        }
    }
}

impl StageCollisionMap {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Errors reading or shaping collision-map documents.
#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    RowCount { expected: usize, found: usize },
    CellValue { row: usize, col: usize, value: u8 },
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::Io(e)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::Json(e)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::Json(e) => write!(f, "JSON error: {}", e),
            MapError::RowCount { expected, found } => {
                write!(f, "Grid has {} rows, expected {}", found, expected)
            }
            MapError::CellValue { row, col, value } => {
                write!(
                    f,
                    "Cell ({}, {}) has value {}, expected 0 or 1",
                    row, col, value
                )
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Shape raw document rows into a `rows × cols` grid.
///
/// Short rows are padded with walkable cells and long rows truncated. A
/// wrong row count or a non-binary cell is an error.
pub fn normalize_rows(raw: &[Vec<u8>], rows: usize, cols: usize) -> Result<Grid, MapError> {
    if raw.len() != rows {
        return Err(MapError::RowCount {
            expected: rows,
            found: raw.len(),
        });
    }
    let mut cells = Vec::with_capacity(rows * cols);
    for (r, row) in raw.iter().enumerate() {
        if row.len() != cols {
            log::warn!("Row {} has {} cols, expected {}", r, row.len(), cols);
        }
        for c in 0..cols {
            let value = row.get(c).copied().unwrap_or(0);
            let cell = Cell::from_bit(value).ok_or(MapError::CellValue {
                row: r,
                col: c,
                value,
            })?;
            cells.push(cell);
        }
    }
    Ok(Grid::from_cells(rows, cols, cells).unwrap_or_else(|| Grid::open(rows, cols)))
}

/// `normalize_rows`, falling back to an open grid on any error.
/// The second value is true when the fallback was used.
pub fn grid_or_default(raw: &[Vec<u8>], rows: usize, cols: usize) -> (Grid, bool) {
    match normalize_rows(raw, rows, cols) {
        Ok(grid) => (grid, false),
        Err(e) => {
            log::warn!("Unusable source grid ({}), using open {}×{} grid", e, rows, cols);
            (Grid::open(rows, cols), true)
        }
    }
}

/// Result of sanitizing one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOutcome {
    pub area_index: u32,
    pub area_name: String,
    /// True when the source grid was unusable and replaced with an open grid.
    /// Open fallback grids skip the sanitizer.
    pub used_default: bool,
    pub report: Option<SanitizeReport>,
    pub wall_count: usize,
    pub cell_count: usize,
}

impl AreaOutcome {
    pub fn wall_density(&self) -> f64 {
        if self.cell_count == 0 {
            return 0.0;
        }
        self.wall_count as f64 / self.cell_count as f64
    }
}

/// Per-area RNG seed derived from the run seed, so areas are independent
/// of processing order.
pub fn area_seed(base_seed: u64, area_index: u32) -> u64 {
    base_seed
        .wrapping_add(area_index as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Normalize and sanitize one area in place.
pub fn sanitize_area(
    area: &mut AreaCollision,
    sanitizer: &GridSanitizer,
    base_seed: u64,
) -> AreaOutcome {
    let config = sanitizer.config();
    let (mut grid, used_default) = grid_or_default(&area.grid, config.rows, config.cols);
    let report = if used_default {
        None
    } else {
        Some(sanitizer.sanitize_seeded(&mut grid, area_seed(base_seed, area.area_index)))
    };
    area.grid = grid.to_rows();
    AreaOutcome {
        area_index: area.area_index,
        area_name: area.area_name.clone(),
        used_default,
        report,
        wall_count: grid.blocked_count(),
        cell_count: grid.cell_count(),
    }
}

/// Sanitize every area of a stage, in order.
pub fn sanitize_stage(
    map: &mut StageCollisionMap,
    config: &SanitizerConfig,
    base_seed: u64,
) -> Vec<AreaOutcome> {
    let sanitizer = GridSanitizer::new(config.clone());
    map.areas
        .iter_mut()
        .map(|area| sanitize_area(area, &sanitizer, base_seed))
        .collect()
}
