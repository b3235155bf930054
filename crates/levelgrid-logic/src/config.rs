//! Sanitizer configuration: dimensions, spawn zone, edge and density rules.
//!
//! One engine serves every level size; the differences between area layouts
//! live entirely in a `SanitizerConfig` value. Two presets match the layouts
//! shipped with the game: the full 22×30 area grid and the compact 15×20 one.
//!
//! ```
//! use levelgrid_logic::config::{validate_config, SanitizerConfig};
//!
//! let config = SanitizerConfig::compact_15x20();
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Grid};

/// Blocked-cell fraction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityBudget {
    /// Above this fraction the grid must be repaired.
    pub hard_cap: f64,
    /// Repair converges toward this fraction.
    pub soft_target: f64,
}

impl Default for DensityBudget {
    fn default() -> Self {
        Self {
            hard_cap: 0.40,
            soft_target: 0.35,
        }
    }
}

/// Every tunable of the repair pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Expected row count of source grids.
    pub rows: usize,
    /// Expected column count of source grids.
    pub cols: usize,
    /// Spawn zone spans `center.row - spawn_half_rows .. center.row + spawn_half_rows`.
    pub spawn_half_rows: usize,
    /// Spawn zone spans `center.col - spawn_half_cols .. center.col + spawn_half_cols`.
    pub spawn_half_cols: usize,
    /// Minimum walkable, spawn-reachable cells per edge.
    pub edge_threshold: usize,
    pub density: DensityBudget,
    /// Manhattan radius cleared around a carve destination.
    pub carve_radius: usize,
    /// Manhattan radius of edge cells forced open around a repaired edge midpoint.
    pub edge_clear_radius: usize,
}

impl SanitizerConfig {
    /// Full-size area layout (22 rows × 30 columns).
    pub fn area_22x30() -> Self {
        Self {
            rows: 22,
            cols: 30,
            spawn_half_rows: 2,
            spawn_half_cols: 3,
            edge_threshold: 2,
            density: DensityBudget::default(),
            carve_radius: 2,
            edge_clear_radius: 2,
        }
    }

    /// Compact layout (15 rows × 20 columns).
    pub fn compact_15x20() -> Self {
        Self {
            rows: 15,
            cols: 20,
            spawn_half_cols: 2,
            ..Self::area_22x30()
        }
    }

    /// Look up a preset by name (`"area"`/`"22x30"`, `"compact"`/`"15x20"`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "area" | "22x30" => Some(Self::area_22x30()),
            "compact" | "15x20" => Some(Self::compact_15x20()),
            _ => None,
        }
    }

    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Spawn zone for a concrete grid. Uses the grid's own dimensions.
    pub fn spawn_zone(&self, grid: &Grid) -> SpawnZone {
        SpawnZone::centered(grid, self.spawn_half_rows, self.spawn_half_cols)
    }

    /// Most reachable cells a single edge repair guarantees on an edge of
    /// `edge_len` cells: the Manhattan-radius strip around the midpoint.
    pub fn max_edge_threshold(&self, edge_len: usize) -> usize {
        let radius = self.carve_radius.max(self.edge_clear_radius);
        (2 * radius + 1).min(edge_len)
    }
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self::area_22x30()
    }
}

/// Rectangular region around the grid center that must stay walkable.
///
/// Bounds are half-open and clipped to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnZone {
    pub center: Coord,
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl SpawnZone {
    pub fn centered(grid: &Grid, half_rows: usize, half_cols: usize) -> Self {
        let center = grid.center();
        Self {
            center,
            row_start: center.row.saturating_sub(half_rows),
            row_end: (center.row + half_rows).min(grid.rows()),
            col_start: center.col.saturating_sub(half_cols),
            col_end: (center.col + half_cols).min(grid.cols()),
        }
    }

    pub fn contains(&self, at: Coord) -> bool {
        (self.row_start..self.row_end).contains(&at.row)
            && (self.col_start..self.col_end).contains(&at.col)
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (self.row_start..self.row_end)
            .flat_map(move |r| (self.col_start..self.col_end).map(move |c| Coord::new(r, c)))
    }

    pub fn cell_count(&self) -> usize {
        (self.row_end - self.row_start) * (self.col_end - self.col_start)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grids need an interior ring to repair: at least 3×3.
    GridTooSmall { rows: usize, cols: usize },
    /// Spawn zone would cover the border ring.
    SpawnZoneTooLarge { half_rows: usize, half_cols: usize },
    /// Zero half-extent gives an empty zone, so the spawn is never forced open.
    SpawnZoneEmpty { half_rows: usize, half_cols: usize },
    /// Threshold exceeds what one edge repair opens on the shorter edge.
    EdgeThresholdTooLarge { threshold: usize, max: usize },
    /// Edge threshold of zero disables edge repair entirely.
    EdgeThresholdZero,
    /// A density fraction outside [0, 1].
    DensityOutOfRange(f64),
    /// Soft target must not exceed the hard cap.
    DensityInverted { hard_cap: f64, soft_target: f64 },
}

/// Validate a sanitizer configuration, returning all errors found.
pub fn validate_config(config: &SanitizerConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.rows < 3 || config.cols < 3 {
        errors.push(ConfigError::GridTooSmall {
            rows: config.rows,
            cols: config.cols,
        });
    } else {
        // Zone starts at center - half and must stay off row/col 0
        let center_row = config.rows / 2;
        let center_col = config.cols / 2;
        if config.spawn_half_rows >= center_row || config.spawn_half_cols >= center_col {
            errors.push(ConfigError::SpawnZoneTooLarge {
                half_rows: config.spawn_half_rows,
                half_cols: config.spawn_half_cols,
            });
        }
        if config.spawn_half_rows == 0 || config.spawn_half_cols == 0 {
            errors.push(ConfigError::SpawnZoneEmpty {
                half_rows: config.spawn_half_rows,
                half_cols: config.spawn_half_cols,
            });
        }
        let max = config.max_edge_threshold(config.rows.min(config.cols));
        if config.edge_threshold > max {
            errors.push(ConfigError::EdgeThresholdTooLarge {
                threshold: config.edge_threshold,
                max,
            });
        }
    }

    if config.edge_threshold == 0 {
        errors.push(ConfigError::EdgeThresholdZero);
    }

    let budget = config.density;
    for value in [budget.hard_cap, budget.soft_target] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::DensityOutOfRange(value));
        }
    }
    if budget.soft_target > budget.hard_cap {
        errors.push(ConfigError::DensityInverted {
            hard_cap: budget.hard_cap,
            soft_target: budget.soft_target,
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for config in [SanitizerConfig::area_22x30(), SanitizerConfig::compact_15x20()] {
            let errors = validate_config(&config);
            assert!(errors.is_empty(), "preset should be valid: {errors:?}");
        }
    }

    #[test]
    fn default_is_area_preset() {
        assert_eq!(SanitizerConfig::default(), SanitizerConfig::area_22x30());
        assert_eq!(SanitizerConfig::preset("15x20"), Some(SanitizerConfig::compact_15x20()));
        assert_eq!(SanitizerConfig::preset("huge"), None);
    }

    #[test]
    fn grid_too_small() {
        let config = SanitizerConfig {
            rows: 2,
            ..SanitizerConfig::default()
        };
        assert!(validate_config(&config).contains(&ConfigError::GridTooSmall { rows: 2, cols: 30 }));
    }

    #[test]
    fn spawn_zone_touching_border() {
        let config = SanitizerConfig {
            spawn_half_rows: 11,
            ..SanitizerConfig::area_22x30()
        };
        assert!(validate_config(&config).contains(&ConfigError::SpawnZoneTooLarge {
            half_rows: 11,
            half_cols: 3
        }));
    }

    #[test]
    fn density_inverted_and_out_of_range() {
        let mut config = SanitizerConfig::default();
        config.density = DensityBudget {
            hard_cap: 0.3,
            soft_target: 1.5,
        };
        let errors = validate_config(&config);
        assert!(errors.contains(&ConfigError::DensityOutOfRange(1.5)));
        assert!(errors.contains(&ConfigError::DensityInverted {
            hard_cap: 0.3,
            soft_target: 1.5
        }));
    }

    #[test]
    fn edge_threshold_bounds() {
        let mut config = SanitizerConfig::compact_15x20();
        config.edge_threshold = 0;
        assert!(validate_config(&config).contains(&ConfigError::EdgeThresholdZero));
        config.edge_threshold = 16;
        assert!(validate_config(&config).contains(&ConfigError::EdgeThresholdTooLarge {
            threshold: 16,
            max: 5
        }));
    }

    #[test]
    fn edge_threshold_limited_by_repair_radius() {
        // Radius 2 opens five cells per edge
        let mut config = SanitizerConfig::compact_15x20();
        config.edge_threshold = 5;
        assert!(validate_config(&config).is_empty());
        config.edge_threshold = 6;
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::EdgeThresholdTooLarge { threshold: 6, max: 5 }]
        );

        let config = SanitizerConfig {
            carve_radius: 0,
            edge_clear_radius: 0,
            ..SanitizerConfig::compact_15x20()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::EdgeThresholdTooLarge { threshold: 2, max: 1 }]
        );

        let config = SanitizerConfig {
            carve_radius: 0,
            edge_clear_radius: 1,
            ..SanitizerConfig::compact_15x20()
        };
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn edge_threshold_limited_by_short_edge() {
        let config = SanitizerConfig {
            rows: 5,
            cols: 20,
            spawn_half_rows: 1,
            edge_threshold: 6,
            carve_radius: 4,
            ..SanitizerConfig::compact_15x20()
        };
        assert_eq!(config.max_edge_threshold(5), 5);
        assert!(validate_config(&config).contains(&ConfigError::EdgeThresholdTooLarge {
            threshold: 6,
            max: 5
        }));
    }

    #[test]
    fn zero_spawn_half_extent_rejected() {
        for (half_rows, half_cols) in [(0, 2), (2, 0)] {
            let config = SanitizerConfig {
                spawn_half_rows: half_rows,
                spawn_half_cols: half_cols,
                ..SanitizerConfig::compact_15x20()
            };
            assert!(validate_config(&config)
                .contains(&ConfigError::SpawnZoneEmpty { half_rows, half_cols }));
            let zone = config.spawn_zone(&Grid::open(15, 20));
            assert_eq!(zone.cell_count(), 0);
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = SanitizerConfig::from_json(r#"{"rows": 15, "cols": 20}"#).unwrap();
        assert_eq!(config.rows, 15);
        assert_eq!(config.cols, 20);
        assert_eq!(config.edge_threshold, 2);
        assert_eq!(config.density, DensityBudget::default());
    }

    #[test]
    fn spawn_zone_compact() {
        let grid = Grid::open(15, 20);
        let zone = SanitizerConfig::compact_15x20().spawn_zone(&grid);
        assert_eq!(zone.center, Coord::new(7, 10));
        assert_eq!((zone.row_start, zone.row_end), (5, 9));
        assert_eq!((zone.col_start, zone.col_end), (8, 12));
        assert_eq!(zone.cell_count(), 16);
        assert!(zone.contains(Coord::new(8, 11)));
        assert!(!zone.contains(Coord::new(9, 11)));
    }

    #[test]
    fn spawn_zone_area() {
        let grid = Grid::open(22, 30);
        let zone = SanitizerConfig::area_22x30().spawn_zone(&grid);
        assert_eq!((zone.row_start, zone.row_end), (9, 13));
        assert_eq!((zone.col_start, zone.col_end), (12, 18));
        assert_eq!(zone.coords().count(), 24);
    }

    #[test]
    fn spawn_zone_clipped_on_tiny_grid() {
        let grid = Grid::open(2, 2);
        let zone = SpawnZone::centered(&grid, 5, 5);
        assert_eq!((zone.row_start, zone.row_end), (0, 2));
        assert_eq!((zone.col_start, zone.col_end), (0, 2));
    }
}
