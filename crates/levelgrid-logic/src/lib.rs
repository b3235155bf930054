//! Pure collision-grid repair for top-down levels.
//!
//! A level's walkable area arrives as a noisy `{0,1}` occupancy grid from an
//! image classifier. This crate repairs it so the level is playable: the
//! spawn is open, every edge is reachable from the spawn, and obstacle
//! density stays under a cap. Functions take plain data and an explicit RNG,
//! so every repair is reproducible and unit-testable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`grid`] | Cells, coordinates, edges, the dense `Grid` matrix |
//! | [`config`] | `SanitizerConfig`, size presets, spawn zone, validation |
//! | [`connectivity`] | BFS flood fill and nearest-walkable search |
//! | [`carve`] | Staircase corridor carving and radius clearing |
//! | [`density`] | Randomized interior wall removal toward a density target |
//! | [`sanitizer`] | The fixed repair pipeline and its report |
//! | [`layout`] | Runtime view: pocket sealing, entry cells, wall rectangles |
//! | [`collision_map`] | Stage JSON documents, normalization, per-area repair |
//!
//! ```
//! use levelgrid_logic::config::SanitizerConfig;
//! use levelgrid_logic::grid::{Cell, Grid};
//! use levelgrid_logic::sanitizer::GridSanitizer;
//!
//! let mut grid = Grid::filled(15, 20, Cell::Blocked);
//! let sanitizer = GridSanitizer::new(SanitizerConfig::compact_15x20());
//! let report = sanitizer.sanitize_seeded(&mut grid, 42);
//! assert!(grid.blocked_fraction() <= 0.35);
//! assert_eq!(report.carved_edges().count(), 4);
//! ```

pub mod carve;
pub mod collision_map;
pub mod config;
pub mod connectivity;
pub mod density;
pub mod grid;
pub mod layout;
pub mod sanitizer;
