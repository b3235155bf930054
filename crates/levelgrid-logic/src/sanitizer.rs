//! Grid repair pipeline.
//!
//! Fixed, single-pass sequence:
//! 1. Force the spawn zone walkable
//! 2. Flood fill from the spawn center
//! 3. For each edge with too few reachable walkable cells, carve from the
//!    spawn center to the edge midpoint and widen the opening along the edge
//! 4. If the level is too dense, open random interior cells toward the soft target
//!
//! Reachability is computed once in step 2; carving for one edge does not
//! change the counts used for the edges checked after it. The pipeline only
//! guarantees spawn-to-edge reachability, not a single connected region.
//! See `layout::seal_isolated_pockets` for the stronger runtime fix-up.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::carve::{carve_path, clear_cells_near};
use crate::config::{SanitizerConfig, SpawnZone};
use crate::connectivity::flood_fill;
use crate::density::{reduce_density, DensityReport};
use crate::grid::{Edge, Grid};

/// Per-edge outcome of step 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRepair {
    pub edge: Edge,
    /// Walkable, spawn-reachable edge cells at the time of the check.
    pub reachable: usize,
    pub carved: bool,
    /// Cells opened by the carve and the edge widening.
    pub opened: usize,
}

/// Diagnostics from one sanitizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizeReport {
    pub spawn_opened: usize,
    pub edges: Vec<EdgeRepair>,
    /// Present only when the density cap was exceeded.
    pub density: Option<DensityReport>,
    pub initial_blocked_fraction: f64,
    pub final_blocked_fraction: f64,
}

impl SanitizeReport {
    /// Total cells turned walkable by the run.
    pub fn cells_opened(&self) -> usize {
        self.spawn_opened
            + self.edges.iter().map(|e| e.opened).sum::<usize>()
            + self.density.map(|d| d.converted).unwrap_or(0)
    }

    pub fn changed(&self) -> bool {
        self.cells_opened() > 0
    }

    pub fn carved_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().filter(|e| e.carved).map(|e| e.edge)
    }
}

/// The repair engine, parametrized entirely by its config.
#[derive(Debug, Clone, Default)]
pub struct GridSanitizer {
    config: SanitizerConfig,
}

impl GridSanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Repair `grid` in place. Always succeeds.
    ///
    /// Randomness (density step only) comes from `rng`.
    pub fn sanitize<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> SanitizeReport {
        let initial_blocked_fraction = grid.blocked_fraction();
        let mut report = SanitizeReport {
            spawn_opened: 0,
            edges: Vec::new(),
            density: None,
            initial_blocked_fraction,
            final_blocked_fraction: initial_blocked_fraction,
        };
        if grid.is_empty() {
            return report;
        }
        if grid.rows() != self.config.rows || grid.cols() != self.config.cols {
            log::debug!(
                "Sanitizing {}×{} grid with config for {}×{}",
                grid.rows(),
                grid.cols(),
                self.config.rows,
                self.config.cols
            );
        }

        // 1. Spawn zone
        let zone = self.config.spawn_zone(grid);
        report.spawn_opened = force_spawn_walkable(grid, &zone);

        // 2. Reachability, captured once
        let reachable = flood_fill(grid, zone.center);

        // 3. Edges
        for edge in Edge::ALL {
            let cells = grid.edge_cells(edge);
            let count = reachable.count_in(&cells);
            let mut repair = EdgeRepair {
                edge,
                reachable: count,
                carved: false,
                opened: 0,
            };
            if count < self.config.edge_threshold {
                if let Some(mid) = cells.get(cells.len() / 2).copied() {
                    let carve = carve_path(grid, zone.center, mid, self.config.carve_radius);
                    let widened =
                        clear_cells_near(grid, &cells, mid, self.config.edge_clear_radius);
                    repair.carved = true;
                    repair.opened = carve.opened + widened;
                    log::debug!(
                        "Edge {} had {} reachable cells, carved to {:?} ({} opened)",
                        edge.name(),
                        count,
                        mid,
                        repair.opened
                    );
                }
            }
            report.edges.push(repair);
        }

        // 4. Density. Carving only ever lowers the fraction, so checking the
        // input fraction as well keeps a dense input from slipping in just
        // under the cap after repair.
        let budget = self.config.density;
        let current = grid.blocked_fraction();
        if initial_blocked_fraction > budget.hard_cap || current > budget.hard_cap {
            report.density = Some(reduce_density(grid, budget.soft_target, rng));
        }

        report.final_blocked_fraction = grid.blocked_fraction();
        log::info!(
            "Sanitized {}×{} grid: {} cells opened, {} edges carved, wall density {:.1}% → {:.1}%",
            grid.rows(),
            grid.cols(),
            report.cells_opened(),
            report.carved_edges().count(),
            initial_blocked_fraction * 100.0,
            report.final_blocked_fraction * 100.0
        );
        report
    }

    /// `sanitize` with a `StdRng` seeded from `seed`, for reproducible runs.
    pub fn sanitize_seeded(&self, grid: &mut Grid, seed: u64) -> SanitizeReport {
        let mut rng = StdRng::seed_from_u64(seed);
        self.sanitize(grid, &mut rng)
    }
}

/// Open every cell of the spawn zone. Returns how many changed.
pub fn force_spawn_walkable(grid: &mut Grid, zone: &SpawnZone) -> usize {
    zone.coords().filter(|c| grid.open_cell(*c)).count()
}
