//! levelgrid Headless Sanitizer Harness
//!
//! Runs the repair pipeline over synthetic and bundled grids and checks the
//! playability invariants on every result. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p levelgrid-simtest --bin levelgrid-simtest
//!   cargo run -p levelgrid-simtest --bin levelgrid-simtest -- --verbose

use levelgrid_logic::collision_map::{normalize_rows, sanitize_stage, StageCollisionMap};
use levelgrid_logic::config::{validate_config, SanitizerConfig};
use levelgrid_logic::connectivity::flood_fill;
use levelgrid_logic::grid::{Cell, Edge, Grid};
use levelgrid_logic::layout::{merge_wall_rects, CollisionLayout};
use levelgrid_logic::sanitizer::GridSanitizer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

// ── Sample stage (same document format the game loads) ─────────────────
const SAMPLE_STAGE_JSON: &str = include_str!("../../../data/sample_collision_map.json");

const SWEEP_DENSITIES: [f64; 6] = [0.0, 0.2, 0.4, 0.55, 0.7, 0.95];
const SWEEP_SEEDS: u64 = 25;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== levelgrid Sanitizer Harness ===\n");

    let mut results = Vec::new();

    // 1. Config presets
    results.extend(validate_presets(verbose));

    // 2. Fixed scenarios
    results.extend(validate_scenarios(verbose));

    // 3. Noise sweep over both presets
    for config in [SanitizerConfig::compact_15x20(), SanitizerConfig::area_22x30()] {
        results.extend(validate_noise_sweep(&config, verbose));
    }

    // 4. Bundled stage document
    results.extend(validate_sample_stage(verbose));

    // 5. Runtime layout
    results.extend(validate_layout(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn noise_grid(rows: usize, cols: usize, density: f64, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = (0..rows * cols)
        .map(|_| {
            if rng.gen_bool(density) {
                Cell::Blocked
            } else {
                Cell::Walkable
            }
        })
        .collect();
    Grid::from_cells(rows, cols, cells).unwrap_or_else(|| Grid::open(rows, cols))
}

/// Smallest count of spawn-reachable walkable cells over the four edges.
fn min_edge_reach(grid: &Grid) -> usize {
    let reach = flood_fill(grid, grid.center());
    Edge::ALL
        .iter()
        .map(|&e| reach.count_in(&grid.edge_cells(e)))
        .min()
        .unwrap_or(0)
}

/// Check every post-condition on a repaired grid. Returns a failure reason.
fn check_invariants(config: &SanitizerConfig, input_fraction: f64, grid: &Grid) -> Option<String> {
    let zone = config.spawn_zone(grid);
    if let Some(blocked) = zone.coords().find(|c| !grid.is_walkable(*c)) {
        return Some(format!("spawn cell {:?} blocked", blocked));
    }
    let reach = min_edge_reach(grid);
    if reach < config.edge_threshold {
        return Some(format!("edge with only {} reachable cells", reach));
    }
    let fraction = grid.blocked_fraction();
    if input_fraction > config.density.hard_cap && fraction > config.density.soft_target {
        return Some(format!(
            "density {:.3} above soft target (input {:.3})",
            fraction, input_fraction
        ));
    }
    if fraction > input_fraction {
        return Some(format!(
            "density rose from {:.3} to {:.3}",
            input_fraction, fraction
        ));
    }
    None
}

// ── 1. Presets ──────────────────────────────────────────────────────────

fn validate_presets(_verbose: bool) -> Vec<TestResult> {
    println!("--- Config Presets ---");
    let mut results = Vec::new();

    for (name, config) in [
        ("compact_15x20", SanitizerConfig::compact_15x20()),
        ("area_22x30", SanitizerConfig::area_22x30()),
    ] {
        let errors = validate_config(&config);
        results.push(TestResult {
            name: format!("preset_{}_valid", name),
            passed: errors.is_empty(),
            detail: if errors.is_empty() {
                format!("{}×{} preset valid", config.rows, config.cols)
            } else {
                format!("{:?}", errors)
            },
        });
    }

    results
}

// ── 2. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();

    // Fully blocked compact grid
    let config = SanitizerConfig::compact_15x20();
    let mut grid = Grid::filled(config.rows, config.cols, Cell::Blocked);
    let report = GridSanitizer::new(config.clone()).sanitize_seeded(&mut grid, 42);
    if verbose {
        println!("{}", grid);
    }
    let failure = check_invariants(&config, 1.0, &grid);
    results.push(TestResult {
        name: "scenario_all_blocked".into(),
        passed: failure.is_none(),
        detail: failure.unwrap_or_else(|| {
            format!(
                "{} edges carved, {} cells opened, density {:.1}%",
                report.carved_edges().count(),
                report.cells_opened(),
                grid.blocked_fraction() * 100.0
            )
        }),
    });

    // Fully open area grid
    let config = SanitizerConfig::area_22x30();
    let mut grid = Grid::open(config.rows, config.cols);
    let report = GridSanitizer::new(config.clone()).sanitize_seeded(&mut grid, 42);
    let unchanged = grid == Grid::open(config.rows, config.cols) && !report.changed();
    results.push(TestResult {
        name: "scenario_all_open".into(),
        passed: unchanged,
        detail: if unchanged {
            "open grid returned unchanged".into()
        } else {
            format!("{} cells changed", report.cells_opened())
        },
    });

    results
}

// ── 3. Noise sweep ──────────────────────────────────────────────────────

fn validate_noise_sweep(config: &SanitizerConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Noise Sweep {}×{} ---", config.rows, config.cols);
    let sanitizer = GridSanitizer::new(config.clone());

    SWEEP_DENSITIES
        .par_iter()
        .map(|&density| {
            let mut failures = Vec::new();
            let mut not_idempotent = 0;
            for seed in 0..SWEEP_SEEDS {
                let mut grid = noise_grid(config.rows, config.cols, density, seed);
                let input_fraction = grid.blocked_fraction();
                sanitizer.sanitize_seeded(&mut grid, seed);
                if let Some(reason) = check_invariants(config, input_fraction, &grid) {
                    failures.push(format!("seed {}: {}", seed, reason));
                }
                let first = grid.clone();
                sanitizer.sanitize_seeded(&mut grid, seed);
                if grid != first {
                    not_idempotent += 1;
                }
            }
            let passed = failures.is_empty() && not_idempotent == 0;
            TestResult {
                name: format!(
                    "sweep_{}x{}_density_{:.2}",
                    config.rows, config.cols, density
                ),
                passed,
                detail: if passed {
                    format!("{} grids repaired, second pass no-op", SWEEP_SEEDS)
                } else {
                    format!(
                        "{} invariant failures, {} non-idempotent; first: {}",
                        failures.len(),
                        not_idempotent,
                        failures.first().map(String::as_str).unwrap_or("-")
                    )
                },
            }
        })
        .collect()
}

// ── 4. Sample stage ─────────────────────────────────────────────────────

fn validate_sample_stage(verbose: bool) -> Vec<TestResult> {
    println!("--- Sample Stage ---");
    let mut results = Vec::new();

    let mut stage = match StageCollisionMap::from_json(SAMPLE_STAGE_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "sample_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "sample_parse".into(),
        passed: !stage.areas.is_empty(),
        detail: format!("{} areas in {}", stage.areas.len(), stage.stage_id),
    });

    let config = SanitizerConfig::area_22x30();
    let outcomes = sanitize_stage(&mut stage, &config, 2024);
    for (outcome, area) in outcomes.iter().zip(&stage.areas) {
        if verbose {
            println!(
                "  Area {} ({}): wall density {}/{} ({:.1}%){}",
                outcome.area_index,
                outcome.area_name,
                outcome.wall_count,
                outcome.cell_count,
                outcome.wall_density() * 100.0,
                if outcome.used_default { " [default]" } else { "" }
            );
        }
        let grid = normalize_rows(&area.grid, config.rows, config.cols);
        let failure = match (&grid, &outcome.report) {
            (Err(e), _) => Some(format!("output not a valid grid: {}", e)),
            (Ok(_), None) if outcome.used_default => None,
            (Ok(g), Some(report)) => check_invariants(&config, report.initial_blocked_fraction, g),
            (Ok(_), None) => Some("no report for sanitized area".into()),
        };
        results.push(TestResult {
            name: format!("sample_area_{}", outcome.area_index),
            passed: failure.is_none(),
            detail: failure.unwrap_or_else(|| {
                format!(
                    "{}: {:.1}% walls{}",
                    outcome.area_name,
                    outcome.wall_density() * 100.0,
                    if outcome.used_default {
                        " (default grid)"
                    } else {
                        ""
                    }
                )
            }),
        });
    }

    results
}

// ── 5. Runtime layout ───────────────────────────────────────────────────

fn validate_layout(_verbose: bool) -> Vec<TestResult> {
    println!("--- Runtime Layout ---");
    let mut results = Vec::new();

    let config = SanitizerConfig::area_22x30();
    let mut grid = noise_grid(config.rows, config.cols, 0.5, 77);
    GridSanitizer::new(config.clone()).sanitize_seeded(&mut grid, 77);
    let blocked = grid.blocked_count();

    let rects = merge_wall_rects(&grid);
    let covered: usize = rects.iter().map(|r| r.width * r.height).sum();
    results.push(TestResult {
        name: "layout_wall_rects_cover".into(),
        passed: covered == blocked,
        detail: format!(
            "{} rects cover {} of {} wall cells",
            rects.len(),
            covered,
            blocked
        ),
    });

    let layout = CollisionLayout::build(grid, true);
    let sealed_ok = layout.connected().len() == layout.grid().walkable_count();
    results.push(TestResult {
        name: "layout_pockets_sealed".into(),
        passed: sealed_ok,
        detail: format!(
            "{} pocket cells sealed, {} connected walkable",
            layout.sealed(),
            layout.connected().len()
        ),
    });

    let mut rng = StdRng::seed_from_u64(5);
    let missing: Vec<_> = Edge::ALL
        .iter()
        .filter(|&&e| layout.entry_cell(e, &mut rng).is_none())
        .map(|e| e.name())
        .collect();
    results.push(TestResult {
        name: "layout_entry_cells".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "entry cell found for every edge".into()
        } else {
            format!("no entry cell for: {}", missing.join(", "))
        },
    });

    results
}
