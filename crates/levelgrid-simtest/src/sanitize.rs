//! Repair every area grid of a stage collision-map document.
//!
//! Usage:
//!   levelgrid-sanitize <input.json> [output.json] [--preset area|compact]
//!                      [--config cfg.json] [--seed N] [--seal-pockets]
//!
//! Areas are sanitized in parallel; each area gets its own seed derived from
//! `--seed` (default 42), so output doesn't depend on scheduling. Without an
//! output path the input file is rewritten in place.

use std::error::Error;
use std::fs;

use levelgrid_logic::collision_map::{
    normalize_rows, sanitize_area, AreaOutcome, StageCollisionMap,
};
use levelgrid_logic::config::{validate_config, SanitizerConfig};
use levelgrid_logic::layout::CollisionLayout;
use levelgrid_logic::sanitizer::GridSanitizer;
use log::{info, warn};
use rayon::prelude::*;

const DEFAULT_SEED: u64 = 42;

struct Args {
    input: String,
    output: Option<String>,
    config: SanitizerConfig,
    seed: u64,
    seal_pockets: bool,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut input = None;
    let mut output = None;
    let mut config = SanitizerConfig::default();
    let mut seed = DEFAULT_SEED;
    let mut seal_pockets = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--preset" => {
                let name = args.next().ok_or("--preset needs a name")?;
                config = SanitizerConfig::preset(&name)
                    .ok_or_else(|| format!("unknown preset '{}'", name))?;
            }
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = SanitizerConfig::from_json(&fs::read_to_string(&path)?)?;
            }
            "--seed" => {
                seed = args.next().ok_or("--seed needs a value")?.parse()?;
            }
            "--seal-pockets" => seal_pockets = true,
            _ if input.is_none() => input = Some(arg.clone()),
            _ if output.is_none() => output = Some(arg.clone()),
            _ => return Err(format!("unexpected argument '{}'", arg).into()),
        }
    }

    Ok(Args {
        input: input.ok_or("usage: levelgrid-sanitize <input.json> [output.json] [options]")?,
        output,
        config,
        seed,
        seal_pockets,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;

    let errors = validate_config(&args.config);
    if !errors.is_empty() {
        return Err(format!("invalid sanitizer config: {:?}", errors).into());
    }

    println!("{}", "=".repeat(60));
    println!("levelgrid - Collision Map Sanitizer");
    println!(
        "Grid: {}x{} | seed {} | seal pockets: {}",
        args.config.cols, args.config.rows, args.seed, args.seal_pockets
    );
    println!("{}", "=".repeat(60));

    let mut stage = StageCollisionMap::load(&args.input)?;
    info!("Loaded {} ({} areas)", stage.stage_id, stage.areas.len());

    let sanitizer = GridSanitizer::new(args.config.clone());
    let outcomes: Vec<AreaOutcome> = stage
        .areas
        .par_iter_mut()
        .map(|area| {
            let mut outcome = sanitize_area(area, &sanitizer, args.seed);
            if args.seal_pockets && !outcome.used_default {
                seal_area(&mut area.grid, &args.config, &mut outcome);
            }
            outcome
        })
        .collect();

    for outcome in &outcomes {
        let label = if outcome.used_default {
            "FAILED: using default open grid"
        } else {
            "OK"
        };
        println!(
            "  Area {} ({}): {} | Wall density: {}/{} ({:.1}%)",
            outcome.area_index,
            outcome.area_name,
            label,
            outcome.wall_count,
            outcome.cell_count,
            outcome.wall_density() * 100.0
        );
        if let Some(density) = outcome.report.as_ref().and_then(|r| r.density) {
            if !density.reached_target() {
                warn!(
                    "Area {}: {} walls still over density target",
                    outcome.area_index, density.remaining_over_target
                );
            }
        }
    }

    let output = args.output.as_deref().unwrap_or(&args.input);
    stage.save(output)?;
    println!("\n  Saved: {}", output);
    Ok(())
}

/// Seal walkable pockets not connected to the spawn region and refresh the
/// outcome's wall count.
fn seal_area(rows: &mut Vec<Vec<u8>>, config: &SanitizerConfig, outcome: &mut AreaOutcome) {
    let grid = match normalize_rows(rows, config.rows, config.cols) {
        Ok(grid) => grid,
        Err(e) => {
            warn!("Area {}: cannot seal pockets: {}", outcome.area_index, e);
            return;
        }
    };
    let layout = CollisionLayout::build(grid, true);
    let sealed = layout.into_grid();
    outcome.wall_count = sealed.blocked_count();
    *rows = sealed.to_rows();
}
