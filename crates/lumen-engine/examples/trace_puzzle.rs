//! Load a puzzle, trace it and print where every beam ends.
//!
//! Usage: `cargo run --example trace_puzzle -- [puzzle.json]`
//!
//! Without an argument a small built-in puzzle is traced. Pending portal
//! choices are answered with the first candidate so the whole grid settles.
//! Set `RUST_LOG=lumen_engine=debug` for per-beam logging.

use anyhow::Context;
use lumen_engine::prelude::*;

const DEMO: &str = r##"{
    "id": "demo",
    "title": "Around the corner",
    "tiles": [
        [
            { "items": [ { "type": "terminus", "on": true,
                           "openings": [ { "direction": 0, "colors": ["#ffcc00"] } ] } ] },
            { "items": [ { "type": "filter", "color": "#3366ff" },
                         { "type": "reflector", "direction": 2, "rotatable": true } ] }
        ],
        [
            null,
            null,
            { "items": [ { "type": "terminus", "openings": [ { "direction": 4 } ] } ] }
        ]
    ],
    "solution": [ { "type": "connections", "required": 1 } ]
}"##;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let source = match std::env::args().nth(1) {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?
        }
        None => DEMO.to_owned(),
    };
    let mut puzzle = Puzzle::from_json(&source).context("failed to load puzzle")?;

    let mut report = puzzle.update()?;
    while let Some(mask) = report.mask.take() {
        let candidate = mask
            .candidates
            .first()
            .context("mask without candidates")?;
        println!(
            "{} is waiting at {}; choosing {} at {}",
            mask.beam, mask.portal, candidate.portal, candidate.tile
        );
        report = puzzle.choose(candidate.tile)?;
    }

    let name = if puzzle.title().is_empty() {
        puzzle.id()
    } else {
        puzzle.title()
    };
    println!(
        "{name}: update {} in {} pass(es), converged: {}",
        report.update, report.passes, report.converged
    );

    for beam in puzzle.beams() {
        let Some(last) = beam.ledger().last() else {
            println!("  {} (off)", beam.id());
            continue;
        };
        let color = beam
            .color()
            .map_or_else(|| "none".to_owned(), |c| c.to_string());
        println!(
            "  {} from {}: {} steps, ends at {} with {:?}, color {color}",
            beam.id(),
            beam.terminus(),
            beam.steps().len(),
            last.tile,
            beam.termination(),
        );
    }

    for collision_loop in &report.collision_loops {
        let members: Vec<String> = collision_loop.beams().map(|b| b.to_string()).collect();
        println!("  collision loop: {}", members.join(", "));
    }

    for (id, terminus) in puzzle.termini() {
        println!(
            "  {id}: {}/{} openings connected{}",
            terminus.connection_count(),
            terminus.openings.len(),
            if terminus.is_activated() { ", activated" } else { "" }
        );
    }

    println!("solved: {}", report.solved);
    println!("state hash: {}", puzzle.state_hash());
    Ok(())
}
