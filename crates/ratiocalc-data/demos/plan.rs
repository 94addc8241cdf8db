//! Plan a factory from a game data file and a settings file.
//!
//! ```text
//! cargo run -p ratiocalc-data --example plan -- [GAME] [SETTINGS]
//! ```
//!
//! Defaults to the bundled files under `data/`. Set `RUST_LOG=debug` to see
//! the solver's progress.

use std::path::PathBuf;

use ratiocalc_core::context::SolverContext;
use ratiocalc_core::factory::Factory;
use ratiocalc_core::totals::SolutionNode;
use ratiocalc_data::{load_game_data, load_settings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
    let mut args = std::env::args().skip(1);
    let game = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("game.toml"));
    let settings = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("settings.toml"));

    let registry = load_game_data(&game)?;
    let config = load_settings(&settings, &registry)?;
    let factory = Factory::new(SolverContext::new(&registry, &config));
    let solution = factory.solve()?;
    let summary = factory.summarize(&solution.totals)?;

    println!("{:<24} {:>10} {:>20} {:>10}", "recipe", "rate/s", "buildings", "power");
    for row in &summary.rows {
        let building = row
            .building
            .and_then(|b| registry.get_building(b))
            .map(|b| b.name.as_str())
            .unwrap_or("-");
        let count = row
            .count
            .as_ref()
            .map(|c| format!("{} x {building}", c.to_up_decimal(2)))
            .unwrap_or_else(|| building.to_string());
        println!(
            "{:<24} {:>10} {:>20} {:>10}",
            registry[row.recipe].name,
            row.rate.to_decimal(3),
            count,
            row.power.to_decimal(1),
        );
    }
    println!("total power: {}", summary.total_power.to_decimal(1));

    for (item, rate) in solution.totals.surplus() {
        println!("surplus: {} {}/s", registry[*item].name, rate.to_decimal(3));
    }
    if solution.totals.rate(SolutionNode::Surplus).is_none() {
        println!("no surplus");
    }
    for output in solution.totals.outputs() {
        let belts = factory.belt_count(&output.amount)?;
        println!(
            "{}: {}/s on {} belts",
            registry[output.item].name,
            output.amount.to_decimal(3),
            belts.to_up_decimal(2),
        );
    }
    Ok(())
}
