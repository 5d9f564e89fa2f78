//! Headless colony: a first landing run for a few dozen turns.
//!
//! Sets down a seed power plant, a command center and both landers, lays
//! out life support, a farm and housing, then prints a line per turn and
//! the notable events as they happen.
//!
//! Run with: `RUST_LOG=outpost_core=debug cargo run -p outpost-core --example headless_colony`

use outpost_core::catalogue::Catalogue;
use outpost_core::colony::Colony;
use outpost_core::config::ColonyConfig;
use outpost_core::event::ColonyEvent;
use outpost_core::id::TileId;
use outpost_core::mine::MineProductionRate;
use outpost_core::structure::StructureTypeId;
use tracing_subscriber::EnvFilter;

const TURNS: u32 = 40;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("outpost_core=info")),
        )
        .init();

    let config = ColonyConfig {
        seed: 2024,
        ..Default::default()
    };
    let mut colony = Colony::new(config, Catalogue::new());

    // --- Landing site ---

    let layout = [
        (StructureTypeId::CommandCenter, 0),
        (StructureTypeId::SeedPower, 1),
        (StructureTypeId::CargoLander, 2),
        (StructureTypeId::ColonistLander, 3),
        (StructureTypeId::Chap, 4),
        (StructureTypeId::Agridome, 5),
        (StructureTypeId::Residence, 6),
        (StructureTypeId::Residence, 7),
        (StructureTypeId::Warehouse, 8),
        (StructureTypeId::SeedSmelter, 9),
    ];
    for (type_id, x) in layout {
        let tile = TileId::new(x, 0, 0);
        colony.place(type_id, tile);
        colony.set_connected(tile, true);
    }

    // A nearby deposit, already surveyed by a miner robot.
    let deposit = TileId::new(3, 4, 0);
    if let Err(e) = colony
        .add_mine(deposit, MineProductionRate::Medium)
        .and_then(|()| colony.on_miner_finished(deposit).map(|_| ()))
    {
        eprintln!("could not open the mine: {e}");
        return;
    }
    colony.set_connected(deposit, true);

    // --- Run ---

    println!("turn | energy    | colonists | births | deaths | food");
    for _ in 0..TURNS {
        let report = colony.advance_turn();
        println!(
            "{:>4} | {:>4}/{:<4} | {:>9} | {:>6} | {:>6} | {:>4}",
            report.turn,
            report.energy.used,
            report.energy.produced,
            report.population,
            report.births,
            report.deaths,
            colony.food_stored(),
        );

        for event in &report.events {
            match event {
                ColonyEvent::StructureBuilt { type_id, .. } => println!("       built {type_id}"),
                ColonyEvent::LanderDeployed { payload, .. } => {
                    println!("       lander deployed: {payload:?}")
                }
                ColonyEvent::MineExtended { depth, .. } => println!("       mine reached depth {depth}"),
                ColonyEvent::MineExhausted { mine } => println!("       mine at {mine} exhausted"),
                ColonyEvent::Starvation { deaths } => println!("       {deaths} colonists starved"),
                _ => {}
            }
        }
    }

    // --- Summary ---

    println!();
    println!("stored resources: {:?}", colony.resources().stored());
    println!("disabled structures: {}", colony.disabled_count());
    println!("state hash: {:016X}", colony.state_hash());
}
