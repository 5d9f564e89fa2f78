//! Builders shared by unit tests, integration tests and benches.
//!
//! Compiled only under `cfg(test)` or the `test-utils` feature.

use crate::catalogue::Catalogue;
use crate::colony::Colony;
use crate::component::FoodProduction;
use crate::config::ColonyConfig;
use crate::id::{StructureKey, TileId};
use crate::population::PopulationRole;
use crate::resources::StorableResources;
use crate::structure::StructureTypeId;

pub const TEST_SEED: u64 = 0x5EED_0042;

pub fn test_config() -> ColonyConfig {
    ColonyConfig {
        seed: TEST_SEED,
        ..Default::default()
    }
}

pub fn test_colony() -> Colony {
    Colony::new(test_config(), Catalogue::new())
}

pub fn test_colony_with(catalogue: Catalogue) -> Colony {
    Colony::new(test_config(), catalogue)
}

/// Surface tile `(x, 0, 0)`.
pub fn tile(x: i32) -> TileId {
    TileId::new(x, 0, 0)
}

/// Place a structure that has already finished construction, on a tile
/// joined to the command network.
pub fn place_built(colony: &mut Colony, type_id: StructureTypeId, tile: TileId) -> StructureKey {
    let key = colony.place(type_id, tile);
    colony.set_connected(tile, true);
    if let Some(structure) = colony.registry.structure_mut(key) {
        if structure.under_construction() {
            structure.enable();
        }
    }
    key
}

pub fn add_workforce(colony: &mut Colony, workers: u32, scientists: u32) {
    colony.population.add(PopulationRole::Worker, workers);
    colony.population.add(PopulationRole::Scientist, scientists);
}

/// Put refined resources straight into the colony pool.
pub fn stock(colony: &mut Colony, amount: StorableResources) {
    let _ = colony.resources.store_all(&amount);
}

pub fn set_food(colony: &mut Colony, key: StructureKey, level: u32) {
    colony.registry.get_mut::<FoodProduction>(key).level = level;
}

/// Keys of the structures in [`starter_colony`].
#[derive(Debug, Clone, Copy)]
pub struct StarterKeys {
    pub command_center: StructureKey,
    pub power: StructureKey,
    pub chap: StructureKey,
    pub agridome: StructureKey,
    pub residence: StructureKey,
    pub warehouse: StructureKey,
}

/// A small working colony: command center with food, one seed power plant,
/// life support, a farm, housing and a warehouse, plus staff and stock.
pub fn starter_colony() -> (Colony, StarterKeys) {
    let mut colony = test_colony();
    let keys = StarterKeys {
        command_center: place_built(&mut colony, StructureTypeId::CommandCenter, tile(0)),
        power: place_built(&mut colony, StructureTypeId::SeedPower, tile(1)),
        chap: place_built(&mut colony, StructureTypeId::Chap, tile(2)),
        agridome: place_built(&mut colony, StructureTypeId::Agridome, tile(3)),
        residence: place_built(&mut colony, StructureTypeId::Residence, tile(4)),
        warehouse: place_built(&mut colony, StructureTypeId::Warehouse, tile(5)),
    };
    set_food(&mut colony, keys.command_center, 200);
    add_workforce(&mut colony, 20, 10);
    stock(&mut colony, StorableResources::new(200, 200, 200, 200));
    (colony, keys)
}
