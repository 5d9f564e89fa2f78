//! Scenario tests driving a colony through its public API.

use outpost_core::catalogue::{Catalogue, builtin_spec};
use outpost_core::colony::Colony;
use outpost_core::event::ColonyEvent;
use outpost_core::id::TileId;
use outpost_core::mine::MineProductionRate;
use outpost_core::population::PopulationRole;
use outpost_core::resources::{ResourceKind, StorableResources};
use outpost_core::save::{LoadError, SAVEGAME_VERSION};
use outpost_core::structure::{
    DisabledReason, IdleReason, Structure, StructureClass, StructureState, StructureTypeId,
};
use outpost_core::test_utils::*;

fn assert_population_within_requirements(colony: &Colony) {
    for (key, structure) in colony.registry().structures() {
        assert!(
            structure
                .population_available()
                .fits_within(&structure.population_requirements()),
            "{} ({key:?}) was granted more staff than it needs",
            structure.name()
        );
    }
}

fn assert_resources_within_capacity(colony: &Colony) {
    let resources = colony.resources();
    for kind in ResourceKind::ALL {
        assert!(resources.get(kind) <= resources.capacity());
    }
}

/// Two solar panels produce 100 between them. Two parks each want 60.
#[test]
fn energy_scarcity_enables_only_the_first_consumer() {
    let mut catalogue = Catalogue::new();
    let mut park = builtin_spec(StructureTypeId::Park);
    park.energy_required = 60;
    park.requires_chap = false;
    catalogue.set_spec(StructureTypeId::Park, park).unwrap();

    let mut colony = test_colony_with(catalogue);
    place_built(&mut colony, StructureTypeId::SolarPanel, tile(0));
    place_built(&mut colony, StructureTypeId::SolarPanel, tile(1));
    let first = place_built(&mut colony, StructureTypeId::Park, tile(2));
    let second = place_built(&mut colony, StructureTypeId::Park, tile(3));

    let report = colony.advance_turn();

    assert_eq!(report.energy.produced, 100);
    assert_eq!(report.energy.used, 60);
    assert!(colony.structure(first).unwrap().operational());
    let second = colony.structure(second).unwrap();
    assert_eq!(second.state(), StructureState::Disabled);
    assert_eq!(second.disabled_reason(), DisabledReason::Energy);
}

#[test]
fn placement_order_within_a_class_decides_energy() {
    let mut catalogue = Catalogue::new();
    let mut park = builtin_spec(StructureTypeId::Park);
    park.energy_required = 60;
    park.requires_chap = false;
    catalogue.set_spec(StructureTypeId::Park, park).unwrap();

    // Same parks, placed in the opposite tile order.
    let mut colony = test_colony_with(catalogue);
    place_built(&mut colony, StructureTypeId::SolarPanel, tile(0));
    place_built(&mut colony, StructureTypeId::SolarPanel, tile(1));
    let first = place_built(&mut colony, StructureTypeId::Park, tile(9));
    let second = place_built(&mut colony, StructureTypeId::Park, tile(2));

    colony.advance_turn();

    assert!(colony.structure(first).unwrap().operational());
    assert!(colony.structure(second).unwrap().disabled());
}

#[test]
fn starvation_kills_everyone_when_there_is_no_food() {
    let mut colony = test_colony();
    add_workforce(&mut colony, 30, 12);
    let before = colony.population().size();

    let report = colony.advance_turn();

    assert_eq!(colony.population().size(), 0);
    assert_eq!(report.deaths, before);
    assert!(
        report
            .events
            .iter()
            .any(|e| matches!(e, ColonyEvent::Starvation { .. }))
    );
}

#[test]
fn first_landing() {
    let mut colony = test_colony();
    place_built(&mut colony, StructureTypeId::CommandCenter, tile(0));
    colony.place(StructureTypeId::CargoLander, tile(1));
    colony.place(StructureTypeId::ColonistLander, tile(2));

    let report = colony.advance_turn();

    let deployed = report
        .events
        .iter()
        .filter(|e| matches!(e, ColonyEvent::LanderDeployed { .. }))
        .count();
    assert_eq!(deployed, 2);
    assert_eq!(colony.resources().stored(), StorableResources::new(25, 25, 15, 15));
    assert!(colony.population().size() > 40);
    assert!((115..125).contains(&colony.food_stored()));
}

#[test]
fn starter_colony_holds_its_invariants() {
    let (mut colony, keys) = starter_colony();
    place_built(&mut colony, StructureTypeId::University, tile(6));
    place_built(&mut colony, StructureTypeId::Laboratory, tile(7));
    place_built(&mut colony, StructureTypeId::Smelter, tile(8));
    place_built(&mut colony, StructureTypeId::MedicalCenter, tile(9));

    for _ in 0..40 {
        colony.advance_turn();
        assert_population_within_requirements(&colony);
        assert_resources_within_capacity(&colony);
    }

    assert!(colony.structure(keys.chap).is_some());
    let sum: u32 = PopulationRole::ALL
        .iter()
        .map(|&role| colony.population_size(role))
        .sum();
    assert_eq!(sum, colony.population().size());
}

#[test]
fn force_idle_survives_turns_until_released() {
    let (mut colony, keys) = starter_colony();
    colony.set_force_idle(keys.agridome, true).unwrap();

    colony.advance_turn();
    let farm = colony.structure(keys.agridome).unwrap();
    assert_eq!(farm.state(), StructureState::Idle);
    assert_eq!(farm.idle_reason(), IdleReason::PlayerSet);

    colony.set_force_idle(keys.agridome, false).unwrap();
    colony.advance_turn();
    assert!(colony.structure(keys.agridome).unwrap().operational());
}

#[test]
fn reports_list_structures_by_class() {
    let (colony, keys) = starter_colony();
    assert_eq!(
        colony.structure_list(StructureClass::Command),
        &[keys.command_center]
    );
    assert!(colony.structure_list(StructureClass::Park).is_empty());
    assert_eq!(colony.disabled_count(), 0);
    assert_eq!(colony.destroyed_count(), 0);
}

#[test]
fn mine_from_discovery_to_exhaustion_flag() {
    let mut colony = test_colony();
    let mine = TileId::new(4, 4, 0);
    colony.add_mine(mine, MineProductionRate::Low).unwrap();
    let facility = colony.on_miner_finished(mine).unwrap();

    for _ in 0..3 {
        colony.advance_turn();
    }
    assert_eq!(colony.mine(mine).unwrap().depth(), 1);
    assert!(
        colony
            .structure(facility)
            .map(Structure::operational)
            .unwrap()
    );

    for kind in ResourceKind::ALL {
        colony.set_mining_enabled(mine, kind, false).unwrap();
    }
    let before = colony.mine(mine).unwrap().total_available();
    colony.advance_turn();
    assert_eq!(colony.mine(mine).unwrap().total_available(), before);
    assert!(!colony.mine(mine).unwrap().exhausted());
}

#[test]
fn save_file_round_trip() {
    let (mut colony, _) = starter_colony();
    for _ in 0..5 {
        colony.advance_turn();
    }

    let path = std::env::temp_dir().join(format!(
        "outpost_save_round_trip_{}.json",
        std::process::id()
    ));
    colony.write_save(&path).unwrap();
    let loaded = Colony::read_save(&path, Catalogue::new(), test_config()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.state_hash(), colony.state_hash());
}

#[test]
fn save_with_a_different_version_is_refused() {
    let (colony, _) = starter_colony();
    let text = colony
        .to_save_string()
        .unwrap()
        .replace(SAVEGAME_VERSION, "0.29");
    let err = Colony::from_save_str(&text, "old.json", Catalogue::new(), test_config())
        .unwrap_err();
    assert!(matches!(err, LoadError::VersionMismatch { .. }));
}

#[test]
fn snapshot_restores_a_running_colony() {
    let (mut colony, _) = starter_colony();
    for _ in 0..10 {
        colony.advance_turn();
    }
    let data = colony.snapshot().unwrap();
    let restored = Colony::restore(&data).unwrap();
    assert_eq!(restored.state_hash(), colony.state_hash());
    assert_eq!(restored.turn(), 10);
}
