//! The turn pipeline.
//!
//! Each call to [`Colony::advance_turn`] runs, in order:
//!
//! 1. **Reset** -- release the labour pool and resize the refined pool from
//!    the storage structures that are working.
//! 2. **Mines** -- recompute every mine's exhausted flag once.
//! 3. **Producers** -- Lander, Command and EnergyProduction passes.
//! 4. **Energy** -- total the output of operational power stations.
//! 5. **Consumers** -- every remaining class in fixed priority order.
//! 6. **Housing** -- assign colonists to operational residences.
//! 7. **Population** -- grow, age and feed the colony; draw the food eaten.
//! 8. **Ruins** -- remove destroyed structures that have aged out.
//!
//! Within a class pass structures are evaluated in insertion order and each
//! one claims workers, scientists, energy and refined resources before the
//! next is looked at. Earlier structures win under scarcity.

use crate::colony::Colony;
use crate::component::{
    ComponentStorage, Factory, FoodProduction, Lander, LanderPayload, MineFacility, PowerStation,
    Residence, RobotCommand, Warehouse,
};
use crate::event::ColonyEvent;
use crate::id::{StructureKey, TileId};
use crate::population::{PopulationInputs, PopulationRole};
use crate::product::ProductType;
use crate::registry::StructureRegistry;
use crate::resources::{ResourceKind, StorableResources};
use crate::sim::TurnReport;
use crate::structure::{
    DisabledReason, IdleReason, Lifecycle, PopulationRequirements, Structure, StructureClass,
    StructureTypeId,
};
use tracing::{debug, info, trace, warn};

const COLONIST_LANDER_STUDENTS: u32 = 10;
const COLONIST_LANDER_WORKERS: u32 = 20;
const COLONIST_LANDER_SCIENTISTS: u32 = 20;
const CARGO_LANDER_FOOD: u32 = 125;
const CARGO_LANDER_RESOURCES: StorableResources = StorableResources::new(25, 25, 15, 15);

/// Raw ore consumed per refined unit.
const ORE_PER_REFINED_UNIT: u32 = 2;

impl Colony {
    /// Advance the colony by one turn.
    pub fn advance_turn(&mut self) -> TurnReport {
        let mut events = Vec::new();
        self.sim.turn += 1;
        let turn = self.sim.turn;

        // Phase 1: reset
        self.population_pool.reset(&self.population);
        self.update_storage_capacity();

        // Phase 2: mines
        self.check_mines(&mut events);

        // Phase 3-5: class passes
        for class in StructureClass::PRODUCER_ORDER {
            self.update_class(class, &mut events);
        }
        self.aggregate_energy();
        for class in StructureClass::CONSUMER_ORDER {
            self.update_class(class, &mut events);
        }

        // Phase 6: housing
        self.assign_colonists();

        // Phase 7: population
        let food_consumed = self.update_population(&mut events);

        // Phase 8: ruins
        self.clear_ruins(&mut events);

        let report = TurnReport {
            turn,
            energy: self.energy,
            population: self.population.size(),
            births: self.population.birth_count(),
            deaths: self.population.death_count(),
            food_consumed,
            disabled: self.registry.disabled_count(),
            destroyed: self.registry.destroyed_count(),
            events,
        };

        info!(
            turn,
            energy_produced = report.energy.produced,
            energy_used = report.energy.used,
            population = report.population,
            births = report.births,
            deaths = report.deaths,
            disabled = report.disabled,
            "Turn complete"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Turn phases
    // -----------------------------------------------------------------------

    fn update_storage_capacity(&mut self) {
        let structures: u32 = self
            .registry
            .structures()
            .filter(|(_, s)| s.operational_or_idle())
            .map(|(_, s)| s.storage_capacity())
            .sum();
        self.resources
            .set_capacity(self.config.base_storage_capacity + structures);
    }

    fn check_mines(&mut self, events: &mut Vec<ColonyEvent>) {
        for (&tile, mine) in self.mines.iter_mut() {
            let was_exhausted = mine.exhausted();
            if mine.check_exhausted() && !was_exhausted {
                debug!(x = tile.x, y = tile.y, "Mine exhausted");
                events.push(ColonyEvent::MineExhausted { mine: tile });
            }
        }
    }

    fn aggregate_energy(&mut self) {
        let produced: u32 = self
            .registry
            .enumerate::<PowerStation>()
            .filter(|(key, _)| {
                self.registry
                    .structure(*key)
                    .is_some_and(Structure::operational)
            })
            .map(|(_, station)| station.output)
            .sum();
        self.energy.reset(produced);
    }

    fn update_class(&mut self, class: StructureClass, events: &mut Vec<ColonyEvent>) {
        let keys = self.registry.structure_list(class).to_vec();
        for key in keys {
            self.update_structure(key, events);
        }
    }

    fn update_structure(&mut self, key: StructureKey, events: &mut Vec<ColonyEvent>) {
        let chap_available = self.registry.any_operational(StructureClass::LifeSupport);
        let connected = self.registry.is_connected(key);
        let Some(structure) = self.registry.structure_mut(key) else {
            return;
        };

        structure.set_population_available(PopulationRequirements::NONE);
        match structure.update() {
            Some(Lifecycle::Built) => {
                let type_id = structure.type_id();
                debug!(structure = type_id.name(), ?key, "Construction complete");
                events.push(ColonyEvent::StructureBuilt {
                    structure: key,
                    type_id,
                });
                self.on_built(key);
            }
            Some(Lifecycle::Destroyed) => {
                let type_id = structure.type_id();
                debug!(structure = type_id.name(), ?key, "Structure reached end of life");
                events.push(ColonyEvent::StructureDestroyed {
                    structure: key,
                    type_id,
                });
            }
            None => {}
        }

        let Some(structure) = self.registry.structure_mut(key) else {
            return;
        };
        if structure.under_construction() || structure.destroyed() {
            return;
        }

        if !structure.self_sustained() && !connected {
            self.disable(key, DisabledReason::Disconnected);
            return;
        }

        if structure.requires_chap() && !chap_available {
            self.disable(key, DisabledReason::Chap);
            return;
        }

        let required = structure.population_requirements();
        let granted = self.population_pool.grantable(&required);
        structure.set_population_available(granted);
        if granted != required {
            self.disable(key, DisabledReason::Population);
            return;
        }

        if structure.energy_required() > self.energy.available() {
            self.disable(key, DisabledReason::Energy);
            return;
        }

        let resources_in = structure.resources_in();
        if !structure.is_idle() && !self.resources.contains(&resources_in) {
            self.disable(key, DisabledReason::RefinedResources);
            return;
        }

        structure.enable();
        self.population_pool.use_population(&required);
        let _ = self.resources.pull_all(&resources_in);
        self.energy.consume(structure.energy_required());
        trace!(structure = structure.name(), ?key, state = %structure.state(), "Structure evaluated");

        if structure.operational_or_idle() {
            self.think(key, events);
        }
    }

    fn disable(&mut self, key: StructureKey, reason: DisabledReason) {
        let Some((structure, components)) = self.registry.split_mut(key) else {
            return;
        };
        if !structure.disabled() || structure.disabled_reason() != reason {
            debug!(structure = structure.name(), ?key, %reason, "Structure disabled");
        }
        structure.disable(reason);
        // Stored food spoils without power and staff.
        if let Some(food) = components.food_production.get_mut(key) {
            food.level = 0;
        }
    }

    fn on_built(&mut self, key: StructureKey) {
        let Some(facility) = self.registry.try_get::<MineFacility>(key) else {
            return;
        };
        let tile = facility.mine;
        match self.mines.get_mut(&tile) {
            Some(mine) => {
                if mine.depth() == 0 {
                    mine.increase_depth();
                }
                mine.set_active(true);
            }
            None => warn!(x = tile.x, y = tile.y, "Mine facility built without a mine"),
        }
    }

    fn assign_colonists(&mut self) {
        let mut remaining = self.population.size();
        let keys = self.registry.structure_list(StructureClass::Residence).to_vec();
        let StructureRegistry {
            structures,
            components,
            ..
        } = &mut self.registry;
        for key in keys {
            let operational = structures.get(key).is_some_and(Structure::operational);
            let Some(residence) = components.residences.get_mut(key) else {
                continue;
            };
            if operational {
                remaining -= residence.assign(remaining);
            } else {
                residence.assigned = 0;
            }
        }
    }

    fn update_population(&mut self, events: &mut Vec<ColonyEvent>) -> u32 {
        let inputs = PopulationInputs {
            morale: self.morale,
            food: self.food_stored(),
            residences: self.registry.operational_count(StructureClass::Residence),
            universities: self.registry.operational_count(StructureClass::University),
            nurseries: self.registry.operational_count(StructureClass::Nursery),
            hospitals: self.registry.operational_count(StructureClass::MedicalCenter),
        };
        let outcome = self.population.update(&inputs, &mut self.rng);

        if outcome.starved > 0 {
            warn!(deaths = outcome.starved, food = inputs.food, "Colonists starved");
            events.push(ColonyEvent::Starvation {
                deaths: outcome.starved,
            });
        }

        let mut remaining = outcome.consumed;
        let stores: Vec<StructureKey> = self
            .registry
            .keys_in_update_order()
            .filter(|&k| {
                self.registry.has::<FoodProduction>(k)
                    && self
                        .registry
                        .structure(k)
                        .is_some_and(Structure::operational_or_idle)
            })
            .collect();
        for key in stores {
            if remaining == 0 {
                break;
            }
            remaining -= self.registry.get_mut::<FoodProduction>(key).pull(remaining);
        }
        outcome.consumed - remaining
    }

    fn clear_ruins(&mut self, events: &mut Vec<ColonyEvent>) {
        let expired: Vec<StructureKey> = self
            .registry
            .structures()
            .filter(|(_, s)| s.expired())
            .map(|(key, _)| key)
            .collect();
        for key in expired {
            let tile = self.registry.tile_of(key);
            if let Ok(structure) = self.registry.remove_structure(key) {
                events.push(ColonyEvent::StructureRemoved {
                    type_id: structure.type_id(),
                    tile,
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Production hooks
    // -----------------------------------------------------------------------

    /// Run every production hook the structure's components call for.
    fn think(&mut self, key: StructureKey, events: &mut Vec<ColonyEvent>) {
        self.think_lander(key, events);
        self.think_food(key);
        self.think_mine_facility(key, events);
        self.think_refinery(key);
        self.think_factory(key, events);
        self.think_residence(key);
    }

    fn think_lander(&mut self, key: StructureKey, events: &mut Vec<ColonyEvent>) {
        let Some(lander) = self.registry.try_get_mut::<Lander>(key) else {
            return;
        };
        if lander.deployed {
            return;
        }
        lander.deployed = true;
        let payload = lander.payload;

        match payload {
            LanderPayload::Colonists => {
                self.population
                    .add(PopulationRole::Student, COLONIST_LANDER_STUDENTS);
                self.population
                    .add(PopulationRole::Worker, COLONIST_LANDER_WORKERS);
                self.population
                    .add(PopulationRole::Scientist, COLONIST_LANDER_SCIENTISTS);
            }
            LanderPayload::Cargo => {
                let _ = self.resources.store_all(&CARGO_LANDER_RESOURCES);
                let command_food = self
                    .registry
                    .structure_list(StructureClass::Command)
                    .iter()
                    .copied()
                    .find(|&k| self.registry.has::<FoodProduction>(k));
                match command_food {
                    Some(command) => {
                        let _ = self
                            .registry
                            .get_mut::<FoodProduction>(command)
                            .store(CARGO_LANDER_FOOD);
                    }
                    None => warn!(?key, "Cargo lander found no food storage"),
                }
            }
        }

        debug!(?key, ?payload, "Lander deployed");
        events.push(ColonyEvent::LanderDeployed {
            structure: key,
            payload,
        });
    }

    fn think_food(&mut self, key: StructureKey) {
        let Some((structure, components)) = self.registry.split_mut(key) else {
            return;
        };
        let Some(food) = components.food_production.get_mut(key) else {
            return;
        };
        if !structure.operational() || food.production == 0 {
            return;
        }
        let _ = food.store(food.production);
        if food.is_full() {
            structure.idle(IdleReason::InternalStorageFull);
        }
    }

    fn think_mine_facility(&mut self, key: StructureKey, events: &mut Vec<ColonyEvent>) {
        let Some(facility) = self.registry.try_get_mut::<MineFacility>(key) else {
            return;
        };
        let tile = facility.mine;
        let extended = facility.advance_extension();
        let trucks = facility.trucks();

        let Some(mine) = self.mines.get_mut(&tile) else {
            warn!(?key, x = tile.x, y = tile.y, "Mine facility has no mine");
            return;
        };

        if extended {
            mine.increase_depth();
            let depth = mine.depth();
            debug!(?key, depth, "Mine extended");
            events.push(ColonyEvent::MineExtended {
                facility: key,
                mine: tile,
                depth,
            });
            let shaft = TileId::new(tile.x, tile.y, depth as i32);
            self.place(StructureTypeId::MineShaft, shaft);
        }

        let Some(mine) = self.mines.get_mut(&tile) else {
            return;
        };
        let Some((structure, components)) = self.registry.split_mut(key) else {
            return;
        };
        let Some(facility) = components.mine_facilities.get_mut(key) else {
            return;
        };
        if !structure.operational() {
            return;
        }
        if mine.exhausted() {
            structure.idle(IdleReason::MineExhausted);
            return;
        }
        if !mine.active() {
            structure.idle(IdleReason::MineInactive);
            return;
        }

        let haul = trucks * self.config.ore_per_truck;
        let mut production = StorableResources::ZERO;
        let mut any_enabled = false;
        let mut any_space = false;
        for kind in ResourceKind::ALL {
            if !mine.mining_enabled(kind) {
                continue;
            }
            any_enabled = true;
            let space = facility.ore.free(kind);
            if space == 0 {
                continue;
            }
            any_space = true;
            let pulled = mine.pull(kind, haul.min(space));
            let _ = facility.ore.store(kind, pulled);
            production.set(kind, pulled);
        }
        structure.set_production(production);

        if any_enabled && !any_space {
            structure.idle(IdleReason::InternalStorageFull);
        }
    }

    fn think_refinery(&mut self, key: StructureKey) {
        let throughput = self.config.smelter_throughput;
        let sources = self.registry.structure_list(StructureClass::Mine).to_vec();
        let StructureRegistry {
            structures,
            components,
            ..
        } = &mut self.registry;
        let Some(structure) = structures.get_mut(key) else {
            return;
        };
        let ComponentStorage {
            mine_facilities,
            ore_refineries,
            ..
        } = components;
        let Some(refinery) = ore_refineries.get_mut(key) else {
            return;
        };
        if !structure.operational() {
            return;
        }

        for kind in ResourceKind::ALL {
            let mut wanted = throughput.min(refinery.ore.free(kind));
            for source in &sources {
                if wanted == 0 {
                    break;
                }
                if let Some(facility) = mine_facilities.get_mut(*source) {
                    let hauled = facility.ore.pull(kind, wanted);
                    let _ = refinery.ore.store(kind, hauled);
                    wanted -= hauled;
                }
            }
        }

        let mut refined = StorableResources::ZERO;
        for kind in ResourceKind::ALL {
            let units = (refinery.ore.get(kind) / ORE_PER_REFINED_UNIT).min(self.resources.free(kind));
            let _ = refinery.ore.pull(kind, units * ORE_PER_REFINED_UNIT);
            let _ = self.resources.store(kind, units);
            refined.set(kind, units);
        }
        structure.set_production(refined);
    }

    fn think_factory(&mut self, key: StructureKey, events: &mut Vec<ColonyEvent>) {
        let Some(factory) = self.registry.try_get::<Factory>(key) else {
            return;
        };
        let (product, waiting) = (factory.product, factory.waiting);
        if !self.registry.structure(key).is_some_and(Structure::operational) {
            return;
        }

        if let Some(waiting) = waiting {
            if !self.deliver(key, waiting, events) {
                return;
            }
        }
        let Some(product) = product else {
            return;
        };

        let cost = product.cost();
        let Some((structure, components)) = self.registry.split_mut(key) else {
            return;
        };
        let Some(factory) = components.factories.get_mut(key) else {
            return;
        };
        if factory.turns_completed == 0 {
            if !self.resources.contains(&cost.resources) {
                structure.idle(IdleReason::FactoryInsufficientResources);
                return;
            }
            let _ = self.resources.pull_all(&cost.resources);
        }
        factory.turns_completed += 1;
        if factory.turns_completed < cost.turns {
            return;
        }

        factory.turns_completed = 0;
        factory.waiting = Some(product);
        debug!(?key, product = product.name(), "Production complete");
        events.push(ColonyEvent::ProductionComplete {
            factory: key,
            product,
        });
        self.deliver(key, product, events);
    }

    /// Hand a finished product on. Returns true once it has left the factory.
    fn deliver(
        &mut self,
        factory: StructureKey,
        product: ProductType,
        events: &mut Vec<ColonyEvent>,
    ) -> bool {
        let delivered = if product.is_robot() {
            self.deploy_robot(factory, product, events)
        } else {
            self.store_product(factory, product, events)
        };
        if delivered {
            if let Some(f) = self.registry.try_get_mut::<Factory>(factory) {
                f.waiting = None;
            }
        } else if let Some(structure) = self.registry.structure_mut(factory) {
            let reason = if product.is_robot() {
                IdleReason::FactoryInsufficientRobotCommandCapacity
            } else {
                IdleReason::FactoryInsufficientWarehouseSpace
            };
            structure.idle(reason);
        }
        delivered
    }

    fn deploy_robot(
        &mut self,
        factory: StructureKey,
        product: ProductType,
        events: &mut Vec<ColonyEvent>,
    ) -> bool {
        assert!(
            product.is_robot(),
            "{} is not a robot and cannot be deployed",
            product.name()
        );
        let target = self
            .registry
            .structure_list(StructureClass::RobotCommand)
            .iter()
            .copied()
            .find(|&k| {
                self.registry.structure(k).is_some_and(Structure::operational)
                    && self
                        .registry
                        .try_get::<RobotCommand>(k)
                        .is_some_and(|rc| !rc.is_full())
            });
        let Some(target) = target else {
            return false;
        };
        let robot = self.issue_robot_id();
        if self.registry.get_mut::<RobotCommand>(target).add_robot(robot).is_err() {
            return false;
        }
        debug!(?factory, robot = robot.0, product = product.name(), "Robot deployed");
        events.push(ColonyEvent::RobotDeployed {
            factory,
            robot_command: target,
            robot,
            product,
        });
        true
    }

    fn store_product(
        &mut self,
        factory: StructureKey,
        product: ProductType,
        events: &mut Vec<ColonyEvent>,
    ) -> bool {
        let target = self
            .registry
            .structure_list(StructureClass::Warehouse)
            .iter()
            .copied()
            .find(|&k| {
                self.registry.structure(k).is_some_and(Structure::operational_or_idle)
                    && self
                        .registry
                        .try_get::<Warehouse>(k)
                        .is_some_and(|w| w.products.can_store(1))
            });
        let Some(target) = target else {
            return false;
        };
        let overflow = self
            .registry
            .get_mut::<Warehouse>(target)
            .products
            .store(product, 1);
        if overflow > 0 {
            return false;
        }
        events.push(ColonyEvent::ProductStored {
            factory,
            warehouse: target,
            product,
        });
        true
    }

    fn think_residence(&mut self, key: StructureKey) {
        if let Some(residence) = self.registry.try_get_mut::<Residence>(key) {
            residence.accumulate_waste();
        }
    }
}
