//! The colony session.
//!
//! [`Colony`] owns every piece of simulation state: the structure registry,
//! mines, population, the refined resource pool, the random stream and the
//! turn counter. It is created at session start and dropped at session end;
//! nothing in the core is global.
//!
//! This module holds construction, collaborator signals and player
//! overrides. The turn pipeline itself lives in [`crate::scheduler`].

use crate::catalogue::{Catalogue, NewStructure};
use crate::component::{Factory, MineFacility, Warehouse};
use crate::config::ColonyConfig;
use crate::fixed::Turns;
use crate::id::{RobotId, StructureKey, TileId};
use crate::mine::{Mine, MineProductionRate};
use crate::population::{Population, PopulationRole};
use crate::population_pool::PopulationPool;
use crate::product::ProductType;
use crate::registry::{RegistryError, StructureRegistry};
use crate::resources::{ResourceKind, ResourceStore};
use crate::rng::SimRng;
use crate::sim::{EnergyLedger, SimState, StateHash};
use crate::structure::{Structure, StructureClass, StructureTypeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColonyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("no mine at {0}")]
    NoMine(TileId),
    #[error("a mine already exists at {0}")]
    MineExists(TileId),
    #[error("structure {structure:?} has no {component} component")]
    MissingComponent {
        structure: StructureKey,
        component: &'static str,
    },
    #[error("factory {factory:?} cannot build {product:?}")]
    UnsupportedProduct {
        factory: StructureKey,
        product: ProductType,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    pub(crate) registry: StructureRegistry,
    pub(crate) mines: BTreeMap<TileId, Mine>,
    pub(crate) population: Population,
    pub(crate) population_pool: PopulationPool,
    pub(crate) resources: ResourceStore,
    pub(crate) energy: EnergyLedger,
    pub(crate) rng: SimRng,
    pub(crate) catalogue: Catalogue,
    pub(crate) config: ColonyConfig,
    pub(crate) sim: SimState,
    pub(crate) morale: i32,
    pub(crate) next_robot: u32,
}

impl Colony {
    pub fn new(config: ColonyConfig, catalogue: Catalogue) -> Self {
        info!(seed = config.seed, "Colony founded");
        Self {
            registry: StructureRegistry::new(),
            mines: BTreeMap::new(),
            population: Population::with_starve_rate(config.starve_rate),
            population_pool: PopulationPool::new(),
            resources: ResourceStore::new(config.base_storage_capacity),
            energy: EnergyLedger::default(),
            rng: SimRng::new(config.seed),
            morale: config.initial_morale,
            catalogue,
            config,
            sim: SimState::new(),
            next_robot: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &StructureRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn turn(&self) -> Turns {
        self.sim.turn
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn population_pool(&self) -> &PopulationPool {
        &self.population_pool
    }

    /// The shared refined resource pool.
    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    pub fn energy(&self) -> EnergyLedger {
        self.energy
    }

    pub fn morale(&self) -> i32 {
        self.morale
    }

    pub fn set_morale(&mut self, morale: i32) {
        self.morale = morale;
    }

    pub fn mine(&self, tile: TileId) -> Option<&Mine> {
        self.mines.get(&tile)
    }

    pub fn mines(&self) -> impl Iterator<Item = (TileId, &Mine)> {
        self.mines.iter().map(|(&tile, mine)| (tile, mine))
    }

    pub fn structure(&self, key: StructureKey) -> Option<&Structure> {
        self.registry.structure(key)
    }

    /// Total food held by structures that are still working.
    pub fn food_stored(&self) -> u32 {
        self.registry
            .enumerate::<crate::component::FoodProduction>()
            .filter(|(key, _)| {
                self.registry
                    .structure(*key)
                    .is_some_and(Structure::operational_or_idle)
            })
            .map(|(_, food)| food.level)
            .sum()
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Build a structure from the catalogue and place it on `tile`.
    pub fn place(&mut self, type_id: StructureTypeId, tile: TileId) -> StructureKey {
        let new = self.catalogue.create(type_id, tile, &self.config);
        self.registry.add_structure(new, tile)
    }

    /// Place a structure built outside the catalogue.
    pub fn place_structure(&mut self, new: NewStructure, tile: TileId) -> StructureKey {
        self.registry.add_structure(new, tile)
    }

    pub fn demolish(&mut self, key: StructureKey) -> Result<Structure, ColonyError> {
        let structure = self.registry.remove_structure(key)?;
        debug!(structure = structure.name(), ?key, "Structure demolished");
        Ok(structure)
    }

    // -----------------------------------------------------------------------
    // Map and robot signals
    // -----------------------------------------------------------------------

    /// Declare an ore deposit on `tile`.
    pub fn add_mine(&mut self, tile: TileId, rate: MineProductionRate) -> Result<(), ColonyError> {
        if self.mines.contains_key(&tile) {
            return Err(ColonyError::MineExists(tile));
        }
        self.mines.insert(tile, Mine::new(rate));
        Ok(())
    }

    pub fn set_connected(&mut self, tile: TileId, connected: bool) {
        self.registry.set_connected(tile, connected);
    }

    pub fn disconnect_all(&mut self) {
        self.registry.disconnect_all();
    }

    /// A digger broke through from `from` to `to`: both ends get an air shaft.
    pub fn on_digger_reached_depth(&mut self, from: TileId, to: TileId) -> [StructureKey; 2] {
        debug!(from_depth = from.depth, to_depth = to.depth, "Digger reached new depth");
        [
            self.place(StructureTypeId::AirShaft, from),
            self.place(StructureTypeId::AirShaft, to),
        ]
    }

    /// A miner robot finished on a mine tile. Places the mine facility and
    /// the shaft beneath it; the mine activates when the facility is built.
    pub fn on_miner_finished(&mut self, tile: TileId) -> Result<StructureKey, ColonyError> {
        if !self.mines.contains_key(&tile) {
            return Err(ColonyError::NoMine(tile));
        }
        let facility = self.place(StructureTypeId::MineFacility, tile);
        self.place(StructureTypeId::MineShaft, tile.below());
        debug!(x = tile.x, y = tile.y, "Mine facility placed");
        Ok(facility)
    }

    // -----------------------------------------------------------------------
    // Player overrides
    // -----------------------------------------------------------------------

    pub fn set_force_idle(
        &mut self,
        key: StructureKey,
        force_idle: bool,
    ) -> Result<(), ColonyError> {
        let structure = self
            .registry
            .structure_mut(key)
            .ok_or(RegistryError::NotManaged(key))?;
        structure.set_force_idle(force_idle);
        Ok(())
    }

    fn mine_mut(&mut self, tile: TileId) -> Result<&mut Mine, ColonyError> {
        self.mines.get_mut(&tile).ok_or(ColonyError::NoMine(tile))
    }

    pub fn set_mine_active(&mut self, tile: TileId, active: bool) -> Result<(), ColonyError> {
        self.mine_mut(tile)?.set_active(active);
        Ok(())
    }

    pub fn set_mining_enabled(
        &mut self,
        tile: TileId,
        kind: ResourceKind,
        enabled: bool,
    ) -> Result<(), ColonyError> {
        self.mine_mut(tile)?.set_mining_enabled(kind, enabled);
        Ok(())
    }

    fn facility_mut(&mut self, key: StructureKey) -> Result<&mut MineFacility, ColonyError> {
        if !self.registry.contains(key) {
            return Err(RegistryError::NotManaged(key).into());
        }
        self.registry
            .try_get_mut::<MineFacility>(key)
            .ok_or(ColonyError::MissingComponent {
                structure: key,
                component: "mine_facility",
            })
    }

    /// Start digging the facility's mine one level deeper. Returns false if
    /// the mine is at maximum depth or already being extended.
    pub fn extend_mine(&mut self, facility: StructureKey) -> Result<bool, ColonyError> {
        let dig_turns = self.config.mine_dig_turns;
        let tile = self.facility_mut(facility)?.mine;
        let depth = self.mines.get(&tile).ok_or(ColonyError::NoMine(tile))?.depth();
        let facility = self.facility_mut(facility)?;
        if !facility.can_extend(depth) {
            return Ok(false);
        }
        facility.begin_extension(dig_turns);
        Ok(true)
    }

    /// Move a truck from the first warehouse holding one onto the facility.
    /// Returns false if no truck is in storage or the facility is full.
    pub fn assign_truck(&mut self, facility: StructureKey) -> Result<bool, ColonyError> {
        let facility_trucks = self.facility_mut(facility)?.trucks();
        if facility_trucks >= crate::component::MAX_TRUCKS {
            return Ok(false);
        }
        let source = self
            .registry
            .enumerate::<Warehouse>()
            .find(|(_, w)| w.products.count(ProductType::Truck) > 0)
            .map(|(key, _)| key);
        let Some(source) = source else {
            return Ok(false);
        };
        let pulled = self
            .registry
            .get_mut::<Warehouse>(source)
            .products
            .pull(ProductType::Truck, 1);
        Ok(pulled == 1 && self.facility_mut(facility)?.add_truck())
    }

    /// Return a truck to the first warehouse with space. The facility keeps
    /// at least one truck.
    pub fn unassign_truck(&mut self, facility: StructureKey) -> Result<bool, ColonyError> {
        if self.facility_mut(facility)?.trucks() <= crate::component::MIN_TRUCKS {
            return Ok(false);
        }
        let target = self
            .registry
            .enumerate::<Warehouse>()
            .find(|(_, w)| w.products.can_store(1))
            .map(|(key, _)| key);
        let Some(target) = target else {
            return Ok(false);
        };
        if !self.facility_mut(facility)?.remove_truck() {
            return Ok(false);
        }
        let overflow = self
            .registry
            .get_mut::<Warehouse>(target)
            .products
            .store(ProductType::Truck, 1);
        Ok(overflow == 0)
    }

    /// Select what a factory builds. Progress on the previous product is lost.
    pub fn set_factory_product(
        &mut self,
        key: StructureKey,
        product: Option<ProductType>,
    ) -> Result<(), ColonyError> {
        if !self.registry.contains(key) {
            return Err(RegistryError::NotManaged(key).into());
        }
        let factory = self
            .registry
            .try_get_mut::<Factory>(key)
            .ok_or(ColonyError::MissingComponent {
                structure: key,
                component: "factory",
            })?;
        if let Some(product) = product {
            if !factory.line.supports(product) {
                return Err(ColonyError::UnsupportedProduct {
                    factory: key,
                    product,
                });
            }
        }
        factory.product = product;
        factory.turns_completed = 0;
        Ok(())
    }

    pub(crate) fn issue_robot_id(&mut self) -> RobotId {
        let id = RobotId(self.next_robot);
        self.next_robot += 1;
        id
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub fn structure_list(&self, class: StructureClass) -> &[StructureKey] {
        self.registry.structure_list(class)
    }

    pub fn disabled_count(&self) -> usize {
        self.registry.disabled_count()
    }

    pub fn destroyed_count(&self) -> usize {
        self.registry.destroyed_count()
    }

    pub fn population_size(&self, role: PopulationRole) -> u32 {
        self.population.size_of(role)
    }

    /// Deterministic digest of the simulation state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.sim.turn);
        h.write_u64(self.rng.state());
        h.write_u32(self.morale as u32);
        h.write_u32(self.energy.produced);
        h.write_u32(self.energy.used);
        for role in PopulationRole::ALL {
            h.write_u32(self.population.size_of(role));
            h.write_u32(self.population.growth().get(role));
            h.write_u32(self.population.death().get(role));
        }
        for amount in self.resources.stored().0 {
            h.write_u32(amount);
        }
        for key in self.registry.keys_in_update_order() {
            let Some(s) = self.registry.structure(key) else {
                continue;
            };
            h.write(&[s.type_id().code(), s.state().code()]);
            h.write(&[s.disabled_reason().code(), s.idle_reason().code()]);
            h.write_u32(s.age());
            for amount in s.production().0 {
                h.write_u32(amount);
            }
            if let Some(food) = self.registry.try_get::<crate::component::FoodProduction>(key) {
                h.write_u32(food.level);
            }
        }
        for (tile, mine) in &self.mines {
            h.write_u32(tile.x as u32);
            h.write_u32(tile.y as u32);
            for vein in mine.veins() {
                for amount in vein.0 {
                    h.write_u32(amount);
                }
            }
        }
        h.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{FoodProduction, Warehouse};
    use crate::structure::StructureState;

    fn colony() -> Colony {
        Colony::new(ColonyConfig::default(), Catalogue::new())
    }

    #[test]
    fn new_colony_uses_config() {
        let config = ColonyConfig {
            base_storage_capacity: 77,
            initial_morale: 420,
            starve_rate: 30,
            ..Default::default()
        };
        let colony = Colony::new(config, Catalogue::new());
        assert_eq!(colony.resources().capacity(), 77);
        assert_eq!(colony.morale(), 420);
        assert_eq!(colony.population().starve_rate(), 30);
        assert_eq!(colony.turn(), 0);
    }

    #[test]
    fn duplicate_mine_is_rejected() {
        let mut colony = colony();
        let tile = TileId::new(1, 1, 0);
        colony.add_mine(tile, MineProductionRate::Low).unwrap();
        assert_eq!(
            colony.add_mine(tile, MineProductionRate::High),
            Err(ColonyError::MineExists(tile))
        );
    }

    #[test]
    fn digger_places_air_shafts_on_both_tiles() {
        let mut colony = colony();
        let [top, bottom] =
            colony.on_digger_reached_depth(TileId::new(2, 2, 0), TileId::new(2, 2, 1));
        assert_eq!(colony.registry().tile_of(top), Some(TileId::new(2, 2, 0)));
        assert_eq!(colony.registry().tile_of(bottom), Some(TileId::new(2, 2, 1)));
        assert_eq!(
            colony.structure(top).map(Structure::type_id),
            Some(StructureTypeId::AirShaft)
        );
        assert_eq!(colony.structure(top).map(Structure::state), Some(StructureState::Operational));
    }

    #[test]
    fn miner_needs_a_mine() {
        let mut colony = colony();
        let tile = TileId::new(0, 3, 0);
        assert_eq!(colony.on_miner_finished(tile), Err(ColonyError::NoMine(tile)));
        colony.add_mine(tile, MineProductionRate::Medium).unwrap();
        let facility = colony.on_miner_finished(tile).unwrap();
        assert!(colony.registry().has::<MineFacility>(facility));
        let shaft = colony.registry().occupant(tile.below()).unwrap();
        assert_eq!(
            colony.structure(shaft).map(Structure::type_id),
            Some(StructureTypeId::MineShaft)
        );
    }

    #[test]
    fn truck_moves_between_warehouse_and_facility() {
        let mut colony = colony();
        let tile = TileId::new(0, 3, 0);
        colony.add_mine(tile, MineProductionRate::Medium).unwrap();
        let facility = colony.on_miner_finished(tile).unwrap();
        let warehouse = colony.place(StructureTypeId::Warehouse, TileId::new(5, 5, 0));

        assert_eq!(colony.assign_truck(facility), Ok(false));
        let _ = colony
            .registry
            .get_mut::<Warehouse>(warehouse)
            .products
            .store(ProductType::Truck, 1);
        assert_eq!(colony.assign_truck(facility), Ok(true));
        assert_eq!(colony.registry().get::<MineFacility>(facility).trucks(), 2);
        assert_eq!(
            colony.registry().get::<Warehouse>(warehouse).products.count(ProductType::Truck),
            0
        );

        assert_eq!(colony.unassign_truck(facility), Ok(true));
        assert_eq!(colony.unassign_truck(facility), Ok(false));
        assert_eq!(
            colony.registry().get::<Warehouse>(warehouse).products.count(ProductType::Truck),
            1
        );
    }

    #[test]
    fn truck_assignment_requires_a_facility() {
        let mut colony = colony();
        let park = colony.place(StructureTypeId::Park, TileId::new(0, 0, 0));
        assert_eq!(
            colony.assign_truck(park),
            Err(ColonyError::MissingComponent {
                structure: park,
                component: "mine_facility"
            })
        );
    }

    #[test]
    fn factory_product_must_match_line() {
        let mut colony = colony();
        let factory = colony.place(StructureTypeId::SurfaceFactory, TileId::new(0, 0, 0));
        colony.set_factory_product(factory, Some(ProductType::Truck)).unwrap();
        assert_eq!(
            colony.set_factory_product(factory, Some(ProductType::Medicine)),
            Err(ColonyError::UnsupportedProduct {
                factory,
                product: ProductType::Medicine
            })
        );
        assert_eq!(colony.registry().get::<Factory>(factory).product, Some(ProductType::Truck));
    }

    #[test]
    fn demolish_twice_fails() {
        let mut colony = colony();
        let park = colony.place(StructureTypeId::Park, TileId::new(0, 0, 0));
        colony.demolish(park).unwrap();
        assert_eq!(
            colony.demolish(park).unwrap_err(),
            ColonyError::Registry(RegistryError::NotManaged(park))
        );
    }

    #[test]
    fn food_stored_ignores_disabled_structures() {
        let mut colony = colony();
        let farm = colony.place(StructureTypeId::Agridome, TileId::new(0, 0, 0));
        colony.registry.get_mut::<FoodProduction>(farm).level = 40;
        assert_eq!(colony.food_stored(), 0);
        colony.registry.structure_mut(farm).unwrap().enable();
        assert_eq!(colony.food_stored(), 40);
    }

    #[test]
    fn state_hash_tracks_changes() {
        let a = colony();
        let mut b = colony();
        assert_eq!(a.state_hash(), b.state_hash());
        b.population_mut().add(PopulationRole::Worker, 1);
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
