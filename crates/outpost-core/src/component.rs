//! Structure components.
//!
//! Each component type lives in its own `SecondaryMap` keyed by
//! [`StructureKey`]; a structure carries at most one instance of each type.
//! The [`Component`] trait gives the registry typed access to the right
//! table.

use crate::id::{RobotId, StructureKey, TileId};
use crate::product::{ProductPool, ProductType};
use crate::resources::ResourceStore;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

// ---------------------------------------------------------------------------
// Component types
// ---------------------------------------------------------------------------

/// Grows food each turn into a bounded store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodProduction {
    pub level: u32,
    pub capacity: u32,
    pub production: u32,
}

impl FoodProduction {
    pub fn new(capacity: u32, production: u32) -> Self {
        Self {
            level: 0,
            capacity,
            production,
        }
    }

    pub fn is_full(&self) -> bool {
        self.level >= self.capacity
    }

    /// Store up to capacity. Returns the amount that did not fit.
    #[must_use = "overflow indicates food that did not fit"]
    pub fn store(&mut self, amount: u32) -> u32 {
        let accepted = amount.min(self.capacity.saturating_sub(self.level));
        self.level += accepted;
        amount - accepted
    }

    /// Remove up to `amount`. Returns the amount actually removed.
    #[must_use = "returns the amount actually removed, which may be less than requested"]
    pub fn pull(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.level);
        self.level -= taken;
        taken
    }
}

/// Generates energy while its structure is operational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStation {
    pub output: u32,
}

/// Holds manufactured products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub products: ProductPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RobotCommandError {
    #[error("robot command is at capacity ({0})")]
    Full(u32),
    #[error("robot {0:?} is already commanded here")]
    Duplicate(RobotId),
}

/// Roster of robots controlled by one command structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotCommand {
    robots: Vec<RobotId>,
    capacity: u32,
}

impl RobotCommand {
    pub fn new(capacity: u32) -> Self {
        Self {
            robots: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn robots(&self) -> &[RobotId] {
        &self.robots
    }

    pub fn is_full(&self) -> bool {
        self.robots.len() as u32 >= self.capacity
    }

    pub fn commands(&self, robot: RobotId) -> bool {
        self.robots.contains(&robot)
    }

    pub fn add_robot(&mut self, robot: RobotId) -> Result<(), RobotCommandError> {
        if self.is_full() {
            return Err(RobotCommandError::Full(self.capacity));
        }
        if self.commands(robot) {
            return Err(RobotCommandError::Duplicate(robot));
        }
        self.robots.push(robot);
        Ok(())
    }

    /// Returns whether the robot was on the roster.
    pub fn remove_robot(&mut self, robot: RobotId) -> bool {
        let before = self.robots.len();
        self.robots.retain(|&r| r != robot);
        self.robots.len() != before
    }
}

pub const MIN_TRUCKS: u32 = 1;
pub const MAX_TRUCKS: u32 = 10;

/// Surface works of a mine: trucks, extension progress and an ore stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineFacility {
    pub mine: TileId,
    pub ore: ResourceStore,
    trucks: u32,
    max_depth: u32,
    dig_turns_remaining: u32,
    extending: bool,
}

impl MineFacility {
    pub fn new(mine: TileId, ore_capacity: u32, max_depth: u32) -> Self {
        Self {
            mine,
            ore: ResourceStore::new(ore_capacity),
            trucks: MIN_TRUCKS,
            max_depth,
            dig_turns_remaining: 0,
            extending: false,
        }
    }

    pub fn trucks(&self) -> u32 {
        self.trucks
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn extending(&self) -> bool {
        self.extending
    }

    pub fn dig_turns_remaining(&self) -> u32 {
        self.dig_turns_remaining
    }

    /// Returns whether a truck was added.
    pub fn add_truck(&mut self) -> bool {
        if self.trucks >= MAX_TRUCKS {
            return false;
        }
        self.trucks += 1;
        true
    }

    /// Returns whether a truck was removed. A facility keeps one truck.
    pub fn remove_truck(&mut self) -> bool {
        if self.trucks <= MIN_TRUCKS {
            return false;
        }
        self.trucks -= 1;
        true
    }

    pub fn can_extend(&self, mine_depth: u32) -> bool {
        !self.extending && mine_depth < self.max_depth
    }

    pub fn begin_extension(&mut self, dig_turns: u32) {
        self.extending = true;
        self.dig_turns_remaining = dig_turns.max(1);
    }

    /// Count down an extension. Returns true on the turn it completes.
    pub fn advance_extension(&mut self) -> bool {
        if !self.extending {
            return false;
        }
        self.dig_turns_remaining = self.dig_turns_remaining.saturating_sub(1);
        if self.dig_turns_remaining == 0 {
            self.extending = false;
            return true;
        }
        false
    }

    pub(crate) fn restore(&mut self, trucks: u32, extending: bool, dig_turns_remaining: u32) {
        self.trucks = trucks.clamp(MIN_TRUCKS, MAX_TRUCKS);
        self.extending = extending;
        self.dig_turns_remaining = dig_turns_remaining;
    }
}

/// Ore intake of a smelter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OreRefining {
    pub ore: ResourceStore,
}

/// The products a factory floor is tooled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductLine {
    Surface,
    Underground,
}

impl ProductLine {
    pub fn products(self) -> &'static [ProductType] {
        match self {
            ProductLine::Surface => &[
                ProductType::Digger,
                ProductType::Dozer,
                ProductType::Miner,
                ProductType::Explorer,
                ProductType::Truck,
                ProductType::RoadMaterials,
                ProductType::MaintenanceSupplies,
            ],
            ProductLine::Underground => &[ProductType::Clothing, ProductType::Medicine],
        }
    }

    pub fn supports(self, product: ProductType) -> bool {
        self.products().contains(&product)
    }
}

/// Builds one product at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    pub line: ProductLine,
    pub product: Option<ProductType>,
    pub turns_completed: u32,
    pub waiting: Option<ProductType>,
}

impl Factory {
    pub fn new(line: ProductLine) -> Self {
        Self {
            line,
            product: None,
            turns_completed: 0,
            waiting: None,
        }
    }
}

/// Houses colonists and collects their waste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residence {
    pub capacity: u32,
    pub assigned: u32,
    pub waste_capacity: u32,
    pub waste_accumulated: u32,
    pub waste_overflow: u32,
}

impl Residence {
    pub fn new(capacity: u32, waste_capacity: u32) -> Self {
        Self {
            capacity,
            assigned: 0,
            waste_capacity,
            waste_accumulated: 0,
            waste_overflow: 0,
        }
    }

    /// Move in as many of `colonists` as fit. Returns the number housed.
    pub fn assign(&mut self, colonists: u32) -> u32 {
        self.assigned = colonists.min(self.capacity);
        self.assigned
    }

    /// One turn of waste from the current residents.
    pub fn accumulate_waste(&mut self) {
        let total = self.waste_accumulated + self.assigned;
        self.waste_accumulated = total.min(self.waste_capacity);
        self.waste_overflow += total - self.waste_accumulated;
    }
}

/// What a lander carries down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanderPayload {
    Colonists,
    Cargo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lander {
    pub payload: LanderPayload,
    pub deployed: bool,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// SoA component storage. Each component type has its own SecondaryMap
/// keyed by StructureKey, providing O(1) access with contiguous storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStorage {
    pub food_production: SecondaryMap<StructureKey, FoodProduction>,
    pub power_stations: SecondaryMap<StructureKey, PowerStation>,
    pub warehouses: SecondaryMap<StructureKey, Warehouse>,
    pub robot_commands: SecondaryMap<StructureKey, RobotCommand>,
    pub mine_facilities: SecondaryMap<StructureKey, MineFacility>,
    pub ore_refineries: SecondaryMap<StructureKey, OreRefining>,
    pub factories: SecondaryMap<StructureKey, Factory>,
    pub residences: SecondaryMap<StructureKey, Residence>,
    pub landers: SecondaryMap<StructureKey, Lander>,
}

impl ComponentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all components for a given structure.
    pub fn remove_structure(&mut self, key: StructureKey) {
        self.food_production.remove(key);
        self.power_stations.remove(key);
        self.warehouses.remove(key);
        self.robot_commands.remove(key);
        self.mine_facilities.remove(key);
        self.ore_refineries.remove(key);
        self.factories.remove(key);
        self.residences.remove(key);
        self.landers.remove(key);
    }
}

/// Components bundled with a structure before it is registered. Holding
/// each type in an `Option` keeps the one-per-type rule structural.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    pub food_production: Option<FoodProduction>,
    pub power_station: Option<PowerStation>,
    pub warehouse: Option<Warehouse>,
    pub robot_command: Option<RobotCommand>,
    pub mine_facility: Option<MineFacility>,
    pub ore_refining: Option<OreRefining>,
    pub factory: Option<Factory>,
    pub residence: Option<Residence>,
    pub lander: Option<Lander>,
}

impl ComponentSet {
    /// Attach a component, replacing any earlier one of the same type.
    pub fn with<T: Component>(mut self, component: T) -> Self {
        *T::slot(&mut self) = Some(component);
        self
    }

    pub fn has<T: Component>(&mut self) -> bool {
        T::slot(self).is_some()
    }

    pub(crate) fn insert_into(self, storage: &mut ComponentStorage, key: StructureKey) {
        fn put<T: Component>(storage: &mut ComponentStorage, key: StructureKey, value: Option<T>) {
            if let Some(value) = value {
                T::table_mut(storage).insert(key, value);
            }
        }
        put(storage, key, self.food_production);
        put(storage, key, self.power_station);
        put(storage, key, self.warehouse);
        put(storage, key, self.robot_command);
        put(storage, key, self.mine_facility);
        put(storage, key, self.ore_refining);
        put(storage, key, self.factory);
        put(storage, key, self.residence);
        put(storage, key, self.lander);
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

/// A component type with a table in [`ComponentStorage`].
pub trait Component: Sized + 'static {
    const NAME: &'static str;

    fn table(storage: &ComponentStorage) -> &SecondaryMap<StructureKey, Self>;
    fn table_mut(storage: &mut ComponentStorage) -> &mut SecondaryMap<StructureKey, Self>;
    fn slot(set: &mut ComponentSet) -> &mut Option<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $name:literal, $table:ident, $slot:ident) => {
        impl Component for $ty {
            const NAME: &'static str = $name;

            fn table(storage: &ComponentStorage) -> &SecondaryMap<StructureKey, Self> {
                &storage.$table
            }

            fn table_mut(storage: &mut ComponentStorage) -> &mut SecondaryMap<StructureKey, Self> {
                &mut storage.$table
            }

            fn slot(set: &mut ComponentSet) -> &mut Option<Self> {
                &mut set.$slot
            }
        }
    };
}

impl_component!(FoodProduction, "food_production", food_production, food_production);
impl_component!(PowerStation, "power_station", power_stations, power_station);
impl_component!(Warehouse, "warehouse", warehouses, warehouse);
impl_component!(RobotCommand, "robot_command", robot_commands, robot_command);
impl_component!(MineFacility, "mine_facility", mine_facilities, mine_facility);
impl_component!(OreRefining, "ore_refining", ore_refineries, ore_refining);
impl_component!(Factory, "factory", factories, factory);
impl_component!(Residence, "residence", residences, residence);
impl_component!(Lander, "lander", landers, lander);

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn key() -> StructureKey {
        let mut keys: SlotMap<StructureKey, ()> = SlotMap::with_key();
        keys.insert(())
    }

    #[test]
    fn food_store_and_pull_clamp() {
        let mut food = FoodProduction::new(100, 10);
        assert_eq!(food.store(90), 0);
        assert_eq!(food.store(20), 10);
        assert!(food.is_full());
        assert_eq!(food.pull(150), 100);
        assert_eq!(food.level, 0);
    }

    #[test]
    fn robot_command_rejects_full_and_duplicate() {
        let mut command = RobotCommand::new(2);
        command.add_robot(RobotId(1)).unwrap();
        assert_eq!(
            command.add_robot(RobotId(1)),
            Err(RobotCommandError::Duplicate(RobotId(1)))
        );
        command.add_robot(RobotId(2)).unwrap();
        assert_eq!(command.add_robot(RobotId(3)), Err(RobotCommandError::Full(2)));
        assert!(command.remove_robot(RobotId(1)));
        assert!(!command.remove_robot(RobotId(1)));
        assert!(!command.is_full());
    }

    #[test]
    fn trucks_stay_within_bounds() {
        let mut facility = MineFacility::new(TileId::new(0, 0, 0), 100, 4);
        assert_eq!(facility.trucks(), MIN_TRUCKS);
        assert!(!facility.remove_truck());
        for _ in 0..20 {
            facility.add_truck();
        }
        assert_eq!(facility.trucks(), MAX_TRUCKS);
    }

    #[test]
    fn extension_counts_down() {
        let mut facility = MineFacility::new(TileId::new(0, 0, 0), 100, 2);
        assert!(facility.can_extend(1));
        assert!(!facility.can_extend(2));
        facility.begin_extension(2);
        assert!(!facility.can_extend(1));
        assert!(!facility.advance_extension());
        assert!(facility.advance_extension());
        assert!(!facility.extending());
        assert!(!facility.advance_extension());
    }

    #[test]
    fn residence_waste_overflows() {
        let mut residence = Residence::new(25, 30);
        assert_eq!(residence.assign(40), 25);
        residence.accumulate_waste();
        assert_eq!(residence.waste_accumulated, 25);
        residence.accumulate_waste();
        assert_eq!(residence.waste_accumulated, 30);
        assert_eq!(residence.waste_overflow, 20);
    }

    #[test]
    fn product_lines_split_products() {
        assert!(ProductLine::Surface.supports(ProductType::Truck));
        assert!(!ProductLine::Surface.supports(ProductType::Medicine));
        assert!(ProductLine::Underground.supports(ProductType::Clothing));
    }

    #[test]
    fn component_set_inserts_each_present_component() {
        let mut storage = ComponentStorage::new();
        let k = key();
        ComponentSet::default()
            .with(FoodProduction::new(10, 1))
            .with(PowerStation { output: 5 })
            .insert_into(&mut storage, k);
        assert!(storage.food_production.contains_key(k));
        assert_eq!(storage.power_stations[k].output, 5);
        assert!(!storage.warehouses.contains_key(k));
    }

    #[test]
    fn with_replaces_same_component_type() {
        let mut set = ComponentSet::default()
            .with(PowerStation { output: 5 })
            .with(PowerStation { output: 9 });
        assert!(set.has::<PowerStation>());
        assert_eq!(set.power_station.map(|p| p.output), Some(9));
    }

    #[test]
    fn remove_structure_cleans_all_components() {
        let mut storage = ComponentStorage::new();
        let k = key();
        ComponentSet::default()
            .with(FoodProduction::new(10, 1))
            .with(Residence::new(25, 100))
            .insert_into(&mut storage, k);
        storage.remove_structure(k);
        assert!(!storage.food_production.contains_key(k));
        assert!(!storage.residences.contains_key(k));
    }
}
