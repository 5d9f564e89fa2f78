//! Ownership of every live structure and its components.
//!
//! Structures sit in a generation-checked `SlotMap`; components sit in
//! per-type `SecondaryMap`s keyed by the same [`StructureKey`]. Each class
//! keeps an insertion-ordered key list that the scheduler walks in order.
//! Tile occupancy and the connectivity facts supplied by the map layer are
//! indexed here as well.

use crate::catalogue::NewStructure;
use crate::component::{Component, ComponentStorage};
use crate::id::{StructureKey, TileId};
use crate::structure::{Structure, StructureClass, StructureState};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("structure {0:?} is not managed by this registry")]
    NotManaged(StructureKey),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureRegistry {
    pub(crate) structures: SlotMap<StructureKey, Structure>,
    pub(crate) components: ComponentStorage,
    class_lists: BTreeMap<StructureClass, Vec<StructureKey>>,
    tiles: SecondaryMap<StructureKey, TileId>,
    occupants: BTreeMap<TileId, StructureKey>,
    connected: BTreeSet<TileId>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a structure and its components on `tile`. Any structure
    /// already standing on the tile is removed first.
    pub fn add_structure(&mut self, new: NewStructure, tile: TileId) -> StructureKey {
        if let Some(previous) = self.occupants.get(&tile).copied() {
            if let Ok(evicted) = self.remove_structure(previous) {
                warn!(
                    structure = evicted.name(),
                    x = tile.x,
                    y = tile.y,
                    depth = tile.depth,
                    "Replaced tile occupant"
                );
            }
        }

        let NewStructure {
            structure,
            components,
        } = new;
        let class = structure.class();
        let name = structure.name();
        let key = self.structures.insert(structure);
        components.insert_into(&mut self.components, key);
        self.class_lists.entry(class).or_default().push(key);
        self.tiles.insert(key, tile);
        self.occupants.insert(tile, key);

        debug!(
            structure = name,
            ?key,
            x = tile.x,
            y = tile.y,
            depth = tile.depth,
            "Structure added"
        );
        key
    }

    /// Remove a structure, its components and its tile placement. Every copy
    /// of `key` stops resolving afterwards.
    pub fn remove_structure(&mut self, key: StructureKey) -> Result<Structure, RegistryError> {
        let structure = self
            .structures
            .remove(key)
            .ok_or(RegistryError::NotManaged(key))?;

        if let Some(list) = self.class_lists.get_mut(&structure.class()) {
            list.retain(|&k| k != key);
        }
        self.components.remove_structure(key);
        if let Some(tile) = self.tiles.remove(key) {
            if self.occupants.get(&tile) == Some(&key) {
                self.occupants.remove(&tile);
            }
        }

        debug!(structure = structure.name(), ?key, "Structure removed");
        Ok(structure)
    }

    pub fn contains(&self, key: StructureKey) -> bool {
        self.structures.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    // -----------------------------------------------------------------------
    // Structure access
    // -----------------------------------------------------------------------

    pub fn structure(&self, key: StructureKey) -> Option<&Structure> {
        self.structures.get(key)
    }

    pub fn structure_mut(&mut self, key: StructureKey) -> Option<&mut Structure> {
        self.structures.get_mut(key)
    }

    /// Every structure, in slot order.
    pub fn structures(&self) -> impl Iterator<Item = (StructureKey, &Structure)> {
        self.structures.iter()
    }

    /// Structures of one class in the order they were added.
    pub fn structure_list(&self, class: StructureClass) -> &[StructureKey] {
        self.class_lists.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every structure, class by class in update order, tubes last. Unlike
    /// slot order this survives a save and reload.
    pub fn keys_in_update_order(&self) -> impl Iterator<Item = StructureKey> + '_ {
        const PRODUCERS: &[StructureClass] = &StructureClass::PRODUCER_ORDER;
        const CONSUMERS: &[StructureClass] = &StructureClass::CONSUMER_ORDER;
        const TUBES: &[StructureClass] = &[StructureClass::Tube];
        PRODUCERS
            .iter()
            .chain(CONSUMERS)
            .chain(TUBES)
            .flat_map(move |&class| self.structure_list(class).iter().copied())
    }

    // -----------------------------------------------------------------------
    // Component access
    // -----------------------------------------------------------------------

    /// The `T` component of a structure.
    ///
    /// # Panics
    ///
    /// Panics if the structure has no `T` component. Use
    /// [`try_get`](Self::try_get) when absence is expected.
    pub fn get<T: Component>(&self, key: StructureKey) -> &T {
        match T::table(&self.components).get(key) {
            Some(component) => component,
            None => panic!("structure {key:?} has no {} component", T::NAME),
        }
    }

    /// Mutable form of [`get`](Self::get).
    ///
    /// # Panics
    ///
    /// Panics if the structure has no `T` component.
    pub fn get_mut<T: Component>(&mut self, key: StructureKey) -> &mut T {
        match T::table_mut(&mut self.components).get_mut(key) {
            Some(component) => component,
            None => panic!("structure {key:?} has no {} component", T::NAME),
        }
    }

    pub fn try_get<T: Component>(&self, key: StructureKey) -> Option<&T> {
        T::table(&self.components).get(key)
    }

    pub fn try_get_mut<T: Component>(&mut self, key: StructureKey) -> Option<&mut T> {
        T::table_mut(&mut self.components).get_mut(key)
    }

    pub fn has<T: Component>(&self, key: StructureKey) -> bool {
        T::table(&self.components).contains_key(key)
    }

    /// Every live `T` component with its owner.
    pub fn enumerate<T: Component>(&self) -> impl Iterator<Item = (StructureKey, &T)> {
        T::table(&self.components).iter()
    }

    pub fn count<T: Component>(&self) -> usize {
        T::table(&self.components).len()
    }

    /// A structure and the component tables, borrowed together.
    pub fn split_mut(
        &mut self,
        key: StructureKey,
    ) -> Option<(&mut Structure, &mut ComponentStorage)> {
        let structure = self.structures.get_mut(key)?;
        Some((structure, &mut self.components))
    }

    // -----------------------------------------------------------------------
    // Tiles and connectivity
    // -----------------------------------------------------------------------

    pub fn tile_of(&self, key: StructureKey) -> Option<TileId> {
        self.tiles.get(key).copied()
    }

    pub fn occupant(&self, tile: TileId) -> Option<StructureKey> {
        self.occupants.get(&tile).copied()
    }

    /// Record whether `tile` is joined to the command network.
    pub fn set_connected(&mut self, tile: TileId, connected: bool) {
        if connected {
            self.connected.insert(tile);
        } else {
            self.connected.remove(&tile);
        }
    }

    pub fn disconnect_all(&mut self) {
        self.connected.clear();
    }

    pub fn is_connected(&self, key: StructureKey) -> bool {
        self.tile_of(key)
            .is_some_and(|tile| self.connected.contains(&tile))
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub fn count_in_state(&self, state: StructureState) -> usize {
        self.structures.values().filter(|s| s.state() == state).count()
    }

    pub fn disabled_count(&self) -> usize {
        self.count_in_state(StructureState::Disabled)
    }

    pub fn destroyed_count(&self) -> usize {
        self.count_in_state(StructureState::Destroyed)
    }

    /// Operational structures of one class.
    pub fn operational_count(&self, class: StructureClass) -> u32 {
        self.structure_list(class)
            .iter()
            .filter(|&&k| self.structures.get(k).is_some_and(Structure::operational))
            .count() as u32
    }

    pub fn any_operational(&self, class: StructureClass) -> bool {
        self.operational_count(class) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Catalogue, StructureSpec};
    use crate::component::{FoodProduction, PowerStation, Warehouse};
    use crate::config::ColonyConfig;
    use crate::structure::StructureTypeId;

    fn build(registry: &mut StructureRegistry, type_id: StructureTypeId, x: i32) -> StructureKey {
        let tile = TileId::new(x, 0, 0);
        let new = Catalogue::new().create(type_id, tile, &ColonyConfig::default());
        registry.add_structure(new, tile)
    }

    #[test]
    fn add_indexes_by_class_and_component() {
        let mut registry = StructureRegistry::new();
        let farm = build(&mut registry, StructureTypeId::Agridome, 0);
        let park = build(&mut registry, StructureTypeId::Park, 1);

        assert_eq!(registry.structure_list(StructureClass::FoodProduction), &[farm]);
        assert_eq!(registry.structure_list(StructureClass::Park), &[park]);
        assert!(registry.has::<FoodProduction>(farm));
        assert!(!registry.has::<FoodProduction>(park));
        assert_eq!(registry.get::<FoodProduction>(farm).capacity, 1000);
        assert_eq!(registry.tile_of(park), Some(TileId::new(1, 0, 0)));
    }

    #[test]
    fn class_lists_keep_insertion_order() {
        let mut registry = StructureRegistry::new();
        let keys: Vec<_> = (0..5)
            .map(|x| build(&mut registry, StructureTypeId::SolarPanel, x))
            .collect();
        assert_eq!(registry.structure_list(StructureClass::EnergyProduction), keys.as_slice());
    }

    #[test]
    fn remove_detaches_everything() {
        let mut registry = StructureRegistry::new();
        let farm = build(&mut registry, StructureTypeId::Agridome, 0);
        let removed = registry.remove_structure(farm).unwrap();
        assert_eq!(removed.type_id(), StructureTypeId::Agridome);
        assert!(registry.structure_list(StructureClass::FoodProduction).is_empty());
        assert!(registry.try_get::<FoodProduction>(farm).is_none());
        assert_eq!(registry.occupant(TileId::new(0, 0, 0)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn double_removal_is_rejected() {
        let mut registry = StructureRegistry::new();
        let park = build(&mut registry, StructureTypeId::Park, 0);
        registry.remove_structure(park).unwrap();
        assert_eq!(
            registry.remove_structure(park).unwrap_err(),
            RegistryError::NotManaged(park)
        );
    }

    #[test]
    fn stale_key_stays_dead_after_slot_reuse() {
        let mut registry = StructureRegistry::new();
        let old = build(&mut registry, StructureTypeId::Warehouse, 0);
        registry.remove_structure(old).unwrap();
        let new = build(&mut registry, StructureTypeId::Warehouse, 0);
        assert!(registry.contains(new));
        assert!(!registry.contains(old));
        assert!(registry.try_get::<Warehouse>(old).is_none());
    }

    #[test]
    fn adding_to_occupied_tile_evicts_occupant() {
        let mut registry = StructureRegistry::new();
        let first = build(&mut registry, StructureTypeId::Park, 0);
        let second = build(&mut registry, StructureTypeId::Residence, 0);
        assert!(!registry.contains(first));
        assert_eq!(registry.occupant(TileId::new(0, 0, 0)), Some(second));
        assert!(registry.structure_list(StructureClass::Park).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "has no power_station component")]
    fn get_of_absent_component_panics() {
        let mut registry = StructureRegistry::new();
        let park = build(&mut registry, StructureTypeId::Park, 0);
        let _ = registry.get::<PowerStation>(park);
    }

    #[test]
    fn enumerate_visits_each_component() {
        let mut registry = StructureRegistry::new();
        let a = build(&mut registry, StructureTypeId::SolarPanel, 0);
        build(&mut registry, StructureTypeId::Park, 1);
        let b = build(&mut registry, StructureTypeId::SeedPower, 2);
        let found: Vec<_> = registry.enumerate::<PowerStation>().map(|(k, _)| k).collect();
        assert_eq!(found, vec![a, b]);
        assert_eq!(registry.count::<PowerStation>(), 2);
    }

    #[test]
    fn connectivity_is_per_tile() {
        let mut registry = StructureRegistry::new();
        let park = build(&mut registry, StructureTypeId::Park, 0);
        assert!(!registry.is_connected(park));
        registry.set_connected(TileId::new(0, 0, 0), true);
        assert!(registry.is_connected(park));
        registry.disconnect_all();
        assert!(!registry.is_connected(park));
    }

    #[test]
    fn state_counts() {
        let mut registry = StructureRegistry::new();
        let spec = StructureSpec::new(StructureClass::Park);
        let a = registry.add_structure(
            NewStructure::new(Structure::new(StructureTypeId::Park, &spec)),
            TileId::new(0, 0, 0),
        );
        registry.add_structure(
            NewStructure::new(Structure::new(StructureTypeId::Park, &spec)),
            TileId::new(1, 0, 0),
        );
        registry.structure_mut(a).unwrap().disable(crate::structure::DisabledReason::Energy);
        assert_eq!(registry.disabled_count(), 1);
        assert_eq!(registry.operational_count(StructureClass::Park), 1);
        assert!(registry.any_operational(StructureClass::Park));
        assert_eq!(registry.destroyed_count(), 0);
    }
}
