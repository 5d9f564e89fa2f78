//! Attribute-dictionary saves.
//!
//! A save is a tree of [`Element`]s: a name, string attributes and child
//! elements, stored as JSON. Every value is written as text so that old
//! saves with missing attributes still load: an absent attribute reads as
//! zero, false or none. The root element carries [`SAVEGAME_VERSION`] and a
//! save from any other version is refused.
//!
//! Loading always builds a fresh [`Colony`]. A failed load leaves any live
//! colony untouched.

use crate::catalogue::Catalogue;
use crate::colony::Colony;
use crate::component::{
    Factory, FoodProduction, Lander, MineFacility, OreRefining, Residence, RobotCommand, Warehouse,
};
use crate::config::ColonyConfig;
use crate::id::{RobotId, StructureKey, TileId};
use crate::mine::{Mine, MineProductionRate};
use crate::population::{PopulationRole, RoleTable};
use crate::product::ProductType;
use crate::resources::{ResourceKind, ResourceStore, StorableResources};
use crate::rng::SimRng;
use crate::structure::{
    ConnectorDir, DisabledReason, IdleReason, PopulationRequirements, SavedStructureState,
    StructureState, StructureTypeId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Format tag written to, and required of, every save.
pub const SAVEGAME_VERSION: &str = "0.30";

/// Name of the root element.
pub const ROOT_ELEMENT: &str = "OutpostHD";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to encode save: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("save has no root element")]
    MissingRoot,
    #[error("expected root element {expected}, found {found}")]
    WrongRoot {
        expected: &'static str,
        found: String,
    },
    #[error("savegame version mismatch: expected {expected}, found {found:?}")]
    VersionMismatch {
        expected: &'static str,
        found: Option<String>,
    },
    #[error("<{element}> attribute {attribute} has invalid value {value:?}")]
    BadValue {
        element: String,
        attribute: String,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// One node of a save: a name, text attributes and nested elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Display) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Display) {
        self.attributes.insert(key.to_owned(), value.to_string());
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Parse an attribute, reading a missing one as the type's default.
    pub fn parse<T>(&self, key: &str) -> Result<T, LoadError>
    where
        T: FromStr + Default,
    {
        match self.attr(key) {
            None => Ok(T::default()),
            Some(raw) => raw.trim().parse().map_err(|_| self.bad_value(key, raw)),
        }
    }

    /// Parse an attribute holding a numeric code, reading a missing one as
    /// `missing`.
    fn parse_code<T>(
        &self,
        key: &str,
        missing: T,
        decode: impl Fn(u8) -> Option<T>,
    ) -> Result<T, LoadError> {
        match self.attr(key) {
            None => Ok(missing),
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(&decode)
                .ok_or_else(|| self.bad_value(key, raw)),
        }
    }

    fn bad_value(&self, key: &str, raw: &str) -> LoadError {
        LoadError::BadValue {
            element: self.name.clone(),
            attribute: key.to_owned(),
            value: raw.to_owned(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document. `file` names the source in error messages.
    pub fn from_json(text: &str, file: &str) -> Result<Element, LoadError> {
        if text.trim().is_empty() {
            return Err(LoadError::MissingRoot);
        }
        let root: Option<Element> =
            serde_json::from_str(text).map_err(|e| LoadError::Parse {
                file: file.to_owned(),
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })?;
        root.ok_or(LoadError::MissingRoot)
    }
}

fn resources_element(name: &str, amount: &StorableResources) -> Element {
    let mut element = Element::new(name);
    for kind in ResourceKind::ALL {
        element.set_attr(kind.attribute_name(), amount.get(kind));
    }
    element
}

fn read_resources(element: &Element) -> Result<StorableResources, LoadError> {
    let mut amount = StorableResources::ZERO;
    for kind in ResourceKind::ALL {
        amount.set(kind, element.parse(kind.attribute_name())?);
    }
    Ok(amount)
}

fn read_optional_resources(
    parent: &Element,
    name: &str,
) -> Result<StorableResources, LoadError> {
    parent
        .child(name)
        .map_or(Ok(StorableResources::ZERO), read_resources)
}

fn roles_element(name: &str, table: &RoleTable) -> Element {
    let mut element = Element::new(name);
    for role in PopulationRole::ALL {
        element.set_attr(role.name(), table.get(role));
    }
    element
}

fn read_roles(parent: &Element, name: &str) -> Result<RoleTable, LoadError> {
    let mut table = RoleTable::default();
    if let Some(element) = parent.child(name) {
        for role in PopulationRole::ALL {
            table.set(role, element.parse(role.name())?);
        }
    }
    Ok(table)
}

fn tile_attrs(element: Element, tile: TileId) -> Element {
    element
        .with_attr("x", tile.x)
        .with_attr("y", tile.y)
        .with_attr("depth", tile.depth)
}

fn read_tile(element: &Element) -> Result<TileId, LoadError> {
    Ok(TileId::new(
        element.parse("x")?,
        element.parse("y")?,
        element.parse("depth")?,
    ))
}

fn product_attr(product: Option<ProductType>) -> &'static str {
    product.map_or("", ProductType::name)
}

fn read_product(element: &Element, key: &str) -> Result<Option<ProductType>, LoadError> {
    match element.attr(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => ProductType::from_name(raw)
            .map(Some)
            .ok_or_else(|| element.bad_value(key, raw)),
    }
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// Serialize one structure with its tile and component blocks.
pub fn structure_element(colony: &Colony, key: StructureKey) -> Option<Element> {
    let structure = colony.registry.structure(key)?;
    let tile = colony.registry.tile_of(key).unwrap_or_default();
    let available = structure.population_available();

    let mut element = tile_attrs(Element::new("structure"), tile)
        .with_attr("type", structure.type_id().code())
        .with_attr("age", structure.age())
        .with_attr("state", structure.state().code())
        .with_attr("forced_idle", structure.force_idle())
        .with_attr("disabled_reason", structure.disabled_reason().code())
        .with_attr("idle_reason", structure.idle_reason().code())
        .with_attr("direction", structure.connector().code())
        .with_attr("pop0", available.workers)
        .with_attr("pop1", available.scientists)
        .with_child(resources_element("production", &structure.production()));

    let registry = &colony.registry;
    if let Some(food) = registry.try_get::<FoodProduction>(key) {
        element.push(Element::new("food").with_attr("level", food.level));
    }
    if let Some(warehouse) = registry.try_get::<Warehouse>(key) {
        let mut products = Element::new("warehouse_products");
        for (product, count) in warehouse.products.iter() {
            products.set_attr(product.name(), count);
        }
        element.push(products);
    }
    if let Some(command) = registry.try_get::<RobotCommand>(key) {
        let ids = command
            .robots()
            .iter()
            .map(|r| r.0.to_string())
            .collect::<Vec<_>>()
            .join(",");
        element.push(Element::new("robots").with_attr("ids", ids));
    }
    if let Some(factory) = registry.try_get::<Factory>(key) {
        element.push(
            Element::new("factory")
                .with_attr("product", product_attr(factory.product))
                .with_attr("turns_completed", factory.turns_completed)
                .with_attr("waiting", product_attr(factory.waiting)),
        );
    }
    if let Some(residence) = registry.try_get::<Residence>(key) {
        element.push(
            Element::new("waste")
                .with_attr("assigned", residence.assigned)
                .with_attr("accumulated", residence.waste_accumulated)
                .with_attr("overflow", residence.waste_overflow),
        );
    }
    if let Some(facility) = registry.try_get::<MineFacility>(key) {
        element.push(
            resources_element("mine_facility", &facility.ore.stored())
                .with_attr("trucks", facility.trucks())
                .with_attr("extending", facility.extending())
                .with_attr("dig_turns", facility.dig_turns_remaining()),
        );
    }
    if let Some(refinery) = registry.try_get::<OreRefining>(key) {
        element.push(resources_element("refinery", &refinery.ore.stored()));
    }
    if let Some(lander) = registry.try_get::<Lander>(key) {
        element.push(Element::new("lander").with_attr("deployed", lander.deployed));
    }
    Some(element)
}

fn read_saved_state(element: &Element) -> Result<SavedStructureState, LoadError> {
    Ok(SavedStructureState {
        age: element.parse("age")?,
        state: element.parse_code(
            "state",
            StructureState::UnderConstruction,
            StructureState::from_code,
        )?,
        force_idle: element.parse("forced_idle")?,
        disabled_reason: element.parse_code(
            "disabled_reason",
            DisabledReason::None,
            DisabledReason::from_code,
        )?,
        idle_reason: element.parse_code("idle_reason", IdleReason::None, IdleReason::from_code)?,
        connector: element.parse_code("direction", ConnectorDir::None, ConnectorDir::from_code)?,
        production: read_optional_resources(element, "production")?,
        population_available: PopulationRequirements::new(
            element.parse("pop0")?,
            element.parse("pop1")?,
        ),
    })
}

/// Rebuild one structure from its element and register it.
fn load_structure(colony: &mut Colony, element: &Element) -> Result<StructureKey, LoadError> {
    let raw_type = element.attr("type").unwrap_or_default();
    let type_id = raw_type
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(StructureTypeId::from_code)
        .ok_or_else(|| element.bad_value("type", raw_type))?;
    let tile = read_tile(element)?;
    let saved = read_saved_state(element)?;

    let mut new = colony.catalogue.create(type_id, tile, &colony.config);
    new.structure.restore(saved);
    let key = colony.registry.add_structure(new, tile);
    restore_components(colony, key, element)?;
    Ok(key)
}

fn restore_components(
    colony: &mut Colony,
    key: StructureKey,
    element: &Element,
) -> Result<(), LoadError> {
    let registry = &mut colony.registry;

    if let (Some(food), Some(saved)) = (
        registry.try_get_mut::<FoodProduction>(key),
        element.child("food"),
    ) {
        food.level = saved.parse::<u32>("level")?.min(food.capacity);
    }

    if let (Some(warehouse), Some(saved)) = (
        registry.try_get_mut::<Warehouse>(key),
        element.child("warehouse_products"),
    ) {
        for (name, raw) in &saved.attributes {
            let product =
                ProductType::from_name(name).ok_or_else(|| saved.bad_value(name, raw))?;
            let count = saved.parse::<u32>(name)?;
            let _ = warehouse.products.store(product, count);
        }
    }

    if let (Some(command), Some(saved)) = (
        registry.try_get_mut::<RobotCommand>(key),
        element.child("robots"),
    ) {
        let ids = saved.attr("ids").unwrap_or_default();
        for raw in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id = raw
                .parse::<u32>()
                .map_err(|_| saved.bad_value("ids", ids))?;
            command
                .add_robot(RobotId(id))
                .map_err(|_| saved.bad_value("ids", ids))?;
        }
    }

    if let (Some(factory), Some(saved)) = (
        registry.try_get_mut::<Factory>(key),
        element.child("factory"),
    ) {
        factory.product = read_product(saved, "product")?;
        factory.turns_completed = saved.parse("turns_completed")?;
        factory.waiting = read_product(saved, "waiting")?;
    }

    if let (Some(residence), Some(saved)) = (
        registry.try_get_mut::<Residence>(key),
        element.child("waste"),
    ) {
        residence.assigned = saved.parse("assigned")?;
        residence.waste_accumulated = saved.parse("accumulated")?;
        residence.waste_overflow = saved.parse("overflow")?;
    }

    if let (Some(facility), Some(saved)) = (
        registry.try_get_mut::<MineFacility>(key),
        element.child("mine_facility"),
    ) {
        facility.ore.set_stored(read_resources(saved)?);
        facility.restore(
            saved.parse("trucks")?,
            saved.parse("extending")?,
            saved.parse("dig_turns")?,
        );
    }

    if let (Some(refinery), Some(saved)) = (
        registry.try_get_mut::<OreRefining>(key),
        element.child("refinery"),
    ) {
        refinery.ore.set_stored(read_resources(saved)?);
    }

    if let (Some(lander), Some(saved)) = (
        registry.try_get_mut::<Lander>(key),
        element.child("lander"),
    ) {
        lander.deployed = saved.parse("deployed")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Mines and population
// ---------------------------------------------------------------------------

pub fn mine_element(tile: TileId, mine: &Mine) -> Element {
    let flags = mine.mining_flags();
    let mut element = tile_attrs(Element::new("mine"), tile)
        .with_attr("rate", mine.production_rate().code())
        .with_attr("active", mine.active())
        .with_attr("exhausted", mine.exhausted());
    for kind in ResourceKind::ALL {
        element.set_attr(
            &format!("mine_{}", kind.attribute_name()),
            flags[kind.index()],
        );
    }
    for (id, vein) in mine.veins().iter().enumerate() {
        element.push(resources_element("vein", vein).with_attr("id", id));
    }
    element
}

pub fn read_mine(element: &Element) -> Result<(TileId, Mine), LoadError> {
    let tile = read_tile(element)?;
    let rate = element.parse_code("rate", MineProductionRate::Low, MineProductionRate::from_code)?;

    let mut veins: Vec<(usize, StorableResources)> = element
        .children_named("vein")
        .map(|v| Ok((v.parse::<usize>("id")?, read_resources(v)?)))
        .collect::<Result<_, LoadError>>()?;
    veins.sort_by_key(|(id, _)| *id);

    let mut mining = [true; 4];
    for kind in ResourceKind::ALL {
        let key = format!("mine_{}", kind.attribute_name());
        if element.attr(&key).is_some() {
            mining[kind.index()] = element.parse(&key)?;
        }
    }

    let mine = Mine::restore(
        rate,
        veins.into_iter().map(|(_, v)| v).collect(),
        mining,
        element.parse("active")?,
        element.parse("exhausted")?,
    );
    Ok((tile, mine))
}

// ---------------------------------------------------------------------------
// Colony
// ---------------------------------------------------------------------------

impl Colony {
    /// Serialize the whole colony to an element tree.
    ///
    /// Structures are written class by class in update order, so a reload
    /// preserves the order in which structures compete for resources.
    pub fn save(&self) -> Element {
        let mut root = Element::new(ROOT_ELEMENT).with_attr("version", SAVEGAME_VERSION);

        root.push(
            Element::new("colony")
                .with_attr("turn", self.sim.turn)
                .with_attr("morale", self.morale)
                .with_attr("rng", self.rng.state())
                .with_attr("next_robot_id", self.next_robot),
        );
        root.push(
            resources_element("resources", &self.resources.stored())
                .with_attr("capacity", self.resources.capacity()),
        );
        root.push(
            Element::new("energy")
                .with_attr("produced", self.energy.produced)
                .with_attr("used", self.energy.used),
        );
        root.push(
            Element::new("population")
                .with_child(roles_element("roles", self.population.roles()))
                .with_child(roles_element("growth", self.population.growth()))
                .with_child(roles_element("death", self.population.death())),
        );

        let mut mines = Element::new("mines");
        for (&tile, mine) in &self.mines {
            mines.push(mine_element(tile, mine));
        }
        root.push(mines);

        let mut structures = Element::new("structures");
        for key in self.registry.keys_in_update_order() {
            if let Some(element) = structure_element(self, key) {
                structures.push(element);
            }
        }
        root.push(structures);

        let mut connected = Element::new("connected");
        for key in self.registry.structures().map(|(key, _)| key) {
            if self.registry.is_connected(key) {
                if let Some(tile) = self.registry.tile_of(key) {
                    connected.push(tile_attrs(Element::new("tile"), tile));
                }
            }
        }
        root.push(connected);

        debug!(
            turn = self.sim.turn,
            structures = self.registry.len(),
            "Colony saved"
        );
        root
    }

    /// Build a colony from a save.
    ///
    /// The catalogue and configuration are supplied by the caller; the
    /// save only records state.
    pub fn load(
        root: &Element,
        catalogue: Catalogue,
        config: ColonyConfig,
    ) -> Result<Colony, LoadError> {
        if root.name.is_empty() {
            return Err(LoadError::MissingRoot);
        }
        if root.name != ROOT_ELEMENT {
            return Err(LoadError::WrongRoot {
                expected: ROOT_ELEMENT,
                found: root.name.clone(),
            });
        }
        match root.attr("version") {
            Some(SAVEGAME_VERSION) => {}
            found => {
                return Err(LoadError::VersionMismatch {
                    expected: SAVEGAME_VERSION,
                    found: found.map(str::to_owned),
                });
            }
        }

        let mut colony = Colony::new(config, catalogue);

        if let Some(element) = root.child("colony") {
            colony.sim.turn = element.parse("turn")?;
            colony.morale = element.parse("morale")?;
            colony.rng = SimRng::from_state(element.parse("rng")?);
            colony.next_robot = element.parse::<u32>("next_robot_id")?.max(1);
        }

        if let Some(element) = root.child("resources") {
            let capacity = match element.attr("capacity") {
                Some(_) => element.parse("capacity")?,
                None => colony.config.base_storage_capacity,
            };
            colony.resources = ResourceStore::new(capacity);
            colony.resources.set_stored(read_resources(element)?);
        }

        if let Some(element) = root.child("energy") {
            colony.energy.produced = element.parse("produced")?;
            colony.energy.used = element.parse("used")?;
        }

        if let Some(element) = root.child("population") {
            colony.population.restore(
                read_roles(element, "roles")?,
                read_roles(element, "growth")?,
                read_roles(element, "death")?,
            );
        }

        if let Some(mines) = root.child("mines") {
            for element in mines.children_named("mine") {
                let (tile, mine) = read_mine(element)?;
                colony.mines.insert(tile, mine);
            }
        }

        if let Some(structures) = root.child("structures") {
            for element in structures.children_named("structure") {
                load_structure(&mut colony, element)?;
            }
        }

        if let Some(connected) = root.child("connected") {
            for element in connected.children_named("tile") {
                colony.registry.set_connected(read_tile(element)?, true);
            }
        }

        colony.population_pool.reset(&colony.population);

        info!(
            turn = colony.sim.turn,
            structures = colony.registry.len(),
            population = colony.population.size(),
            "Colony loaded"
        );
        Ok(colony)
    }

    pub fn to_save_string(&self) -> Result<String, SaveError> {
        self.save().to_json()
    }

    pub fn from_save_str(
        text: &str,
        file: &str,
        catalogue: Catalogue,
        config: ColonyConfig,
    ) -> Result<Colony, LoadError> {
        let root = Element::from_json(text, file)?;
        Colony::load(&root, catalogue, config)
    }

    pub fn write_save(&self, path: &Path) -> Result<(), SaveError> {
        let text = self.to_save_string()?;
        std::fs::write(path, text).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), turn = self.sim.turn, "Save written");
        Ok(())
    }

    pub fn read_save(
        path: &Path,
        catalogue: Catalogue,
        config: ColonyConfig,
    ) -> Result<Colony, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Colony::from_save_str(&text, &path.display().to_string(), catalogue, config)
    }
}
