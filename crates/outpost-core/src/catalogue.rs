//! Structure blueprints.
//!
//! A [`StructureSpec`] fixes the class, limits and component composition of
//! one structure type. The built-in table covers every
//! [`StructureTypeId`]; data files may override individual entries.

use crate::component::{
    ComponentSet, Factory, FoodProduction, Lander, LanderPayload, MineFacility, OreRefining,
    PowerStation, ProductLine, Residence, RobotCommand, Warehouse,
};
use crate::config::ColonyConfig;
use crate::fixed::div_quantity;
use crate::id::TileId;
use crate::product::ProductPool;
use crate::resources::{ResourceStore, StorableResources};
use crate::structure::{
    ConnectorDir, PopulationRequirements, Structure, StructureClass, StructureTypeId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    #[error("blueprint for {structure} lists component {component} more than once")]
    DuplicateComponent {
        structure: StructureTypeId,
        component: &'static str,
    },
    #[error("blueprint for {structure} must keep class {expected}, got {found}")]
    ClassChanged {
        structure: StructureTypeId,
        expected: StructureClass,
        found: StructureClass,
    },
}

// ---------------------------------------------------------------------------
// Blueprints
// ---------------------------------------------------------------------------

/// A component attached to every structure built from a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentSpec {
    FoodProduction { capacity: u32, production: u32 },
    PowerStation { output: u32 },
    /// Output is divided by the configured mean solar distance.
    SolarCollector { base_output: u32 },
    Warehouse,
    RobotCommand,
    MineFacility,
    OreRefining { capacity: u32 },
    Factory { line: ProductLine },
    Residence { capacity: u32 },
    Lander { payload: LanderPayload },
}

impl ComponentSpec {
    /// Name of the component type this blueprint produces.
    pub fn component_name(&self) -> &'static str {
        match self {
            ComponentSpec::FoodProduction { .. } => "food_production",
            ComponentSpec::PowerStation { .. } | ComponentSpec::SolarCollector { .. } => {
                "power_station"
            }
            ComponentSpec::Warehouse => "warehouse",
            ComponentSpec::RobotCommand => "robot_command",
            ComponentSpec::MineFacility => "mine_facility",
            ComponentSpec::OreRefining { .. } => "ore_refining",
            ComponentSpec::Factory { .. } => "factory",
            ComponentSpec::Residence { .. } => "residence",
            ComponentSpec::Lander { .. } => "lander",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub class: StructureClass,
    /// Turns until the structure decays. Zero never decays.
    #[serde(default)]
    pub max_age: u32,
    #[serde(default)]
    pub turns_to_build: u32,
    #[serde(default)]
    pub energy_required: u32,
    #[serde(default)]
    pub resources_in: StorableResources,
    #[serde(default)]
    pub population: PopulationRequirements,
    #[serde(default)]
    pub requires_chap: bool,
    #[serde(default)]
    pub self_sustained: bool,
    #[serde(default)]
    pub storage_capacity: u32,
    #[serde(default)]
    pub connector: ConnectorDir,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl StructureSpec {
    /// A blueprint with no requirements and no components.
    pub fn new(class: StructureClass) -> Self {
        Self {
            class,
            max_age: 0,
            turns_to_build: 0,
            energy_required: 0,
            resources_in: StorableResources::ZERO,
            population: PopulationRequirements::NONE,
            requires_chap: false,
            self_sustained: false,
            storage_capacity: 0,
            connector: ConnectorDir::None,
            components: Vec::new(),
        }
    }

    fn lifetime(mut self, max_age: u32, turns_to_build: u32) -> Self {
        self.max_age = max_age;
        self.turns_to_build = turns_to_build;
        self
    }

    fn energy(mut self, energy: u32) -> Self {
        self.energy_required = energy;
        self
    }

    fn input(mut self, resources: StorableResources) -> Self {
        self.resources_in = resources;
        self
    }

    fn staff(mut self, workers: u32, scientists: u32) -> Self {
        self.population = PopulationRequirements::new(workers, scientists);
        self
    }

    fn chap(mut self) -> Self {
        self.requires_chap = true;
        self
    }

    fn self_sustained(mut self) -> Self {
        self.self_sustained = true;
        self
    }

    fn storage(mut self, capacity: u32) -> Self {
        self.storage_capacity = capacity;
        self
    }

    fn connector(mut self, connector: ConnectorDir) -> Self {
        self.connector = connector;
        self
    }

    fn component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    fn validate(&self, structure: StructureTypeId) -> Result<(), CatalogueError> {
        for (i, a) in self.components.iter().enumerate() {
            let name = a.component_name();
            if self.components[i + 1..].iter().any(|b| b.component_name() == name) {
                return Err(CatalogueError::DuplicateComponent {
                    structure,
                    component: name,
                });
            }
        }
        Ok(())
    }
}

/// Built-in blueprint for a structure type.
pub fn builtin_spec(type_id: StructureTypeId) -> StructureSpec {
    use StructureClass as C;
    use StructureTypeId as T;

    match type_id {
        T::AirShaft => StructureSpec::new(C::Tube)
            .self_sustained()
            .connector(ConnectorDir::Vertical),
        T::Tube => StructureSpec::new(C::Tube)
            .self_sustained()
            .connector(ConnectorDir::Intersection),
        T::MineShaft => StructureSpec::new(C::Undefined)
            .self_sustained()
            .connector(ConnectorDir::Vertical),
        T::CargoLander => StructureSpec::new(C::Lander)
            .lifetime(50, 1)
            .self_sustained()
            .component(ComponentSpec::Lander { payload: LanderPayload::Cargo }),
        T::ColonistLander => StructureSpec::new(C::Lander)
            .lifetime(50, 1)
            .self_sustained()
            .component(ComponentSpec::Lander { payload: LanderPayload::Colonists }),
        T::SeedLander => StructureSpec::new(C::Lander).lifetime(50, 1).self_sustained(),
        T::SeedFactory => StructureSpec::new(C::Factory)
            .lifetime(150, 7)
            .energy(5)
            .component(ComponentSpec::Factory { line: ProductLine::Surface }),
        T::SeedPower => StructureSpec::new(C::EnergyProduction)
            .lifetime(150, 5)
            .component(ComponentSpec::PowerStation { output: 50 }),
        T::SeedSmelter => StructureSpec::new(C::Smelter)
            .lifetime(150, 6)
            .energy(5)
            .component(ComponentSpec::OreRefining { capacity: 500 }),
        T::Chap => StructureSpec::new(C::LifeSupport)
            .lifetime(600, 5)
            .energy(10)
            .input(StorableResources::new(2, 0, 1, 1)),
        T::CommandCenter => StructureSpec::new(C::Command)
            .lifetime(500, 4)
            .self_sustained()
            .storage(250)
            .connector(ConnectorDir::Intersection)
            .component(ComponentSpec::FoodProduction { capacity: 250, production: 0 }),
        T::Agridome => StructureSpec::new(C::FoodProduction)
            .lifetime(600, 3)
            .energy(2)
            .input(StorableResources::new(1, 0, 0, 0))
            .staff(1, 0)
            .chap()
            .component(ComponentSpec::FoodProduction { capacity: 1000, production: 10 }),
        T::CommTower => StructureSpec::new(C::Communication).lifetime(500, 2).energy(2),
        T::FusionReactor => StructureSpec::new(C::EnergyProduction)
            .lifetime(1000, 10)
            .input(StorableResources::new(2, 2, 1, 1))
            .staff(1, 2)
            .component(ComponentSpec::PowerStation { output: 1000 }),
        T::HotLaboratory => StructureSpec::new(C::Laboratory)
            .lifetime(500, 5)
            .energy(5)
            .staff(1, 3),
        T::Laboratory => StructureSpec::new(C::Laboratory)
            .lifetime(500, 4)
            .energy(3)
            .staff(1, 3)
            .chap(),
        T::MedicalCenter => StructureSpec::new(C::MedicalCenter)
            .lifetime(500, 4)
            .energy(5)
            .staff(1, 2)
            .chap(),
        T::MineFacility => StructureSpec::new(C::Mine)
            .lifetime(0, 3)
            .self_sustained()
            .component(ComponentSpec::MineFacility),
        T::Nursery => StructureSpec::new(C::Nursery)
            .lifetime(500, 3)
            .energy(2)
            .staff(1, 1)
            .chap(),
        T::Park => StructureSpec::new(C::Park).lifetime(500, 2).chap(),
        T::RecreationCenter => StructureSpec::new(C::RecreationCenter)
            .lifetime(500, 3)
            .energy(3)
            .staff(2, 0)
            .chap(),
        T::RedLightDistrict => StructureSpec::new(C::Commercial)
            .lifetime(500, 3)
            .energy(3)
            .staff(2, 0)
            .chap(),
        T::Residence => StructureSpec::new(C::Residence)
            .lifetime(500, 2)
            .energy(2)
            .chap()
            .component(ComponentSpec::Residence { capacity: 25 }),
        T::RobotCommand => StructureSpec::new(C::RobotCommand)
            .lifetime(500, 3)
            .energy(5)
            .component(ComponentSpec::RobotCommand),
        T::Smelter => StructureSpec::new(C::Smelter)
            .lifetime(500, 5)
            .energy(5)
            .staff(4, 0)
            .component(ComponentSpec::OreRefining { capacity: 800 }),
        T::SolarPanel => StructureSpec::new(C::EnergyProduction)
            .lifetime(1000, 4)
            .component(ComponentSpec::PowerStation { output: 50 }),
        T::SolarPlant => StructureSpec::new(C::EnergyProduction)
            .lifetime(1000, 4)
            .staff(0, 2)
            .component(ComponentSpec::SolarCollector { base_output: 2000 }),
        T::StorageTanks => StructureSpec::new(C::Storage)
            .lifetime(500, 2)
            .energy(1)
            .storage(1000),
        T::SurfaceFactory => StructureSpec::new(C::Factory)
            .lifetime(500, 7)
            .energy(10)
            .staff(4, 0)
            .component(ComponentSpec::Factory { line: ProductLine::Surface }),
        T::SurfacePolice => StructureSpec::new(C::SurfacePolice)
            .lifetime(500, 3)
            .energy(5)
            .staff(4, 0),
        T::UndergroundFactory => StructureSpec::new(C::Factory)
            .lifetime(500, 7)
            .energy(10)
            .staff(2, 0)
            .chap()
            .component(ComponentSpec::Factory { line: ProductLine::Underground }),
        T::UndergroundPolice => StructureSpec::new(C::UndergroundPolice)
            .lifetime(500, 3)
            .energy(5)
            .staff(4, 0)
            .chap(),
        T::University => StructureSpec::new(C::University)
            .lifetime(500, 4)
            .energy(3)
            .staff(1, 3)
            .chap(),
        T::Warehouse => StructureSpec::new(C::Warehouse)
            .lifetime(500, 2)
            .energy(1)
            .component(ComponentSpec::Warehouse),
        T::Recycling => StructureSpec::new(C::Recycling)
            .lifetime(500, 4)
            .energy(4)
            .staff(1, 1),
        T::Road => StructureSpec::new(C::Road).lifetime(0, 1).self_sustained(),
        T::Commercial => StructureSpec::new(C::Commercial)
            .lifetime(500, 3)
            .energy(3)
            .staff(1, 0)
            .chap(),
    }
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// A structure plus its components, ready to be registered.
#[derive(Debug, Clone)]
pub struct NewStructure {
    pub structure: Structure,
    pub components: ComponentSet,
}

impl NewStructure {
    pub fn new(structure: Structure) -> Self {
        Self {
            structure,
            components: ComponentSet::default(),
        }
    }
}

/// Built-in blueprints plus validated overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    overrides: BTreeMap<StructureTypeId, StructureSpec>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the blueprint of one structure type. Its class cannot change.
    pub fn set_spec(
        &mut self,
        type_id: StructureTypeId,
        spec: StructureSpec,
    ) -> Result<(), CatalogueError> {
        let expected = builtin_spec(type_id).class;
        if spec.class != expected {
            return Err(CatalogueError::ClassChanged {
                structure: type_id,
                expected,
                found: spec.class,
            });
        }
        spec.validate(type_id)?;
        self.overrides.insert(type_id, spec);
        Ok(())
    }

    pub fn spec(&self, type_id: StructureTypeId) -> StructureSpec {
        self.overrides
            .get(&type_id)
            .cloned()
            .unwrap_or_else(|| builtin_spec(type_id))
    }

    pub fn is_overridden(&self, type_id: StructureTypeId) -> bool {
        self.overrides.contains_key(&type_id)
    }

    /// Build a structure of `type_id` with its components. `tile` is where it
    /// will stand; mine facilities bind to the mine on that tile.
    pub fn create(
        &self,
        type_id: StructureTypeId,
        tile: TileId,
        config: &ColonyConfig,
    ) -> NewStructure {
        let spec = self.spec(type_id);
        let mut new = NewStructure::new(Structure::new(type_id, &spec));
        for component in &spec.components {
            new.components = attach(new.components, component, tile, config);
        }
        new
    }
}

fn attach(
    set: ComponentSet,
    spec: &ComponentSpec,
    tile: TileId,
    config: &ColonyConfig,
) -> ComponentSet {
    match *spec {
        ComponentSpec::FoodProduction { capacity, production } => {
            set.with(FoodProduction::new(capacity, production))
        }
        ComponentSpec::PowerStation { output } => set.with(PowerStation { output }),
        ComponentSpec::SolarCollector { base_output } => set.with(PowerStation {
            output: div_quantity(base_output, config.mean_solar_distance),
        }),
        ComponentSpec::Warehouse => set.with(Warehouse {
            products: ProductPool::new(config.warehouse_capacity),
        }),
        ComponentSpec::RobotCommand => set.with(RobotCommand::new(config.robot_command_capacity)),
        ComponentSpec::MineFacility => set.with(MineFacility::new(
            tile,
            config.mine_facility_ore_capacity,
            config.max_mine_depth,
        )),
        ComponentSpec::OreRefining { capacity } => set.with(OreRefining {
            ore: ResourceStore::new(capacity),
        }),
        ComponentSpec::Factory { line } => set.with(Factory::new(line)),
        ComponentSpec::Residence { capacity } => {
            set.with(Residence::new(capacity, config.residence_waste_capacity))
        }
        ComponentSpec::Lander { payload } => set.with(Lander {
            payload,
            deployed: false,
        }),
    }
}
