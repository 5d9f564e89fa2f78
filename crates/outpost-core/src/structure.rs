//! The structure entity: identity, lifecycle and operating requirements.
//!
//! Capabilities beyond these common fields live in components (see
//! [`crate::component`]), keyed by the same [`crate::id::StructureKey`].

use crate::catalogue::StructureSpec;
use crate::resources::StorableResources;
use serde::{Deserialize, Serialize};

/// Declares a fieldless enum with a stable numeric code and a snake_case
/// name, both used by saves and logs.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

coded_enum! {
    /// Behaviour family of a structure. Determines its update priority.
    pub enum StructureClass {
        Command = 0 => "command",
        Communication = 1 => "communication",
        Commercial = 2 => "commercial",
        EnergyProduction = 3 => "energy_production",
        Factory = 4 => "factory",
        FoodProduction = 5 => "food_production",
        Laboratory = 6 => "laboratory",
        Lander = 7 => "lander",
        LifeSupport = 8 => "life_support",
        MedicalCenter = 9 => "medical_center",
        Mine = 10 => "mine",
        Nursery = 11 => "nursery",
        Park = 12 => "park",
        RecreationCenter = 13 => "recreation_center",
        Recycling = 14 => "recycling",
        Residence = 15 => "residence",
        Road = 16 => "road",
        RobotCommand = 17 => "robot_command",
        Smelter = 18 => "smelter",
        Storage = 19 => "storage",
        SurfacePolice = 20 => "surface_police",
        Tube = 21 => "tube",
        UndergroundPolice = 22 => "underground_police",
        University = 23 => "university",
        Warehouse = 24 => "warehouse",
        Undefined = 25 => "undefined",
    }
}

impl StructureClass {
    /// Classes updated after energy output is totalled, in priority order.
    pub const CONSUMER_ORDER: [StructureClass; 22] = [
        StructureClass::Mine,
        StructureClass::Smelter,
        StructureClass::LifeSupport,
        StructureClass::FoodProduction,
        StructureClass::MedicalCenter,
        StructureClass::Nursery,
        StructureClass::Factory,
        StructureClass::Storage,
        StructureClass::Park,
        StructureClass::SurfacePolice,
        StructureClass::UndergroundPolice,
        StructureClass::RecreationCenter,
        StructureClass::Recycling,
        StructureClass::Residence,
        StructureClass::RobotCommand,
        StructureClass::Warehouse,
        StructureClass::Laboratory,
        StructureClass::Commercial,
        StructureClass::University,
        StructureClass::Communication,
        StructureClass::Road,
        StructureClass::Undefined,
    ];

    /// Classes updated before energy output is totalled.
    pub const PRODUCER_ORDER: [StructureClass; 3] = [
        StructureClass::Lander,
        StructureClass::Command,
        StructureClass::EnergyProduction,
    ];
}

coded_enum! {
    /// Concrete kind of structure. Fixed at creation.
    pub enum StructureTypeId {
        AirShaft = 0 => "air_shaft",
        CargoLander = 1 => "cargo_lander",
        ColonistLander = 2 => "colonist_lander",
        SeedLander = 3 => "seed_lander",
        SeedFactory = 4 => "seed_factory",
        SeedPower = 5 => "seed_power",
        SeedSmelter = 6 => "seed_smelter",
        Chap = 7 => "chap",
        CommandCenter = 8 => "command_center",
        Agridome = 9 => "agridome",
        CommTower = 10 => "comm_tower",
        FusionReactor = 11 => "fusion_reactor",
        HotLaboratory = 12 => "hot_laboratory",
        Laboratory = 13 => "laboratory",
        MedicalCenter = 14 => "medical_center",
        MineFacility = 15 => "mine_facility",
        MineShaft = 16 => "mine_shaft",
        Nursery = 17 => "nursery",
        Park = 18 => "park",
        RecreationCenter = 19 => "recreation_center",
        RedLightDistrict = 20 => "red_light_district",
        Residence = 21 => "residence",
        RobotCommand = 22 => "robot_command",
        Smelter = 23 => "smelter",
        SolarPanel = 24 => "solar_panel",
        SolarPlant = 25 => "solar_plant",
        StorageTanks = 26 => "storage_tanks",
        SurfaceFactory = 27 => "surface_factory",
        SurfacePolice = 28 => "surface_police",
        Tube = 29 => "tube",
        UndergroundFactory = 30 => "underground_factory",
        UndergroundPolice = 31 => "underground_police",
        University = 32 => "university",
        Warehouse = 33 => "warehouse",
        Recycling = 34 => "recycling",
        Road = 35 => "road",
        Commercial = 36 => "commercial",
    }
}

coded_enum! {
    pub enum StructureState {
        UnderConstruction = 0 => "under_construction",
        Operational = 1 => "operational",
        Idle = 2 => "idle",
        Disabled = 3 => "disabled",
        Destroyed = 4 => "destroyed",
    }
}

coded_enum! {
    /// Why a structure could not run this turn.
    pub enum DisabledReason {
        None = 0 => "none",
        Chap = 1 => "chap",
        Disconnected = 2 => "disconnected",
        Energy = 3 => "energy",
        Population = 4 => "population",
        RefinedResources = 5 => "refined_resources",
        StructuralIntegrity = 6 => "structural_integrity",
    }
}

coded_enum! {
    /// Why a working structure chose not to produce.
    pub enum IdleReason {
        None = 0 => "none",
        PlayerSet = 1 => "player_set",
        InternalStorageFull = 2 => "internal_storage_full",
        FactoryProductionComplete = 3 => "factory_production_complete",
        FactoryInsufficientResources = 4 => "factory_insufficient_resources",
        FactoryInsufficientRobotCommandCapacity = 5 => "factory_insufficient_robot_command_capacity",
        FactoryInsufficientWarehouseSpace = 6 => "factory_insufficient_warehouse_space",
        MineExhausted = 7 => "mine_exhausted",
        MineInactive = 8 => "mine_inactive",
        InsufficientLuxuryProduct = 9 => "insufficient_luxury_product",
    }
}

coded_enum! {
    /// How a tile-spanning structure joins neighbouring tubes.
    pub enum ConnectorDir {
        None = 0 => "none",
        Intersection = 1 => "intersection",
        RightLeft = 2 => "right_left",
        UpDown = 3 => "up_down",
        Vertical = 4 => "vertical",
    }
}

impl Default for ConnectorDir {
    fn default() -> Self {
        ConnectorDir::None
    }
}

// ---------------------------------------------------------------------------
// Population requirements
// ---------------------------------------------------------------------------

/// Workers and scientists needed (or granted) to run a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopulationRequirements {
    #[serde(default)]
    pub workers: u32,
    #[serde(default)]
    pub scientists: u32,
}

impl PopulationRequirements {
    pub const NONE: Self = Self {
        workers: 0,
        scientists: 0,
    };

    pub const fn new(workers: u32, scientists: u32) -> Self {
        Self {
            workers,
            scientists,
        }
    }

    /// Whether every role of `self` is at most the same role of `other`.
    pub fn fits_within(&self, other: &Self) -> bool {
        self.workers <= other.workers && self.scientists <= other.scientists
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// A lifecycle transition produced by [`Structure::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Built,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    type_id: StructureTypeId,
    class: StructureClass,
    state: StructureState,
    age: u32,
    max_age: u32,
    turns_to_build: u32,
    energy_required: u32,
    resources_in: StorableResources,
    population_requirements: PopulationRequirements,
    population_available: PopulationRequirements,
    requires_chap: bool,
    self_sustained: bool,
    force_idle: bool,
    disabled_reason: DisabledReason,
    idle_reason: IdleReason,
    connector: ConnectorDir,
    storage_capacity: u32,
    production: StorableResources,
}

impl Structure {
    /// Build a structure from its blueprint. Structures with no build time
    /// start operational.
    pub fn new(type_id: StructureTypeId, spec: &StructureSpec) -> Self {
        let state = if spec.turns_to_build == 0 {
            StructureState::Operational
        } else {
            StructureState::UnderConstruction
        };
        Self {
            type_id,
            class: spec.class,
            state,
            age: 0,
            max_age: spec.max_age,
            turns_to_build: spec.turns_to_build,
            energy_required: spec.energy_required,
            resources_in: spec.resources_in,
            population_requirements: spec.population,
            population_available: PopulationRequirements::NONE,
            requires_chap: spec.requires_chap,
            self_sustained: spec.self_sustained,
            force_idle: false,
            disabled_reason: DisabledReason::None,
            idle_reason: IdleReason::None,
            connector: spec.connector,
            storage_capacity: spec.storage_capacity,
            production: StorableResources::ZERO,
        }
    }

    pub fn type_id(&self) -> StructureTypeId {
        self.type_id
    }

    pub fn class(&self) -> StructureClass {
        self.class
    }

    pub fn name(&self) -> &'static str {
        self.type_id.name()
    }

    pub fn state(&self) -> StructureState {
        self.state
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    pub fn turns_to_build(&self) -> u32 {
        self.turns_to_build
    }

    pub fn energy_required(&self) -> u32 {
        self.energy_required
    }

    pub fn resources_in(&self) -> StorableResources {
        self.resources_in
    }

    pub fn population_requirements(&self) -> PopulationRequirements {
        self.population_requirements
    }

    pub fn population_available(&self) -> PopulationRequirements {
        self.population_available
    }

    pub fn requires_chap(&self) -> bool {
        self.requires_chap
    }

    pub fn self_sustained(&self) -> bool {
        self.self_sustained
    }

    pub fn force_idle(&self) -> bool {
        self.force_idle
    }

    pub fn disabled_reason(&self) -> DisabledReason {
        self.disabled_reason
    }

    pub fn idle_reason(&self) -> IdleReason {
        self.idle_reason
    }

    pub fn connector(&self) -> ConnectorDir {
        self.connector
    }

    /// Refined storage this structure adds to the colony pool while working.
    pub fn storage_capacity(&self) -> u32 {
        self.storage_capacity
    }

    /// What the structure produced during its last `think`.
    pub fn production(&self) -> StorableResources {
        self.production
    }

    pub fn operational(&self) -> bool {
        self.state == StructureState::Operational
    }

    pub fn is_idle(&self) -> bool {
        self.state == StructureState::Idle
    }

    pub fn operational_or_idle(&self) -> bool {
        self.operational() || self.is_idle()
    }

    pub fn disabled(&self) -> bool {
        self.state == StructureState::Disabled
    }

    pub fn destroyed(&self) -> bool {
        self.state == StructureState::Destroyed
    }

    pub fn under_construction(&self) -> bool {
        self.state == StructureState::UnderConstruction
    }

    /// Whether a destroyed structure has stood as a ruin long enough to clear.
    pub fn expired(&self) -> bool {
        self.destroyed() && self.age > self.max_age
    }

    /// Per-turn hook: ages the structure and advances construction or decay.
    pub fn update(&mut self) -> Option<Lifecycle> {
        self.age = self.age.saturating_add(1);
        match self.state {
            StructureState::Destroyed => None,
            StructureState::UnderConstruction => {
                if self.age >= self.turns_to_build {
                    self.enable();
                    Some(Lifecycle::Built)
                } else {
                    None
                }
            }
            _ if self.max_age > 0 && self.age >= self.max_age => {
                self.destroy();
                Some(Lifecycle::Destroyed)
            }
            _ => None,
        }
    }

    /// Return to work, or to idle if the player has parked the structure.
    pub fn enable(&mut self) {
        if self.force_idle {
            self.idle(IdleReason::PlayerSet);
            return;
        }
        self.state = StructureState::Operational;
        self.disabled_reason = DisabledReason::None;
        self.idle_reason = IdleReason::None;
    }

    pub fn disable(&mut self, reason: DisabledReason) {
        self.state = StructureState::Disabled;
        self.disabled_reason = reason;
        self.idle_reason = IdleReason::None;
        self.production = StorableResources::ZERO;
    }

    pub fn idle(&mut self, reason: IdleReason) {
        self.state = StructureState::Idle;
        self.idle_reason = reason;
        self.disabled_reason = DisabledReason::None;
    }

    pub fn destroy(&mut self) {
        self.state = StructureState::Destroyed;
        self.disabled_reason = DisabledReason::None;
        self.idle_reason = IdleReason::None;
        self.population_available = PopulationRequirements::NONE;
        self.production = StorableResources::ZERO;
    }

    /// Player override. Only affects structures that are currently working.
    pub fn set_force_idle(&mut self, force_idle: bool) {
        self.force_idle = force_idle;
        if !self.operational_or_idle() {
            return;
        }
        if force_idle {
            self.idle(IdleReason::PlayerSet);
        } else {
            self.enable();
        }
    }

    pub(crate) fn set_population_available(&mut self, available: PopulationRequirements) {
        self.population_available = available;
    }

    pub(crate) fn set_production(&mut self, production: StorableResources) {
        self.production = production;
    }

    /// Overwrite lifecycle fields from a save.
    pub(crate) fn restore(&mut self, saved: SavedStructureState) {
        self.age = saved.age;
        self.state = saved.state;
        self.force_idle = saved.force_idle;
        self.disabled_reason = saved.disabled_reason;
        self.idle_reason = saved.idle_reason;
        self.connector = saved.connector;
        self.production = saved.production;
        self.population_available = saved.population_available;
    }
}

/// Mutable fields carried by a save record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SavedStructureState {
    pub age: u32,
    pub state: StructureState,
    pub force_idle: bool,
    pub disabled_reason: DisabledReason,
    pub idle_reason: IdleReason,
    pub connector: ConnectorDir,
    pub production: StorableResources,
    pub population_available: PopulationRequirements,
}
