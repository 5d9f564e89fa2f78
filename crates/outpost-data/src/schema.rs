//! Serde data file structs for colony content.
//!
//! These structs define the on-disk format for colony settings and structure
//! blueprint overrides. They are deserialized from RON, JSON, or TOML data
//! files and then applied over the built-in defaults by the loader.

use outpost_core::catalogue::{ComponentSpec, StructureSpec};
use outpost_core::component::{LanderPayload, ProductLine};
use outpost_core::config::ColonyConfig;
use outpost_core::fixed::f64_to_fixed64;
use outpost_core::resources::StorableResources;
use serde::Deserialize;

// ===========================================================================
// Colony settings
// ===========================================================================

/// Colony settings in a data file. Absent fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColonyConfigData {
    pub seed: Option<u64>,
    pub starve_rate: Option<u32>,
    pub base_storage_capacity: Option<u32>,
    pub warehouse_capacity: Option<u32>,
    pub robot_command_capacity: Option<u32>,
    pub ore_per_truck: Option<u32>,
    pub mine_facility_ore_capacity: Option<u32>,
    pub max_mine_depth: Option<u32>,
    pub mine_dig_turns: Option<u32>,
    pub smelter_throughput: Option<u32>,
    pub initial_morale: Option<i32>,
    /// Distance to the star in AU.
    pub mean_solar_distance: Option<f64>,
    pub residence_waste_capacity: Option<u32>,
}

impl ColonyConfigData {
    /// Write every present field into `config`.
    pub fn apply(&self, config: &mut ColonyConfig) {
        macro_rules! set {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = self.$field {
                    config.$field = v;
                })+
            };
        }
        set!(
            seed,
            starve_rate,
            base_storage_capacity,
            warehouse_capacity,
            robot_command_capacity,
            ore_per_truck,
            mine_facility_ore_capacity,
            max_mine_depth,
            mine_dig_turns,
            smelter_throughput,
            initial_morale,
            residence_waste_capacity,
        );
        if let Some(distance) = self.mean_solar_distance {
            config.mean_solar_distance = f64_to_fixed64(distance);
        }
    }
}

// ===========================================================================
// Structure overrides
// ===========================================================================

/// Refined resources by kind. Missing kinds are zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ResourcesData {
    #[serde(default)]
    pub common_metals: u32,
    #[serde(default)]
    pub common_minerals: u32,
    #[serde(default)]
    pub rare_metals: u32,
    #[serde(default)]
    pub rare_minerals: u32,
}

impl From<ResourcesData> for StorableResources {
    fn from(r: ResourcesData) -> Self {
        StorableResources::new(
            r.common_metals,
            r.common_minerals,
            r.rare_metals,
            r.rare_minerals,
        )
    }
}

/// Override of one structure type's blueprint, keyed by its type name
/// (`"agridome"`, `"solar_panel"`, ...). Only the named fields change.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureData {
    pub name: String,
    pub max_age: Option<u32>,
    pub turns_to_build: Option<u32>,
    pub energy: Option<u32>,
    pub resources: Option<ResourcesData>,
    pub workers: Option<u32>,
    pub scientists: Option<u32>,
    pub requires_chap: Option<bool>,
    pub self_sustained: Option<bool>,
    pub storage: Option<u32>,
    /// Replaces the whole component list when present.
    pub components: Option<Vec<ComponentData>>,
}

/// A component blueprint in a data file.
#[derive(Debug, Clone, Deserialize)]
pub enum ComponentData {
    FoodProduction { capacity: u32, production: u32 },
    PowerStation { output: u32 },
    SolarCollector { base_output: u32 },
    Warehouse,
    RobotCommand,
    MineFacility,
    OreRefining { capacity: u32 },
    Factory { line: ProductLineData },
    Residence { capacity: u32 },
    Lander { payload: PayloadData },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLineData {
    Surface,
    Underground,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadData {
    Colonists,
    Cargo,
}

impl From<ComponentData> for ComponentSpec {
    fn from(data: ComponentData) -> Self {
        match data {
            ComponentData::FoodProduction {
                capacity,
                production,
            } => ComponentSpec::FoodProduction {
                capacity,
                production,
            },
            ComponentData::PowerStation { output } => ComponentSpec::PowerStation { output },
            ComponentData::SolarCollector { base_output } => {
                ComponentSpec::SolarCollector { base_output }
            }
            ComponentData::Warehouse => ComponentSpec::Warehouse,
            ComponentData::RobotCommand => ComponentSpec::RobotCommand,
            ComponentData::MineFacility => ComponentSpec::MineFacility,
            ComponentData::OreRefining { capacity } => ComponentSpec::OreRefining { capacity },
            ComponentData::Factory { line } => ComponentSpec::Factory {
                line: match line {
                    ProductLineData::Surface => ProductLine::Surface,
                    ProductLineData::Underground => ProductLine::Underground,
                },
            },
            ComponentData::Residence { capacity } => ComponentSpec::Residence { capacity },
            ComponentData::Lander { payload } => ComponentSpec::Lander {
                payload: match payload {
                    PayloadData::Colonists => LanderPayload::Colonists,
                    PayloadData::Cargo => LanderPayload::Cargo,
                },
            },
        }
    }
}

impl StructureData {
    /// Apply this override on top of `spec`.
    pub fn apply(&self, mut spec: StructureSpec) -> StructureSpec {
        if let Some(v) = self.max_age {
            spec.max_age = v;
        }
        if let Some(v) = self.turns_to_build {
            spec.turns_to_build = v;
        }
        if let Some(v) = self.energy {
            spec.energy_required = v;
        }
        if let Some(v) = self.resources {
            spec.resources_in = v.into();
        }
        if let Some(v) = self.workers {
            spec.population.workers = v;
        }
        if let Some(v) = self.scientists {
            spec.population.scientists = v;
        }
        if let Some(v) = self.requires_chap {
            spec.requires_chap = v;
        }
        if let Some(v) = self.self_sustained {
            spec.self_sustained = v;
        }
        if let Some(v) = self.storage {
            spec.storage_capacity = v;
        }
        if let Some(components) = &self.components {
            spec.components = components.iter().cloned().map(ComponentSpec::from).collect();
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::catalogue::builtin_spec;
    use outpost_core::fixed::Fixed64;
    use outpost_core::structure::StructureTypeId;

    #[test]
    fn colony_settings_keep_unnamed_defaults() {
        let data: ColonyConfigData =
            ron::from_str("(seed: Some(9), mean_solar_distance: Some(2.0))").unwrap();
        let mut config = ColonyConfig::default();
        data.apply(&mut config);

        assert_eq!(config.seed, 9);
        assert_eq!(config.mean_solar_distance, Fixed64::from_num(2));
        assert_eq!(config.starve_rate, ColonyConfig::default().starve_rate);
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let result: Result<ColonyConfigData, _> = serde_json::from_str(r#"{ "sead": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn override_touches_only_named_fields() {
        let data: StructureData = serde_json::from_str(
            r#"{ "name": "agridome", "energy": 7, "resources": { "rare_metals": 2 } }"#,
        )
        .unwrap();
        let base = builtin_spec(StructureTypeId::Agridome);
        let spec = data.apply(base.clone());

        assert_eq!(spec.energy_required, 7);
        assert_eq!(spec.resources_in, StorableResources::new(0, 0, 2, 0));
        assert_eq!(spec.population, base.population);
        assert_eq!(spec.components, base.components);
    }

    #[test]
    fn components_replace_the_whole_list() {
        let data: StructureData = toml::from_str(
            r#"
name = "warehouse"
components = ["Warehouse", { Residence = { capacity = 5 } }]
"#,
        )
        .unwrap();
        let spec = data.apply(builtin_spec(StructureTypeId::Warehouse));
        assert_eq!(
            spec.components,
            vec![
                ComponentSpec::Warehouse,
                ComponentSpec::Residence { capacity: 5 }
            ]
        );
    }

    #[test]
    fn factory_line_and_lander_payload_read_by_name() {
        let data: Vec<ComponentData> = ron::from_str(
            "[Factory(line: underground), Lander(payload: cargo)]",
        )
        .unwrap();
        let specs: Vec<ComponentSpec> = data.into_iter().map(ComponentSpec::from).collect();
        assert_eq!(
            specs,
            vec![
                ComponentSpec::Factory {
                    line: ProductLine::Underground
                },
                ComponentSpec::Lander {
                    payload: LanderPayload::Cargo
                },
            ]
        );
    }
}
