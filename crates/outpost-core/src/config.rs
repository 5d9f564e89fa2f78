//! Colony-wide tuning knobs.
//!
//! Every field has a default, so partial config files only need to name
//! what they change.

use crate::fixed::Fixed64;
use crate::population::DEFAULT_STARVE_RATE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    /// Seed for the colony random stream.
    pub seed: u64,
    /// Percent of unfed colonists that starve per turn.
    pub starve_rate: u32,
    /// Refined storage available before any storage structure is built.
    pub base_storage_capacity: u32,
    /// Product capacity of each warehouse.
    pub warehouse_capacity: u32,
    /// Robots each robot command structure can control.
    pub robot_command_capacity: u32,
    /// Ore of each enabled kind one truck hauls per turn.
    pub ore_per_truck: u32,
    /// Ore stash of each mine facility, per kind.
    pub mine_facility_ore_capacity: u32,
    pub max_mine_depth: u32,
    /// Turns a mine facility spends digging one level deeper.
    pub mine_dig_turns: u32,
    /// Raw ore per kind a smelter can take in per turn.
    pub smelter_throughput: u32,
    pub initial_morale: i32,
    /// Distance to the star in AU; solar output scales with its inverse.
    pub mean_solar_distance: Fixed64,
    pub residence_waste_capacity: u32,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            seed: 0x0DD5_EED5,
            starve_rate: DEFAULT_STARVE_RATE,
            base_storage_capacity: 250,
            warehouse_capacity: 100,
            robot_command_capacity: 10,
            ore_per_truck: 10,
            mine_facility_ore_capacity: 500,
            max_mine_depth: 4,
            mine_dig_turns: 3,
            smelter_throughput: 50,
            initial_morale: 600,
            mean_solar_distance: Fixed64::ONE,
            residence_waste_capacity: 1000,
        }
    }
}
