//! Outpost Core -- the colony simulation behind a turn-based colony builder.
//!
//! This crate owns the structure registry and its components, the fixed-order
//! turn scheduler, the population model, mines and ore veins, refined
//! resource and product pools, and saves.
//!
//! # Turn Pipeline
//!
//! Each call to [`colony::Colony::advance_turn`] runs:
//!
//! 1. **Reset** -- Release the labour pool and resize refined storage.
//! 2. **Mines** -- Recompute every mine's exhausted flag.
//! 3. **Producers** -- Landers, command and energy production, then total the
//!    colony's energy output.
//! 4. **Consumers** -- Every other class in fixed priority order. Each
//!    structure claims workers, scientists, energy and refined resources or
//!    is disabled with a reason.
//! 5. **Population** -- House colonists, then grow, age and feed them.
//! 6. **Ruins** -- Clear destroyed structures that have aged out.
//!
//! Allocation is first come, first served: class order first, then the
//! order structures were placed within a class.
//!
//! # Key Types
//!
//! - [`colony::Colony`] -- The session object. Owns all state; nothing is
//!   global.
//! - [`registry::StructureRegistry`] -- Generation-checked structure handles
//!   with per-type component tables.
//! - [`catalogue::Catalogue`] -- Blueprints for every structure type.
//! - [`population::Population`] -- Five-role demographic model with
//!   remainder-carrying growth and death buckets.
//! - [`mine::Mine`] -- Ore veins drained shallowest first.
//! - [`resources::ResourceStore`] and [`product::ProductPool`] -- Bounded
//!   stores of refined resources and manufactured products.
//! - [`save`] -- Versioned attribute-dictionary saves.
//! - [`serialize`] -- Binary snapshots via bitcode.

pub mod catalogue;
pub mod colony;
pub mod component;
pub mod config;
pub mod event;
pub mod fixed;
pub mod id;
pub mod mine;
pub mod population;
pub mod population_pool;
pub mod product;
pub mod registry;
pub mod resources;
pub mod rng;
pub mod save;
pub mod scheduler;
pub mod serialize;
pub mod sim;
pub mod structure;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
