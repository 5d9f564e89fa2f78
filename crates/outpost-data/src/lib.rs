//! Data-driven colony setup: colony settings and structure blueprint
//! overrides read from RON, TOML or JSON files.

pub mod loader;
pub mod schema;

pub use loader::{ColonyData, DataLoadError, load_colony_data};
