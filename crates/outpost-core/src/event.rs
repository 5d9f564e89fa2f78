//! Notable things that happened during a turn.
//!
//! Events are collected in order while the turn runs and handed back in the
//! [`crate::sim::TurnReport`]; the core keeps no subscribers of its own.

use crate::component::LanderPayload;
use crate::id::{RobotId, StructureKey, TileId};
use crate::product::ProductType;
use crate::structure::StructureTypeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColonyEvent {
    StructureBuilt {
        structure: StructureKey,
        type_id: StructureTypeId,
    },
    StructureDestroyed {
        structure: StructureKey,
        type_id: StructureTypeId,
    },
    /// A ruin was cleared from the registry. Its key no longer resolves.
    StructureRemoved {
        type_id: StructureTypeId,
        tile: Option<TileId>,
    },
    LanderDeployed {
        structure: StructureKey,
        payload: LanderPayload,
    },
    ProductionComplete {
        factory: StructureKey,
        product: ProductType,
    },
    ProductStored {
        factory: StructureKey,
        warehouse: StructureKey,
        product: ProductType,
    },
    RobotDeployed {
        factory: StructureKey,
        robot_command: StructureKey,
        robot: RobotId,
        product: ProductType,
    },
    MineExtended {
        facility: StructureKey,
        mine: TileId,
        depth: u32,
    },
    MineExhausted {
        mine: TileId,
    },
    Starvation {
        deaths: u32,
    },
}
