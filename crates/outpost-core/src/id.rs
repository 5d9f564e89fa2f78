use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a structure in the colony registry.
    ///
    /// Keys carry a generation: once a structure is removed, every copy of
    /// its key stops resolving, even if the slot is later reused.
    pub struct StructureKey;
}

/// Position of an occupied tile. `depth` 0 is the surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TileId {
    pub x: i32,
    pub y: i32,
    pub depth: i32,
}

impl TileId {
    pub const fn new(x: i32, y: i32, depth: i32) -> Self {
        Self { x, y, depth }
    }

    /// The tile directly beneath this one.
    pub const fn below(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.depth)
    }
}

/// Identifies a robot issued by a robot command structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn tile_below_keeps_coordinates() {
        let tile = TileId::new(4, 7, 0);
        assert_eq!(tile.below(), TileId::new(4, 7, 1));
    }

    #[test]
    fn tiles_order_by_x_then_y_then_depth() {
        let mut tiles = vec![TileId::new(1, 0, 0), TileId::new(0, 5, 2), TileId::new(0, 5, 1)];
        tiles.sort();
        assert_eq!(
            tiles,
            vec![TileId::new(0, 5, 1), TileId::new(0, 5, 2), TileId::new(1, 0, 0)]
        );
    }

    #[test]
    fn stale_structure_key_does_not_resolve() {
        let mut map: SlotMap<StructureKey, u32> = SlotMap::with_key();
        let a = map.insert(1);
        map.remove(a);
        let b = map.insert(2);
        assert_ne!(a, b);
        assert!(map.get(a).is_none());
    }
}
