//! Per-tile ore deposits.
//!
//! A mine is a stack of veins, one per depth level dug. Veins are seeded
//! from a yield table keyed by the mine's production rate and drained
//! shallowest first.

use crate::resources::{ResourceKind, StorableResources};
use serde::{Deserialize, Serialize};

/// Yield tier of a mine, fixed when the deposit is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MineProductionRate {
    Low,
    Medium,
    High,
}

impl MineProductionRate {
    pub const ALL: [MineProductionRate; 3] = [
        MineProductionRate::Low,
        MineProductionRate::Medium,
        MineProductionRate::High,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Ore seeded into each new vein.
    pub const fn vein_yield(self) -> StorableResources {
        match self {
            MineProductionRate::Low => StorableResources::new(600, 500, 600, 500),
            MineProductionRate::Medium => StorableResources::new(700, 550, 700, 550),
            MineProductionRate::High => StorableResources::new(850, 600, 850, 600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mine {
    rate: MineProductionRate,
    veins: Vec<StorableResources>,
    mining: [bool; 4],
    active: bool,
    exhausted: bool,
}

impl Mine {
    /// A discovered but undug deposit: no veins, inactive, every ore enabled.
    pub fn new(rate: MineProductionRate) -> Self {
        Self {
            rate,
            veins: Vec::new(),
            mining: [true; 4],
            active: false,
            exhausted: false,
        }
    }

    pub fn production_rate(&self) -> MineProductionRate {
        self.rate
    }

    pub fn depth(&self) -> u32 {
        self.veins.len() as u32
    }

    pub fn veins(&self) -> &[StorableResources] {
        &self.veins
    }

    /// Dig one level deeper, appending a fresh vein.
    pub fn increase_depth(&mut self) {
        self.veins.push(self.rate.vein_yield());
    }

    /// Take up to `quantity` of one ore, shallowest vein first. Returns the
    /// amount actually removed.
    #[must_use = "returns the amount actually pulled, which may be less than requested"]
    pub fn pull(&mut self, kind: ResourceKind, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for vein in &mut self.veins {
            if remaining == 0 {
                break;
            }
            let available = vein.get(kind);
            let taken = available.min(remaining);
            vein.set(kind, available - taken);
            remaining -= taken;
        }
        quantity - remaining
    }

    /// Ore of one kind left across all veins.
    pub fn ore_available(&self, kind: ResourceKind) -> u32 {
        self.veins.iter().map(|v| v.get(kind)).sum()
    }

    /// Nominal per-vein yield of one kind times depth, ignoring depletion.
    pub fn ore_total_yield(&self, kind: ResourceKind) -> u32 {
        self.rate.vein_yield().get(kind) * self.depth()
    }

    pub fn total_available(&self) -> u64 {
        self.veins.iter().map(StorableResources::total).sum()
    }

    /// Recompute the exhausted flag. Inactive mines keep their previous flag.
    pub fn check_exhausted(&mut self) -> bool {
        if !self.active {
            return self.exhausted;
        }
        self.exhausted = self.total_available() == 0;
        self.exhausted
    }

    /// Last value computed by [`Mine::check_exhausted`].
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn mining_enabled(&self, kind: ResourceKind) -> bool {
        self.mining[kind.index()]
    }

    pub fn set_mining_enabled(&mut self, kind: ResourceKind, enabled: bool) {
        self.mining[kind.index()] = enabled;
    }

    /// Rebuild a mine from saved state.
    pub fn restore(
        rate: MineProductionRate,
        veins: Vec<StorableResources>,
        mining: [bool; 4],
        active: bool,
        exhausted: bool,
    ) -> Self {
        Self {
            rate,
            veins,
            mining,
            active,
            exhausted,
        }
    }

    pub(crate) fn mining_flags(&self) -> [bool; 4] {
        self.mining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dug(rate: MineProductionRate, depth: u32) -> Mine {
        let mut mine = Mine::new(rate);
        for _ in 0..depth {
            mine.increase_depth();
        }
        mine
    }

    #[test]
    fn depth_tracks_vein_count() {
        let mine = dug(MineProductionRate::Low, 3);
        assert_eq!(mine.depth(), 3);
        assert_eq!(mine.veins().len(), 3);
    }

    #[test]
    fn medium_mine_drains_shallowest_first() {
        let mut mine = dug(MineProductionRate::Medium, 2);
        assert_eq!(mine.ore_available(ResourceKind::CommonMetals), 1400);

        assert_eq!(mine.pull(ResourceKind::CommonMetals, 1000), 1000);
        assert_eq!(mine.ore_available(ResourceKind::CommonMetals), 400);
        assert_eq!(mine.veins()[0].get(ResourceKind::CommonMetals), 0);
        assert_eq!(mine.veins()[1].get(ResourceKind::CommonMetals), 400);
    }

    #[test]
    fn pull_never_overdraws() {
        let mut mine = dug(MineProductionRate::Low, 1);
        assert_eq!(mine.pull(ResourceKind::RareMinerals, 800), 500);
        assert_eq!(mine.pull(ResourceKind::RareMinerals, 1), 0);
        assert_eq!(mine.ore_available(ResourceKind::RareMinerals), 0);
    }

    #[test]
    fn total_yield_ignores_depletion() {
        let mut mine = dug(MineProductionRate::High, 2);
        let _ = mine.pull(ResourceKind::CommonMinerals, 700);
        assert_eq!(mine.ore_total_yield(ResourceKind::CommonMinerals), 1200);
        assert_eq!(mine.ore_available(ResourceKind::CommonMinerals), 500);
    }

    #[test]
    fn exhaustion_is_only_updated_on_check() {
        let mut mine = dug(MineProductionRate::Low, 1);
        mine.set_active(true);
        assert!(!mine.check_exhausted());
        for kind in ResourceKind::ALL {
            let _ = mine.pull(kind, u32::MAX);
        }
        assert!(!mine.exhausted());
        assert!(mine.check_exhausted());
        assert!(mine.exhausted());

        mine.increase_depth();
        assert!(mine.exhausted());
        assert!(!mine.check_exhausted());
    }

    #[test]
    fn inactive_mine_is_not_rechecked() {
        let mut mine = Mine::new(MineProductionRate::Medium);
        assert!(!mine.check_exhausted());
        mine.set_active(true);
        assert!(mine.check_exhausted());
    }

    #[test]
    fn toggles_default_on() {
        let mut mine = Mine::new(MineProductionRate::Low);
        assert!(!mine.active());
        for kind in ResourceKind::ALL {
            assert!(mine.mining_enabled(kind));
        }
        mine.set_mining_enabled(ResourceKind::RareMetals, false);
        assert!(!mine.mining_enabled(ResourceKind::RareMetals));
        assert!(mine.mining_enabled(ResourceKind::CommonMetals));
    }

    #[test]
    fn rate_codes_round_trip() {
        for rate in MineProductionRate::ALL {
            assert_eq!(MineProductionRate::from_code(rate.code()), Some(rate));
        }
        assert_eq!(MineProductionRate::from_code(9), None);
    }
}
