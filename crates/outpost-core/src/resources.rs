//! Refined and raw resource quantities.
//!
//! [`StorableResources`] is a plain 4-tuple over the ore alphabet;
//! [`ResourceStore`] adds a per-kind capacity and clamps every write to it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The four ore/mineral kinds. The declaration order is the index order of
/// every resource tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    CommonMetals,
    CommonMinerals,
    RareMetals,
    RareMinerals,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::CommonMetals,
        ResourceKind::CommonMinerals,
        ResourceKind::RareMetals,
        ResourceKind::RareMinerals,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Attribute name used by saves.
    pub const fn attribute_name(self) -> &'static str {
        match self {
            ResourceKind::CommonMetals => "common_metals",
            ResourceKind::CommonMinerals => "common_minerals",
            ResourceKind::RareMetals => "rare_metals",
            ResourceKind::RareMinerals => "rare_minerals",
        }
    }
}

// ---------------------------------------------------------------------------
// StorableResources
// ---------------------------------------------------------------------------

/// A quantity of each resource kind.
///
/// Comparison is component-wise: `a >= b` holds only when every kind of `a`
/// is at least the same kind of `b`. Mixed results compare as unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StorableResources(pub [u32; 4]);

impl StorableResources {
    pub const ZERO: Self = Self([0; 4]);

    pub const fn new(
        common_metals: u32,
        common_minerals: u32,
        rare_metals: u32,
        rare_minerals: u32,
    ) -> Self {
        Self([common_metals, common_minerals, rare_metals, rare_minerals])
    }

    pub const fn get(&self, kind: ResourceKind) -> u32 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u32) {
        self.0[kind.index()] = amount;
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|&v| u64::from(v)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Component-wise minimum.
    pub fn min(&self, other: &Self) -> Self {
        let mut out = *self;
        for (a, b) in out.0.iter_mut().zip(other.0) {
            *a = (*a).min(b);
        }
        out
    }
}

impl PartialOrd for StorableResources {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let mut less = false;
        let mut greater = false;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.cmp(b) {
                Ordering::Less => less = true,
                Ordering::Greater => greater = true,
                Ordering::Equal => {}
            }
        }
        match (less, greater) {
            (false, false) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (true, true) => None,
        }
    }
}

impl Add for StorableResources {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for StorableResources {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a = a.saturating_add(b);
        }
    }
}

/// Saturates at zero per kind.
impl Sub for StorableResources {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl SubAssign for StorableResources {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a = a.saturating_sub(b);
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceStore
// ---------------------------------------------------------------------------

/// Resource quantities bounded by a capacity that applies to each kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceStore {
    stored: StorableResources,
    capacity: u32,
}

impl ResourceStore {
    pub fn new(capacity: u32) -> Self {
        Self {
            stored: StorableResources::ZERO,
            capacity,
        }
    }

    pub fn stored(&self) -> StorableResources {
        self.stored
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.stored.get(kind)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Free space left for one kind.
    pub fn free(&self, kind: ResourceKind) -> u32 {
        self.capacity - self.stored.get(kind)
    }

    /// Whether every kind of `amount` is currently held.
    pub fn contains(&self, amount: &StorableResources) -> bool {
        self.stored >= *amount
    }

    /// Change the capacity. Stored amounts above the new capacity are lost.
    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
        for v in self.stored.0.iter_mut() {
            *v = (*v).min(capacity);
        }
    }

    /// Store up to capacity. Returns the amount that did not fit.
    #[must_use = "overflow indicates resources that did not fit"]
    pub fn store(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let accepted = amount.min(self.free(kind));
        self.stored.0[kind.index()] += accepted;
        amount - accepted
    }

    /// Store every kind. Returns the per-kind overflow.
    #[must_use = "overflow indicates resources that did not fit"]
    pub fn store_all(&mut self, amount: &StorableResources) -> StorableResources {
        let mut overflow = StorableResources::ZERO;
        for kind in ResourceKind::ALL {
            overflow.set(kind, self.store(kind, amount.get(kind)));
        }
        overflow
    }

    /// Remove up to `amount`. Returns the amount actually removed.
    #[must_use = "returns the amount actually removed, which may be less than requested"]
    pub fn pull(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let taken = amount.min(self.stored.get(kind));
        self.stored.0[kind.index()] -= taken;
        taken
    }

    /// Remove up to `amount` of every kind. Returns what was actually removed.
    #[must_use = "returns the amount actually removed, which may be less than requested"]
    pub fn pull_all(&mut self, amount: &StorableResources) -> StorableResources {
        let mut taken = StorableResources::ZERO;
        for kind in ResourceKind::ALL {
            taken.set(kind, self.pull(kind, amount.get(kind)));
        }
        taken
    }

    /// Replace the stored amounts, clamped to capacity. Used by loaders.
    pub fn set_stored(&mut self, amount: StorableResources) {
        self.stored = amount.min(&StorableResources([self.capacity; 4]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_component_wise() {
        let pool = StorableResources::new(1, 0, 1, 1);
        let need = StorableResources::new(2, 0, 1, 1);
        assert!(!(pool >= need));
        assert!(pool < need);
        assert!(need >= pool);
        assert!(pool >= pool);
    }

    #[test]
    fn mixed_comparison_is_unordered() {
        let a = StorableResources::new(5, 0, 0, 0);
        let b = StorableResources::new(0, 5, 0, 0);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(!(a >= b));
        assert!(!(b >= a));
    }

    #[test]
    fn subtraction_saturates() {
        let a = StorableResources::new(1, 2, 3, 4);
        let b = StorableResources::new(2, 2, 2, 2);
        assert_eq!(a - b, StorableResources::new(0, 0, 1, 2));
    }

    #[test]
    fn addition_is_per_kind() {
        let a = StorableResources::new(1, 2, 3, 4);
        assert_eq!(a + a, StorableResources::new(2, 4, 6, 8));
        assert_eq!(a.total(), 10);
    }

    #[test]
    fn store_clamps_and_reports_overflow() {
        let mut store = ResourceStore::new(10);
        assert_eq!(store.store(ResourceKind::RareMetals, 7), 0);
        assert_eq!(store.store(ResourceKind::RareMetals, 7), 4);
        assert_eq!(store.get(ResourceKind::RareMetals), 10);
        assert_eq!(store.free(ResourceKind::RareMetals), 0);
        assert_eq!(store.free(ResourceKind::CommonMetals), 10);
    }

    #[test]
    fn pull_returns_what_was_removed() {
        let mut store = ResourceStore::new(50);
        let _ = store.store(ResourceKind::CommonMinerals, 12);
        assert_eq!(store.pull(ResourceKind::CommonMinerals, 5), 5);
        assert_eq!(store.pull(ResourceKind::CommonMinerals, 100), 7);
        assert_eq!(store.pull(ResourceKind::CommonMinerals, 1), 0);
    }

    #[test]
    fn pull_all_is_partial_when_short() {
        let mut store = ResourceStore::new(50);
        let _ = store.store_all(&StorableResources::new(1, 0, 1, 1));
        let taken = store.pull_all(&StorableResources::new(2, 0, 1, 1));
        assert_eq!(taken, StorableResources::new(1, 0, 1, 1));
        assert!(store.stored().is_empty());
    }

    #[test]
    fn shrinking_capacity_clamps_stored() {
        let mut store = ResourceStore::new(100);
        let _ = store.store_all(&StorableResources::new(80, 20, 0, 100));
        store.set_capacity(50);
        assert_eq!(store.stored(), StorableResources::new(50, 20, 0, 50));
    }

    #[test]
    fn set_stored_clamps() {
        let mut store = ResourceStore::new(10);
        store.set_stored(StorableResources::new(5, 50, 0, 10));
        assert_eq!(store.stored(), StorableResources::new(5, 10, 0, 10));
    }
}
