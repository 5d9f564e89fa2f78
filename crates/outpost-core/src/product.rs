//! Manufactured products and the warehouse product pool.

use crate::resources::StorableResources;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size of the product id space. Product discriminants stay below this.
pub const PRODUCT_SLOTS: u8 = 64;

/// Something a factory can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProductType {
    Digger = 0,
    Dozer = 1,
    Miner = 2,
    Explorer = 3,
    Truck = 4,
    RoadMaterials = 16,
    MaintenanceSupplies = 17,
    Clothing = 32,
    Medicine = 33,
}

/// Build time and refined resource cost of one product unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionCost {
    pub turns: u32,
    pub resources: StorableResources,
}

impl ProductType {
    pub const ALL: [ProductType; 9] = [
        ProductType::Digger,
        ProductType::Dozer,
        ProductType::Miner,
        ProductType::Explorer,
        ProductType::Truck,
        ProductType::RoadMaterials,
        ProductType::MaintenanceSupplies,
        ProductType::Clothing,
        ProductType::Medicine,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ProductType::Digger => "digger",
            ProductType::Dozer => "dozer",
            ProductType::Miner => "miner",
            ProductType::Explorer => "explorer",
            ProductType::Truck => "truck",
            ProductType::RoadMaterials => "road_materials",
            ProductType::MaintenanceSupplies => "maintenance_supplies",
            ProductType::Clothing => "clothing",
            ProductType::Medicine => "medicine",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Robots go to a robot command structure rather than a warehouse.
    pub const fn is_robot(self) -> bool {
        matches!(
            self,
            ProductType::Digger | ProductType::Dozer | ProductType::Miner | ProductType::Explorer
        )
    }

    pub const fn cost(self) -> ProductionCost {
        let (turns, resources) = match self {
            ProductType::Digger => (5, StorableResources::new(10, 5, 5, 5)),
            ProductType::Dozer => (5, StorableResources::new(10, 5, 5, 5)),
            ProductType::Miner => (5, StorableResources::new(10, 5, 5, 5)),
            ProductType::Explorer => (5, StorableResources::new(10, 5, 5, 5)),
            ProductType::Truck => (3, StorableResources::new(10, 5, 5, 0)),
            ProductType::RoadMaterials => (2, StorableResources::new(2, 2, 0, 0)),
            ProductType::MaintenanceSupplies => (2, StorableResources::new(2, 2, 1, 1)),
            ProductType::Clothing => (1, StorableResources::new(0, 1, 0, 0)),
            ProductType::Medicine => (2, StorableResources::new(0, 2, 0, 1)),
        };
        ProductionCost { turns, resources }
    }
}

// ---------------------------------------------------------------------------
// ProductPool
// ---------------------------------------------------------------------------

/// Product counts sharing a single capacity across all product kinds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductPool {
    products: BTreeMap<ProductType, u32>,
    capacity: u32,
}

impl ProductPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            products: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn count(&self, product: ProductType) -> u32 {
        self.products.get(&product).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.products.values().sum()
    }

    pub fn available_storage(&self) -> u32 {
        self.capacity - self.total()
    }

    pub fn can_store(&self, amount: u32) -> bool {
        amount <= self.available_storage()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Store up to capacity. Returns the amount that did not fit.
    #[must_use = "overflow indicates products that did not fit"]
    pub fn store(&mut self, product: ProductType, amount: u32) -> u32 {
        let accepted = amount.min(self.available_storage());
        if accepted > 0 {
            *self.products.entry(product).or_insert(0) += accepted;
        }
        amount - accepted
    }

    /// Remove up to `amount`. Returns the amount actually removed.
    #[must_use = "returns the amount actually removed, which may be less than requested"]
    pub fn pull(&mut self, product: ProductType, amount: u32) -> u32 {
        let Some(count) = self.products.get_mut(&product) else {
            return 0;
        };
        let taken = amount.min(*count);
        *count -= taken;
        if *count == 0 {
            self.products.remove(&product);
        }
        taken
    }

    /// Iterate stored products in product id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductType, u32)> + '_ {
        self.products.iter().map(|(&p, &c)| (p, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_ids_fit_slot_space() {
        for product in ProductType::ALL {
            assert!(product.id() < PRODUCT_SLOTS);
            assert_eq!(ProductType::from_id(product.id()), Some(product));
            assert_eq!(ProductType::from_name(product.name()), Some(product));
        }
    }

    #[test]
    fn robots_are_flagged() {
        assert!(ProductType::Digger.is_robot());
        assert!(!ProductType::Truck.is_robot());
        assert!(!ProductType::Clothing.is_robot());
    }

    #[test]
    fn capacity_is_shared_between_products() {
        let mut pool = ProductPool::new(10);
        assert_eq!(pool.store(ProductType::Truck, 6), 0);
        assert_eq!(pool.store(ProductType::Clothing, 6), 2);
        assert_eq!(pool.total(), 10);
        assert!(!pool.can_store(1));
    }

    #[test]
    fn pull_clamps_and_forgets_empty_entries() {
        let mut pool = ProductPool::new(10);
        let _ = pool.store(ProductType::Medicine, 3);
        assert_eq!(pool.pull(ProductType::Medicine, 5), 3);
        assert_eq!(pool.pull(ProductType::Medicine, 1), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn pull_of_absent_product_is_zero() {
        let mut pool = ProductPool::new(10);
        assert_eq!(pool.pull(ProductType::Truck, 1), 0);
    }
}
