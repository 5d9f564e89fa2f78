//! Property-based tests for the colony core.
//!
//! Generates random pool operations, mine pulls, populations and colony
//! command sequences, then checks the invariants that must hold after each.

use outpost_core::catalogue::Catalogue;
use outpost_core::colony::Colony;
use outpost_core::mine::{Mine, MineProductionRate};
use outpost_core::population::{Population, PopulationInputs, PopulationRole};
use outpost_core::product::{ProductPool, ProductType};
use outpost_core::resources::{ResourceKind, ResourceStore, StorableResources};
use outpost_core::rng::SimRng;
use outpost_core::structure::StructureTypeId;
use outpost_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_kind() -> impl Strategy<Value = ResourceKind> {
    prop::sample::select(ResourceKind::ALL.to_vec())
}

fn arb_rate() -> impl Strategy<Value = MineProductionRate> {
    prop::sample::select(MineProductionRate::ALL.to_vec())
}

fn arb_product() -> impl Strategy<Value = ProductType> {
    prop::sample::select(ProductType::ALL.to_vec())
}

fn arb_population() -> impl Strategy<Value = Population> {
    proptest::collection::vec(0..500u32, 5).prop_map(|counts| {
        let mut population = Population::new();
        for (role, count) in PopulationRole::ALL.into_iter().zip(counts) {
            population.add(role, count);
        }
        population
    })
}

#[derive(Debug, Clone)]
enum PoolOp {
    Store(ResourceKind, u32),
    Pull(ResourceKind, u32),
    Resize(u32),
}

fn arb_pool_ops() -> impl Strategy<Value = Vec<PoolOp>> {
    proptest::collection::vec(
        prop_oneof![
            (arb_kind(), 0..400u32).prop_map(|(k, n)| PoolOp::Store(k, n)),
            (arb_kind(), 0..400u32).prop_map(|(k, n)| PoolOp::Pull(k, n)),
            (0..500u32).prop_map(PoolOp::Resize),
        ],
        1..60,
    )
}

/// Surface types that need nothing beyond a tile to run.
const PLACEABLE: &[StructureTypeId] = &[
    StructureTypeId::SolarPanel,
    StructureTypeId::Chap,
    StructureTypeId::Agridome,
    StructureTypeId::Residence,
    StructureTypeId::Warehouse,
    StructureTypeId::StorageTanks,
    StructureTypeId::Park,
    StructureTypeId::Smelter,
    StructureTypeId::SurfaceFactory,
    StructureTypeId::RobotCommand,
    StructureTypeId::University,
    StructureTypeId::Laboratory,
    StructureTypeId::MedicalCenter,
    StructureTypeId::Road,
];

/// Colony commands issued between turns.
#[derive(Debug, Clone)]
enum ColonyOp {
    Place(usize, i32),
    Connect(i32, bool),
    Demolish(usize),
    Turn,
}

fn arb_colony_ops() -> impl Strategy<Value = Vec<ColonyOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..PLACEABLE.len(), 6..14i32).prop_map(|(t, x)| ColonyOp::Place(t, x)),
            (0..12i32, any::<bool>()).prop_map(|(x, c)| ColonyOp::Connect(x, c)),
            (0..20usize).prop_map(ColonyOp::Demolish),
            Just(ColonyOp::Turn),
            Just(ColonyOp::Turn),
        ],
        1..40,
    )
}

fn apply(colony: &mut Colony, op: &ColonyOp) {
    match *op {
        ColonyOp::Place(t, x) => {
            place_built(colony, PLACEABLE[t], tile(x));
        }
        ColonyOp::Connect(x, connected) => colony.set_connected(tile(x), connected),
        ColonyOp::Demolish(i) => {
            let key = colony.registry().structures().map(|(k, _)| k).nth(i);
            if let Some(key) = key {
                colony.demolish(key).unwrap();
            }
        }
        ColonyOp::Turn => {
            colony.advance_turn();
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Stored amounts never exceed capacity, whatever the operation order.
    #[test]
    fn resource_store_stays_within_capacity(capacity in 0..300u32, ops in arb_pool_ops()) {
        let mut store = ResourceStore::new(capacity);
        for op in &ops {
            match *op {
                PoolOp::Store(kind, n) => {
                    let before = store.get(kind);
                    let overflow = store.store(kind, n);
                    prop_assert_eq!(store.get(kind) - before + overflow, n);
                }
                PoolOp::Pull(kind, n) => {
                    let before = store.get(kind);
                    let taken = store.pull(kind, n);
                    prop_assert!(taken <= n);
                    prop_assert_eq!(before - store.get(kind), taken);
                }
                PoolOp::Resize(c) => store.set_capacity(c),
            }
            for kind in ResourceKind::ALL {
                prop_assert!(store.get(kind) <= store.capacity());
            }
        }
    }

    #[test]
    fn product_pool_total_stays_within_capacity(
        capacity in 0..200u32,
        ops in proptest::collection::vec((arb_product(), 0..80u32, any::<bool>()), 1..50),
    ) {
        let mut pool = ProductPool::new(capacity);
        for &(product, amount, store) in &ops {
            if store {
                let overflow = pool.store(product, amount);
                prop_assert!(overflow <= amount);
            } else {
                let taken = pool.pull(product, amount);
                prop_assert!(taken <= amount);
            }
            prop_assert!(pool.total() <= pool.capacity());
            prop_assert_eq!(pool.available_storage(), pool.capacity() - pool.total());
        }
    }

    /// Pulls never return more than asked and drain ore one-for-one.
    #[test]
    fn mine_pull_conserves_ore(
        rate in arb_rate(),
        depth in 0..5u32,
        pulls in proptest::collection::vec((arb_kind(), 0..2000u32), 1..20),
    ) {
        let mut mine = Mine::new(rate);
        for _ in 0..depth {
            mine.increase_depth();
        }
        prop_assert_eq!(mine.depth() as usize, mine.veins().len());

        for &(kind, quantity) in &pulls {
            let before = mine.total_available();
            let pulled = mine.pull(kind, quantity);
            prop_assert!(pulled <= quantity);
            prop_assert_eq!(before - mine.total_available(), u64::from(pulled));
            for kind in ResourceKind::ALL {
                prop_assert!(mine.ore_available(kind) <= mine.ore_total_yield(kind));
            }
        }
    }

    #[test]
    fn population_size_is_the_sum_of_roles(
        mut population in arb_population(),
        morale in 0..1000i32,
        food in 0..500u32,
        seed in any::<u64>(),
        residences in 0..3u32,
    ) {
        let mut rng = SimRng::new(seed);
        let inputs = PopulationInputs {
            morale,
            food,
            residences,
            universities: 1,
            nurseries: 1,
            hospitals: 1,
        };
        for _ in 0..5 {
            population.update(&inputs, &mut rng);
            let sum: u32 = PopulationRole::ALL.iter().map(|&r| population.size_of(r)).sum();
            prop_assert_eq!(population.size(), sum);
        }
    }

    /// With no food at all, everyone dies and every death is counted.
    #[test]
    fn zero_food_starves_everyone(
        mut population in arb_population(),
        morale in 0..1000i32,
        seed in any::<u64>(),
    ) {
        let mut rng = SimRng::new(seed);
        let inputs = PopulationInputs { morale, ..Default::default() };
        let before = population.size();
        let outcome = population.update(&inputs, &mut rng);
        prop_assert_eq!(population.size(), 0);
        prop_assert_eq!(population.death_count(), before);
        prop_assert_eq!(outcome.consumed, 0);
    }

    /// Random build orders never grant staff beyond requirements or store
    /// beyond capacity.
    #[test]
    fn colony_commands_hold_invariants(ops in arb_colony_ops()) {
        let (mut colony, _) = starter_colony();
        for op in &ops {
            apply(&mut colony, op);
            for (_, structure) in colony.registry().structures() {
                prop_assert!(structure
                    .population_available()
                    .fits_within(&structure.population_requirements()));
            }
            for kind in ResourceKind::ALL {
                prop_assert!(colony.resources().get(kind) <= colony.resources().capacity());
            }
        }
    }

    /// Identical command sequences give identical state hashes.
    #[test]
    fn colony_is_deterministic(ops in arb_colony_ops()) {
        let (mut a, _) = starter_colony();
        let (mut b, _) = starter_colony();
        for op in &ops {
            apply(&mut a, op);
            apply(&mut b, op);
        }
        a.advance_turn();
        b.advance_turn();
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }

    /// A save taken after random commands reloads to the same state.
    #[test]
    fn save_round_trip(ops in arb_colony_ops()) {
        let (mut colony, _) = starter_colony();
        for op in &ops {
            apply(&mut colony, op);
        }
        let text = colony.to_save_string().unwrap();
        let mut loaded =
            Colony::from_save_str(&text, "prop.json", Catalogue::new(), test_config()).unwrap();
        prop_assert_eq!(loaded.state_hash(), colony.state_hash());

        colony.advance_turn();
        loaded.advance_turn();
        prop_assert_eq!(loaded.state_hash(), colony.state_hash());
    }
}

#[test]
fn stored_resources_compare_component_wise() {
    let small = StorableResources::new(1, 0, 1, 1);
    let needed = StorableResources::new(2, 0, 1, 1);
    assert!(small < needed);
    assert!(!(needed <= small));
}
