//! Colony demographics.
//!
//! Five roles advance Child -> Student -> Worker/Scientist -> Retired once per
//! turn. Every rate is an integer division whose remainder is kept in a
//! per-role bucket (`growth` or `death`) and carried into the next turn, so
//! fractional rates accumulate exactly and replays are bit-for-bit stable.

use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

const STUDENT_TO_SCIENTIST_RATE: u32 = 35;
const STUDENT_TO_ADULT_BASE: u32 = 190;
const ADULT_TO_RETIREE_BASE: u32 = 2000;
const SCIENTIST_SELECTION_RATE: u32 = 45;
const ADULT_MORTALITY_PENALTY: u32 = 250;
const NURSERY_MORTALITY_BONUS: u32 = 10;
const HOSPITAL_STUDENT_MORTALITY_BONUS: u32 = 65;
const HOSPITAL_ADULT_MORTALITY_BONUS: u32 = 60;

/// Percent of the unfed population that starves each turn unless configured.
pub const DEFAULT_STARVE_RATE: u32 = 50;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationRole {
    Child,
    Student,
    Worker,
    Scientist,
    Retired,
}

impl PopulationRole {
    pub const ALL: [PopulationRole; 5] = [
        PopulationRole::Child,
        PopulationRole::Student,
        PopulationRole::Worker,
        PopulationRole::Scientist,
        PopulationRole::Retired,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            PopulationRole::Child => "child",
            PopulationRole::Student => "student",
            PopulationRole::Worker => "worker",
            PopulationRole::Scientist => "scientist",
            PopulationRole::Retired => "retired",
        }
    }
}

/// One count per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleTable(pub [u32; 5]);

impl RoleTable {
    pub const fn get(&self, role: PopulationRole) -> u32 {
        self.0[role.index()]
    }

    pub fn set(&mut self, role: PopulationRole, value: u32) {
        self.0[role.index()] = value;
    }

    fn add(&mut self, role: PopulationRole, value: u32) {
        let slot = &mut self.0[role.index()];
        *slot = slot.saturating_add(value);
    }

    /// Remove up to `value`, returning how many were actually removed.
    fn take(&mut self, role: PopulationRole, value: u32) -> u32 {
        let slot = &mut self.0[role.index()];
        let taken = value.min(*slot);
        *slot -= taken;
        taken
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Morale
// ---------------------------------------------------------------------------

/// Morale bands. The discriminant is the row in `MORALE_MODIFIERS` picked
/// by `clamp(morale, 1, 999) / 200`, so the lowest morale lands on the
/// Excellent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoraleTier {
    Excellent,
    Good,
    Fair,
    Poor,
    Terrible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoraleModifier {
    pub research_bonus: i32,
    pub production_bonus: i32,
    pub fertility_rate: u32,
    pub mortality_rate: u32,
}

const MORALE_MODIFIERS: [MoraleModifier; 5] = [
    MoraleModifier { research_bonus: 50, production_bonus: 50, fertility_rate: 110, mortality_rate: 80 },
    MoraleModifier { research_bonus: 25, production_bonus: 25, fertility_rate: 90, mortality_rate: 75 },
    MoraleModifier { research_bonus: 0, production_bonus: 0, fertility_rate: 60, mortality_rate: 40 },
    MoraleModifier { research_bonus: -25, production_bonus: -25, fertility_rate: 40, mortality_rate: 20 },
    MoraleModifier { research_bonus: -50, production_bonus: -50, fertility_rate: 20, mortality_rate: 10 },
];

impl MoraleTier {
    pub fn from_morale(morale: i32) -> Self {
        match morale.clamp(1, 999) / 200 {
            0 => MoraleTier::Excellent,
            1 => MoraleTier::Good,
            2 => MoraleTier::Fair,
            3 => MoraleTier::Poor,
            _ => MoraleTier::Terrible,
        }
    }

    pub const fn modifier(self) -> MoraleModifier {
        MORALE_MODIFIERS[self as usize]
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Per-turn inputs gathered by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationInputs {
    pub morale: i32,
    pub food: u32,
    pub residences: u32,
    pub universities: u32,
    pub nurseries: u32,
    pub hospitals: u32,
}

/// Food eaten during a turn and how many went hungry to death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FoodOutcome {
    pub consumed: u32,
    pub starved: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    roles: RoleTable,
    growth: RoleTable,
    death: RoleTable,
    birth_count: u32,
    death_count: u32,
    starve_rate: u32,
}

impl Population {
    pub fn new() -> Self {
        Self::with_starve_rate(DEFAULT_STARVE_RATE)
    }

    /// `starve_rate` is a percentage and is clamped to 100.
    pub fn with_starve_rate(starve_rate: u32) -> Self {
        Self {
            roles: RoleTable::default(),
            growth: RoleTable::default(),
            death: RoleTable::default(),
            birth_count: 0,
            death_count: 0,
            starve_rate: starve_rate.min(100),
        }
    }

    pub fn size(&self) -> u32 {
        self.roles.sum()
    }

    pub fn size_of(&self, role: PopulationRole) -> u32 {
        self.roles.get(role)
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn growth(&self) -> &RoleTable {
        &self.growth
    }

    pub fn death(&self) -> &RoleTable {
        &self.death
    }

    pub fn birth_count(&self) -> u32 {
        self.birth_count
    }

    pub fn death_count(&self) -> u32 {
        self.death_count
    }

    pub fn starve_rate(&self) -> u32 {
        self.starve_rate
    }

    pub fn add(&mut self, role: PopulationRole, count: u32) {
        self.roles.add(role, count);
    }

    pub fn clear(&mut self) {
        self.roles = RoleTable::default();
    }

    /// Students, workers, scientists and retirees.
    pub fn adults(&self) -> u32 {
        self.size() - self.roles.get(PopulationRole::Child)
    }

    /// Restore every table from saved values.
    pub fn restore(&mut self, roles: RoleTable, growth: RoleTable, death: RoleTable) {
        self.roles = roles;
        self.growth = growth;
        self.death = death;
    }

    /// Advance one turn.
    pub fn update(&mut self, inputs: &PopulationInputs, rng: &mut SimRng) -> FoodOutcome {
        self.birth_count = 0;
        self.death_count = 0;

        let modifier = MoraleTier::from_morale(inputs.morale).modifier();

        self.spawn_children(&modifier, inputs.residences, inputs.nurseries);
        self.spawn_students();
        self.spawn_adults(inputs.universities, rng);
        self.spawn_retirees(rng);

        self.kill_children(&modifier, inputs.nurseries);
        self.kill_students(&modifier, inputs.hospitals);
        if rng.percent() < SCIENTIST_SELECTION_RATE {
            self.kill_adults(PopulationRole::Scientist, &modifier, inputs.hospitals);
        } else {
            self.kill_adults(PopulationRole::Worker, &modifier, inputs.hospitals);
        }
        self.kill_adults(PopulationRole::Retired, &modifier, inputs.hospitals);

        self.consume_food(inputs.food, rng)
    }

    /// Move `growth[role]` forward by `amount` and return the whole units
    /// that crossed `divisor`, keeping the remainder in the bucket.
    fn accrue(bucket: &mut RoleTable, role: PopulationRole, amount: u32, divisor: u32) -> u32 {
        let divisor = divisor.max(1);
        let value = bucket.get(role).saturating_add(amount);
        bucket.set(role, value % divisor);
        value / divisor
    }

    fn spawn_children(&mut self, modifier: &MoraleModifier, residences: u32, nurseries: u32) {
        if residences == 0 && nurseries == 0 {
            return;
        }
        let scientists = self.roles.get(PopulationRole::Scientist);
        let workers = self.roles.get(PopulationRole::Worker);
        if scientists + workers <= self.roles.get(PopulationRole::Child) {
            return;
        }
        let born = Self::accrue(
            &mut self.growth,
            PopulationRole::Child,
            scientists / 4 + workers / 2,
            modifier.fertility_rate,
        );
        self.roles.add(PopulationRole::Child, born);
        self.birth_count = born;
    }

    fn spawn_students(&mut self) {
        let children = self.roles.get(PopulationRole::Child);
        if children == 0 {
            return;
        }
        let divisor = (self.adults().max(STUDENT_TO_ADULT_BASE) / 40 * 3 + 16) * 4;
        let promoted = Self::accrue(&mut self.growth, PopulationRole::Student, children, divisor);
        let promoted = self.roles.take(PopulationRole::Child, promoted);
        self.roles.add(PopulationRole::Student, promoted);
    }

    fn spawn_adults(&mut self, universities: u32, rng: &mut SimRng) {
        let students = self.roles.get(PopulationRole::Student);
        if students == 0 {
            return;
        }
        let divisor = (self.adults().max(STUDENT_TO_ADULT_BASE) / 40 * 3 + 45) * 4;
        let graduated = Self::accrue(&mut self.growth, PopulationRole::Worker, students, divisor);
        let graduated = self.roles.take(PopulationRole::Student, graduated);

        // One draw decides the whole batch.
        if universities > 0 && rng.percent() < STUDENT_TO_SCIENTIST_RATE {
            self.roles.add(PopulationRole::Scientist, graduated);
        } else {
            self.roles.add(PopulationRole::Worker, graduated);
        }
    }

    fn spawn_retirees(&mut self, rng: &mut SimRng) {
        let working =
            self.roles.get(PopulationRole::Worker) + self.roles.get(PopulationRole::Scientist);
        if working == 0 {
            return;
        }
        let divisor = (working.max(ADULT_TO_RETIREE_BASE) / 40 * 3 + 40) * 4;
        let retiring = Self::accrue(&mut self.growth, PopulationRole::Retired, working / 10, divisor);

        let from = if rng.percent() < SCIENTIST_SELECTION_RATE {
            PopulationRole::Scientist
        } else {
            PopulationRole::Worker
        };
        let retired = self.roles.take(from, retiring);
        self.roles.add(PopulationRole::Retired, retired);
    }

    fn kill(&mut self, role: PopulationRole, divisor: u32) {
        let count = self.roles.get(role);
        let deaths = Self::accrue(&mut self.death, role, count, divisor);
        self.death_count += self.roles.take(role, deaths);
    }

    fn kill_children(&mut self, modifier: &MoraleModifier, nurseries: u32) {
        if self.roles.get(PopulationRole::Child) == 0 {
            return;
        }
        let divisor = modifier.mortality_rate + nurseries * NURSERY_MORTALITY_BONUS;
        self.kill(PopulationRole::Child, divisor);
        if self.roles.get(PopulationRole::Child) == 0 {
            self.death.set(PopulationRole::Child, 0);
            self.growth.set(PopulationRole::Student, 0);
        }
    }

    /// Student deaths only run while there are children.
    fn kill_students(&mut self, modifier: &MoraleModifier, hospitals: u32) {
        if self.roles.get(PopulationRole::Child) == 0 {
            return;
        }
        let divisor = modifier.mortality_rate + hospitals * HOSPITAL_STUDENT_MORTALITY_BONUS;
        self.kill(PopulationRole::Student, divisor);
        if self.roles.get(PopulationRole::Student) == 0 {
            self.death.set(PopulationRole::Student, 0);
            self.growth.set(PopulationRole::Worker, 0);
        }
    }

    fn kill_adults(&mut self, role: PopulationRole, modifier: &MoraleModifier, hospitals: u32) {
        if self.roles.get(role) == 0 {
            return;
        }
        let divisor = modifier.mortality_rate
            + ADULT_MORTALITY_PENALTY
            + hospitals * HOSPITAL_ADULT_MORTALITY_BONUS;
        self.kill(role, divisor);
        if self.roles.get(role) == 0 {
            self.death.set(role, 0);
        }
    }

    fn consume_food(&mut self, food: u32, rng: &mut SimRng) -> FoodOutcome {
        let size = self.size();
        if food == 0 {
            self.death_count += size;
            self.clear();
            return FoodOutcome {
                consumed: 0,
                starved: size,
            };
        }

        let fed = food.saturating_mul(10);
        if fed >= size {
            return FoodOutcome {
                consumed: size / 10,
                starved: 0,
            };
        }

        let starving = u64::from(size - fed) * u64::from(self.starve_rate);
        let mut to_kill = ((starving + u64::from(rng.percent())) / 100) as u32;
        to_kill = to_kill.min(size);
        let starved = to_kill;

        let mut nonzero = PopulationRole::ALL.len() as u32;
        while to_kill >= nonzero && nonzero > 0 {
            let per_role = to_kill / nonzero;
            nonzero = PopulationRole::ALL.len() as u32;
            for role in PopulationRole::ALL {
                let killed = self.roles.take(role, per_role);
                self.death_count += killed;
                to_kill -= killed;
                if self.roles.get(role) == 0 {
                    nonzero -= 1;
                }
            }
        }

        let mut index = rng.percent() as usize % PopulationRole::ALL.len();
        while to_kill > 0 && self.size() > 0 {
            let role = PopulationRole::ALL[index];
            if self.roles.take(role, 1) == 1 {
                self.death_count += 1;
                to_kill -= 1;
            }
            index = (index + 1) % PopulationRole::ALL.len();
        }

        FoodOutcome {
            consumed: fed / 10,
            starved: starved - to_kill,
        }
    }
}

impl Default for Population {
    fn default() -> Self {
        Self::new()
    }
}
