//! Per-turn labour accounting.
//!
//! The pool is reset from the population at the start of every turn and
//! structures draw workers and scientists from it in scheduler order.

use crate::population::{Population, PopulationRole};
use crate::structure::PopulationRequirements;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationPool {
    workers: u32,
    scientists: u32,
    workers_used: u32,
    scientists_used: u32,
}

impl PopulationPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a fresh headcount and release everyone.
    pub fn reset(&mut self, population: &Population) {
        self.workers = population.size_of(PopulationRole::Worker);
        self.scientists = population.size_of(PopulationRole::Scientist);
        self.workers_used = 0;
        self.scientists_used = 0;
    }

    pub fn available_workers(&self) -> u32 {
        self.workers - self.workers_used
    }

    pub fn available_scientists(&self) -> u32 {
        self.scientists - self.scientists_used
    }

    pub fn workers_used(&self) -> u32 {
        self.workers_used
    }

    pub fn scientists_used(&self) -> u32 {
        self.scientists_used
    }

    /// What the pool can grant toward `required`, role by role.
    pub fn grantable(&self, required: &PopulationRequirements) -> PopulationRequirements {
        PopulationRequirements::new(
            required.workers.min(self.available_workers()),
            required.scientists.min(self.available_scientists()),
        )
    }

    /// Commit `amount` if the pool holds all of it. Returns whether it did.
    pub fn use_population(&mut self, amount: &PopulationRequirements) -> bool {
        if amount.workers > self.available_workers()
            || amount.scientists > self.available_scientists()
        {
            return false;
        }
        self.workers_used += amount.workers;
        self.scientists_used += amount.scientists;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(workers: u32, scientists: u32) -> PopulationPool {
        let mut population = Population::new();
        population.add(PopulationRole::Worker, workers);
        population.add(PopulationRole::Scientist, scientists);
        let mut pool = PopulationPool::new();
        pool.reset(&population);
        pool
    }

    #[test]
    fn grantable_is_component_wise_min() {
        let pool = pool(3, 1);
        let granted = pool.grantable(&PopulationRequirements::new(5, 1));
        assert_eq!(granted, PopulationRequirements::new(3, 1));
    }

    #[test]
    fn use_population_is_all_or_nothing() {
        let mut pool = pool(3, 1);
        assert!(pool.use_population(&PopulationRequirements::new(2, 1)));
        assert!(!pool.use_population(&PopulationRequirements::new(2, 0)));
        assert_eq!(pool.available_workers(), 1);
        assert_eq!(pool.available_scientists(), 0);
    }

    #[test]
    fn reset_releases_everyone() {
        let mut population = Population::new();
        population.add(PopulationRole::Worker, 4);
        let mut pool = PopulationPool::new();
        pool.reset(&population);
        assert!(pool.use_population(&PopulationRequirements::new(4, 0)));
        pool.reset(&population);
        assert_eq!(pool.available_workers(), 4);
        assert_eq!(pool.workers_used(), 0);
    }
}
