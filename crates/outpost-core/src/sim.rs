//! Turn bookkeeping: the turn counter, the energy ledger, the per-turn
//! report, and the state hash used to compare runs.

use crate::event::ColonyEvent;
use crate::fixed::Turns;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Turns completed so far.
    pub turn: Turns,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Colony energy for the current turn. `produced` is fixed once per turn;
/// `used` grows as structures are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyLedger {
    pub produced: u32,
    pub used: u32,
}

impl EnergyLedger {
    pub fn available(&self) -> u32 {
        self.produced.saturating_sub(self.used)
    }

    /// Start a new allocation round with a fresh output total.
    pub fn reset(&mut self, produced: u32) {
        self.produced = produced;
        self.used = 0;
    }

    pub fn consume(&mut self, amount: u32) {
        self.used = self.used.saturating_add(amount);
    }
}

// ---------------------------------------------------------------------------
// Turn report
// ---------------------------------------------------------------------------

/// What one call to [`crate::colony::Colony::advance_turn`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: Turns,
    pub energy: EnergyLedger,
    pub population: u32,
    pub births: u32,
    pub deaths: u32,
    pub food_consumed: u32,
    pub disabled: usize,
    pub destroyed: usize,
    pub events: Vec<ColonyEvent>,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of colony state for replay comparison.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
