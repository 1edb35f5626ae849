//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A simulation tick. One tick = one simulated month.
pub type Tick = u64;

/// The canonical run identifier.
pub type RunId = String;

pub const MONTHS_PER_YEAR: Tick = 12;

/// Stable identity of a household. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseholdId(pub u64);

/// Index of a house in the housing stock. The stock is append-only,
/// so `houses[id.0].id == id` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HouseId(pub usize);

/// Monotonic household id counter owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct HouseholdIds {
    next: u64,
}

impl HouseholdIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume numbering after the largest id already in use.
    pub fn starting_after(max_existing: u64) -> Self {
        Self { next: max_existing + 1 }
    }

    /// Never hand out an id at or below `max_existing`.
    pub fn skip_past(&mut self, max_existing: u64) {
        self.next = self.next.max(max_existing + 1);
    }

    pub fn next_id(&mut self) -> HouseholdId {
        let id = HouseholdId(self.next);
        self.next += 1;
        id
    }
}

impl std::fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hh-{:06}", self.0)
    }
}

impl std::fmt::Display for HouseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "house-{:06}", self.0)
    }
}
