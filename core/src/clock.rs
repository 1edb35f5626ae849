//! Simulation clock: months and the years they roll up into.

use crate::types::{RunId, Tick, MONTHS_PER_YEAR};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(run_id: RunId) -> Self {
        Self { run_id, current_tick: 0 }
    }

    /// Advance one month. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }

    /// Completed simulated years.
    pub fn year(&self) -> u64 {
        self.current_tick / MONTHS_PER_YEAR
    }

    /// True when the current tick closes a year.
    pub fn is_year_end(&self) -> bool {
        self.current_tick > 0 && self.current_tick % MONTHS_PER_YEAR == 0
    }
}
