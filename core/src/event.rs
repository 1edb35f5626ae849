//! Events emitted during simulation.
//!
//! Events are plain return values: components hand them back to the
//! engine, which buffers them for the caller. Nothing subscribes.

use crate::{
    house::Tenure,
    types::{HouseId, HouseholdId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Variants are appended as features land and are never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
        households: usize,
        houses: usize,
    },
    YearCompleted {
        tick: Tick,
        year: u64,
        tax_rate: f64,
    },

    // ── Market events ──────────────────────────────
    HousePurchased {
        tick: Tick,
        household_id: HouseholdId,
        house_id: HouseId,
        price: f64,
        loan: f64,
    },
    HouseRented {
        tick: Tick,
        household_id: HouseholdId,
        house_id: HouseId,
        monthly_rent: f64,
    },
    SocialHousingAssigned {
        tick: Tick,
        household_id: HouseholdId,
        house_id: HouseId,
        waitlist_time: u32,
    },
    HouseVacated {
        tick: Tick,
        household_id: HouseholdId,
        house_id: HouseId,
    },

    // ── Bank events ────────────────────────────────
    MortgageRepaid {
        tick: Tick,
        household_id: HouseholdId,
    },
    ForeclosureRecorded {
        tick: Tick,
        household_id: HouseholdId,
        house_id: Option<HouseId>,
        outstanding_principal: f64,
        payment_due: f64,
        wealth: f64,
    },

    // ── Demographic events ─────────────────────────
    HouseholdDissolved {
        tick: Tick,
        household_id: HouseholdId,
    },
    MigrationApplied {
        tick: Tick,
        net_households: i64,
    },

    // ── Construction events ────────────────────────
    HouseConstructed {
        tick: Tick,
        house_id: HouseId,
        size: f64,
        tenure: Tenure,
        price: f64,
    },
}

impl SimEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. } => "run_initialized",
            Self::YearCompleted { .. } => "year_completed",
            Self::HousePurchased { .. } => "house_purchased",
            Self::HouseRented { .. } => "house_rented",
            Self::SocialHousingAssigned { .. } => "social_housing_assigned",
            Self::HouseVacated { .. } => "house_vacated",
            Self::MortgageRepaid { .. } => "mortgage_repaid",
            Self::ForeclosureRecorded { .. } => "foreclosure_recorded",
            Self::HouseholdDissolved { .. } => "household_dissolved",
            Self::MigrationApplied { .. } => "migration_applied",
            Self::HouseConstructed { .. } => "house_constructed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
