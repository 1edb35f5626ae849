//! Operations on the shared `households` / `houses` collections that
//! more than one component needs: leaving a dwelling, dissolving
//! households, the size-ordered vacancy index, and the occupancy check.
//!
//! RULE: a pass that removes households collects ids first and applies
//! the removal after the iteration completes.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    house::House,
    household::Household,
    types::{HouseId, HouseholdId, Tick},
};
use std::collections::{HashMap, HashSet};

/// Leave the current dwelling. Owners sell at the current price and the
/// proceeds, net of any outstanding principal, are credited to wealth.
/// Returns the vacated house.
pub fn release_dwelling(household: &mut Household, houses: &mut [House]) -> Option<HouseId> {
    let contract = household.contract.take()?;
    let house = houses.get_mut(contract.house.0)?;
    if contract.kind.is_owner_occupied() {
        household.update_wealth(house.price - household.loan_amount);
        household.clear_loan();
    }
    if house.owner == Some(household.id) {
        house.change_ownership(None);
    }
    Some(contract.house)
}

/// Lender takes the dwelling back. No sale proceeds reach the household.
pub fn repossess_dwelling(household: &mut Household, houses: &mut [House]) -> Option<HouseId> {
    household.clear_loan();
    let contract = household.contract.take()?;
    if let Some(house) = houses.get_mut(contract.house.0) {
        if house.owner == Some(household.id) {
            house.change_ownership(None);
        }
    }
    Some(contract.house)
}

/// Remove every household in `doomed`, vacating their dwellings first.
pub fn dissolve_households(
    households: &mut Vec<Household>,
    houses: &mut [House],
    doomed: &HashSet<HouseholdId>,
    tick: Tick,
) -> Vec<SimEvent> {
    if doomed.is_empty() {
        return Vec::new();
    }
    let mut events = Vec::with_capacity(doomed.len());
    for household in households.iter_mut().filter(|h| doomed.contains(&h.id)) {
        if let Some(contract) = household.contract.take() {
            if let Some(house) = houses.get_mut(contract.house.0) {
                if house.owner == Some(household.id) {
                    house.change_ownership(None);
                }
            }
        }
        household.clear_loan();
        events.push(SimEvent::HouseholdDissolved { tick, household_id: household.id });
    }
    households.retain(|h| !doomed.contains(&h.id));
    events
}

/// Position of each household in the slice, by id.
pub fn index_by_id(households: &[Household]) -> HashMap<HouseholdId, usize> {
    households.iter().enumerate().map(|(i, h)| (h.id, i)).collect()
}

/// Vacant houses ordered by floor area, for nearest-size matching.
#[derive(Debug, Clone, Default)]
pub struct VacancyIndex {
    entries: Vec<(f64, HouseId)>,
}

impl VacancyIndex {
    pub fn build(houses: &[House], filter: impl Fn(&House) -> bool) -> Self {
        let mut entries: Vec<(f64, HouseId)> = houses
            .iter()
            .filter(|h| h.is_available() && filter(h))
            .map(|h| (h.size, h.id))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The vacancy minimizing `|size - target|`, as (position, id).
    /// On an exact tie the smaller house wins.
    pub fn nearest(&self, target: f64) -> Option<(usize, HouseId)> {
        if self.entries.is_empty() {
            return None;
        }
        let upper = self.entries.partition_point(|(size, _)| *size < target);
        let pos = match (upper.checked_sub(1), self.entries.get(upper)) {
            (Some(lower), Some((above, _))) => {
                let below = self.entries[lower].0;
                if target - below <= above - target { lower } else { upper }
            }
            (Some(lower), None) => lower,
            (None, _) => upper,
        };
        Some((pos, self.entries[pos].1))
    }

    /// Remove the entry at `pos`, returning its house.
    pub fn take(&mut self, pos: usize) -> HouseId {
        self.entries.remove(pos).1
    }
}

/// Check the occupancy and loan invariants over the whole population.
pub fn verify_occupancy(households: &[Household], houses: &[House], tick: Tick) -> SimResult<()> {
    let violation = |detail: String| SimError::InvariantViolation { tick, detail };

    for (i, house) in houses.iter().enumerate() {
        if house.id != HouseId(i) {
            return Err(violation(format!("{} stored at position {i}", house.id)));
        }
    }

    let index = index_by_id(households);
    if index.len() != households.len() {
        return Err(violation("duplicate household ids".into()));
    }

    for house in houses {
        let Some(owner) = house.owner else { continue };
        let Some(&pos) = index.get(&owner) else {
            return Err(violation(format!("{} owned by missing {owner}", house.id)));
        };
        if households[pos].current_house() != Some(house.id) {
            return Err(violation(format!("{} owned by {owner} whose contract points elsewhere", house.id)));
        }
    }

    for h in households {
        if let Some(contract) = &h.contract {
            let owner = houses.get(contract.house.0).and_then(|house| house.owner);
            if owner != Some(h.id) {
                return Err(violation(format!("{} contract points to {} owned by {owner:?}", h.id, contract.house)));
            }
        }
        if h.loan_amount < 0.0 {
            return Err(violation(format!("{} has negative loan {}", h.id, h.loan_amount)));
        }
        let with_loan = h.contract_type() == Some(crate::contract::ContractType::OwnerOccupiedWithLoan);
        if h.has_active_loan() != with_loan {
            return Err(violation(format!(
                "{} loan {} disagrees with contract {:?}",
                h.id, h.loan_amount, h.contract_type()
            )));
        }
        if !h.has_active_loan() && h.loan_term_years != 0 {
            return Err(violation(format!("{} keeps a loan term without a loan", h.id)));
        }
    }
    Ok(())
}
