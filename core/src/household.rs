//! Household agents and their relocation decision.
//!
//! The relocation decision is a stochastic discrete-choice model:
//! every affordable candidate gets a utility with idiosyncratic noise,
//! and the household moves with a probability that grows with the
//! relative gain of the best candidate over where it lives now.

use crate::{
    contract::{ContractType, HousingContract},
    house::{House, Tenure},
    rng::RandomSource,
    types::{HouseId, HouseholdId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn is_female(&self) -> bool {
        matches!(self, Self::Female)
    }

    /// Fair coin.
    pub fn draw(rng: &mut dyn RandomSource) -> Self {
        if rng.uniform() < 0.5 {
            Self::Male
        } else {
            Self::Female
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub age: u32,
    pub gender: Gender,
    /// Annual income. Zero means unemployed or dependent.
    pub income: f64,
}

impl Person {
    pub fn new(age: u32, gender: Gender, income: f64) -> Self {
        Self { age, gender, income }
    }

    pub fn newborn(gender: Gender) -> Self {
        Self::new(0, gender, 0.0)
    }

    pub fn increment_age(&mut self) {
        self.age += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub members: Vec<Person>,
    pub income_percentile: Option<u8>,
    pub contract: Option<HousingContract>,
    pub wealth: f64,
    pub want_to_move: bool,
    /// Consecutive ticks eligible for, but not granted, social housing.
    pub waitlist_time: u32,
    pub loan_amount: f64,
    pub loan_term_years: u32,
}

impl Household {
    pub fn new(id: HouseholdId, members: Vec<Person>, wealth: f64) -> Self {
        Self {
            id,
            members,
            income_percentile: None,
            contract: None,
            wealth,
            want_to_move: false,
            waitlist_time: 0,
            loan_amount: 0.0,
            loan_term_years: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Annual income summed over members.
    pub fn total_income(&self) -> f64 {
        self.members.iter().map(|m| m.income).sum()
    }

    pub fn monthly_income(&self) -> f64 {
        self.total_income() / 12.0
    }

    pub fn update_wealth(&mut self, amount: f64) {
        self.wealth += amount;
    }

    pub fn is_housed(&self) -> bool {
        self.contract.is_some()
    }

    pub fn current_house(&self) -> Option<HouseId> {
        self.contract.as_ref().map(|c| c.house)
    }

    pub fn contract_type(&self) -> Option<ContractType> {
        self.contract.as_ref().map(|c| c.kind)
    }

    pub fn current_tenure(&self) -> Option<Tenure> {
        self.contract_type().map(|k| k.tenure())
    }

    pub fn is_homeowner(&self) -> bool {
        self.contract_type().is_some_and(|k| k.is_owner_occupied())
    }

    pub fn has_active_loan(&self) -> bool {
        self.loan_amount > 0.0
    }

    pub fn set_loan(&mut self, principal: f64, term_years: u32) {
        self.loan_amount = principal;
        self.loan_term_years = term_years;
    }

    pub fn clear_loan(&mut self) {
        self.loan_amount = 0.0;
        self.loan_term_years = 0;
    }

    pub fn increment_waitlist_time(&mut self) {
        self.waitlist_time += 1;
    }

    pub fn reset_waitlist_time(&mut self) {
        self.waitlist_time = 0;
    }

    /// Relocation decision. See the module docs.
    ///
    /// `current_house` is the dwelling referenced by the contract, if any.
    /// A candidate is considered only when `afford_fn` accepts the monthly
    /// cost `payment_fn` quotes for it. Sets `want_to_move` and returns it.
    #[allow(clippy::too_many_arguments)]
    pub fn decide_to_move<A, P>(
        &mut self,
        current_house: Option<&House>,
        candidates: &[&House],
        base_movement_cost: f64,
        afford_fn: A,
        payment_fn: P,
        params: &RelocationParams,
        rng: &mut dyn RandomSource,
    ) -> bool
    where
        A: Fn(&Household, f64) -> bool,
        P: Fn(&House) -> f64,
    {
        let current_utility = match current_house {
            Some(house) => dwelling_utility(self, house, params),
            None => params.unhoused_baseline_utility + rng.gaussian(0.0, params.noise_sd),
        };

        let mut best_utility = f64::NEG_INFINITY;
        for house in candidates {
            if !afford_fn(self, payment_fn(house)) {
                continue;
            }
            let utility = candidate_utility(self, house, base_movement_cost, params)
                + rng.gaussian(0.0, params.noise_sd);
            if utility > best_utility {
                best_utility = utility;
            }
        }

        let p = move_probability(best_utility, current_utility, params.move_probability_scale);
        self.want_to_move = p > 0.0 && rng.chance(p);
        self.want_to_move
    }
}

/// Weights of the relocation utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationParams {
    pub space_weight: f64,
    pub quality_weight: f64,
    pub price_weight: f64,
    /// Standard deviation of the idiosyncratic preference noise.
    pub noise_sd: f64,
    pub unhoused_baseline_utility: f64,
    pub tenure_switch_multiplier: f64,
    /// Tenure after which moving costs nothing extra.
    pub tenure_discount_years: f64,
    /// Price is judged against this multiple of annual income.
    pub income_price_multiple: f64,
    pub move_probability_scale: f64,
}

impl Default for RelocationParams {
    fn default() -> Self {
        Self {
            space_weight: 3.0,
            quality_weight: 0.5,
            price_weight: 1.0,
            noise_sd: 2.0,
            unhoused_baseline_utility: 1.0,
            tenure_switch_multiplier: 1.5,
            tenure_discount_years: 10.0,
            income_price_multiple: 5.0,
            move_probability_scale: 3.0,
        }
    }
}

/// Noise-free utility of living in `house`, before any movement cost.
/// Non-decreasing in size and quality.
pub fn dwelling_utility(household: &Household, house: &House, params: &RelocationParams) -> f64 {
    let persons = household.size().max(1) as f64;
    let space_per_person = house.size.max(0.0) / persons;
    let annual_income = household.total_income();
    let price_ratio = if annual_income > 0.0 {
        house.price / (params.income_price_multiple * annual_income)
    } else {
        0.0
    };
    params.space_weight * space_per_person.ln_1p()
        + params.quality_weight * house.quality as f64
        - params.price_weight * price_ratio
}

/// Cost of moving into a dwelling of `candidate_tenure`.
pub fn movement_cost(
    household: &Household,
    candidate_tenure: Tenure,
    base_movement_cost: f64,
    params: &RelocationParams,
) -> f64 {
    let years = household.contract.as_ref().map_or(0.0, |c| c.years_in_place());
    let discount = (1.0 - years / params.tenure_discount_years).max(0.0);
    let switch = match household.current_tenure() {
        Some(current) if current != candidate_tenure => params.tenure_switch_multiplier,
        _ => 1.0,
    };
    base_movement_cost * discount * switch
}

/// Noise-free utility of moving to `house`.
pub fn candidate_utility(
    household: &Household,
    house: &House,
    base_movement_cost: f64,
    params: &RelocationParams,
) -> f64 {
    dwelling_utility(household, house, params)
        - movement_cost(household, house.tenure, base_movement_cost, params)
}

/// `min(1, scale * (best - current) / current)` when the best option beats
/// the current one; 0 otherwise, and 0 when `current` is not positive.
pub fn move_probability(best_utility: f64, current_utility: f64, scale: f64) -> f64 {
    if !best_utility.is_finite() || best_utility <= current_utility || current_utility <= 0.0 {
        return 0.0;
    }
    (scale * (best_utility - current_utility) / current_utility).min(1.0)
}
