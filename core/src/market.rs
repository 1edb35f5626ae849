//! Housing market: the monthly phases that move households between
//! dwellings.
//!
//! Phases, in the order the engine calls them:
//!   1. update_prices:         every price drifts with a small random shock
//!   2. update_contracts:      tenure clocks advance, savings accrue, rent is paid
//!   3. decide_moves:          each household runs the relocation decision
//!   4. match_purchases:       movers buy the nearest-size vacant Buy house
//!      match_rentals:         remaining movers rent the nearest private let
//!   5. ration_social_housing: vacant social houses go to the longest waiters
//!   6. churn_vacancies:       owner/landlord exits vacate occupied houses
//!
//! Payment collection (7) belongs to the bank.

use crate::{
    bank::MortgageBank,
    config::MarketConfig,
    contract::{ContractType, HousingContract},
    event::SimEvent,
    house::{House, Tenure},
    household::Household,
    population::{index_by_id, release_dwelling, VacancyIndex},
    rng::RandomSource,
    types::{HouseId, Tick},
};

pub struct HousingMarket {
    config: MarketConfig,
    rng: Box<dyn RandomSource>,
}

impl HousingMarket {
    pub fn new(config: MarketConfig, rng: Box<dyn RandomSource>) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    // ── 1. Prices ──────────────────────────────────────────────────────

    pub fn update_prices(&mut self, houses: &mut [House]) {
        let drift = self.config.annual_price_drift / 12.0;
        for house in houses.iter_mut() {
            let shock = (self.rng.uniform() - 0.5) * self.config.monthly_price_volatility;
            house.update_price((1.0 + drift + shock).max(0.01));
        }
    }

    // ── 2. Contracts ───────────────────────────────────────────────────

    /// Advance every contract one month, accrue disposable income and
    /// settle rent. Mortgage instalments are left to the bank.
    pub fn update_contracts(
        &self,
        households: &mut [Household],
        houses: &[House],
        tax_rate: f64,
        expense_share: f64,
    ) {
        for household in households.iter_mut() {
            let disposable = household.monthly_income() * (1.0 - tax_rate) * (1.0 - expense_share);
            household.update_wealth(disposable);

            let Some(contract) = household.contract.as_mut() else { continue };
            contract.advance_month();
            if contract.kind.is_rental() {
                if let Some(house) = houses.get(contract.house.0) {
                    contract.monthly_cost = rent_for(&self.config, house);
                }
                let rent = contract.monthly_cost;
                household.update_wealth(-rent);
            }
        }
    }

    // ── 3. Mobility ────────────────────────────────────────────────────

    /// Run the relocation decision for every household against a random
    /// sample of vacancies. Unhoused households always keep searching.
    /// Returns the number of households that want to move.
    pub fn decide_moves(
        &mut self,
        households: &mut [Household],
        houses: &[House],
        bank: &MortgageBank,
    ) -> usize {
        let Self { config, rng } = self;
        let config = &*config;
        let vacant: Vec<&House> = houses.iter().filter(|h| h.is_available()).collect();
        let mut wanting = 0usize;
        let mut candidates: Vec<&House> = Vec::with_capacity(config.candidate_sample_size);

        for household in households.iter_mut() {
            candidates.clear();
            if !vacant.is_empty() {
                let eligible = is_social_eligible(config, household);
                for _ in 0..config.candidate_sample_size {
                    let house = vacant[rng.index(vacant.len())];
                    if house.tenure != Tenure::SocialRent || eligible {
                        candidates.push(house);
                    }
                }
            }

            let current = household.current_house().and_then(|id| houses.get(id.0));
            let wants = household.decide_to_move(
                current,
                &candidates,
                config.base_movement_cost,
                |h, payment| is_affordable(config, h, payment),
                |house| monthly_cost_for(config, bank, house),
                &config.relocation,
                rng.as_mut(),
            );
            if !wants && !household.is_housed() {
                household.want_to_move = true;
            }
            if household.want_to_move {
                wanting += 1;
            }
        }
        wanting
    }

    // ── 4. Matching ────────────────────────────────────────────────────

    /// Greedy purchase channel. Each mover looks at the single vacant Buy
    /// house nearest its space target; a vacancy is gone once taken.
    pub fn match_purchases(
        &self,
        households: &mut [Household],
        houses: &mut [House],
        bank: &MortgageBank,
        tick: Tick,
    ) -> Vec<SimEvent> {
        let cfg = &self.config;
        let mut index = VacancyIndex::build(houses, |h| h.tenure == Tenure::Buy);
        let mut events = Vec::new();

        for household in households.iter_mut().filter(|h| h.want_to_move) {
            if index.is_empty() {
                break;
            }
            let target = household.size() as f64 * cfg.space_per_person_target;
            let Some((pos, house_id)) = index.nearest(target) else { break };
            let price = houses[house_id.0].price;
            let down_payment = price * cfg.down_payment_fraction;
            let loan = price - down_payment;
            let payment = bank.payment_for(loan, cfg.mortgage_term_years);
            if !is_affordable(cfg, household, payment) {
                continue;
            }
            if bank.underwrite(household, price, down_payment).is_err() {
                continue;
            }

            release_dwelling(household, houses);
            if !bank.approve_mortgage(household, price, down_payment, cfg.mortgage_term_years) {
                log::warn!(
                    "tick={tick} market: {} lost its deposit selling its previous home; left unhoused",
                    household.id
                );
                continue;
            }

            index.take(pos);
            houses[house_id.0].change_ownership(Some(household.id));
            household.contract = Some(HousingContract::mortgaged(house_id, loan, payment));
            household.want_to_move = false;
            household.reset_waitlist_time();
            events.push(SimEvent::HousePurchased {
                tick,
                household_id: household.id,
                house_id,
                price,
                loan,
            });
        }
        events
    }

    /// Private rental channel for movers who did not buy. Owners stay put.
    pub fn match_rentals(
        &self,
        households: &mut [Household],
        houses: &mut [House],
        tick: Tick,
    ) -> Vec<SimEvent> {
        let cfg = &self.config;
        let mut index = VacancyIndex::build(houses, |h| h.tenure == Tenure::PrivateRent);
        let mut events = Vec::new();

        for household in households
            .iter_mut()
            .filter(|h| h.want_to_move && !h.is_homeowner())
        {
            if index.is_empty() {
                break;
            }
            let target = household.size() as f64 * cfg.space_per_person_target;
            let Some((pos, house_id)) = index.nearest(target) else { break };
            let rent = rent_for(cfg, &houses[house_id.0]);
            if !is_affordable(cfg, household, rent) {
                continue;
            }

            release_dwelling(household, houses);
            index.take(pos);
            houses[house_id.0].change_ownership(Some(household.id));
            household.contract = Some(HousingContract::new(ContractType::RentedFromLandlord, house_id, rent));
            household.want_to_move = false;
            household.reset_waitlist_time();
            events.push(SimEvent::HouseRented {
                tick,
                household_id: household.id,
                house_id,
                monthly_rent: rent,
            });
        }
        events
    }

    // ── 5. Social housing ──────────────────────────────────────────────

    /// Give each vacant social house to the eligible household with the
    /// longest waitlist time. Eligibility is recomputed on every call.
    pub fn ration_social_housing(
        &self,
        households: &mut [Household],
        houses: &mut [House],
        tick: Tick,
    ) -> Vec<SimEvent> {
        let cfg = &self.config;
        let mut eligible: Vec<usize> = Vec::new();
        for (i, household) in households.iter_mut().enumerate() {
            if is_social_eligible(cfg, household) {
                eligible.push(i);
            } else {
                household.reset_waitlist_time();
            }
        }

        let vacant: Vec<HouseId> = houses
            .iter()
            .filter(|h| h.tenure == Tenure::SocialRent && h.is_available())
            .map(|h| h.id)
            .collect();

        // Longest wait first; the stable sort keeps population order on ties.
        eligible.sort_by(|a, b| households[*b].waitlist_time.cmp(&households[*a].waitlist_time));
        let granted = vacant.len().min(eligible.len());
        let mut events = Vec::with_capacity(granted);

        for (&i, &house_id) in eligible.iter().zip(vacant.iter()) {
            let household = &mut households[i];
            let rent = houses[house_id.0].monthly_rent(cfg.social_rent_yield);
            houses[house_id.0].change_ownership(Some(household.id));
            household.contract = Some(HousingContract::new(ContractType::SocialHousing, house_id, rent));
            household.want_to_move = false;
            events.push(SimEvent::SocialHousingAssigned {
                tick,
                household_id: household.id,
                house_id,
                waitlist_time: household.waitlist_time,
            });
            household.reset_waitlist_time();
        }
        for &i in &eligible[granted..] {
            households[i].increment_waitlist_time();
        }

        log::debug!(
            "tick={tick} market: social eligible={} vacant={} granted={granted}",
            eligible.len(),
            vacant.len()
        );
        events
    }

    // ── 6. Vacancy churn ───────────────────────────────────────────────

    /// Each occupied house independently becomes vacant with the churn
    /// probability. Draws are made first, then the exits applied.
    pub fn churn_vacancies(
        &mut self,
        households: &mut [Household],
        houses: &mut [House],
        tick: Tick,
    ) -> Vec<SimEvent> {
        let p = self.config.vacancy_churn_probability;
        let mut exits = Vec::new();
        for house in houses.iter() {
            if let Some(owner) = house.owner {
                if self.rng.chance(p) {
                    exits.push((house.id, owner));
                }
            }
        }

        let index = index_by_id(households);
        let mut events = Vec::with_capacity(exits.len());
        for (house_id, owner) in exits {
            match index.get(&owner) {
                Some(&pos) => {
                    let household = &mut households[pos];
                    release_dwelling(household, houses);
                    household.want_to_move = true;
                }
                None => {
                    log::warn!("tick={tick} market: {house_id} owned by unknown {owner}; vacating");
                    houses[house_id.0].change_ownership(None);
                }
            }
            events.push(SimEvent::HouseVacated { tick, household_id: owner, house_id });
        }
        events
    }
}

// ── Affordability helpers ────────────────────────────────────────────────

/// A monthly housing cost is affordable when it stays within the
/// configured share of monthly income.
pub fn is_affordable(config: &MarketConfig, household: &Household, monthly_cost: f64) -> bool {
    monthly_cost <= config.affordability_ratio * household.monthly_income()
}

pub fn is_social_eligible(config: &MarketConfig, household: &Household) -> bool {
    !household.is_housed() && household.total_income() < config.social_income_threshold
}

/// Monthly rent for a rental dwelling at its tenure's yield.
pub fn rent_for(config: &MarketConfig, house: &House) -> f64 {
    match house.tenure {
        Tenure::SocialRent => house.monthly_rent(config.social_rent_yield),
        Tenure::PrivateRent | Tenure::Buy => house.monthly_rent(config.private_rent_yield),
    }
}

/// What living in `house` would cost per month: the mortgage instalment
/// for a standard purchase, or the rent.
pub fn monthly_cost_for(config: &MarketConfig, bank: &MortgageBank, house: &House) -> f64 {
    match house.tenure {
        Tenure::Buy => {
            let loan = house.price * (1.0 - config.down_payment_fraction);
            bank.payment_for(loan, config.mortgage_term_years)
        }
        Tenure::PrivateRent | Tenure::SocialRent => rent_for(config, house),
    }
}
