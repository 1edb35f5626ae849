//! Initial population and housing stock.
//!
//! Household counts come from the reference composition tables divided
//! by the scale factor. The stock is sized to cover every household,
//! and each household is placed in the vacant house closest to its
//! space target.

use crate::{
    bank::MortgageBank,
    config::SimConfig,
    contract::{ContractType, HousingContract},
    economy::{assign_income_percentiles, draw_income},
    error::{SimError, SimResult},
    house::{draw_quality, House, Tenure},
    household::{Gender, Household, Person},
    market::rent_for,
    population::VacancyIndex,
    reference::{HouseholdType, ReferenceTables},
    rng::RandomSource,
    types::{HouseId, HouseholdIds},
};

pub struct PopulationGenerator {
    rng: Box<dyn RandomSource>,
}

impl PopulationGenerator {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Build the scaled household population. Households that fail to
    /// generate are logged and skipped.
    pub fn generate_households(
        &mut self,
        config: &SimConfig,
        tables: &ReferenceTables,
        scale_factor: f64,
        ids: &mut HouseholdIds,
    ) -> Vec<Household> {
        let mut households = Vec::new();
        for (&kind, &count) in &tables.composition.household_type_counts {
            let target = (count as f64 / scale_factor).round() as usize;
            for _ in 0..target {
                match self.build_members(kind, config, tables) {
                    Ok(members) => {
                        let income: f64 = members.iter().map(|m| m.income).sum();
                        let wealth = config.economy.initial_wealth_multiple * income;
                        households.push(Household::new(ids.next_id(), members, wealth));
                    }
                    Err(e) => log::warn!("generator: skipped {kind:?} household: {e}"),
                }
            }
        }
        assign_income_percentiles(&mut households);
        households
    }

    fn build_members(
        &mut self,
        kind: HouseholdType,
        config: &SimConfig,
        tables: &ReferenceTables,
    ) -> SimResult<Vec<Person>> {
        let adults: Vec<Gender> = match kind {
            HouseholdType::OnePerson => vec![Gender::draw(self.rng.as_mut())],
            HouseholdType::MarriedCouple | HouseholdType::MarriedCoupleWithChildren => {
                vec![Gender::Male, Gender::Female]
            }
            HouseholdType::OneMotherWithChildren => vec![Gender::Female],
            HouseholdType::OneFatherWithChildren => vec![Gender::Male],
        };
        let children = match kind {
            HouseholdType::OnePerson | HouseholdType::MarriedCouple => 0,
            _ => tables.draw_children(self.rng.as_mut())?,
        };

        let mut members = Vec::with_capacity(adults.len() + children as usize);
        for gender in adults {
            let age = tables.draw_adult_age(self.rng.as_mut())?;
            let income = draw_income(tables, &config.economy, age, gender, self.rng.as_mut())?;
            members.push(Person::new(age, gender, income));
        }
        for _ in 0..children {
            let gender = Gender::draw(self.rng.as_mut());
            let age = tables.draw_child_age(self.rng.as_mut())?;
            let income = draw_income(tables, &config.economy, age, gender, self.rng.as_mut())?;
            members.push(Person::new(age, gender, income));
        }
        Ok(members)
    }

    /// Initial stock: the scaled real-world count, but never fewer than
    /// `min_stock_per_household` houses per household.
    pub fn generate_houses(
        &mut self,
        config: &SimConfig,
        households: &[Household],
        scale_factor: f64,
    ) -> Vec<House> {
        let c = &config.construction;
        let scaled = c.initial_stock / scale_factor;
        let floor = c.min_stock_per_household * households.len() as f64;
        let count = scaled.max(floor).ceil() as usize;

        let average_size = if households.is_empty() {
            1.0
        } else {
            households.iter().map(Household::size).sum::<usize>() as f64 / households.len() as f64
        };
        let mean_area = average_size * config.market.space_per_person_target;

        (0..count)
            .map(|i| {
                let size = self
                    .rng
                    .gaussian(mean_area, c.initial_size_sd)
                    .clamp(c.size_min, c.size_max);
                let quality = draw_quality(self.rng.as_mut());
                let tenure = c.tenure_mix.draw(self.rng.as_mut());
                let price = c.price_model.price(size, quality, tenure);
                House::new(HouseId(i), size, quality, tenure, price)
            })
            .collect()
    }

    /// Place every household in the vacant house nearest its space target
    /// and give it the contract that house's tenure implies.
    pub fn assign_dwellings(
        &mut self,
        config: &SimConfig,
        tables: &ReferenceTables,
        households: &mut [Household],
        houses: &mut [House],
    ) -> SimResult<()> {
        let rate = config.bank.initial_interest_rate;
        let term_years = config.market.mortgage_term_years;
        let term_months = term_years * 12;
        let mortgaged_share = tables.mortgaged_owner_share();
        let mut index = VacancyIndex::build(houses, |_| true);

        for household in households.iter_mut() {
            let target = household.size() as f64 * config.market.space_per_person_target;
            let (pos, house_id) = index.nearest(target).ok_or_else(|| {
                SimError::Config(format!("housing stock exhausted placing {}", household.id))
            })?;
            index.take(pos);
            let house = &mut houses[house_id.0];
            house.change_ownership(Some(household.id));

            let contract = match house.tenure {
                Tenure::Buy if self.rng.chance(mortgaged_share) => {
                    let principal = house.price * (1.0 - config.market.down_payment_fraction);
                    let paid = self.rng.int_range(0, term_months as i64) as u32;
                    let balance = MortgageBank::remaining_balance(principal, rate, term_months, paid);
                    let payment = MortgageBank::monthly_payment(principal, rate, term_months);
                    household.set_loan(balance, term_years);
                    let mut contract = HousingContract::mortgaged(house_id, balance, payment);
                    contract.payments_made = paid;
                    contract.months_elapsed = paid;
                    contract
                }
                Tenure::Buy => HousingContract::outright(house_id),
                Tenure::PrivateRent => HousingContract::new(
                    ContractType::RentedFromLandlord,
                    house_id,
                    rent_for(&config.market, house),
                ),
                Tenure::SocialRent => HousingContract::new(
                    ContractType::SocialHousing,
                    house_id,
                    rent_for(&config.market, house),
                ),
            };
            household.contract = Some(contract);
        }
        Ok(())
    }
}
