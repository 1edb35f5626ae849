//! Aggregate statistics over the population and the stock.
//!
//! Every average or rate over an empty set is reported as 0.

use crate::{
    house::{House, Tenure},
    household::Household,
    types::Tick,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickStatistics {
    pub tick: Tick,
    pub households: usize,
    pub population: usize,
    pub avg_household_size: f64,
    pub houses: usize,
    pub vacant_houses: usize,
    pub avg_purchase_price: f64,
    pub avg_monthly_rent: f64,
    pub homeownership_rate: f64,
    pub avg_household_income: f64,
    /// Share of all members with zero income, dependants included.
    pub unemployment_rate: f64,
    pub wanting_to_move: usize,
    /// Mean floor area per person over housed households.
    pub area_per_person: f64,
}

impl TickStatistics {
    pub fn compute(tick: Tick, households: &[Household], houses: &[House]) -> Self {
        let population: usize = households.iter().map(Household::size).sum();

        let buy_prices: Vec<f64> = houses
            .iter()
            .filter(|h| h.tenure == Tenure::Buy)
            .map(|h| h.price)
            .collect();
        let rents: Vec<f64> = households
            .iter()
            .filter_map(|h| h.contract.as_ref())
            .filter(|c| c.kind.is_rental())
            .map(|c| c.monthly_cost)
            .collect();

        let owners = households.iter().filter(|h| h.is_homeowner()).count();
        let jobless = households
            .iter()
            .flat_map(|h| h.members.iter())
            .filter(|p| p.income == 0.0)
            .count();

        let (housed_area, housed_people) = households
            .iter()
            .filter_map(|h| {
                let id = h.current_house()?;
                houses.get(id.0).map(|house| (house.size, h.size()))
            })
            .fold((0.0, 0usize), |(area, people), (size, n)| (area + size, people + n));

        Self {
            tick,
            households: households.len(),
            population,
            avg_household_size: ratio(population as f64, households.len()),
            houses: houses.len(),
            vacant_houses: houses.iter().filter(|h| h.is_available()).count(),
            avg_purchase_price: mean(&buy_prices),
            avg_monthly_rent: mean(&rents),
            homeownership_rate: ratio(owners as f64, households.len()),
            avg_household_income: ratio(
                households.iter().map(Household::total_income).sum(),
                households.len(),
            ),
            unemployment_rate: ratio(jobless as f64, population),
            wanting_to_move: households.iter().filter(|h| h.want_to_move).count(),
            area_per_person: ratio(housed_area, housed_people),
        }
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

fn mean(values: &[f64]) -> f64 {
    ratio(values.iter().sum(), values.len())
}
