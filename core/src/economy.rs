//! Yearly household economics: income re-draws, income percentiles and
//! the wealth-driven tax rate.

use crate::{
    config::EconomyConfig,
    error::SimResult,
    household::{Gender, Household},
    reference::ReferenceTables,
    rng::RandomSource,
    types::Tick,
};

pub struct HouseholdEconomy {
    config: EconomyConfig,
    rng: Box<dyn RandomSource>,
}

impl HouseholdEconomy {
    pub fn new(config: EconomyConfig, rng: Box<dyn RandomSource>) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Re-draw every member's income for their current age, then rank
    /// households into income percentiles.
    pub fn update_incomes(
        &mut self,
        households: &mut [Household],
        tables: &ReferenceTables,
        tick: Tick,
    ) -> SimResult<()> {
        let mut unemployed = 0usize;
        for person in households.iter_mut().flat_map(|h| h.members.iter_mut()) {
            person.income = draw_income(tables, &self.config, person.age, person.gender, self.rng.as_mut())?;
            if is_working_age(&self.config, person.age) && person.income == 0.0 {
                unemployed += 1;
            }
        }
        assign_income_percentiles(households);
        log::debug!("tick={tick} economy: incomes redrawn, {unemployed} working-age persons without income");
        Ok(())
    }

    /// Nudge the tax rate by one step against average wealth.
    pub fn update_tax_rate(&self, households: &[Household], tax_rate: f64) -> f64 {
        next_tax_rate(&self.config, households, tax_rate)
    }
}

/// Annual income for one person: table income with multiplicative noise,
/// zero for dependants and for the unemployed share of working age.
pub fn draw_income(
    tables: &ReferenceTables,
    config: &EconomyConfig,
    age: u32,
    gender: Gender,
    rng: &mut dyn RandomSource,
) -> SimResult<f64> {
    if age < config.working_age_min {
        return Ok(0.0);
    }
    if is_working_age(config, age) && rng.chance(config.unemployment_rate) {
        return Ok(0.0);
    }
    let base = tables.income(age, gender)?;
    let noise = 1.0 + rng.gaussian(0.0, config.income_noise_sd);
    Ok((base * noise).max(0.0))
}

pub fn is_working_age(config: &EconomyConfig, age: u32) -> bool {
    (config.working_age_min..config.retirement_age).contains(&age)
}

/// Rank households by total income. Percentiles run 0..=99.
pub fn assign_income_percentiles(households: &mut [Household]) {
    let n = households.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        households[a]
            .total_income()
            .total_cmp(&households[b].total_income())
            .then(households[a].id.cmp(&households[b].id))
    });
    for (rank, &i) in order.iter().enumerate() {
        households[i].income_percentile = Some((rank * 100 / n) as u8);
    }
}

/// Average wealth above the high threshold raises the rate one step,
/// below the low threshold lowers it. Clamped to the configured band.
pub fn next_tax_rate(config: &EconomyConfig, households: &[Household], tax_rate: f64) -> f64 {
    if households.is_empty() {
        return tax_rate;
    }
    let average_wealth = households.iter().map(|h| h.wealth).sum::<f64>() / households.len() as f64;
    let next = if average_wealth > config.high_wealth_threshold {
        tax_rate + config.tax_rate_step
    } else if average_wealth < config.low_wealth_threshold {
        tax_rate - config.tax_rate_step
    } else {
        tax_rate
    };
    next.clamp(config.tax_rate_min, config.tax_rate_max)
}
