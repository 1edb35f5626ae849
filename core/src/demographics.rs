//! Demographic engine: the yearly population update.
//!
//! PHASES (fixed order, each sees only the result of the previous one):
//!   1. Mortality: per-person death draws; emptied households dissolve
//!   2. Fertility: women of child-bearing age may add a newborn
//!   3. Migration: net inflow creates migrant households, net outflow
//!      removes randomly chosen ones
//!   4. Aging: everyone gets a year older
//!
//! RULE: every phase draws first and applies afterwards. No household
//! or person is added or removed while the population is being iterated.

use crate::{
    error::SimResult,
    event::SimEvent,
    house::House,
    household::{Gender, Household, Person},
    population::dissolve_households,
    reference::ReferenceTables,
    rng::RandomSource,
    types::{HouseholdId, HouseholdIds, Tick},
};
use std::collections::HashSet;

/// First age with a fertility entry.
pub const FERTILE_AGE_MIN: u32 = 15;
pub const FERTILE_AGE_MAX: u32 = 49;

/// Counts from one yearly update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicSummary {
    pub deaths: usize,
    pub births: usize,
    pub net_migration: i64,
    pub dissolved: usize,
}

pub struct DemographicEngine {
    rng: Box<dyn RandomSource>,
}

impl DemographicEngine {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Run all four phases in order.
    pub fn run_year(
        &mut self,
        households: &mut Vec<Household>,
        houses: &mut [House],
        tables: &ReferenceTables,
        ids: &mut HouseholdIds,
        tick: Tick,
    ) -> SimResult<(DemographicSummary, Vec<SimEvent>)> {
        let mut summary = DemographicSummary::default();
        let mut events = Vec::new();

        let (deaths, dissolved) = self.apply_mortality(households, houses, tables, tick)?;
        summary.deaths = deaths;
        summary.dissolved += dissolved.len();
        events.extend(dissolved);

        summary.births = self.apply_fertility(households, tables)?;

        let (net, migration_events) = self.apply_migration(households, houses, tables, ids, tick)?;
        summary.net_migration = net;
        summary.dissolved += migration_events
            .iter()
            .filter(|e| matches!(e, SimEvent::HouseholdDissolved { .. }))
            .count();
        events.extend(migration_events);

        age_population(households);

        log::debug!(
            "tick={tick} demographics: deaths={} births={} net_migration={} dissolved={} households={}",
            summary.deaths,
            summary.births,
            summary.net_migration,
            summary.dissolved,
            households.len()
        );
        Ok((summary, events))
    }

    // ── 1. Mortality ───────────────────────────────────────────────────

    /// Returns the number of deaths and the dissolution events for
    /// households left without members.
    pub fn apply_mortality(
        &mut self,
        households: &mut Vec<Household>,
        houses: &mut [House],
        tables: &ReferenceTables,
        tick: Tick,
    ) -> SimResult<(usize, Vec<SimEvent>)> {
        let mut deaths: Vec<(usize, usize)> = Vec::new();
        for (i, household) in households.iter().enumerate() {
            for (j, person) in household.members.iter().enumerate() {
                let rate = tables.mortality_rate(person.gender.is_female(), person.age)?;
                if self.rng.chance(rate) {
                    deaths.push((i, j));
                }
            }
        }

        // Reverse order keeps member positions valid while removing.
        for &(i, j) in deaths.iter().rev() {
            households[i].members.remove(j);
        }

        let emptied: HashSet<HouseholdId> = households
            .iter()
            .filter(|h| h.members.is_empty())
            .map(|h| h.id)
            .collect();
        let events = dissolve_households(households, houses, &emptied, tick);
        Ok((deaths.len(), events))
    }

    // ── 2. Fertility ───────────────────────────────────────────────────

    pub fn apply_fertility(
        &mut self,
        households: &mut [Household],
        tables: &ReferenceTables,
    ) -> SimResult<usize> {
        let multiplier = tables.demography.birth_trend_multiplier;
        let mut births: Vec<usize> = Vec::new();
        for (i, household) in households.iter().enumerate() {
            for person in &household.members {
                if !person.gender.is_female() || !(FERTILE_AGE_MIN..=FERTILE_AGE_MAX).contains(&person.age) {
                    continue;
                }
                let rate = tables.birth_rate(person.age - FERTILE_AGE_MIN)? * multiplier;
                if self.rng.chance(rate) {
                    births.push(i);
                }
            }
        }

        for &i in &births {
            let gender = Gender::draw(self.rng.as_mut());
            households[i].members.push(Person::newborn(gender));
        }
        Ok(births.len())
    }

    // ── 3. Migration ───────────────────────────────────────────────────

    /// Returns the signed household delta and the events it produced.
    pub fn apply_migration(
        &mut self,
        households: &mut Vec<Household>,
        houses: &mut [House],
        tables: &ReferenceTables,
        ids: &mut HouseholdIds,
        tick: Tick,
    ) -> SimResult<(i64, Vec<SimEvent>)> {
        let net = net_migration(tables, households.len());
        let mut events = Vec::new();

        if net > 0 {
            let female_share = tables.demography.migration.female_share;
            let mut arrivals = Vec::with_capacity(net as usize);
            for _ in 0..net {
                let is_female = self.rng.chance(female_share);
                let gender = if is_female { Gender::Female } else { Gender::Male };
                let age = tables.draw_migrant_age(is_female, self.rng.as_mut());
                let income = tables.income(age, gender)?;
                let mut migrant = Household::new(ids.next_id(), vec![Person::new(age, gender, income)], 0.0);
                migrant.want_to_move = true;
                arrivals.push(migrant);
            }
            households.extend(arrivals);
        } else if net < 0 {
            let leaving = (net.unsigned_abs() as usize).min(households.len());
            let mut pool: Vec<HouseholdId> = households.iter().map(|h| h.id).collect();
            let mut doomed = HashSet::with_capacity(leaving);
            for _ in 0..leaving {
                let pick = self.rng.index(pool.len());
                doomed.insert(pool.swap_remove(pick));
            }
            events.extend(dissolve_households(households, houses, &doomed, tick));
        }

        if net != 0 {
            events.push(SimEvent::MigrationApplied { tick, net_households: net });
        }
        Ok((net, events))
    }
}

// ── 4. Aging ──────────────────────────────────────────────────────────────

pub fn age_population(households: &mut [Household]) {
    for person in households.iter_mut().flat_map(|h| h.members.iter_mut()) {
        person.increment_age();
    }
}

/// `floor(net_migration_per_year / initial_population_size * household_count)`.
pub fn net_migration(tables: &ReferenceTables, household_count: usize) -> i64 {
    let m = &tables.demography.migration;
    (m.net_migration_per_year / m.initial_population_size * household_count as f64).floor() as i64
}
