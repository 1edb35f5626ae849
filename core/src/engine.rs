//! The simulation engine: wires the components together and drives the
//! monthly and yearly schedules.
//!
//! MONTHLY ORDER (fixed, never reordered):
//!   1. Price update
//!   2. Contract update and wealth accrual
//!   3. Mobility decisions
//!   4. Market matching (purchase, then private rental)
//!   5. Social housing rationing
//!   6. Vacancy churn
//!   7. Mortgage payment collection
//!
//! YEARLY ORDER:
//!   1. Demographics (mortality, fertility, migration, aging)
//!   2. Income update
//!   3. Tax-rate update
//!   4. Construction
//!
//! RULES:
//!   - The engine owns the components; the caller owns the population
//!     and the stock and passes them in on every tick.
//!   - All randomness flows through the RngBank, one stream per component.
//!   - Events are buffered and handed out by take_events().

use crate::{
    bank::MortgageBank,
    clock::SimClock,
    config::SimConfig,
    construction::ConstructionSupplier,
    demographics::DemographicEngine,
    economy::HouseholdEconomy,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    generator::PopulationGenerator,
    house::House,
    household::Household,
    market::HousingMarket,
    reference::ReferenceTables,
    rng::{RandomSource, RngBank, SubsystemSlot},
    types::{HouseholdIds, RunId, Tick},
};

pub struct SimEngine {
    pub run_id:   RunId,
    pub clock:    SimClock,
    seed:         u64,
    config:       SimConfig,
    tables:       ReferenceTables,
    scale_factor: f64,
    tax_rate:     f64,
    generator:    PopulationGenerator,
    market:       HousingMarket,
    bank:         MortgageBank,
    demographics: DemographicEngine,
    economy:      HouseholdEconomy,
    construction: ConstructionSupplier,
    ids:          HouseholdIds,
    events:       Vec<SimEvent>,
}

impl SimEngine {
    /// Build an engine whose components draw from per-slot streams of `seed`.
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        tables: ReferenceTables,
    ) -> SimResult<Self> {
        let bank = RngBank::new(seed);
        Self::with_rng(run_id, seed, config, tables, |slot| {
            Box::new(bank.for_slot(slot)) as Box<dyn RandomSource>
        })
    }

    /// Build an engine with caller-supplied randomness per slot.
    pub fn with_rng<F>(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        tables: ReferenceTables,
        mut rng_for: F,
    ) -> SimResult<Self>
    where
        F: FnMut(SubsystemSlot) -> Box<dyn RandomSource>,
    {
        config.validate()?;
        tables.validate()?;
        Ok(Self {
            clock:        SimClock::new(run_id.clone()),
            seed,
            scale_factor: 1.0,
            tax_rate:     config.economy.initial_tax_rate,
            generator:    PopulationGenerator::new(rng_for(SubsystemSlot::Generator)),
            market:       HousingMarket::new(config.market.clone(), rng_for(SubsystemSlot::Market)),
            bank:         MortgageBank::new(&config.bank)?,
            demographics: DemographicEngine::new(rng_for(SubsystemSlot::Demographics)),
            economy:      HouseholdEconomy::new(config.economy.clone(), rng_for(SubsystemSlot::Economy)),
            construction: ConstructionSupplier::new(
                config.construction.clone(),
                rng_for(SubsystemSlot::Construction),
            ),
            ids:          HouseholdIds::new(),
            events:       Vec::new(),
            config,
            tables,
            run_id,
        })
    }

    pub fn bank(&self) -> &MortgageBank {
        &self.bank
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Tax rate applied by the monthly accrual.
    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Generate the initial population and stock and house everyone.
    /// Each simulated agent stands for `scale_factor` real ones.
    pub fn initialize(&mut self, scale_factor: f64) -> SimResult<(Vec<Household>, Vec<House>)> {
        if !(scale_factor > 0.0 && scale_factor.is_finite()) {
            return Err(SimError::Config(format!("scale factor must be positive, got {scale_factor}")));
        }
        self.scale_factor = scale_factor;

        let mut households =
            self.generator
                .generate_households(&self.config, &self.tables, scale_factor, &mut self.ids);
        let mut houses = self.generator.generate_houses(&self.config, &households, scale_factor);
        self.generator
            .assign_dwellings(&self.config, &self.tables, &mut households, &mut houses)?;

        log::info!(
            "run={} initialized: seed={} scale={scale_factor} households={} houses={}",
            self.run_id,
            self.seed,
            households.len(),
            houses.len()
        );
        self.events.push(SimEvent::RunInitialized {
            run_id:     self.run_id.clone(),
            seed:       self.seed,
            households: households.len(),
            houses:     houses.len(),
        });
        self.check(&households, &houses, 0)?;
        Ok((households, houses))
    }

    /// Advance one month. This is the core simulation step.
    pub fn monthly_tick(
        &mut self,
        households: &mut [Household],
        houses: &mut [House],
    ) -> SimResult<Tick> {
        let tick = self.clock.advance();
        let expense_share = self.economy.config().expense_share;

        self.market.update_prices(houses);
        self.market.update_contracts(households, houses, self.tax_rate, expense_share);
        let movers = self.market.decide_moves(households, houses, &self.bank);

        let purchases = self.market.match_purchases(households, houses, &self.bank, tick);
        let rentals = self.market.match_rentals(households, houses, tick);
        let social = self.market.ration_social_housing(households, houses, tick);
        let churn = self.market.churn_vacancies(households, houses, tick);
        let servicing = self.bank.collect_payments(households, houses, tick);

        log::debug!(
            "tick={tick} market: movers={movers} purchases={} rentals={} social={} vacated={}",
            purchases.len(),
            rentals.len(),
            social.len(),
            churn.len()
        );

        self.events.extend(purchases);
        self.events.extend(rentals);
        self.events.extend(social);
        self.events.extend(churn);
        self.events.extend(servicing);

        self.check(households, houses, tick)?;
        Ok(tick)
    }

    /// Run the yearly schedule at the current tick. Returns the new tax rate,
    /// which also becomes the rate for the following months.
    pub fn yearly_tick(
        &mut self,
        households: &mut Vec<Household>,
        houses: &mut Vec<House>,
        tax_rate: f64,
    ) -> SimResult<f64> {
        let tick = self.clock.current_tick;
        if let Some(max_id) = households.iter().map(|h| h.id.0).max() {
            self.ids.skip_past(max_id);
        }

        let (_, demographic_events) =
            self.demographics
                .run_year(households, houses, &self.tables, &mut self.ids, tick)?;
        self.events.extend(demographic_events);

        self.economy.update_incomes(households, &self.tables, tick)?;
        let next_rate = self.economy.update_tax_rate(households, tax_rate);
        if next_rate != tax_rate {
            log::debug!("tick={tick} economy: tax rate {tax_rate:.2} -> {next_rate:.2}");
        }

        let (built, construction_events) =
            self.construction
                .build_year(households, houses.len(), self.scale_factor, tick);
        houses.extend(built);
        self.events.extend(construction_events);

        self.tax_rate = next_rate;
        self.events.push(SimEvent::YearCompleted {
            tick,
            year: self.clock.year(),
            tax_rate: next_rate,
        });
        log::info!(
            "run={} year {} done: households={} houses={}",
            self.run_id,
            self.clock.year(),
            households.len(),
            houses.len()
        );

        self.check(households, houses, tick)?;
        Ok(next_rate)
    }

    /// Drain the events buffered since the last call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Wrap events as event-log rows for persistence.
    pub fn log_entries(&self, events: &[SimEvent]) -> SimResult<Vec<EventLogEntry>> {
        events
            .iter()
            .map(|event| {
                Ok(EventLogEntry {
                    id:         None,
                    run_id:     self.run_id.clone(),
                    tick:       event_tick(event),
                    event_type: event.type_name().to_string(),
                    payload:    serde_json::to_string(event)?,
                })
            })
            .collect()
    }

    #[cfg(debug_assertions)]
    fn check(&self, households: &[Household], houses: &[House], tick: Tick) -> SimResult<()> {
        crate::population::verify_occupancy(households, houses, tick)
    }

    #[cfg(not(debug_assertions))]
    fn check(&self, _households: &[Household], _houses: &[House], _tick: Tick) -> SimResult<()> {
        Ok(())
    }
}

/// The tick an event belongs to. Run initialization is tick 0.
fn event_tick(event: &SimEvent) -> Tick {
    match event {
        SimEvent::RunInitialized { .. } => 0,
        SimEvent::YearCompleted { tick, .. }
        | SimEvent::HousePurchased { tick, .. }
        | SimEvent::HouseRented { tick, .. }
        | SimEvent::SocialHousingAssigned { tick, .. }
        | SimEvent::HouseVacated { tick, .. }
        | SimEvent::MortgageRepaid { tick, .. }
        | SimEvent::ForeclosureRecorded { tick, .. }
        | SimEvent::HouseholdDissolved { tick, .. }
        | SimEvent::MigrationApplied { tick, .. }
        | SimEvent::HouseConstructed { tick, .. } => *tick,
    }
}
