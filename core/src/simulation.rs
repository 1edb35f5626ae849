//! A run in progress: the engine plus the state it advances.

use crate::{
    engine::SimEngine,
    error::SimResult,
    event::SimEvent,
    house::House,
    household::Household,
    stats::TickStatistics,
    types::MONTHS_PER_YEAR,
};

pub struct Simulation {
    pub engine:     SimEngine,
    pub households: Vec<Household>,
    pub houses:     Vec<House>,
    pub tax_rate:   f64,
}

impl Simulation {
    /// Initialize the population and stock at `scale_factor`.
    pub fn start(mut engine: SimEngine, scale_factor: f64) -> SimResult<Self> {
        let (households, houses) = engine.initialize(scale_factor)?;
        let tax_rate = engine.tax_rate();
        Ok(Self { engine, households, houses, tax_rate })
    }

    /// One month, followed by the yearly schedule when the month closes a year.
    pub fn step_month(&mut self) -> SimResult<()> {
        self.engine.monthly_tick(&mut self.households, &mut self.houses)?;
        if self.engine.clock.is_year_end() {
            self.tax_rate = self
                .engine
                .yearly_tick(&mut self.households, &mut self.houses, self.tax_rate)?;
        }
        Ok(())
    }

    /// Run n months in a loop.
    pub fn run_months(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.step_month()?;
        }
        Ok(())
    }

    /// Run twelve months and report the statistics at year end.
    pub fn run_year(&mut self) -> SimResult<TickStatistics> {
        self.run_months(MONTHS_PER_YEAR)?;
        Ok(self.statistics())
    }

    pub fn statistics(&self) -> TickStatistics {
        TickStatistics::compute(self.engine.clock.current_tick, &self.households, &self.houses)
    }

    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.engine.take_events()
    }
}
