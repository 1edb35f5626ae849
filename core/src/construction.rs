//! Construction supplier: adds new dwellings to the stock once a year.

use crate::{
    config::ConstructionConfig,
    event::SimEvent,
    house::{draw_quality, House},
    household::Household,
    rng::RandomSource,
    types::{HouseId, Tick},
};

pub struct ConstructionSupplier {
    config: ConstructionConfig,
    rng: Box<dyn RandomSource>,
}

impl ConstructionSupplier {
    pub fn new(config: ConstructionConfig, rng: Box<dyn RandomSource>) -> Self {
        Self { config, rng }
    }

    /// Candidates drawn per year at this scale.
    pub fn planned_count(&self, scale_factor: f64) -> usize {
        (self.config.base_annual_count / scale_factor).round().max(0.0) as usize
    }

    /// One candidate dwelling with the given id.
    pub fn draw_house(&mut self, id: HouseId) -> House {
        let c = &self.config;
        let size = self
            .rng
            .gaussian(c.size_mean, c.size_sd)
            .clamp(c.size_min, c.size_max);
        let quality = draw_quality(self.rng.as_mut());
        let tenure = c.tenure_mix.draw(self.rng.as_mut());
        let price = c.price_model.price(size, quality, tenure);
        House::new(id, size, quality, tenure, price)
    }

    /// Draw this year's candidates and keep those large enough for at
    /// least one existing household. Kept houses are numbered from
    /// `next_id` and returned for the caller to append to the stock.
    pub fn build_year(
        &mut self,
        households: &[Household],
        next_id: usize,
        scale_factor: f64,
        tick: Tick,
    ) -> (Vec<House>, Vec<SimEvent>) {
        // A house fits someone iff it fits the smallest household.
        let Some(smallest) = households.iter().map(Household::size).min() else {
            log::debug!("tick={tick} construction: no households, nothing built");
            return (Vec::new(), Vec::new());
        };
        let min_size = self.config.min_area_per_person * smallest as f64;

        let planned = self.planned_count(scale_factor);
        let mut built = Vec::new();
        for _ in 0..planned {
            let candidate = self.draw_house(HouseId(next_id + built.len()));
            if candidate.size >= min_size {
                built.push(candidate);
            }
        }

        let events = built
            .iter()
            .map(|h| SimEvent::HouseConstructed {
                tick,
                house_id: h.id,
                size: h.size,
                tenure: h.tenure,
                price: h.price,
            })
            .collect();
        log::debug!("tick={tick} construction: planned={planned} built={}", built.len());
        (built, events)
    }
}
