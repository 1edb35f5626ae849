//! Dwellings, their tenure, and the price formula shared by the
//! initial stock and new construction.

use crate::{
    error::{SimError, SimResult},
    rng::RandomSource,
    types::{HouseId, HouseholdId},
};
use serde::{Deserialize, Serialize};

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    SocialRent,
    PrivateRent,
    Buy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    /// Floor area in square metres.
    pub size: f64,
    pub quality: u8,
    pub tenure: Tenure,
    pub price: f64,
    pub owner: Option<HouseholdId>,
}

impl House {
    pub fn new(id: HouseId, size: f64, quality: u8, tenure: Tenure, price: f64) -> Self {
        Self { id, size, quality, tenure, price, owner: None }
    }

    pub fn is_available(&self) -> bool {
        self.owner.is_none()
    }

    pub fn change_ownership(&mut self, new_owner: Option<HouseholdId>) {
        self.owner = new_owner;
    }

    pub fn update_price(&mut self, factor: f64) {
        self.price *= factor;
    }

    /// Monthly rent implied by an annual rental yield on the price.
    pub fn monthly_rent(&self, annual_yield: f64) -> f64 {
        self.price * annual_yield / 12.0
    }
}

/// Deterministic price from physical attributes and tenure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceModel {
    pub price_per_m2: f64,
    pub quality_base: f64,
    pub quality_step: f64,
    pub buy_premium: f64,
}

impl Default for PriceModel {
    fn default() -> Self {
        Self {
            price_per_m2: 2_000.0,
            quality_base: 0.5,
            quality_step: 0.1,
            buy_premium: 1.2,
        }
    }
}

impl PriceModel {
    pub fn price(&self, size: f64, quality: u8, tenure: Tenure) -> f64 {
        let base = size * self.price_per_m2;
        let quality_multiplier = self.quality_base + quality as f64 * self.quality_step;
        let tenure_multiplier = if tenure == Tenure::Buy { self.buy_premium } else { 1.0 };
        base * quality_multiplier * tenure_multiplier
    }
}

/// Fixed mixture of tenure types for newly created dwellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenureMix {
    pub buy: f64,
    pub private_rent: f64,
    pub social_rent: f64,
}

impl Default for TenureMix {
    fn default() -> Self {
        Self { buy: 0.6, private_rent: 0.3, social_rent: 0.1 }
    }
}

impl TenureMix {
    pub fn validate(&self) -> SimResult<()> {
        let parts = [self.buy, self.private_rent, self.social_rent];
        if parts.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(SimError::Config(format!("tenure mix shares must lie in [0,1]: {self:?}")));
        }
        let total: f64 = parts.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(SimError::Config(format!("tenure mix must sum to 1, got {total}")));
        }
        Ok(())
    }

    pub fn draw(&self, rng: &mut dyn RandomSource) -> Tenure {
        let roll = rng.uniform();
        if roll < self.buy {
            Tenure::Buy
        } else if roll < self.buy + self.private_rent {
            Tenure::PrivateRent
        } else {
            Tenure::SocialRent
        }
    }
}

/// Draw a quality score uniformly in [MIN_QUALITY, MAX_QUALITY].
pub fn draw_quality(rng: &mut dyn RandomSource) -> u8 {
    rng.int_range(MIN_QUALITY as i64, MAX_QUALITY as i64 + 1) as u8
}
