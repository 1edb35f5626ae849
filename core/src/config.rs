use crate::{
    error::{SimError, SimResult},
    house::{PriceModel, TenureMix},
    household::RelocationParams,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

// ── Market ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub base_movement_cost: f64,
    /// Target floor area per household member, in m².
    pub space_per_person_target: f64,
    /// Maximum share of monthly income a housing payment may take.
    pub affordability_ratio: f64,
    pub down_payment_fraction: f64,
    pub mortgage_term_years: u32,
    /// Annual household income below which social housing is available.
    pub social_income_threshold: f64,
    pub vacancy_churn_probability: f64,
    /// Vacancies evaluated per household per month.
    pub candidate_sample_size: usize,
    pub annual_price_drift: f64,
    pub monthly_price_volatility: f64,
    pub private_rent_yield: f64,
    pub social_rent_yield: f64,
    pub relocation: RelocationParams,
}

// ── Bank ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Annual rate as a fraction (0.03 = 3%).
    pub initial_interest_rate: f64,
    pub max_ltv: f64,
    /// Maximum loan as a multiple of annual household income.
    pub max_dti: f64,
}

// ── Construction and initial stock ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionConfig {
    /// Real-world completions per year, divided by the scale factor.
    pub base_annual_count: f64,
    pub size_mean: f64,
    pub size_sd: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub min_area_per_person: f64,
    pub tenure_mix: TenureMix,
    pub price_model: PriceModel,
    /// Real-world dwelling stock at the start of the run.
    pub initial_stock: f64,
    pub initial_size_sd: f64,
    /// Initial stock is at least this multiple of the household count.
    pub min_stock_per_household: f64,
}

// ── Household economy ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub initial_tax_rate: f64,
    pub tax_rate_min: f64,
    pub tax_rate_max: f64,
    pub tax_rate_step: f64,
    pub high_wealth_threshold: f64,
    pub low_wealth_threshold: f64,
    /// Share of disposable income spent on living costs.
    pub expense_share: f64,
    pub income_noise_sd: f64,
    pub unemployment_rate: f64,
    pub working_age_min: u32,
    pub retirement_age: u32,
    pub initial_wealth_multiple: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub market: MarketConfig,
    pub bank: BankConfig,
    pub construction: ConstructionConfig,
    pub economy: EconomyConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> SimResult<Self> {
        let config = Self {
            market: read_json(&format!("{data_dir}/market/market_config.json"))?,
            bank: read_json(&format!("{data_dir}/bank/mortgage_config.json"))?,
            construction: read_json(&format!("{data_dir}/construction/construction_config.json"))?,
            economy: read_json(&format!("{data_dir}/population/economy_config.json"))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            market: MarketConfig {
                base_movement_cost: 2.0,
                space_per_person_target: 20.0,
                affordability_ratio: 0.30,
                down_payment_fraction: 0.20,
                mortgage_term_years: 30,
                social_income_threshold: 25_000.0,
                vacancy_churn_probability: 0.01,
                candidate_sample_size: 10,
                annual_price_drift: 0.02,
                monthly_price_volatility: 0.01,
                private_rent_yield: 0.05,
                social_rent_yield: 0.02,
                relocation: RelocationParams::default(),
            },
            bank: BankConfig {
                initial_interest_rate: 0.03,
                max_ltv: 0.90,
                max_dti: 3.0,
            },
            construction: ConstructionConfig {
                base_annual_count: 20_000.0,
                size_mean: 95.0,
                size_sd: 30.0,
                size_min: 20.0,
                size_max: 300.0,
                min_area_per_person: 15.0,
                tenure_mix: TenureMix::default(),
                price_model: PriceModel::default(),
                initial_stock: 2_006_000.0,
                initial_size_sd: 30.0,
                min_stock_per_household: 1.1,
            },
            economy: EconomyConfig {
                initial_tax_rate: 0.20,
                tax_rate_min: 0.10,
                tax_rate_max: 0.40,
                tax_rate_step: 0.01,
                high_wealth_threshold: 500_000.0,
                low_wealth_threshold: 200_000.0,
                expense_share: 0.60,
                income_noise_sd: 0.10,
                unemployment_rate: 0.06,
                working_age_min: 15,
                retirement_age: 66,
                initial_wealth_multiple: 1.0,
            },
        }
    }

    /// Reject settings that cannot describe a runnable market.
    pub fn validate(&self) -> SimResult<()> {
        let m = &self.market;
        if m.space_per_person_target <= 0.0 {
            return Err(config("market.space_per_person_target must be positive"));
        }
        for (name, v) in [
            ("market.affordability_ratio", m.affordability_ratio),
            ("market.down_payment_fraction", m.down_payment_fraction),
            ("market.vacancy_churn_probability", m.vacancy_churn_probability),
        ] {
            require_unit_interval(name, v)?;
        }
        if m.mortgage_term_years == 0 {
            return Err(config("market.mortgage_term_years must be positive"));
        }
        if m.base_movement_cost < 0.0 || m.monthly_price_volatility < 0.0 {
            return Err(config("market costs and volatility must be non-negative"));
        }
        if m.relocation.noise_sd < 0.0 || m.relocation.tenure_discount_years <= 0.0 {
            return Err(config("market.relocation has an invalid noise or discount horizon"));
        }
        if m.relocation.income_price_multiple <= 0.0 {
            return Err(config("market.relocation.income_price_multiple must be positive"));
        }

        let b = &self.bank;
        if b.initial_interest_rate < 0.0 {
            return Err(SimError::NegativeInterestRate { rate: b.initial_interest_rate });
        }
        require_unit_interval("bank.max_ltv", b.max_ltv)?;
        if b.max_dti <= 0.0 {
            return Err(config("bank.max_dti must be positive"));
        }

        let c = &self.construction;
        c.tenure_mix.validate()?;
        if c.size_min <= 0.0 || c.size_min > c.size_max {
            return Err(config("construction size bounds must satisfy 0 < size_min <= size_max"));
        }
        if c.base_annual_count < 0.0 || c.size_sd < 0.0 || c.initial_size_sd < 0.0 {
            return Err(config("construction counts and spreads must be non-negative"));
        }
        if c.min_area_per_person <= 0.0 {
            return Err(config("construction.min_area_per_person must be positive"));
        }

        let e = &self.economy;
        if e.tax_rate_min > e.tax_rate_max {
            return Err(config("economy.tax_rate_min exceeds tax_rate_max"));
        }
        for (name, v) in [
            ("economy.initial_tax_rate", e.initial_tax_rate),
            ("economy.expense_share", e.expense_share),
            ("economy.unemployment_rate", e.unemployment_rate),
        ] {
            require_unit_interval(name, v)?;
        }
        if e.working_age_min >= e.retirement_age {
            return Err(config("economy.working_age_min must be below retirement_age"));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> SimResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SimError::Config(format!("Cannot read {path}: {e}")))?;
    Ok(serde_json::from_str(&content)?)
}

fn config(msg: &str) -> SimError {
    SimError::Config(msg.to_string())
}

fn require_unit_interval(name: &str, value: f64) -> SimResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(config(&format!("{name} must lie in [0,1], got {value}")));
    }
    Ok(())
}
