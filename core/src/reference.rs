//! Static reference tables: income, household composition, mortality,
//! fertility and migration. Loaded once, read-only during ticks.
//!
//! Built-in defaults describe Ireland around 2020. `load()` reads the same
//! structures from `data/reference/*.json`.

use crate::{
    contract::ContractType,
    demographics::{FERTILE_AGE_MAX, FERTILE_AGE_MIN},
    error::{SimError, SimResult},
    household::Gender,
    rng::RandomSource,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

const WEEKS_PER_YEAR: f64 = 52.0;
const PROBABILITY_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdType {
    OnePerson,
    MarriedCouple,
    MarriedCoupleWithChildren,
    OneMotherWithChildren,
    OneFatherWithChildren,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    PreSchool,
    Primary,
    Secondary,
    YoungAdult,
    Adult,
    Over65,
}

impl AgeGroup {
    /// Inclusive lower bound, exclusive upper bound.
    pub fn age_range(&self) -> (u32, u32) {
        match self {
            Self::PreSchool => (0, 5),
            Self::Primary => (5, 13),
            Self::Secondary => (13, 19),
            Self::YoungAdult => (19, 25),
            Self::Adult => (25, 65),
            Self::Over65 => (65, 81),
        }
    }

    pub fn is_adult(&self) -> bool {
        matches!(self, Self::YoungAdult | Self::Adult | Self::Over65)
    }

    pub fn draw_age(&self, rng: &mut dyn RandomSource) -> u32 {
        let (lo, hi) = self.age_range();
        rng.int_range(lo as i64, hi as i64) as u32
    }
}

/// Mean weekly income for an age band starting at `min_age`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeBand {
    pub min_age: u32,
    pub male_weekly: f64,
    pub female_weekly: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdComposition {
    pub household_type_counts: BTreeMap<HouseholdType, u64>,
    pub children_distribution: BTreeMap<u32, u64>,
    pub child_age_group_counts: BTreeMap<AgeGroup, u64>,
    pub adult_age_group_counts: BTreeMap<AgeGroup, u64>,
    pub tenure_counts: BTreeMap<ContractType, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationParams {
    pub net_migration_per_year: f64,
    /// Real-world population the net migration figure refers to.
    pub initial_population_size: f64,
    /// Probability that a migrant is female.
    pub female_share: f64,
    /// Width in years of each age band of the distributions below.
    pub band_width: u32,
    pub age_distribution_male: Vec<f64>,
    pub age_distribution_female: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demography {
    /// Annual death probability indexed by age.
    pub mortality_male: Vec<f64>,
    pub mortality_female: Vec<f64>,
    /// Annual birth probability indexed by (age - 15).
    pub fertility: Vec<f64>,
    pub birth_trend_multiplier: f64,
    pub migration: MigrationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub income_bands: Vec<IncomeBand>,
    pub composition: HouseholdComposition,
    pub demography: Demography,
}

impl ReferenceTables {
    /// Load from `data_dir/reference/`.
    pub fn load(data_dir: &str) -> SimResult<Self> {
        #[derive(Deserialize)]
        struct IncomeFile {
            bands: Vec<IncomeBand>,
        }

        let income: IncomeFile = read_json(&format!("{data_dir}/reference/income_2020.json"))?;
        let composition: HouseholdComposition =
            read_json(&format!("{data_dir}/reference/households.json"))?;
        let demography: Demography = read_json(&format!("{data_dir}/reference/demography.json"))?;

        let tables = Self { income_bands: income.bands, composition, demography };
        tables.validate()?;
        Ok(tables)
    }

    /// Built-in Irish 2020 tables.
    pub fn irish_2020() -> Self {
        let income_bands = vec![
            IncomeBand { min_age: 0, male_weekly: 0.0, female_weekly: 0.0 },
            IncomeBand { min_age: 15, male_weekly: 401.66, female_weekly: 344.92 },
            IncomeBand { min_age: 25, male_weekly: 692.20, female_weekly: 628.25 },
            IncomeBand { min_age: 30, male_weekly: 927.24, female_weekly: 767.05 },
            IncomeBand { min_age: 40, male_weekly: 1_106.87, female_weekly: 825.52 },
            IncomeBand { min_age: 50, male_weekly: 1_106.31, female_weekly: 756.63 },
            IncomeBand { min_age: 60, male_weekly: 851.77, female_weekly: 584.27 },
        ];

        let composition = HouseholdComposition {
            household_type_counts: BTreeMap::from([
                (HouseholdType::OnePerson, 425_974),
                (HouseholdType::MarriedCouple, 274_417 + 79_912),
                (HouseholdType::MarriedCoupleWithChildren, 541_578 + 78_409),
                (HouseholdType::OneMotherWithChildren, 155_583),
                (HouseholdType::OneFatherWithChildren, 26_812),
            ]),
            children_distribution: BTreeMap::from([
                (1, 346_938),
                (2, 323_796),
                (3, 157_160),
                (4, 44_846),
                (5, 9_593),
                (6, 2_392),
                (7, 1_174),
            ]),
            child_age_group_counts: BTreeMap::from([
                (AgeGroup::PreSchool, 331_515),
                (AgeGroup::Primary, 548_693),
                (AgeGroup::Secondary, 371_588),
            ]),
            adult_age_group_counts: BTreeMap::from([
                (AgeGroup::YoungAdult, 331_208),
                (AgeGroup::Adult, 2_541_294),
                (AgeGroup::Over65, 637_567),
            ]),
            tenure_counts: BTreeMap::from([
                (ContractType::OwnerOccupiedWithoutLoan, 679_718),
                (ContractType::OwnerOccupiedWithLoan, 531_207),
                (ContractType::RentedFromLandlord, 348_493),
                (ContractType::SocialHousing, 165_178),
            ]),
        };

        let demography = Demography {
            mortality_male: gompertz_mortality(0.0033, 4.0e-5, 0.095),
            mortality_female: gompertz_mortality(0.0028, 2.5e-5, 0.097),
            fertility: fertility_curve(0.123, 32.0, 5.5),
            birth_trend_multiplier: 1.0,
            migration: MigrationParams {
                net_migration_per_year: 33_700.0,
                initial_population_size: 4_977_400.0,
                female_share: 0.49,
                band_width: 5,
                age_distribution_male: vec![
                    0.06, 0.03, 0.03, 0.04, 0.16, 0.22, 0.17, 0.11, 0.07, 0.04, 0.03, 0.02, 0.01,
                    0.005, 0.003, 0.002,
                ],
                age_distribution_female: vec![
                    0.06, 0.03, 0.03, 0.05, 0.18, 0.22, 0.16, 0.10, 0.06, 0.04, 0.03, 0.02, 0.01,
                    0.005, 0.003, 0.002,
                ],
            },
        };

        Self { income_bands, composition, demography }
    }

    pub fn validate(&self) -> SimResult<()> {
        match self.income_bands.first() {
            Some(band) if band.min_age == 0 => {}
            _ => return Err(config("income table must start at age 0")),
        }
        if self.income_bands.windows(2).any(|w| w[0].min_age >= w[1].min_age) {
            return Err(config("income bands must be sorted by strictly increasing min_age"));
        }

        let c = &self.composition;
        require_positive_total("household_type_counts", c.household_type_counts.values())?;
        require_positive_total("children_distribution", c.children_distribution.values())?;
        require_positive_total("child_age_group_counts", c.child_age_group_counts.values())?;
        require_positive_total("adult_age_group_counts", c.adult_age_group_counts.values())?;
        require_positive_total("tenure_counts", c.tenure_counts.values())?;
        if let Some(g) = c.child_age_group_counts.keys().find(|g| g.is_adult()) {
            return Err(config(&format!("child_age_group_counts contains adult group {g:?}")));
        }
        if let Some(g) = c.adult_age_group_counts.keys().find(|g| !g.is_adult()) {
            return Err(config(&format!("adult_age_group_counts contains child group {g:?}")));
        }

        let d = &self.demography;
        require_probabilities("mortality_male", &d.mortality_male)?;
        require_probabilities("mortality_female", &d.mortality_female)?;
        require_probabilities("fertility", &d.fertility)?;
        let fertile_years = (FERTILE_AGE_MAX - FERTILE_AGE_MIN + 1) as usize;
        if d.fertility.len() < fertile_years {
            return Err(config(&format!(
                "fertility must cover ages {FERTILE_AGE_MIN}..={FERTILE_AGE_MAX}, got {} entries",
                d.fertility.len()
            )));
        }
        for (name, table) in [("mortality_male", &d.mortality_male), ("mortality_female", &d.mortality_female)] {
            if table.last().copied() != Some(1.0) {
                return Err(config(&format!("{name} must end in certain death so no one ages past it")));
            }
        }
        if d.birth_trend_multiplier < 0.0 {
            return Err(config("birth_trend_multiplier must be non-negative"));
        }

        let m = &d.migration;
        if m.initial_population_size <= 0.0 {
            return Err(config("migration initial_population_size must be positive"));
        }
        if !(0.0..=1.0).contains(&m.female_share) {
            return Err(config("migration female_share must lie in [0,1]"));
        }
        if m.band_width == 0 {
            return Err(config("migration band_width must be positive"));
        }
        require_distribution("age_distribution_male", &m.age_distribution_male)?;
        require_distribution("age_distribution_female", &m.age_distribution_female)?;
        let oldest_migrant = m.age_distribution_male.len().max(m.age_distribution_female.len()) * m.band_width as usize;
        if oldest_migrant > d.mortality_male.len().min(d.mortality_female.len()) {
            return Err(config("migration age bands reach past the mortality tables"));
        }
        Ok(())
    }

    /// Annual income for a person of this age and gender.
    pub fn income(&self, age: u32, gender: Gender) -> SimResult<f64> {
        let band = self
            .income_bands
            .iter()
            .rev()
            .find(|b| age >= b.min_age)
            .ok_or_else(|| SimError::DataRange(format!("no income band covers age {age}")))?;
        let weekly = match gender {
            Gender::Male => band.male_weekly,
            Gender::Female => band.female_weekly,
        };
        Ok(weekly * WEEKS_PER_YEAR)
    }

    pub fn mortality_rate(&self, is_female: bool, age: u32) -> SimResult<f64> {
        let table = if is_female {
            &self.demography.mortality_female
        } else {
            &self.demography.mortality_male
        };
        table.get(age as usize).copied().ok_or_else(|| {
            SimError::DataRange(format!("age {age} beyond mortality table of {} entries", table.len()))
        })
    }

    /// Birth probability for a woman aged `15 + age_offset`.
    pub fn birth_rate(&self, age_offset: u32) -> SimResult<f64> {
        let curve = &self.demography.fertility;
        curve.get(age_offset as usize).copied().ok_or_else(|| {
            SimError::DataRange(format!("fertility offset {age_offset} beyond curve of {} entries", curve.len()))
        })
    }

    /// Share of owner-occupiers that carry a mortgage.
    pub fn mortgaged_owner_share(&self) -> f64 {
        let counts = &self.composition.tenure_counts;
        let with = *counts.get(&ContractType::OwnerOccupiedWithLoan).unwrap_or(&0) as f64;
        let without = *counts.get(&ContractType::OwnerOccupiedWithoutLoan).unwrap_or(&0) as f64;
        if with + without == 0.0 {
            0.0
        } else {
            with / (with + without)
        }
    }

    pub fn total_households(&self) -> u64 {
        self.composition.household_type_counts.values().sum()
    }

    pub fn draw_adult_age(&self, rng: &mut dyn RandomSource) -> SimResult<u32> {
        let group = draw_weighted(&self.composition.adult_age_group_counts, rng)?;
        Ok(group.draw_age(rng))
    }

    pub fn draw_child_age(&self, rng: &mut dyn RandomSource) -> SimResult<u32> {
        let group = draw_weighted(&self.composition.child_age_group_counts, rng)?;
        Ok(group.draw_age(rng))
    }

    pub fn draw_children(&self, rng: &mut dyn RandomSource) -> SimResult<u32> {
        draw_weighted(&self.composition.children_distribution, rng)
    }

    /// Age of a migrant: band from the sex's distribution, uniform within the band.
    pub fn draw_migrant_age(&self, is_female: bool, rng: &mut dyn RandomSource) -> u32 {
        let m = &self.demography.migration;
        let dist = if is_female { &m.age_distribution_female } else { &m.age_distribution_male };
        let roll = rng.uniform();
        let mut cumulative = 0.0;
        let mut band = dist.len().saturating_sub(1);
        for (i, p) in dist.iter().enumerate() {
            cumulative += p;
            if roll < cumulative {
                band = i;
                break;
            }
        }
        band as u32 * m.band_width + rng.int_range(0, m.band_width as i64) as u32
    }
}

/// Draw a key with probability proportional to its count.
pub fn draw_weighted<K: Copy + Ord + std::fmt::Debug>(
    counts: &BTreeMap<K, u64>,
    rng: &mut dyn RandomSource,
) -> SimResult<K> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return Err(config("cannot draw from an empty count table"));
    }
    let roll = rng.int_range(0, total as i64) as u64;
    let mut cumulative = 0u64;
    for (key, count) in counts {
        cumulative += count;
        if roll < cumulative {
            return Ok(*key);
        }
    }
    Err(config(&format!("draw {roll} fell outside count table {counts:?}")))
}

/// Gompertz curve over ages 0..=100 with a separate infant rate.
/// The final age is certain death so the tables always cover the population.
fn gompertz_mortality(infant: f64, a: f64, b: f64) -> Vec<f64> {
    (0..=100u32)
        .map(|age| match age {
            0 => infant,
            100 => 1.0,
            _ => (a * (b * age as f64).exp()).min(1.0),
        })
        .collect()
}

/// Gaussian-shaped age-specific fertility over ages 15..=49.
fn fertility_curve(peak: f64, peak_age: f64, spread: f64) -> Vec<f64> {
    (15..=49u32)
        .map(|age| {
            let z = (age as f64 - peak_age) / spread;
            peak * (-0.5 * z * z).exp()
        })
        .collect()
}

fn read_json<T: DeserializeOwned>(path: &str) -> SimResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SimError::Config(format!("Cannot read {path}: {e}")))?;
    Ok(serde_json::from_str(&content)?)
}

fn config(msg: &str) -> SimError {
    SimError::Config(msg.to_string())
}

fn require_positive_total<'a>(name: &str, values: impl Iterator<Item = &'a u64>) -> SimResult<()> {
    if values.sum::<u64>() == 0 {
        return Err(config(&format!("{name} must have a positive total")));
    }
    Ok(())
}

fn require_probabilities(name: &str, values: &[f64]) -> SimResult<()> {
    if values.is_empty() {
        return Err(config(&format!("{name} must not be empty")));
    }
    if let Some(p) = values.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(config(&format!("{name} contains {p}, outside [0,1]")));
    }
    Ok(())
}

fn require_distribution(name: &str, values: &[f64]) -> SimResult<()> {
    require_probabilities(name, values)?;
    let total: f64 = values.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(config(&format!("{name} must sum to 1, got {total:.4}")));
    }
    Ok(())
}
