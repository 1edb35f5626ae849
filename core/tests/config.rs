//! Configuration and reference-table loading and validation.
//! Integration tests run from the core crate, so the data directory is `../data`.

use housing_core::{
    config::SimConfig,
    error::SimError,
    household::Gender,
    reference::{HouseholdComposition, ReferenceTables},
};

const DATA_DIR: &str = "../data";

// ── Config ────────────────────────────────────────────────────────────────

#[test]
fn shipped_config_loads_and_matches_test_defaults() {
    let loaded = SimConfig::load(DATA_DIR).expect("data/ config loads");
    let defaults = SimConfig::default_test();
    assert_eq!(loaded.market.candidate_sample_size, defaults.market.candidate_sample_size);
    assert_eq!(loaded.market.mortgage_term_years, 30);
    assert_eq!(loaded.bank.max_ltv, defaults.bank.max_ltv);
    assert_eq!(loaded.construction.base_annual_count, defaults.construction.base_annual_count);
    assert_eq!(loaded.economy.expense_share, defaults.economy.expense_share);
}

#[test]
fn default_test_config_is_valid() {
    SimConfig::default_test().validate().expect("defaults validate");
}

#[test]
fn negative_interest_rate_fails_validation() {
    let mut config = SimConfig::default_test();
    config.bank.initial_interest_rate = -0.5;
    assert!(matches!(config.validate(), Err(SimError::NegativeInterestRate { .. })));
}

#[test]
fn unbalanced_tenure_mix_fails_validation() {
    let mut config = SimConfig::default_test();
    config.construction.tenure_mix.buy = 0.9;
    assert!(matches!(config.validate(), Err(SimError::Config(_))));
}

#[test]
fn missing_data_dir_is_a_config_error() {
    assert!(matches!(SimConfig::load("/nonexistent/data"), Err(SimError::Config(_))));
}

// ── Reference tables ──────────────────────────────────────────────────────

#[test]
fn shipped_reference_tables_match_builtin() {
    let loaded = ReferenceTables::load(DATA_DIR).expect("data/reference loads");
    let builtin = ReferenceTables::irish_2020();
    assert_eq!(loaded.total_households(), builtin.total_households());
    assert_eq!(loaded.demography.mortality_male.len(), 101);
    assert_eq!(loaded.demography.fertility.len(), 35);
    assert!((loaded.mortgaged_owner_share() - builtin.mortgaged_owner_share()).abs() < 1e-12);
}

#[test]
fn income_lookup_is_weekly_times_fifty_two() {
    let tables = ReferenceTables::irish_2020();
    let income = tables.income(30, Gender::Male).expect("age 30 is covered");
    assert!((income - 927.24 * 52.0).abs() < 1e-9);
    assert_eq!(tables.income(3, Gender::Female).expect("children are covered"), 0.0);
}

#[test]
fn lookups_beyond_tables_are_data_range_errors() {
    let tables = ReferenceTables::irish_2020();
    assert!(matches!(tables.mortality_rate(true, 101), Err(SimError::DataRange(_))));
    assert!(matches!(tables.birth_rate(35), Err(SimError::DataRange(_))));
    assert!(tables.birth_rate(34).is_ok());
}

#[test]
fn migration_distribution_must_sum_to_one() {
    let mut tables = ReferenceTables::irish_2020();
    tables.demography.migration.age_distribution_male[0] += 0.2;
    assert!(matches!(tables.validate(), Err(SimError::Config(_))));
}

#[test]
fn empty_fertility_curve_is_rejected() {
    let mut tables = ReferenceTables::irish_2020();
    tables.demography.fertility.clear();
    assert!(matches!(tables.validate(), Err(SimError::Config(_))));
}

#[test]
fn short_fertility_curve_fails_at_setup() {
    let mut tables = ReferenceTables::irish_2020();
    tables.demography.fertility.truncate(30);
    assert!(matches!(tables.validate(), Err(SimError::Config(_))));
}

#[test]
fn mortality_table_must_end_in_certain_death() {
    let mut tables = ReferenceTables::irish_2020();
    if let Some(last) = tables.demography.mortality_female.last_mut() {
        *last = 0.5;
    }
    assert!(matches!(tables.validate(), Err(SimError::Config(_))));
}

#[test]
fn migrant_ages_must_fit_the_mortality_tables() {
    let mut tables = ReferenceTables::irish_2020();
    tables.demography.migration.band_width = 10;
    assert!(matches!(tables.validate(), Err(SimError::Config(_))));
}

#[test]
fn unknown_household_type_fails_to_parse() {
    let json = r#"{
        "household_type_counts": {"one_person": 10, "commune": 3},
        "children_distribution": {"1": 5},
        "child_age_group_counts": {"primary": 5},
        "adult_age_group_counts": {"adult": 5},
        "tenure_counts": {"social_housing": 5}
    }"#;
    assert!(serde_json::from_str::<HouseholdComposition>(json).is_err());
}
