//! Yearly population update: mortality, fertility, migration, aging.

use housing_core::{
    contract::HousingContract,
    demographics::{age_population, net_migration, DemographicEngine},
    error::SimError,
    event::SimEvent,
    house::{House, Tenure},
    household::{Gender, Household, Person},
    reference::ReferenceTables,
    rng::ScriptedRng,
    types::{HouseId, HouseholdId, HouseholdIds},
};

// ── Helpers ───────────────────────────────────────────────────────────────

fn engine(u: f64) -> DemographicEngine {
    DemographicEngine::new(Box::new(ScriptedRng::constant(u)))
}

fn housed(id: u64, members: Vec<Person>, houses: &mut Vec<House>) -> Household {
    let house_id = HouseId(houses.len());
    let mut house = House::new(house_id, 80.0, 5, Tenure::Buy, 200_000.0);
    let mut h = Household::new(HouseholdId(id), members, 10_000.0);
    house.change_ownership(Some(h.id));
    h.contract = Some(HousingContract::outright(house_id));
    houses.push(house);
    h
}

fn population(n: u64, houses: &mut Vec<House>) -> Vec<Household> {
    (1..=n)
        .map(|id| housed(id, vec![Person::new(40, Gender::Male, 40_000.0)], houses))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn certain_death_dissolves_households_and_vacates_dwellings() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = population(3, &mut houses);
    let mut d = engine(0.0);

    let (deaths, events) = d.apply_mortality(&mut households, &mut houses, &tables, 12).expect("mortality");

    assert_eq!(deaths, 3);
    assert!(households.is_empty());
    assert!(houses.iter().all(House::is_available), "dwellings of the dead are vacated");
    assert_eq!(
        events.iter().filter(|e| matches!(e, SimEvent::HouseholdDissolved { .. })).count(),
        3
    );
}

#[test]
fn survivors_keep_their_household() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = vec![housed(
        1,
        vec![Person::new(100, Gender::Female, 0.0), Person::new(40, Gender::Male, 30_000.0)],
        &mut houses,
    )];
    let mut d = engine(0.999);

    let (deaths, events) = d.apply_mortality(&mut households, &mut houses, &tables, 12).expect("mortality");

    assert_eq!(deaths, 1, "the last age in the table is certain death");
    assert!(events.is_empty());
    assert_eq!(households[0].members.len(), 1);
    assert_eq!(households[0].members[0].age, 40);
    assert!(households[0].is_housed());
}

#[test]
fn age_beyond_mortality_table_is_a_data_range_error() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = vec![housed(1, vec![Person::new(150, Gender::Male, 0.0)], &mut houses)];
    let mut d = engine(0.5);

    match d.apply_mortality(&mut households, &mut houses, &tables, 12) {
        Err(SimError::DataRange(_)) => {}
        other => panic!("expected DataRange, got {other:?}"),
    }
}

#[test]
fn births_only_to_women_of_child_bearing_age() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = vec![
        housed(1, vec![Person::new(30, Gender::Female, 0.0)], &mut houses),
        housed(2, vec![Person::new(30, Gender::Male, 0.0)], &mut houses),
        housed(3, vec![Person::new(60, Gender::Female, 0.0)], &mut houses),
    ];
    let mut d = engine(0.0);

    let births = d.apply_fertility(&mut households, &tables).expect("fertility");

    assert_eq!(births, 1);
    assert_eq!(households[0].members.len(), 2);
    let baby = &households[0].members[1];
    assert_eq!(baby.age, 0);
    assert_eq!(baby.income, 0.0);
    assert_eq!(households[1].members.len(), 1);
    assert_eq!(households[2].members.len(), 1);
}

#[test]
fn net_migration_is_floored() {
    let tables = ReferenceTables::irish_2020();
    // 33_700 / 4_977_400 * 1_000 = 6.77
    assert_eq!(net_migration(&tables, 1_000), 6);

    let mut leaving = tables.clone();
    leaving.demography.migration.net_migration_per_year = -33_700.0;
    assert_eq!(net_migration(&leaving, 1_000), -7);
    assert_eq!(net_migration(&tables, 0), 0);
}

#[test]
fn immigrants_arrive_unhoused_with_fresh_ids() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = population(1_000, &mut houses);
    let mut ids = HouseholdIds::starting_after(1_000);
    let mut d = engine(0.3);

    let (net, events) = d
        .apply_migration(&mut households, &mut houses, &tables, &mut ids, 12)
        .expect("migration");

    assert_eq!(net, 6);
    assert_eq!(households.len(), 1_006);
    for migrant in &households[1_000..] {
        assert!(migrant.id.0 > 1_000, "{} reuses an existing id", migrant.id);
        assert_eq!(migrant.size(), 1);
        assert_eq!(migrant.wealth, 0.0);
        assert!(!migrant.is_housed());
        assert!(migrant.want_to_move);
    }
    assert!(events.contains(&SimEvent::MigrationApplied { tick: 12, net_households: 6 }));
}

#[test]
fn emigration_removes_households_and_frees_their_homes() {
    let mut tables = ReferenceTables::irish_2020();
    tables.demography.migration.net_migration_per_year = -33_700.0;
    let mut houses = Vec::new();
    let mut households = population(1_000, &mut houses);
    let mut ids = HouseholdIds::starting_after(1_000);
    let mut d = engine(0.42);

    let (net, _) = d
        .apply_migration(&mut households, &mut houses, &tables, &mut ids, 12)
        .expect("migration");

    assert_eq!(net, -7);
    assert_eq!(households.len(), 993);
    assert_eq!(houses.iter().filter(|h| h.is_available()).count(), 7);
    let occupied = houses.iter().filter(|h| !h.is_available()).count();
    assert_eq!(occupied, households.len(), "every remaining household still has its home");
}

#[test]
fn aging_adds_a_year_to_everyone() {
    let mut houses = Vec::new();
    let mut households = vec![housed(
        1,
        vec![Person::new(0, Gender::Female, 0.0), Person::new(64, Gender::Male, 1.0)],
        &mut houses,
    )];
    age_population(&mut households);
    let ages: Vec<u32> = households[0].members.iter().map(|p| p.age).collect();
    assert_eq!(ages, vec![1, 65]);
}

#[test]
fn full_year_runs_phases_in_order() {
    let tables = ReferenceTables::irish_2020();
    let mut houses = Vec::new();
    let mut households = population(200, &mut houses);
    let mut ids = HouseholdIds::starting_after(200);
    let mut d = engine(0.5);

    let (summary, _) = d
        .run_year(&mut households, &mut houses, &tables, &mut ids, 12)
        .expect("year");

    assert_eq!(summary.deaths, 0, "a 40-year-old never dies on a 0.5 draw");
    assert_eq!(summary.births, 0);
    assert_eq!(summary.net_migration, 1);
    assert_eq!(households.len(), 201);
    assert!(households[..200].iter().all(|h| h.members[0].age == 41));
    assert_eq!(households[200].members[0].age % 5, 3, "migrants are aged within their band, then by one");
}
