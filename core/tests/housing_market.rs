//! Monthly market phases: prices, contracts, mobility, matching,
//! social rationing and vacancy churn.

use housing_core::{
    bank::MortgageBank,
    config::SimConfig,
    contract::{ContractType, HousingContract},
    event::SimEvent,
    house::{House, Tenure},
    household::{Gender, Household, Person},
    market::{rent_for, HousingMarket},
    population::verify_occupancy,
    rng::ScriptedRng,
    types::{HouseId, HouseholdId},
};

// ── Helpers ───────────────────────────────────────────────────────────────

fn market(u: f64) -> HousingMarket {
    HousingMarket::new(SimConfig::default_test().market, Box::new(ScriptedRng::constant(u)))
}

fn bank() -> MortgageBank {
    MortgageBank::new(&SimConfig::default_test().bank).expect("bank")
}

fn household(id: u64, persons: usize, income_each: f64, wealth: f64) -> Household {
    let members = (0..persons)
        .map(|i| Person::new(30 + i as u32, Gender::Female, income_each))
        .collect();
    Household::new(HouseholdId(id), members, wealth)
}

fn house(id: usize, size: f64, tenure: Tenure) -> House {
    let price = SimConfig::default_test().construction.price_model.price(size, 5, tenure);
    House::new(HouseId(id), size, 5, tenure, price)
}

fn move_in(h: &mut Household, house: &mut House, kind: ContractType, cost: f64) {
    house.change_ownership(Some(h.id));
    h.contract = Some(HousingContract::new(kind, house.id, cost));
}

fn assigned_ids(events: &[SimEvent]) -> Vec<HouseholdId> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::SocialHousingAssigned { household_id, .. } => Some(*household_id),
            _ => None,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn prices_drift_by_monthly_trend_at_median_shock() {
    let mut m = market(0.5);
    let mut houses = vec![house(0, 100.0, Tenure::Buy)];
    let before = houses[0].price;
    m.update_prices(&mut houses);
    let expected = before * (1.0 + 0.02 / 12.0);
    assert!((houses[0].price - expected).abs() < 1e-6, "expected {expected}, got {}", houses[0].price);
}

#[test]
fn renters_accrue_savings_and_pay_rent() {
    let m = market(0.5);
    let mut houses = vec![house(0, 80.0, Tenure::PrivateRent)];
    let mut h = household(1, 1, 60_000.0, 1_000.0);
    move_in(&mut h, &mut houses[0], ContractType::RentedFromLandlord, 0.0);
    let mut households = vec![h];

    m.update_contracts(&mut households, &houses, 0.2, 0.6);

    let rent = rent_for(m.config(), &houses[0]);
    let disposable = 5_000.0 * 0.8 * 0.4;
    let h = &households[0];
    assert!((h.wealth - (1_000.0 + disposable - rent)).abs() < 1e-6);
    let contract = h.contract.as_ref().expect("still renting");
    assert_eq!(contract.months_elapsed, 1);
    assert!((contract.monthly_cost - rent).abs() < 1e-9, "rent is refreshed from the current price");
}

#[test]
fn unhoused_households_always_search() {
    let mut m = market(0.99);
    let houses: Vec<House> = Vec::new();
    let mut households = vec![household(1, 2, 20_000.0, 0.0), household(2, 1, 90_000.0, 0.0)];

    let wanting = m.decide_moves(&mut households, &houses, &bank());
    assert_eq!(wanting, 2);
    assert!(households.iter().all(|h| h.want_to_move));
}

#[test]
fn purchase_takes_nearest_size_buy_house() {
    let m = market(0.5);
    let bank = bank();
    let mut houses = vec![
        house(0, 40.0, Tenure::Buy),
        house(1, 62.0, Tenure::Buy),
        house(2, 100.0, Tenure::Buy),
        house(3, 60.0, Tenure::PrivateRent),
    ];
    let mut h = household(1, 3, 30_000.0, 60_000.0);
    h.want_to_move = true;
    let mut households = vec![h];

    let events = m.match_purchases(&mut households, &mut houses, &bank, 5);

    assert_eq!(events.len(), 1);
    let h = &households[0];
    assert_eq!(h.current_house(), Some(HouseId(1)), "62 m² is closest to 3 × 20 m² among Buy houses");
    assert_eq!(h.contract_type(), Some(ContractType::OwnerOccupiedWithLoan));
    assert!(!h.want_to_move);
    let price = houses[1].price;
    assert!((h.wealth - (60_000.0 - 0.2 * price)).abs() < 1e-6);
    assert!((h.loan_amount - 0.8 * price).abs() < 1e-6);
    assert_eq!(houses[1].owner, Some(h.id));
    verify_occupancy(&households, &houses, 5).expect("occupancy holds after a purchase");
}

#[test]
fn a_vacancy_is_consumed_by_the_first_buyer() {
    let m = market(0.5);
    let bank = bank();
    let mut houses = vec![house(0, 40.0, Tenure::Buy)];
    let mut households = vec![household(1, 2, 40_000.0, 60_000.0), household(2, 2, 40_000.0, 60_000.0)];
    households.iter_mut().for_each(|h| h.want_to_move = true);

    let events = m.match_purchases(&mut households, &mut houses, &bank, 1);

    assert_eq!(events.len(), 1);
    assert!(households[0].is_housed());
    assert!(!households[1].is_housed());
    assert!(households[1].want_to_move, "the unlucky buyer keeps looking");
}

#[test]
fn unaffordable_purchase_is_skipped() {
    let m = market(0.5);
    let bank = bank();
    let mut houses = vec![house(0, 200.0, Tenure::Buy)];
    let mut h = household(1, 1, 20_000.0, 500_000.0);
    h.want_to_move = true;
    let mut households = vec![h];

    let events = m.match_purchases(&mut households, &mut houses, &bank, 1);
    assert!(events.is_empty());
    assert!(houses[0].is_available());
    assert_eq!(households[0].wealth, 500_000.0);
}

#[test]
fn owner_who_buys_sells_the_old_home() {
    let m = market(0.5);
    let bank = bank();
    let mut houses = vec![house(0, 40.0, Tenure::Buy), house(1, 80.0, Tenure::Buy)];
    let mut h = household(1, 4, 40_000.0, 40_000.0);
    move_in(&mut h, &mut houses[0], ContractType::OwnerOccupiedWithoutLoan, 0.0);
    h.want_to_move = true;
    let mut households = vec![h];
    let old_price = houses[0].price;
    let new_price = houses[1].price;

    m.match_purchases(&mut households, &mut houses, &bank, 1);

    let h = &households[0];
    assert_eq!(h.current_house(), Some(HouseId(1)));
    assert!(houses[0].is_available(), "the old home is back on the market");
    assert!((h.wealth - (40_000.0 + old_price - 0.2 * new_price)).abs() < 1e-6);
}

#[test]
fn renters_fall_back_to_private_rental() {
    let m = market(0.5);
    let mut houses = vec![house(0, 30.0, Tenure::PrivateRent), house(1, 55.0, Tenure::PrivateRent)];
    let mut h = household(1, 3, 20_000.0, 0.0);
    h.want_to_move = true;
    let mut households = vec![h];

    let events = m.match_rentals(&mut households, &mut houses, 2);

    assert_eq!(events.len(), 1);
    let h = &households[0];
    assert_eq!(h.current_house(), Some(HouseId(1)));
    assert_eq!(h.contract_type(), Some(ContractType::RentedFromLandlord));
    let rent = h.contract.as_ref().map(|c| c.monthly_cost).unwrap_or_default();
    assert!(rent <= 0.3 * h.monthly_income());
}

#[test]
fn social_housing_goes_to_the_longest_waiting() {
    let m = market(0.5);
    let mut households = Vec::new();
    // 15 eligible: unhoused, low income, waitlist 0..=14.
    for i in 0..15u64 {
        let mut h = household(i + 1, 1, 10_000.0, 0.0);
        h.waitlist_time = i as u32;
        households.push(h);
    }
    // 85 ineligible: unhoused but well paid, with stale counters.
    for i in 15..100u64 {
        let mut h = household(i + 1, 1, 80_000.0, 0.0);
        h.waitlist_time = 7;
        households.push(h);
    }
    let mut houses: Vec<House> = (0..10).map(|i| house(i, 60.0, Tenure::SocialRent)).collect();

    let events = m.ration_social_housing(&mut households, &mut houses, 3);

    let mut assigned = assigned_ids(&events);
    assigned.sort();
    let expected: Vec<HouseholdId> = (6..=15).map(HouseholdId).collect();
    assert_eq!(assigned, expected, "waitlist times 5..=14 are served first");

    for h in &households[..5] {
        assert!(!h.is_housed());
        assert_eq!(h.waitlist_time, h.id.0 as u32, "waited {} months, now one more", h.id.0 - 1);
    }
    for h in &households[5..15] {
        assert_eq!(h.contract_type(), Some(ContractType::SocialHousing));
        assert_eq!(h.waitlist_time, 0);
    }
    assert!(households[15..].iter().all(|h| h.waitlist_time == 0), "ineligible counters reset");
    assert!(houses.iter().all(|h| !h.is_available()));
    verify_occupancy(&households, &houses, 3).expect("occupancy holds after rationing");
}

#[test]
fn social_housing_without_vacancies_only_counts_waiting() {
    let m = market(0.5);
    let mut households = vec![household(1, 1, 5_000.0, 0.0)];
    let mut houses = vec![house(0, 60.0, Tenure::PrivateRent)];

    let events = m.ration_social_housing(&mut households, &mut houses, 1);
    assert!(events.is_empty());
    assert_eq!(households[0].waitlist_time, 1);
}

#[test]
fn churn_vacates_every_house_when_every_draw_hits() {
    let mut m = market(0.0);
    let mut houses = vec![house(0, 80.0, Tenure::Buy), house(1, 60.0, Tenure::PrivateRent)];
    let mut owner = household(1, 2, 40_000.0, 1_000.0);
    move_in(&mut owner, &mut houses[0], ContractType::OwnerOccupiedWithoutLoan, 0.0);
    let mut renter = household(2, 1, 30_000.0, 1_000.0);
    move_in(&mut renter, &mut houses[1], ContractType::RentedFromLandlord, 500.0);
    let mut households = vec![owner, renter];
    let sale_price = houses[0].price;

    let events = m.churn_vacancies(&mut households, &mut houses, 4);

    assert_eq!(events.len(), 2);
    assert!(houses.iter().all(House::is_available));
    assert!(households.iter().all(|h| !h.is_housed() && h.want_to_move));
    assert!((households[0].wealth - (1_000.0 + sale_price)).abs() < 1e-6, "the owner sold");
    assert_eq!(households[1].wealth, 1_000.0, "the renter just left");
}

#[test]
fn churn_leaves_houses_alone_when_no_draw_hits() {
    let mut m = market(0.5);
    let mut houses = vec![house(0, 80.0, Tenure::Buy)];
    let mut owner = household(1, 2, 40_000.0, 1_000.0);
    move_in(&mut owner, &mut houses[0], ContractType::OwnerOccupiedWithoutLoan, 0.0);
    let mut households = vec![owner];

    assert!(m.churn_vacancies(&mut households, &mut houses, 4).is_empty());
    assert!(households[0].is_housed());
}
