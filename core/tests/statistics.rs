use housing_core::{
    contract::{ContractType, HousingContract},
    house::{House, Tenure},
    household::{Gender, Household, Person},
    stats::TickStatistics,
    types::{HouseId, HouseholdId},
};

#[test]
fn empty_population_reports_zeroes() {
    let stats = TickStatistics::compute(0, &[], &[]);
    assert_eq!(stats.households, 0);
    assert_eq!(stats.avg_household_size, 0.0);
    assert_eq!(stats.avg_purchase_price, 0.0);
    assert_eq!(stats.avg_monthly_rent, 0.0);
    assert_eq!(stats.homeownership_rate, 0.0);
    assert_eq!(stats.avg_household_income, 0.0);
    assert_eq!(stats.unemployment_rate, 0.0);
    assert_eq!(stats.area_per_person, 0.0);
}

#[test]
fn small_market_aggregates() {
    let mut houses = vec![
        House::new(HouseId(0), 100.0, 5, Tenure::Buy, 300_000.0),
        House::new(HouseId(1), 50.0, 5, Tenure::PrivateRent, 100_000.0),
        House::new(HouseId(2), 70.0, 5, Tenure::Buy, 100_000.0),
    ];

    let mut owner = Household::new(
        HouseholdId(1),
        vec![Person::new(40, Gender::Male, 60_000.0), Person::new(8, Gender::Female, 0.0)],
        0.0,
    );
    owner.contract = Some(HousingContract::outright(HouseId(0)));
    houses[0].change_ownership(Some(owner.id));

    let mut renter = Household::new(HouseholdId(2), vec![Person::new(30, Gender::Female, 0.0)], 0.0);
    renter.contract = Some(HousingContract::new(ContractType::RentedFromLandlord, HouseId(1), 800.0));
    houses[1].change_ownership(Some(renter.id));

    let mut searching = Household::new(HouseholdId(3), vec![Person::new(70, Gender::Male, 20_000.0)], 0.0);
    searching.want_to_move = true;

    let stats = TickStatistics::compute(12, &[owner, renter, searching], &houses);

    assert_eq!(stats.tick, 12);
    assert_eq!(stats.households, 3);
    assert_eq!(stats.population, 4);
    assert!((stats.avg_household_size - 4.0 / 3.0).abs() < 1e-12);
    assert_eq!(stats.vacant_houses, 1);
    assert!((stats.avg_purchase_price - 200_000.0).abs() < 1e-9, "mean over Buy-tenure houses");
    assert!((stats.avg_monthly_rent - 800.0).abs() < 1e-9);
    assert!((stats.homeownership_rate - 1.0 / 3.0).abs() < 1e-12);
    assert!((stats.avg_household_income - 80_000.0 / 3.0).abs() < 1e-9);
    assert!((stats.unemployment_rate - 0.5).abs() < 1e-12, "the child and the renter earn nothing");
    assert_eq!(stats.wanting_to_move, 1);
    assert!((stats.area_per_person - 50.0).abs() < 1e-12, "150 m² over three housed people");
}

#[test]
fn unemployment_counts_every_member_without_income() {
    let household = Household::new(
        HouseholdId(1),
        vec![
            Person::new(40, Gender::Male, 50_000.0),
            Person::new(5, Gender::Female, 0.0),
            Person::new(80, Gender::Female, 0.0),
        ],
        0.0,
    );
    let stats = TickStatistics::compute(1, &[household], &[]);
    assert!(
        (stats.unemployment_rate - 2.0 / 3.0).abs() < 1e-12,
        "children and retirees count too, got {}",
        stats.unemployment_rate
    );
}
