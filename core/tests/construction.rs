//! Yearly construction of new dwellings.

use housing_core::{
    config::SimConfig,
    construction::ConstructionSupplier,
    event::SimEvent,
    household::{Gender, Household, Person},
    rng::{RngBank, ScriptedRng, SubsystemSlot},
    types::{HouseId, HouseholdId},
};

// ── Helpers ───────────────────────────────────────────────────────────────

fn household_of(size: usize) -> Household {
    let members = (0..size).map(|_| Person::new(30, Gender::Male, 30_000.0)).collect();
    Household::new(HouseholdId(size as u64), members, 0.0)
}

fn seeded(seed: u64) -> ConstructionSupplier {
    let rng = RngBank::new(seed).for_slot(SubsystemSlot::Construction);
    ConstructionSupplier::new(SimConfig::default_test().construction, Box::new(rng))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[test]
fn planned_count_scales_with_the_scale_factor() {
    let supplier = seeded(1);
    assert_eq!(supplier.planned_count(1_000.0), 20);
    assert_eq!(supplier.planned_count(3_000.0), 7, "6.67 rounds to 7");
    assert_eq!(supplier.planned_count(1.0e9), 0);
}

#[test]
fn nothing_is_built_without_households() {
    let mut supplier = seeded(1);
    let (built, events) = supplier.build_year(&[], 0, 100.0, 12);
    assert!(built.is_empty());
    assert!(events.is_empty());
}

#[test]
fn new_houses_respect_bounds_and_continue_the_id_sequence() {
    let mut supplier = seeded(7);
    let cfg = SimConfig::default_test().construction;
    let (built, events) = supplier.build_year(&[household_of(1)], 500, 100.0, 24);

    assert_eq!(built.len(), 200, "every candidate fits a one-person household");
    assert_eq!(events.len(), built.len());
    for (i, house) in built.iter().enumerate() {
        assert_eq!(house.id, HouseId(500 + i));
        assert!(house.size >= cfg.size_min && house.size <= cfg.size_max);
        assert!((1..=10).contains(&house.quality));
        assert!(house.is_available());
        let expected = cfg.price_model.price(house.size, house.quality, house.tenure);
        assert!((house.price - expected).abs() < 1e-6);
    }
    assert!(events.iter().all(|e| matches!(e, SimEvent::HouseConstructed { tick: 24, .. })));
}

#[test]
fn houses_too_small_for_everyone_are_dropped() {
    // A 21-person household needs 315 m², above the size ceiling.
    let mut supplier = seeded(3);
    let (built, _) = supplier.build_year(&[household_of(21)], 0, 100.0, 12);
    assert!(built.is_empty());
}

#[test]
fn candidate_is_clamped_to_size_floor() {
    let rng = ScriptedRng::new(vec![0.0], vec![-100.0]);
    let mut supplier = ConstructionSupplier::new(SimConfig::default_test().construction, Box::new(rng));
    let house = supplier.draw_house(HouseId(0));
    assert_eq!(house.size, 20.0);
    assert_eq!(house.quality, 1);
}
