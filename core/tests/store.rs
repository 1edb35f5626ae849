//! SQLite report sink.

use housing_core::{
    config::SimConfig,
    engine::SimEngine,
    reference::ReferenceTables,
    simulation::Simulation,
    store::SimStore,
};

fn store_with_run(run_id: &str) -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .insert_run(run_id, 9, 10_000.0, "0.1.0-test", "2020-01-01T00:00:00Z")
        .expect("insert run");
    store
}

#[test]
fn migration_is_idempotent() {
    let store = SimStore::in_memory().expect("store");
    store.migrate().expect("first");
    store.migrate().expect("second");
}

#[test]
fn yearly_statistics_are_recorded_in_tick_order() {
    let run_id = "store-stats";
    let store = store_with_run(run_id);
    let engine = SimEngine::new(run_id.into(), 9, SimConfig::default_test(), ReferenceTables::irish_2020())
        .expect("engine");
    let mut sim = Simulation::start(engine, 10_000.0).expect("start");

    store.record_statistics(run_id, &sim.statistics()).expect("initial stats");
    let year_one = sim.run_year().expect("year");
    store.record_statistics(run_id, &year_one).expect("year stats");

    let rows = store.statistics_for_run(run_id).expect("read back");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].tick, 0);
    assert_eq!(rows[1], year_one);
}

#[test]
fn event_log_is_queryable_by_tick_and_type() {
    let run_id = "store-events";
    let mut store = store_with_run(run_id);
    let engine = SimEngine::new(run_id.into(), 9, SimConfig::default_test(), ReferenceTables::irish_2020())
        .expect("engine");
    let mut sim = Simulation::start(engine, 10_000.0).expect("start");
    sim.run_months(12).expect("a year");

    let events = sim.take_events();
    let entries = sim.engine.log_entries(&events).expect("entries");
    store.append_events(&entries).expect("append");

    assert_eq!(store.count_events(run_id, "run_initialized").expect("count"), 1);
    assert_eq!(store.count_events(run_id, "year_completed").expect("count"), 1);
    let at_zero = store.events_for_tick(run_id, 0).expect("tick 0");
    assert_eq!(at_zero[0].event_type, "run_initialized");
    let at_twelve = store.events_for_tick(run_id, 12).expect("tick 12");
    assert!(at_twelve.iter().any(|e| e.event_type == "year_completed"));
}
