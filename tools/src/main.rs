//! sim-runner: headless runner for the housing market simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --years 10 --scale 1000 --db run.db
//!   sim-runner --seed 12345 --years 5 --builtin-tables --json
//!   sim-runner --seed 7 --years 20 --tax-rate 0.25

use anyhow::{Context, Result};
use housing_core::{
    config::SimConfig,
    engine::SimEngine,
    reference::ReferenceTables,
    simulation::Simulation,
    stats::TickStatistics,
    store::SimStore,
};
use std::env;

#[derive(serde::Serialize)]
struct RunSummary<'a> {
    run_id: &'a str,
    seed: u64,
    scale_factor: f64,
    years: u64,
    final_tax_rate: f64,
    interest_rate: f64,
    events_logged: usize,
    yearly: &'a [TickStatistics],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let years = parse_arg(&args, "--years", 10u64);
    let scale = parse_arg(&args, "--scale", 1_000.0f64);
    let tax_rate: Option<f64> = parse_optional(&args, "--tax-rate");
    let json = args.iter().any(|a| a == "--json");
    let builtin = args.iter().any(|a| a == "--builtin-tables");
    let db = string_arg(&args, "--db", ":memory:");
    let data_dir = string_arg(&args, "--data-dir", "./data");

    if !json {
        println!("Housing market ABM: sim-runner");
        println!("  seed:      {seed}");
        println!("  years:     {years}");
        println!("  scale:     {scale}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        if let Some(rate) = tax_rate {
            println!("  tax_rate:  {rate}");
        }
        println!();
    }

    let (mut config, tables) = if builtin {
        (SimConfig::default_test(), ReferenceTables::irish_2020())
    } else {
        (
            SimConfig::load(data_dir).with_context(|| format!("loading config from {data_dir}"))?,
            ReferenceTables::load(data_dir)
                .with_context(|| format!("loading reference tables from {data_dir}"))?,
        )
    };

    if let Some(rate) = tax_rate {
        config.economy.initial_tax_rate = rate;
    }

    let mut store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    let started_at = chrono::Utc::now().to_rfc3339();
    store.insert_run(&run_id, seed, scale, env!("CARGO_PKG_VERSION"), &started_at)?;

    let engine = SimEngine::new(run_id.clone(), seed, config, tables)?;
    let mut sim = Simulation::start(engine, scale)?;
    store.record_statistics(&run_id, &sim.statistics())?;

    let mut yearly = Vec::with_capacity(years as usize);
    let mut events_logged = persist_events(&mut store, &mut sim)?;
    for _ in 0..years {
        let stats = sim.run_year()?;
        store.record_statistics(&run_id, &stats)?;
        events_logged += persist_events(&mut store, &mut sim)?;
        if !json {
            print_year(&stats, sim.tax_rate);
        }
        yearly.push(stats);
    }

    let summary = RunSummary {
        run_id: &run_id,
        seed: sim.engine.seed(),
        scale_factor: sim.engine.scale_factor(),
        years,
        final_tax_rate: sim.tax_rate,
        interest_rate: sim.engine.bank().interest_rate(),
        events_logged,
        yearly: &yearly,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &store)?;
    }
    Ok(())
}

fn persist_events(store: &mut SimStore, sim: &mut Simulation) -> Result<usize> {
    let events = sim.take_events();
    let entries = sim.engine.log_entries(&events)?;
    store.append_events(&entries)?;
    Ok(entries.len())
}

fn print_year(stats: &TickStatistics, tax_rate: f64) {
    println!(
        "  year {:>3} | households {:>6} | vacant {:>6} | price {:>9.0} | rent {:>6.0} | owners {:>5.1}% | tax {:.2}",
        stats.tick / 12,
        stats.households,
        stats.vacant_houses,
        stats.avg_purchase_price,
        stats.avg_monthly_rent,
        stats.homeownership_rate * 100.0,
        tax_rate,
    );
}

fn print_summary(summary: &RunSummary<'_>, store: &SimStore) -> Result<()> {
    let purchases = store.count_events(summary.run_id, "house_purchased")?;
    let foreclosures = store.count_events(summary.run_id, "foreclosure_recorded")?;
    let social = store.count_events(summary.run_id, "social_housing_assigned")?;

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", summary.run_id);
    println!("  years run:      {}", summary.years);
    println!("  final tax rate: {:.2}", summary.final_tax_rate);
    println!("  interest rate:  {:.4}", summary.interest_rate);
    println!("  events logged:  {}", summary.events_logged);
    println!("  purchases:      {purchases}");
    println!("  foreclosures:   {foreclosures}");
    println!("  social lets:    {social}");
    if let Some(last) = summary.yearly.last() {
        println!("  population:     {}", last.population);
        println!("  unemployment:   {:.1}%", last.unemployment_rate * 100.0);
        println!("  m² per person:  {:.1}", last.area_per_person);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    parse_optional(args, flag).unwrap_or(default)
}

/// Value following `flag`, if present and parsable. Unparsable values are
/// reported and ignored.
fn parse_optional<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let raw = args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("{flag}: cannot parse {raw:?}; ignoring it");
            None
        }
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .unwrap_or(default)
}
