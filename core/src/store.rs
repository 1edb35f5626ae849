//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The store is a report sink: runs, per-tick statistics and the event
//! log are written out; simulation state is never read back.

use rusqlite::{params, Connection};
use crate::{
    error::SimResult,
    event::EventLogEntry,
    stats::TickStatistics,
    types::Tick,
};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: u64,
        scale_factor: f64,
        version: &str,
        started_at: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, scale_factor, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, scale_factor, version, started_at],
        )?;
        Ok(())
    }

    // ── Statistics ─────────────────────────────────────────────

    pub fn record_statistics(&self, run_id: &str, stats: &TickStatistics) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO tick_statistics (
                run_id, tick, households, population, avg_household_size, houses,
                vacant_houses, avg_purchase_price, avg_monthly_rent, homeownership_rate,
                avg_household_income, unemployment_rate, wanting_to_move, area_per_person)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                run_id,
                stats.tick as i64,
                stats.households as i64,
                stats.population as i64,
                stats.avg_household_size,
                stats.houses as i64,
                stats.vacant_houses as i64,
                stats.avg_purchase_price,
                stats.avg_monthly_rent,
                stats.homeownership_rate,
                stats.avg_household_income,
                stats.unemployment_rate,
                stats.wanting_to_move as i64,
                stats.area_per_person,
            ],
        )?;
        Ok(())
    }

    pub fn statistics_for_run(&self, run_id: &str) -> SimResult<Vec<TickStatistics>> {
        let mut stmt = self.conn.prepare(
            "SELECT tick, households, population, avg_household_size, houses,
                    vacant_houses, avg_purchase_price, avg_monthly_rent, homeownership_rate,
                    avg_household_income, unemployment_rate, wanting_to_move, area_per_person
             FROM tick_statistics WHERE run_id = ?1
             ORDER BY tick ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(TickStatistics {
                    tick:                 row.get::<_, i64>(0)? as u64,
                    households:           row.get::<_, i64>(1)? as usize,
                    population:           row.get::<_, i64>(2)? as usize,
                    avg_household_size:   row.get(3)?,
                    houses:               row.get::<_, i64>(4)? as usize,
                    vacant_houses:        row.get::<_, i64>(5)? as usize,
                    avg_purchase_price:   row.get(6)?,
                    avg_monthly_rent:     row.get(7)?,
                    homeownership_rate:   row.get(8)?,
                    avg_household_income: row.get(9)?,
                    unemployment_rate:    row.get(10)?,
                    wanting_to_move:      row.get::<_, i64>(11)? as usize,
                    area_per_person:      row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.tick as i64, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    /// Append a batch inside one transaction.
    pub fn append_events(&mut self, entries: &[EventLogEntry]) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log (run_id, tick, event_type, payload)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in entries {
                stmt.execute(params![entry.run_id, entry.tick as i64, entry.event_type, entry.payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    tick:       row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_events(&self, run_id: &str, event_type: &str) -> SimResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
