//! SQLite-backed store.
//!
//! Facts are append-only and read back in insertion order, so reshaping a
//! stored taxonomy resolves duplicates exactly as the original ingestion
//! would. Metrics and valuations are replaced wholesale per entity or per
//! `(instrument, ratio)`; [`SqliteStore::replace_run`] swaps every entity and
//! series of a pipeline run inside one transaction.

use crate::{
    error::{DataError, Result},
    fact::FactRecord,
    metrics::{MetricsRecord, ValuationObservation},
    period::{Frequency, PeriodEnd},
    price::{Instrument, PriceObservation},
};
use chrono::NaiveDate;
use keel_registry::Taxonomy;
use rusqlite::{Connection, params};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// SQLite store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid stored date {raw:?}: {e}")))
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS facts (
                taxonomy TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                native_code TEXT NOT NULL,
                period_end TEXT NOT NULL,
                frequency TEXT NOT NULL,
                value REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_facts_taxonomy ON facts(taxonomy, entity_id);

            CREATE TABLE IF NOT EXISTS prices (
                instrument_id TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                close_price REAL NOT NULL,
                shares_outstanding REAL NOT NULL,
                PRIMARY KEY (instrument_id, trade_date)
            );

            CREATE TABLE IF NOT EXISTS instruments (
                instrument_id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL,
                taxonomy TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS metrics (
                entity_id TEXT NOT NULL,
                taxonomy TEXT NOT NULL,
                fiscal_year INTEGER NOT NULL,
                fiscal_quarter INTEGER NOT NULL,
                period_end TEXT NOT NULL,
                metric TEXT NOT NULL,
                value REAL,
                PRIMARY KEY (entity_id, fiscal_year, fiscal_quarter, metric)
            );

            CREATE TABLE IF NOT EXISTS valuations (
                instrument_id TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                ratio_name TEXT NOT NULL,
                ratio_value REAL,
                PRIMARY KEY (instrument_id, trade_date, ratio_name)
            );",
        )?;
        Ok(())
    }

    /// Append facts reported under `taxonomy`.
    ///
    /// Non-finite values carry no information and are not stored.
    pub fn put_facts(&self, taxonomy: &Taxonomy, facts: &[FactRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO facts (taxonomy, entity_id, native_code, period_end, frequency, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for fact in facts {
                if !fact.value.is_finite() {
                    debug!(
                        entity = %fact.entity_id,
                        code = %fact.native_code,
                        "not storing non-finite fact value"
                    );
                    continue;
                }
                stmt.execute(params![
                    taxonomy.as_str(),
                    fact.entity_id,
                    fact.native_code,
                    fact.period_end.to_string(),
                    fact.frequency.code(),
                    fact.value
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All facts of a taxonomy, in insertion order.
    pub fn get_facts(&self, taxonomy: &Taxonomy) -> Result<Vec<FactRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT entity_id, native_code, period_end, frequency, value
             FROM facts WHERE taxonomy = ?1 ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![taxonomy.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (entity_id, native_code, period_end, frequency, value) = row?;
            facts.push(FactRecord {
                entity_id,
                native_code,
                period_end: PeriodEnd::parse(&period_end)?,
                frequency: Frequency::from_code(&frequency)?,
                value,
            });
        }
        Ok(facts)
    }

    /// Distinct entities with facts under `taxonomy`, sorted.
    pub fn get_entities(&self, taxonomy: &Taxonomy) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT entity_id FROM facts WHERE taxonomy = ?1 ORDER BY entity_id",
        )?;
        let entities = stmt
            .query_map(params![taxonomy.as_str()], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(entities)
    }

    /// Store price observations, replacing any existing row for the same day.
    pub fn put_prices(&self, prices: &[PriceObservation]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for price in prices {
            tx.execute(
                "INSERT OR REPLACE INTO prices
                 (instrument_id, trade_date, close_price, shares_outstanding)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    price.instrument_id,
                    price.trade_date.to_string(),
                    price.close_price,
                    price.shares_outstanding
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Price history of an instrument in date order.
    pub fn get_prices(&self, instrument_id: &str) -> Result<Vec<PriceObservation>> {
        let mut stmt = self.conn.prepare(
            "SELECT trade_date, close_price, shares_outstanding
             FROM prices WHERE instrument_id = ?1 ORDER BY trade_date ASC",
        )?;

        let rows = stmt.query_map(params![instrument_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut prices = Vec::new();
        for row in rows {
            let (date, close_price, shares_outstanding) = row?;
            prices.push(PriceObservation {
                instrument_id: instrument_id.to_string(),
                trade_date: parse_date(&date)?,
                close_price,
                shares_outstanding,
            });
        }
        Ok(prices)
    }

    /// Register or update an instrument mapping.
    pub fn put_instrument(&self, instrument: &Instrument) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO instruments (instrument_id, entity_id, taxonomy)
             VALUES (?1, ?2, ?3)",
            params![
                instrument.instrument_id,
                instrument.entity_id,
                instrument.taxonomy.as_str()
            ],
        )?;
        Ok(())
    }

    /// All instruments, sorted by id.
    pub fn get_instruments(&self) -> Result<Vec<Instrument>> {
        let mut stmt = self.conn.prepare(
            "SELECT instrument_id, entity_id, taxonomy FROM instruments ORDER BY instrument_id",
        )?;
        let instruments = stmt
            .query_map([], |row| {
                Ok(Instrument::new(
                    &row.get::<_, String>(0)?,
                    &row.get::<_, String>(1)?,
                    Taxonomy::new(&row.get::<_, String>(2)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(instruments)
    }

    /// Replace every stored metric of `entity_id` with `records`.
    ///
    /// Records are stored under their own `entity_id`.
    pub fn replace_metrics(&self, entity_id: &str, records: &[MetricsRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM metrics WHERE entity_id = ?1", params![entity_id])?;
        insert_metrics(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the metrics and valuations of a whole run in one transaction.
    ///
    /// Every entity present in `metrics` and every `(instrument, ratio)`
    /// present in `valuations` is replaced; others are left untouched. A
    /// reader sees either the previous contents or the complete new run.
    pub fn replace_run(
        &self,
        metrics: &[MetricsRecord],
        valuations: &[ValuationObservation],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let entities: BTreeSet<&str> = metrics.iter().map(|m| m.entity_id.as_str()).collect();
        for entity_id in entities {
            tx.execute("DELETE FROM metrics WHERE entity_id = ?1", params![entity_id])?;
        }
        let series: BTreeSet<(&str, &str)> = valuations
            .iter()
            .map(|v| (v.instrument_id.as_str(), v.ratio_name.as_str()))
            .collect();
        for (instrument_id, ratio_name) in series {
            tx.execute(
                "DELETE FROM valuations WHERE instrument_id = ?1 AND ratio_name = ?2",
                params![instrument_id, ratio_name],
            )?;
        }

        insert_metrics(&tx, metrics)?;
        insert_valuations(&tx, valuations)?;
        tx.commit()?;
        Ok(())
    }

    /// Metrics history of an entity in period order.
    pub fn get_metrics(&self, entity_id: &str) -> Result<Vec<MetricsRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT taxonomy, fiscal_year, fiscal_quarter, period_end, metric, value
             FROM metrics WHERE entity_id = ?1
             ORDER BY fiscal_year, fiscal_quarter, metric",
        )?;

        let rows = stmt.query_map(params![entity_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, u8>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<f64>>(5)?,
            ))
        })?;

        let mut records: BTreeMap<(i32, u8), MetricsRecord> = BTreeMap::new();
        for row in rows {
            let (taxonomy, fiscal_year, fiscal_quarter, period_end, metric, value) = row?;
            let period_end = parse_date(&period_end)?;
            records
                .entry((fiscal_year, fiscal_quarter))
                .or_insert_with(|| MetricsRecord {
                    entity_id: entity_id.to_string(),
                    taxonomy: Taxonomy::new(&taxonomy),
                    fiscal_year,
                    fiscal_quarter,
                    period_end,
                    values: BTreeMap::new(),
                })
                .values
                .insert(metric, value);
        }
        Ok(records.into_values().collect())
    }

    /// Replace the stored series of one ratio for one instrument.
    ///
    /// Observations belonging to another instrument or ratio are stored under
    /// their own key.
    pub fn replace_valuations(
        &self,
        instrument_id: &str,
        ratio_name: &str,
        observations: &[ValuationObservation],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM valuations WHERE instrument_id = ?1 AND ratio_name = ?2",
            params![instrument_id, ratio_name],
        )?;
        insert_valuations(&tx, observations)?;
        tx.commit()?;
        Ok(())
    }

    /// Stored series of one ratio for one instrument, in date order.
    pub fn get_valuations(
        &self,
        instrument_id: &str,
        ratio_name: &str,
    ) -> Result<Vec<ValuationObservation>> {
        let mut stmt = self.conn.prepare(
            "SELECT trade_date, ratio_value FROM valuations
             WHERE instrument_id = ?1 AND ratio_name = ?2
             ORDER BY trade_date ASC",
        )?;

        let rows = stmt.query_map(params![instrument_id, ratio_name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let (date, ratio_value) = row?;
            observations.push(ValuationObservation {
                instrument_id: instrument_id.to_string(),
                trade_date: parse_date(&date)?,
                ratio_name: ratio_name.to_string(),
                ratio_value,
            });
        }
        Ok(observations)
    }

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            facts: count("SELECT COUNT(*) FROM facts")?,
            entities: count("SELECT COUNT(DISTINCT entity_id) FROM facts")?,
            prices: count("SELECT COUNT(*) FROM prices")?,
            instruments: count("SELECT COUNT(*) FROM instruments")?,
            metric_values: count("SELECT COUNT(*) FROM metrics")?,
            valuations: count("SELECT COUNT(*) FROM valuations")?,
        })
    }
}

fn insert_metrics(conn: &Connection, records: &[MetricsRecord]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO metrics
         (entity_id, taxonomy, fiscal_year, fiscal_quarter, period_end, metric, value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for record in records {
        for (metric, value) in &record.values {
            stmt.execute(params![
                record.entity_id,
                record.taxonomy.as_str(),
                record.fiscal_year,
                record.fiscal_quarter,
                record.period_end.to_string(),
                metric,
                value
            ])?;
        }
    }
    Ok(())
}

fn insert_valuations(conn: &Connection, observations: &[ValuationObservation]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO valuations (instrument_id, trade_date, ratio_name, ratio_value)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for obs in observations {
        stmt.execute(params![
            obs.instrument_id,
            obs.trade_date.to_string(),
            obs.ratio_name,
            obs.ratio_value
        ])?;
    }
    Ok(())
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored facts
    pub facts: usize,
    /// Number of distinct entities with facts
    pub entities: usize,
    /// Number of price observations
    pub prices: usize,
    /// Number of registered instruments
    pub instruments: usize,
    /// Number of stored metric cells, including undefined ones
    pub metric_values: usize,
    /// Number of stored valuation observations
    pub valuations: usize,
}
