//! Columnar ingestion from polars DataFrames.
//!
//! Fact frames carry `entity_id, native_code, period_end, frequency, value`;
//! price frames carry `instrument_id, trade_date, close, shares_outstanding`.
//! Date columns may be either `Date` or `String` typed.

use crate::{
    error::{DataError, Result},
    fact::FactRecord,
    period::{Frequency, PeriodEnd},
    price::{Instrument, PriceObservation},
};
use chrono::NaiveDate;
use keel_registry::Taxonomy;
use polars::prelude::*;
use tracing::debug;

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}

fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    Ok(column(df, name)?.cast(&DataType::String)?.str()?.clone())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    Ok(column(df, name)?.cast(&DataType::Float64)?.f64()?.clone())
}

fn required<'a>(values: &'a StringChunked, row: usize, name: &str) -> Result<&'a str> {
    values
        .get(row)
        .ok_or_else(|| DataError::Parse(format!("Missing {name} at row {row}")))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid date {raw:?}: {e}")))
}

/// Read fact records from a long-format frame, preserving row order.
///
/// Rows with a null value are skipped; a null key column is an error.
pub fn facts_from_frame(df: &DataFrame) -> Result<Vec<FactRecord>> {
    let entities = string_column(df, "entity_id")?;
    let codes = string_column(df, "native_code")?;
    let period_ends = string_column(df, "period_end")?;
    let frequencies = string_column(df, "frequency")?;
    let values = float_column(df, "value")?;

    let mut facts = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        let Some(value) = values.get(i) else {
            skipped += 1;
            continue;
        };
        facts.push(FactRecord {
            entity_id: required(&entities, i, "entity_id")?.to_string(),
            native_code: required(&codes, i, "native_code")?.to_string(),
            period_end: PeriodEnd::parse(required(&period_ends, i, "period_end")?)?,
            frequency: Frequency::from_code(required(&frequencies, i, "frequency")?)?,
            value,
        });
    }

    if skipped > 0 {
        debug!(skipped, "skipped fact rows with null values");
    }
    Ok(facts)
}

/// Read daily price observations from a frame.
pub fn prices_from_frame(df: &DataFrame) -> Result<Vec<PriceObservation>> {
    let instruments = string_column(df, "instrument_id")?;
    let dates = string_column(df, "trade_date")?;
    let closes = float_column(df, "close")?;
    let shares = float_column(df, "shares_outstanding")?;

    (0..df.height())
        .map(|i| {
            Ok(PriceObservation {
                instrument_id: required(&instruments, i, "instrument_id")?.to_string(),
                trade_date: parse_date(required(&dates, i, "trade_date")?)?,
                close_price: closes
                    .get(i)
                    .ok_or_else(|| DataError::Parse(format!("Missing close at row {i}")))?,
                shares_outstanding: shares.get(i).ok_or_else(|| {
                    DataError::Parse(format!("Missing shares_outstanding at row {i}"))
                })?,
            })
        })
        .collect()
}

/// Read instrument mappings from a frame with `instrument_id, entity_id, taxonomy`.
pub fn instruments_from_frame(df: &DataFrame) -> Result<Vec<Instrument>> {
    let instruments = string_column(df, "instrument_id")?;
    let entities = string_column(df, "entity_id")?;
    let taxonomies = string_column(df, "taxonomy")?;

    (0..df.height())
        .map(|i| {
            Ok(Instrument::new(
                required(&instruments, i, "instrument_id")?,
                required(&entities, i, "entity_id")?,
                Taxonomy::new(required(&taxonomies, i, "taxonomy")?),
            ))
        })
        .collect()
}
