//! polars views of engine outputs.

use crate::error::Result;
use chrono::NaiveDate;
use keel_data::{MetricsRecord, ValuationObservation};
use keel_engine::DistributionSummary;
use polars::prelude::*;
use std::collections::BTreeSet;

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Column> {
    let days: Vec<i32> = dates
        .map(|d| (d - epoch()).num_days() as i32)
        .collect();
    Ok(Series::new(name.into(), days)
        .cast(&DataType::Date)?
        .into())
}

/// Wide metrics frame: key columns followed by one `Float64` column per
/// metric name, sorted. Metrics a record lacks are null.
pub fn metrics_to_frame(records: &[MetricsRecord]) -> Result<DataFrame> {
    let names: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.values.keys().map(String::as_str))
        .collect();

    let entities: Vec<&str> = records.iter().map(|r| r.entity_id.as_str()).collect();
    let taxonomies: Vec<&str> = records.iter().map(|r| r.taxonomy.as_str()).collect();
    let years: Vec<i32> = records.iter().map(|r| r.fiscal_year).collect();
    let quarters: Vec<u32> = records.iter().map(|r| u32::from(r.fiscal_quarter)).collect();

    let mut columns: Vec<Column> = vec![
        Series::new("entity_id".into(), entities).into(),
        Series::new("taxonomy".into(), taxonomies).into(),
        Series::new("fiscal_year".into(), years).into(),
        Series::new("fiscal_quarter".into(), quarters).into(),
        date_column("period_end", records.iter().map(|r| r.period_end))?,
    ];

    for name in names {
        let values: Vec<Option<f64>> = records.iter().map(|r| r.get(name)).collect();
        columns.push(Series::new(name.into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Long valuation frame with columns
/// `instrument_id, trade_date, ratio_name, ratio_value`.
pub fn valuations_to_frame(observations: &[ValuationObservation]) -> Result<DataFrame> {
    let instruments: Vec<&str> = observations
        .iter()
        .map(|o| o.instrument_id.as_str())
        .collect();
    let ratios: Vec<&str> = observations.iter().map(|o| o.ratio_name.as_str()).collect();
    let values: Vec<Option<f64>> = observations.iter().map(|o| o.ratio_value).collect();

    Ok(DataFrame::new(vec![
        Series::new("instrument_id".into(), instruments).into(),
        date_column("trade_date", observations.iter().map(|o| o.trade_date))?,
        Series::new("ratio_name".into(), ratios).into(),
        Series::new("ratio_value".into(), values).into(),
    ])?)
}

/// One row per summary.
pub fn summaries_to_frame(summaries: &[DistributionSummary]) -> Result<DataFrame> {
    let floats = |f: fn(&DistributionSummary) -> f64| -> Vec<f64> {
        summaries.iter().map(f).collect()
    };
    let instruments: Vec<&str> = summaries.iter().map(|s| s.instrument_id.as_str()).collect();
    let ratios: Vec<&str> = summaries.iter().map(|s| s.ratio_name.as_str()).collect();
    let sizes: Vec<u64> = summaries.iter().map(|s| s.sample_size as u64).collect();
    let capped: Vec<bool> = summaries.iter().map(|s| s.used_capped).collect();

    Ok(DataFrame::new(vec![
        Series::new("instrument_id".into(), instruments).into(),
        Series::new("ratio_name".into(), ratios).into(),
        date_column("as_of_date", summaries.iter().map(|s| s.as_of_date))?,
        Series::new("p5".into(), floats(|s| s.p5)).into(),
        Series::new("p25".into(), floats(|s| s.p25)).into(),
        Series::new("p50".into(), floats(|s| s.p50)).into(),
        Series::new("p75".into(), floats(|s| s.p75)).into(),
        Series::new("p95".into(), floats(|s| s.p95)).into(),
        Series::new("current_value".into(), floats(|s| s.current_value)).into(),
        Series::new("current_percentile".into(), floats(|s| s.current_percentile)).into(),
        Series::new("sample_size".into(), sizes).into(),
        Series::new("used_capped".into(), capped).into(),
    ])?)
}
