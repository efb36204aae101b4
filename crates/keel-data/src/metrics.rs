//! Derived records produced by the engine.

use chrono::NaiveDate;
use keel_registry::Taxonomy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::period::PeriodKey;

/// Computed metrics of one entity for one fiscal period.
///
/// A `None` value is a metric the period lacked inputs for; it is expected
/// and normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// Reporting entity
    pub entity_id: String,
    /// Taxonomy the entity reports under
    pub taxonomy: Taxonomy,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter, 1..=4
    pub fiscal_quarter: u8,
    /// Last calendar day of the fiscal quarter
    pub period_end: NaiveDate,
    /// Metric name → value
    pub values: BTreeMap<String, Option<f64>>,
}

impl MetricsRecord {
    /// `(fiscal_year, fiscal_quarter)` key.
    pub const fn key(&self) -> PeriodKey {
        PeriodKey::new(self.fiscal_year, self.fiscal_quarter)
    }

    /// Value of a metric; `None` if absent or undefined.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied().flatten()
    }
}

/// One valuation ratio of an instrument on one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationObservation {
    /// Instrument identifier
    pub instrument_id: String,
    /// Trading day; always has a matching price observation
    pub trade_date: NaiveDate,
    /// Ratio name (`pe_ttm`, `pb`, ...)
    pub ratio_name: String,
    /// Ratio value; `None` when the fundamental denominator is missing or zero
    pub ratio_value: Option<f64>,
}
