//! Wide records: one row per entity and fiscal period.

use crate::period::{FiscalPeriod, Frequency, PeriodKey};
use chrono::NaiveDate;
use keel_registry::Taxonomy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All catalogued facts an entity reported for one fiscal period, keyed by
/// generic name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRecord {
    /// Reporting entity
    pub entity_id: String,
    /// Taxonomy the facts were reported under
    pub taxonomy: Taxonomy,
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter, 1..=4
    pub fiscal_quarter: u8,
    /// Whether the record covers the full fiscal year
    pub is_full_year: bool,
    /// Last calendar day of the fiscal quarter
    pub period_end: NaiveDate,
    /// Reporting frequency the record is classified under
    pub source: Frequency,
    /// Generic name → value
    pub values: BTreeMap<String, f64>,
}

impl WideRecord {
    /// Empty record for an entity and period.
    pub fn new(
        entity_id: &str,
        taxonomy: Taxonomy,
        period: FiscalPeriod,
        source: Frequency,
    ) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            taxonomy,
            fiscal_year: period.fiscal_year,
            fiscal_quarter: period.fiscal_quarter,
            is_full_year: period.is_full_year,
            period_end: period.period_end,
            source,
            values: BTreeMap::new(),
        }
    }

    /// `(fiscal_year, fiscal_quarter)` key.
    pub const fn key(&self) -> PeriodKey {
        PeriodKey::new(self.fiscal_year, self.fiscal_quarter)
    }

    /// Value of a generic field.
    pub fn get(&self, generic_name: &str) -> Option<f64> {
        self.values.get(generic_name).copied()
    }

    /// Set a generic field, overwriting any earlier value.
    pub fn set(&mut self, generic_name: &str, value: f64) {
        self.values.insert(generic_name.to_string(), value);
    }

    /// Classify the record by the period of a fact about to be written.
    ///
    /// The first fact decides. Later facts may promote a quarterly record to
    /// an annual report, but never demote an annual report: a balance sheet
    /// filed as `Q` does not turn an annual P&L into a single quarter.
    pub fn classify(&mut self, period: FiscalPeriod, source: Frequency) {
        if self.values.is_empty() || !self.is_annual_report() {
            self.is_full_year = period.is_full_year;
            self.period_end = period.period_end;
            self.source = source;
        }
    }

    /// Whether this record holds a single discrete quarter.
    ///
    /// Only quarterly reports qualify; annual, semi-annual and monthly
    /// reports never take part in a four-quarter summation.
    pub fn is_discrete_quarter(&self) -> bool {
        self.source == Frequency::Quarterly
    }

    /// Whether the TTM of this record is its own value, with no summation.
    pub fn is_annual_report(&self) -> bool {
        self.is_full_year && self.source != Frequency::Quarterly
    }
}
