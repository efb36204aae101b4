//! Long-format fact records.

use crate::{
    error::Result,
    period::{FiscalPeriod, Frequency, PeriodEnd, normalize},
};
use serde::{Deserialize, Serialize};

/// One reported line item, as delivered by upstream ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Reporting entity
    pub entity_id: String,
    /// Taxonomy-specific line-item code
    pub native_code: String,
    /// Raw period end
    pub period_end: PeriodEnd,
    /// Reporting frequency
    pub frequency: Frequency,
    /// Reported value
    pub value: f64,
}

impl FactRecord {
    /// Create a fact from raw string fields.
    pub fn new(
        entity_id: &str,
        native_code: &str,
        period_end: &str,
        frequency_code: &str,
        value: f64,
    ) -> Result<Self> {
        Ok(Self {
            entity_id: entity_id.to_string(),
            native_code: native_code.to_string(),
            period_end: PeriodEnd::parse(period_end)?,
            frequency: Frequency::from_code(frequency_code)?,
            value,
        })
    }

    /// Canonical fiscal period of this fact.
    pub fn fiscal_period(&self) -> Result<FiscalPeriod> {
        normalize(self.period_end, self.frequency)
    }
}
