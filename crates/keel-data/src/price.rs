//! Daily market data.

use chrono::NaiveDate;
use keel_registry::Taxonomy;
use serde::{Deserialize, Serialize};

/// Closing price and share count of an instrument on one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Instrument identifier
    pub instrument_id: String,
    /// Trading day
    pub trade_date: NaiveDate,
    /// Closing price
    pub close_price: f64,
    /// Shares outstanding on that day
    pub shares_outstanding: f64,
}

impl PriceObservation {
    /// Create an observation.
    pub fn new(
        instrument_id: &str,
        trade_date: NaiveDate,
        close_price: f64,
        shares_outstanding: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            trade_date,
            close_price,
            shares_outstanding,
        }
    }

    /// Market capitalization.
    pub fn market_cap(&self) -> f64 {
        self.close_price * self.shares_outstanding
    }
}

/// Links a priced instrument to the entity whose fundamentals value it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Instrument identifier
    pub instrument_id: String,
    /// Reporting entity
    pub entity_id: String,
    /// Taxonomy the entity reports under
    pub taxonomy: Taxonomy,
}

impl Instrument {
    /// Create an instrument mapping.
    pub fn new(instrument_id: &str, entity_id: &str, taxonomy: Taxonomy) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            entity_id: entity_id.to_string(),
            taxonomy,
        }
    }
}
