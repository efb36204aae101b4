#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fact;
pub mod frame;
pub mod metrics;
pub mod period;
pub mod price;
pub mod reshape;
pub mod store;
pub mod wide;

pub use error::{DataError, Result};
pub use fact::FactRecord;
pub use frame::{facts_from_frame, instruments_from_frame, prices_from_frame};
pub use metrics::{MetricsRecord, ValuationObservation};
pub use period::{FiscalPeriod, Frequency, PeriodEnd, PeriodKey, normalize, normalize_raw};
pub use price::{Instrument, PriceObservation};
pub use reshape::Reshaper;
pub use store::{SqliteStore, StoreStats};
pub use wide::WideRecord;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
