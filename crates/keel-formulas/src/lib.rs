#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fundamentals;
pub mod growth;
pub mod inputs;
pub mod leverage;
pub mod per_share;
pub mod primitives;
pub mod profitability;
pub mod registry;
pub mod sector;
pub mod valuation;

pub use inputs::{InputSnapshot, Inputs};
pub use primitives::{
    TtmSource, percentage, period_over_period_growth, safe_ratio, trailing_twelve_month,
};
pub use registry::{
    Formula, FormulaCategory, available_formulas, formulas_by_category, get_formula,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
