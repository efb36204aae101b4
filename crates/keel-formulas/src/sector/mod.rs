//! Taxonomy-exclusive formulas.
//!
//! These read generic names that only exist in one taxonomy's catalogue
//! (net interest income for banks, premiums for insurers, fee income for
//! brokers). On any other taxonomy they evaluate to `None`.

pub mod banking;
pub mod brokerage;
pub mod insurance;
