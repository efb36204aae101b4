//! How formulas read their inputs.

use std::collections::HashMap;

/// Named scalar inputs for one entity at one fiscal period.
///
/// Names are generic metric names (`net_income`, `total_equity`), never
/// taxonomy-specific codes.
pub trait Inputs {
    /// Balance-sheet style value at the period end.
    fn point(&self, name: &str) -> Option<f64>;

    /// Flow summed over the trailing twelve months ending at the period.
    fn ttm(&self, name: &str) -> Option<f64>;

    /// Trailing-twelve-month flow ending one year before the period.
    fn prior_ttm(&self, name: &str) -> Option<f64>;
}

/// [`Inputs`] backed by plain maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    point: HashMap<String, f64>,
    ttm: HashMap<String, f64>,
    prior_ttm: HashMap<String, f64>,
}

impl InputSnapshot {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point-in-time value.
    pub fn with_point(mut self, name: &str, value: f64) -> Self {
        self.point.insert(name.to_string(), value);
        self
    }

    /// Add a trailing-twelve-month value.
    pub fn with_ttm(mut self, name: &str, value: f64) -> Self {
        self.ttm.insert(name.to_string(), value);
        self
    }

    /// Add a year-earlier trailing-twelve-month value.
    pub fn with_prior_ttm(mut self, name: &str, value: f64) -> Self {
        self.prior_ttm.insert(name.to_string(), value);
        self
    }
}

impl Inputs for InputSnapshot {
    fn point(&self, name: &str) -> Option<f64> {
        self.point.get(name).copied()
    }

    fn ttm(&self, name: &str) -> Option<f64> {
        self.ttm.get(name).copied()
    }

    fn prior_ttm(&self, name: &str) -> Option<f64> {
        self.prior_ttm.get(name).copied()
    }
}
