//! Year-over-year growth of trailing-twelve-month flows, in percent.

use crate::{
    inputs::Inputs,
    primitives::{percentage, period_over_period_growth},
};

fn ttm_growth(inputs: &dyn Inputs, name: &str) -> Option<f64> {
    percentage(period_over_period_growth(
        inputs.ttm(name),
        inputs.prior_ttm(name),
    ))
}

/// Revenue growth.
pub fn revenue_growth(inputs: &dyn Inputs) -> Option<f64> {
    ttm_growth(inputs, "revenue")
}

/// Net income growth.
pub fn net_income_growth(inputs: &dyn Inputs) -> Option<f64> {
    ttm_growth(inputs, "net_income")
}
