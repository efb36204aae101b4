//! Broker revenue mix, in percent of operating revenue.

use crate::{
    inputs::Inputs,
    primitives::{percentage, safe_ratio},
};

fn revenue_share(inputs: &dyn Inputs, name: &str) -> Option<f64> {
    percentage(safe_ratio(inputs.ttm(name), inputs.ttm("revenue")))
}

/// Brokerage commission share of revenue.
pub fn brokerage_fee_share(inputs: &dyn Inputs) -> Option<f64> {
    revenue_share(inputs, "brokerage_fee_income")
}

/// Investment banking share of revenue.
pub fn investment_banking_share(inputs: &dyn Inputs) -> Option<f64> {
    revenue_share(inputs, "investment_banking_income")
}

/// Proprietary trading share of revenue.
pub fn proprietary_trading_share(inputs: &dyn Inputs) -> Option<f64> {
    revenue_share(inputs, "proprietary_trading_income")
}
