//! Insurer underwriting and investment ratios, in percent.

use crate::{
    inputs::Inputs,
    primitives::{percentage, safe_ratio, sum},
};

/// Claims incurred over net premiums earned.
pub fn loss_ratio(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("claims_incurred"),
        inputs.ttm("net_premiums_earned"),
    ))
}

/// Underwriting expense over net premiums earned.
pub fn expense_ratio(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("underwriting_expense"),
        inputs.ttm("net_premiums_earned"),
    ))
}

/// Loss ratio plus expense ratio. Above 100 means an underwriting loss.
pub fn combined_ratio(inputs: &dyn Inputs) -> Option<f64> {
    sum(loss_ratio(inputs), expense_ratio(inputs))
}

/// TTM investment income over period-end investment assets.
pub fn investment_yield(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("investment_income"),
        inputs.point("investment_assets"),
    ))
}
