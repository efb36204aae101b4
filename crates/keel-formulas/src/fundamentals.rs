//! Fundamental building blocks consumed by the valuation compositor.

use crate::{
    inputs::Inputs,
    primitives::{finite, sum},
};

/// Net income over the trailing twelve months.
pub fn net_income_ttm(inputs: &dyn Inputs) -> Option<f64> {
    inputs.ttm("net_income")
}

/// Revenue over the trailing twelve months.
pub fn revenue_ttm(inputs: &dyn Inputs) -> Option<f64> {
    inputs.ttm("revenue")
}

/// Operating income plus depreciation and amortization, trailing twelve months.
pub fn ebitda_ttm(inputs: &dyn Inputs) -> Option<f64> {
    sum(
        inputs.ttm("operating_income"),
        inputs.ttm("depreciation_amortization"),
    )
}

/// Shareholders' equity at period end.
pub fn total_equity(inputs: &dyn Inputs) -> Option<f64> {
    inputs.point("total_equity").and_then(finite)
}

/// Short-term plus long-term borrowings at period end.
pub fn total_debt(inputs: &dyn Inputs) -> Option<f64> {
    sum(inputs.point("short_term_debt"), inputs.point("long_term_debt"))
}

/// Cash and equivalents at period end.
pub fn cash(inputs: &dyn Inputs) -> Option<f64> {
    inputs.point("cash").and_then(finite)
}

/// Shares outstanding at period end.
pub fn shares_outstanding(inputs: &dyn Inputs) -> Option<f64> {
    inputs.point("shares_outstanding").and_then(finite)
}
