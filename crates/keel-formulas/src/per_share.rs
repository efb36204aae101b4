//! Per-share figures.

use crate::{inputs::Inputs, primitives::safe_ratio};

/// Earnings per share on a trailing-twelve-month basis.
pub fn eps_ttm(inputs: &dyn Inputs) -> Option<f64> {
    safe_ratio(
        inputs.ttm("net_income"),
        inputs.point("shares_outstanding"),
    )
}

/// Book value per share.
pub fn bvps(inputs: &dyn Inputs) -> Option<f64> {
    safe_ratio(
        inputs.point("total_equity"),
        inputs.point("shares_outstanding"),
    )
}
