//! Balance-sheet structure.

use crate::{
    inputs::Inputs,
    primitives::{percentage, safe_ratio},
};

/// Total liabilities over total assets, in percent.
pub fn debt_to_assets(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.point("total_liabilities"),
        inputs.point("total_assets"),
    ))
}

/// Current assets over current liabilities.
pub fn current_ratio(inputs: &dyn Inputs) -> Option<f64> {
    safe_ratio(
        inputs.point("current_assets"),
        inputs.point("current_liabilities"),
    )
}
