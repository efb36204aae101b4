//! Profitability ratios, in percent.

use crate::{
    inputs::Inputs,
    primitives::{difference, percentage, safe_ratio},
};

/// Return on equity: TTM net income over period-end equity.
pub fn roe(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("net_income"),
        inputs.point("total_equity"),
    ))
}

/// Return on assets: TTM net income over period-end total assets.
pub fn roa(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("net_income"),
        inputs.point("total_assets"),
    ))
}

/// Gross margin.
pub fn gross_margin(inputs: &dyn Inputs) -> Option<f64> {
    let revenue = inputs.ttm("revenue");
    percentage(safe_ratio(
        difference(revenue, inputs.ttm("cost_of_revenue")),
        revenue,
    ))
}

/// Operating margin.
pub fn operating_margin(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("operating_income"),
        inputs.ttm("revenue"),
    ))
}

/// Net margin.
pub fn net_margin(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(inputs.ttm("net_income"), inputs.ttm("revenue")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputSnapshot;
    use approx::assert_relative_eq;

    fn inputs() -> InputSnapshot {
        InputSnapshot::new()
            .with_ttm("net_income", 460.0)
            .with_ttm("revenue", 2000.0)
            .with_ttm("cost_of_revenue", 1500.0)
            .with_ttm("operating_income", 600.0)
            .with_point("total_equity", 500.0)
            .with_point("total_assets", 4600.0)
    }

    #[test]
    fn test_roe() {
        assert_relative_eq!(roe(&inputs()).unwrap(), 92.0, epsilon = 1e-9);
    }

    #[test]
    fn test_margins() {
        let inputs = inputs();
        assert_relative_eq!(roa(&inputs).unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(gross_margin(&inputs).unwrap(), 25.0, epsilon = 1e-9);
        assert_relative_eq!(operating_margin(&inputs).unwrap(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(net_margin(&inputs).unwrap(), 23.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_equity_is_undefined() {
        let inputs = inputs().with_point("total_equity", 0.0);
        assert_eq!(roe(&inputs), None);
    }
}
