//! Bank ratios, in percent.

use crate::{
    inputs::Inputs,
    primitives::{percentage, safe_ratio},
};

/// Net interest margin: TTM net interest income over interest-earning assets.
pub fn nim(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("net_interest_income"),
        inputs.point("interest_earning_assets"),
    ))
}

/// Cost-to-income ratio.
pub fn cir(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.ttm("operating_expense"),
        inputs.ttm("revenue"),
    ))
}

/// Non-performing loans over gross loans.
pub fn npl_ratio(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.point("non_performing_loans"),
        inputs.point("total_loans"),
    ))
}

/// Loan loss allowance over non-performing loans.
pub fn provision_coverage(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.point("loan_loss_reserve"),
        inputs.point("non_performing_loans"),
    ))
}

/// Gross loans over customer deposits.
pub fn loan_to_deposit(inputs: &dyn Inputs) -> Option<f64> {
    percentage(safe_ratio(
        inputs.point("total_loans"),
        inputs.point("total_deposits"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputSnapshot;
    use approx::assert_relative_eq;

    #[test]
    fn test_bank_ratios() {
        let inputs = InputSnapshot::new()
            .with_ttm("net_interest_income", 30.0)
            .with_ttm("operating_expense", 40.0)
            .with_ttm("revenue", 100.0)
            .with_point("interest_earning_assets", 1500.0)
            .with_point("non_performing_loans", 12.0)
            .with_point("loan_loss_reserve", 24.0)
            .with_point("total_loans", 800.0)
            .with_point("total_deposits", 1000.0);

        assert_relative_eq!(nim(&inputs).unwrap(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(cir(&inputs).unwrap(), 40.0, epsilon = 1e-9);
        assert_relative_eq!(npl_ratio(&inputs).unwrap(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(provision_coverage(&inputs).unwrap(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(loan_to_deposit(&inputs).unwrap(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nim_without_bank_inputs() {
        let inputs = InputSnapshot::new().with_ttm("revenue", 100.0);
        assert_eq!(nim(&inputs), None);
    }
}
