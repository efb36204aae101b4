//! Formula Registry
//!
//! Central catalogue of every formula, looked up by name. Entity calculators
//! hold lists of formula names and resolve them here.

use crate::{
    fundamentals, growth,
    inputs::Inputs,
    leverage, per_share, profitability,
    sector::{banking, brokerage, insurance},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Formula categories
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaCategory {
    /// TTM flows and period-end balances used by valuation ratios
    #[display("fundamental")]
    Fundamental,
    /// Returns and margins
    #[display("profitability")]
    Profitability,
    /// Balance-sheet structure
    #[display("leverage")]
    Leverage,
    /// Year-over-year growth
    #[display("growth")]
    Growth,
    /// Per-share figures
    #[display("per_share")]
    PerShare,
    /// Bank-only ratios
    #[display("banking")]
    Banking,
    /// Insurer-only ratios
    #[display("insurance")]
    Insurance,
    /// Broker-only ratios
    #[display("brokerage")]
    Brokerage,
}

/// A named formula and its metadata.
#[derive(Clone, Copy)]
pub struct Formula {
    /// Formula name (unique identifier, also the output metric name)
    pub name: &'static str,
    /// Formula category
    pub category: FormulaCategory,
    /// What the formula measures
    pub description: &'static str,
    /// Generic metric names the formula reads
    pub inputs: &'static [&'static str],
    /// The computation
    pub compute: fn(&dyn Inputs) -> Option<f64>,
}

impl Formula {
    /// Evaluate the formula.
    pub fn evaluate(&self, inputs: &dyn Inputs) -> Option<f64> {
        (self.compute)(inputs)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

const FORMULAS: &[Formula] = &[
    // Fundamentals
    Formula {
        name: "net_income_ttm",
        category: FormulaCategory::Fundamental,
        description: "Net income over the trailing twelve months",
        inputs: &["net_income"],
        compute: fundamentals::net_income_ttm,
    },
    Formula {
        name: "revenue_ttm",
        category: FormulaCategory::Fundamental,
        description: "Operating revenue over the trailing twelve months",
        inputs: &["revenue"],
        compute: fundamentals::revenue_ttm,
    },
    Formula {
        name: "ebitda_ttm",
        category: FormulaCategory::Fundamental,
        description: "Operating income plus depreciation and amortization, TTM",
        inputs: &["operating_income", "depreciation_amortization"],
        compute: fundamentals::ebitda_ttm,
    },
    Formula {
        name: "total_equity",
        category: FormulaCategory::Fundamental,
        description: "Shareholders' equity at period end",
        inputs: &["total_equity"],
        compute: fundamentals::total_equity,
    },
    Formula {
        name: "total_debt",
        category: FormulaCategory::Fundamental,
        description: "Short-term plus long-term borrowings at period end",
        inputs: &["short_term_debt", "long_term_debt"],
        compute: fundamentals::total_debt,
    },
    Formula {
        name: "cash",
        category: FormulaCategory::Fundamental,
        description: "Cash and equivalents at period end",
        inputs: &["cash"],
        compute: fundamentals::cash,
    },
    Formula {
        name: "shares_outstanding",
        category: FormulaCategory::Fundamental,
        description: "Shares outstanding at period end",
        inputs: &["shares_outstanding"],
        compute: fundamentals::shares_outstanding,
    },
    // Profitability
    Formula {
        name: "roe",
        category: FormulaCategory::Profitability,
        description: "Return on equity (%)",
        inputs: &["net_income", "total_equity"],
        compute: profitability::roe,
    },
    Formula {
        name: "roa",
        category: FormulaCategory::Profitability,
        description: "Return on assets (%)",
        inputs: &["net_income", "total_assets"],
        compute: profitability::roa,
    },
    Formula {
        name: "gross_margin",
        category: FormulaCategory::Profitability,
        description: "Revenue less cost of revenue over revenue (%)",
        inputs: &["revenue", "cost_of_revenue"],
        compute: profitability::gross_margin,
    },
    Formula {
        name: "operating_margin",
        category: FormulaCategory::Profitability,
        description: "Operating income over revenue (%)",
        inputs: &["operating_income", "revenue"],
        compute: profitability::operating_margin,
    },
    Formula {
        name: "net_margin",
        category: FormulaCategory::Profitability,
        description: "Net income over revenue (%)",
        inputs: &["net_income", "revenue"],
        compute: profitability::net_margin,
    },
    // Leverage
    Formula {
        name: "debt_to_assets",
        category: FormulaCategory::Leverage,
        description: "Total liabilities over total assets (%)",
        inputs: &["total_liabilities", "total_assets"],
        compute: leverage::debt_to_assets,
    },
    Formula {
        name: "current_ratio",
        category: FormulaCategory::Leverage,
        description: "Current assets over current liabilities",
        inputs: &["current_assets", "current_liabilities"],
        compute: leverage::current_ratio,
    },
    // Growth
    Formula {
        name: "revenue_growth",
        category: FormulaCategory::Growth,
        description: "Year-over-year growth of TTM revenue (%)",
        inputs: &["revenue"],
        compute: growth::revenue_growth,
    },
    Formula {
        name: "net_income_growth",
        category: FormulaCategory::Growth,
        description: "Year-over-year growth of TTM net income (%)",
        inputs: &["net_income"],
        compute: growth::net_income_growth,
    },
    // Per share
    Formula {
        name: "eps_ttm",
        category: FormulaCategory::PerShare,
        description: "TTM earnings per share",
        inputs: &["net_income", "shares_outstanding"],
        compute: per_share::eps_ttm,
    },
    Formula {
        name: "bvps",
        category: FormulaCategory::PerShare,
        description: "Book value per share",
        inputs: &["total_equity", "shares_outstanding"],
        compute: per_share::bvps,
    },
    // Banking
    Formula {
        name: "nim",
        category: FormulaCategory::Banking,
        description: "Net interest margin (%)",
        inputs: &["net_interest_income", "interest_earning_assets"],
        compute: banking::nim,
    },
    Formula {
        name: "cir",
        category: FormulaCategory::Banking,
        description: "Cost-to-income ratio (%)",
        inputs: &["operating_expense", "revenue"],
        compute: banking::cir,
    },
    Formula {
        name: "npl_ratio",
        category: FormulaCategory::Banking,
        description: "Non-performing loans over gross loans (%)",
        inputs: &["non_performing_loans", "total_loans"],
        compute: banking::npl_ratio,
    },
    Formula {
        name: "provision_coverage",
        category: FormulaCategory::Banking,
        description: "Loan loss allowance over non-performing loans (%)",
        inputs: &["loan_loss_reserve", "non_performing_loans"],
        compute: banking::provision_coverage,
    },
    Formula {
        name: "loan_to_deposit",
        category: FormulaCategory::Banking,
        description: "Gross loans over customer deposits (%)",
        inputs: &["total_loans", "total_deposits"],
        compute: banking::loan_to_deposit,
    },
    // Insurance
    Formula {
        name: "loss_ratio",
        category: FormulaCategory::Insurance,
        description: "Claims over net premiums earned (%)",
        inputs: &["claims_incurred", "net_premiums_earned"],
        compute: insurance::loss_ratio,
    },
    Formula {
        name: "expense_ratio",
        category: FormulaCategory::Insurance,
        description: "Underwriting expense over net premiums earned (%)",
        inputs: &["underwriting_expense", "net_premiums_earned"],
        compute: insurance::expense_ratio,
    },
    Formula {
        name: "combined_ratio",
        category: FormulaCategory::Insurance,
        description: "Loss ratio plus expense ratio (%)",
        inputs: &["claims_incurred", "underwriting_expense", "net_premiums_earned"],
        compute: insurance::combined_ratio,
    },
    Formula {
        name: "investment_yield",
        category: FormulaCategory::Insurance,
        description: "Investment income over investment assets (%)",
        inputs: &["investment_income", "investment_assets"],
        compute: insurance::investment_yield,
    },
    // Brokerage
    Formula {
        name: "brokerage_fee_share",
        category: FormulaCategory::Brokerage,
        description: "Brokerage fee income share of revenue (%)",
        inputs: &["brokerage_fee_income", "revenue"],
        compute: brokerage::brokerage_fee_share,
    },
    Formula {
        name: "investment_banking_share",
        category: FormulaCategory::Brokerage,
        description: "Investment banking income share of revenue (%)",
        inputs: &["investment_banking_income", "revenue"],
        compute: brokerage::investment_banking_share,
    },
    Formula {
        name: "proprietary_trading_share",
        category: FormulaCategory::Brokerage,
        description: "Proprietary trading income share of revenue (%)",
        inputs: &["proprietary_trading_income", "revenue"],
        compute: brokerage::proprietary_trading_share,
    },
];

/// Every available formula
pub const fn available_formulas() -> &'static [Formula] {
    FORMULAS
}

/// Get a formula by name
pub fn get_formula(name: &str) -> Option<&'static Formula> {
    FORMULAS.iter().find(|f| f.name == name)
}

/// Get formulas by category
pub fn formulas_by_category(category: FormulaCategory) -> Vec<&'static Formula> {
    FORMULAS.iter().filter(|f| f.category == category).collect()
}

/// List all formula names
pub fn list_formula_names() -> Vec<&'static str> {
    FORMULAS.iter().map(|f| f.name).collect()
}

/// Count formulas by category
pub fn count_by_category() -> HashMap<FormulaCategory, usize> {
    let mut counts = HashMap::new();
    for formula in FORMULAS {
        *counts.entry(formula.category).or_insert(0) += 1;
    }
    counts
}
