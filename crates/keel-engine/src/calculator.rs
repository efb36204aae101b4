//! Entity calculators.
//!
//! A single [`EntityCalculator`] serves every taxonomy. What differs between
//! taxonomies is only the [`FormulaTable`]: the list of formula names it
//! evaluates for each fiscal period.
//!
//! # TTM window
//!
//! For a record at period `k`, a flow's trailing-twelve-month value is:
//!
//! 1. its own value when the record at `k` is an annual report (`Y`, a
//!    semi-annual full-year report, or the month-0 fallback);
//! 2. otherwise the sum over `k`, `k-1`, `k-2`, `k-3` when all four exist as
//!    discrete quarterly reports and each carries the field;
//! 3. otherwise undefined.
//!
//! A quarterly Q4 report is flagged full-year by the period normalizer but is
//! still a single quarter, so it only ever takes step 2.

use crate::error::{EngineError, Result};
use keel_data::{MetricsRecord, PeriodKey, WideRecord};
use keel_formulas::{Formula, Inputs, TtmSource, get_formula, trailing_twelve_month};
use keel_registry::{MetricRegistry, Taxonomy};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Formula names evaluated for one taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaTable {
    /// Taxonomy name the table was written for
    pub taxonomy: &'static str,
    /// Formula names, in output order
    pub formulas: &'static [&'static str],
}

impl FormulaTable {
    /// General companies.
    pub const COMPANY: Self = Self {
        taxonomy: "company",
        formulas: &[
            "net_income_ttm",
            "revenue_ttm",
            "ebitda_ttm",
            "total_equity",
            "total_debt",
            "cash",
            "shares_outstanding",
            "roe",
            "roa",
            "gross_margin",
            "operating_margin",
            "net_margin",
            "debt_to_assets",
            "current_ratio",
            "revenue_growth",
            "net_income_growth",
            "eps_ttm",
            "bvps",
        ],
    };

    /// Banks.
    pub const BANK: Self = Self {
        taxonomy: "bank",
        formulas: &[
            "net_income_ttm",
            "revenue_ttm",
            "total_equity",
            "cash",
            "shares_outstanding",
            "roe",
            "roa",
            "net_margin",
            "debt_to_assets",
            "revenue_growth",
            "net_income_growth",
            "eps_ttm",
            "bvps",
            "nim",
            "cir",
            "npl_ratio",
            "provision_coverage",
            "loan_to_deposit",
        ],
    };

    /// Insurers.
    pub const INSURER: Self = Self {
        taxonomy: "insurer",
        formulas: &[
            "net_income_ttm",
            "revenue_ttm",
            "total_equity",
            "cash",
            "shares_outstanding",
            "roe",
            "roa",
            "net_margin",
            "debt_to_assets",
            "revenue_growth",
            "net_income_growth",
            "eps_ttm",
            "bvps",
            "loss_ratio",
            "expense_ratio",
            "combined_ratio",
            "investment_yield",
        ],
    };

    /// Brokers and securities firms.
    pub const BROKER: Self = Self {
        taxonomy: "broker",
        formulas: &[
            "net_income_ttm",
            "revenue_ttm",
            "total_equity",
            "cash",
            "shares_outstanding",
            "roe",
            "roa",
            "net_margin",
            "debt_to_assets",
            "revenue_growth",
            "net_income_growth",
            "eps_ttm",
            "bvps",
            "brokerage_fee_share",
            "investment_banking_share",
            "proprietary_trading_share",
        ],
    };

    /// Built-in table for a taxonomy.
    ///
    /// Taxonomies without a dedicated table use the general company table.
    pub fn for_taxonomy(taxonomy: &Taxonomy) -> Self {
        match taxonomy.as_str() {
            "bank" => Self::BANK,
            "insurer" => Self::INSURER,
            "broker" => Self::BROKER,
            "company" => Self::COMPANY,
            other => {
                debug!(taxonomy = other, "no dedicated formula table, using company table");
                Self::COMPANY
            }
        }
    }
}

/// Computes metrics histories for entities of one taxonomy.
#[derive(Debug, Clone)]
pub struct EntityCalculator {
    taxonomy: Taxonomy,
    formulas: Vec<&'static Formula>,
}

impl EntityCalculator {
    /// Calculator using the built-in table of `taxonomy`.
    pub fn new(registry: &MetricRegistry, taxonomy: Taxonomy) -> Result<Self> {
        let table = FormulaTable::for_taxonomy(&taxonomy);
        Self::with_formulas(registry, taxonomy, table.formulas)
    }

    /// Calculator with an explicit list of formula names.
    ///
    /// Fails if a name is not a known formula, or if a formula reads a
    /// generic name the registry does not define.
    pub fn with_formulas(
        registry: &MetricRegistry,
        taxonomy: Taxonomy,
        names: &[&str],
    ) -> Result<Self> {
        let formulas = names
            .iter()
            .map(|name| -> Result<&'static Formula> {
                let formula = get_formula(name).ok_or_else(|| EngineError::UnknownFormula {
                    name: (*name).to_string(),
                    taxonomy: taxonomy.to_string(),
                })?;
                for input in formula.inputs {
                    registry.require(input)?;
                }
                Ok(formula)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { taxonomy, formulas })
    }

    /// Taxonomy this calculator serves.
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Names of the metrics each record will carry.
    pub fn metric_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formulas.iter().map(|f| f.name)
    }

    /// Compute the chronological metrics history of `entity_id`.
    ///
    /// Records of other entities or taxonomies are ignored. A period key seen
    /// twice is an integrity violation: the later record is skipped. Periods
    /// where every metric is undefined are omitted.
    pub fn compute(&self, entity_id: &str, records: &[WideRecord]) -> Vec<MetricsRecord> {
        let mut periods: BTreeMap<PeriodKey, &WideRecord> = BTreeMap::new();

        for record in records.iter().filter(|r| r.entity_id == entity_id) {
            if record.taxonomy != self.taxonomy {
                warn!(
                    entity = entity_id,
                    expected = %self.taxonomy,
                    found = %record.taxonomy,
                    "skipping record from another taxonomy"
                );
                continue;
            }
            if periods.contains_key(&record.key()) {
                warn!(
                    entity = entity_id,
                    period = %record.key(),
                    "duplicate period reached calculator, skipping later record"
                );
                continue;
            }
            periods.insert(record.key(), record);
        }

        let mut history = Vec::with_capacity(periods.len());
        for record in periods.values() {
            let window = TtmWindow {
                periods: &periods,
                current: record,
            };

            let values: BTreeMap<String, Option<f64>> = self
                .formulas
                .iter()
                .map(|f| (f.name.to_string(), f.evaluate(&window)))
                .collect();

            if values.values().all(Option::is_none) {
                debug!(
                    entity = entity_id,
                    period = %record.key(),
                    "no metric defined for period, omitting"
                );
                continue;
            }

            history.push(MetricsRecord {
                entity_id: entity_id.to_string(),
                taxonomy: self.taxonomy.clone(),
                fiscal_year: record.fiscal_year,
                fiscal_quarter: record.fiscal_quarter,
                period_end: record.period_end,
                values,
            });
        }
        history
    }
}

/// Formula inputs for one period, backed by the entity's full history.
#[derive(Debug)]
struct TtmWindow<'a> {
    periods: &'a BTreeMap<PeriodKey, &'a WideRecord>,
    current: &'a WideRecord,
}

impl TtmWindow<'_> {
    fn ttm_at(&self, key: PeriodKey, name: &str) -> Option<f64> {
        let record = self.periods.get(&key)?;

        if record.is_annual_report() {
            return trailing_twelve_month(TtmSource::Annual(record.get(name)));
        }

        // A quarterly Q4 is flagged full-year but still holds a single quarter.
        let mut quarters = [None; 4];
        let mut cursor = key;
        for slot in quarters.iter_mut().rev() {
            match self.periods.get(&cursor) {
                Some(q) if q.is_discrete_quarter() => *slot = q.get(name),
                _ => return None,
            }
            cursor = cursor.previous();
        }
        trailing_twelve_month(TtmSource::Quarters(&quarters))
    }
}

impl Inputs for TtmWindow<'_> {
    fn point(&self, name: &str) -> Option<f64> {
        self.current.get(name)
    }

    fn ttm(&self, name: &str) -> Option<f64> {
        self.ttm_at(self.current.key(), name)
    }

    fn prior_ttm(&self, name: &str) -> Option<f64> {
        self.ttm_at(self.current.key().year_ago(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use keel_data::{FiscalPeriod, Frequency};
    use rstest::rstest;

    fn record(
        taxonomy: Taxonomy,
        year: i32,
        quarter: u8,
        source: Frequency,
        values: &[(&str, f64)],
    ) -> WideRecord {
        let full_year = quarter == 4 && source != Frequency::Monthly;
        let period = FiscalPeriod::new(year, quarter, full_year).unwrap();
        let mut record = WideRecord::new("E1", taxonomy, period, source);
        for (name, value) in values {
            record.set(name, *value);
        }
        record
    }

    fn company_quarters(net_income: [f64; 4]) -> Vec<WideRecord> {
        (1..=4)
            .map(|q| {
                let mut values = vec![("net_income", net_income[q as usize - 1])];
                if q == 4 {
                    values.push(("total_equity", 500.0));
                }
                record(Taxonomy::company(), 2023, q, Frequency::Quarterly, &values)
            })
            .collect()
    }

    #[test]
    fn test_roe_on_full_window() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let history = calculator.compute("E1", &company_quarters([100.0, 110.0, 120.0, 130.0]));
        let q4 = history.iter().find(|r| r.fiscal_quarter == 4).unwrap();

        assert_relative_eq!(q4.get("net_income_ttm").unwrap(), 460.0);
        assert_relative_eq!(q4.get("roe").unwrap(), 92.0, epsilon = 1e-9);
    }

    #[test]
    fn test_incomplete_window_degrades_single_metric() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let mut records = company_quarters([100.0, 110.0, 120.0, 130.0]);
        records.remove(1);
        let history = calculator.compute("E1", &records);
        let q4 = history.iter().find(|r| r.fiscal_quarter == 4).unwrap();

        // Three quarters are not a year, even when the last one is a Q4.
        assert_eq!(q4.get("net_income_ttm"), None);
        assert_eq!(q4.get("roe"), None);
        assert_eq!(q4.get("total_equity"), Some(500.0));
    }

    #[test]
    fn test_annual_total_is_not_summed_with_quarters() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let mut records = company_quarters([100.0, 110.0, 120.0, 0.0]);
        records[3] = record(
            Taxonomy::company(),
            2023,
            4,
            Frequency::Annual,
            &[("net_income", 460.0), ("total_equity", 500.0)],
        );
        let history = calculator.compute("E1", &records);
        let q4 = history.iter().find(|r| r.fiscal_quarter == 4).unwrap();

        assert_relative_eq!(q4.get("net_income_ttm").unwrap(), 460.0);
        assert_relative_eq!(q4.get("roe").unwrap(), 92.0, epsilon = 1e-9);
    }

    #[test]
    fn test_annual_report_is_its_own_ttm() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let records = vec![record(
            Taxonomy::company(),
            2022,
            4,
            Frequency::Annual,
            &[("net_income", 100.0), ("total_equity", 400.0)],
        )];
        let history = calculator.compute("E1", &records);

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].get("net_income_ttm"), Some(100.0));
        assert_relative_eq!(history[0].get("roe").unwrap(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_semi_annual_half_year_has_no_ttm() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::bank()).unwrap();

        let records = vec![record(
            Taxonomy::bank(),
            2023,
            2,
            Frequency::SemiAnnual,
            &[("net_income", 50.0), ("total_equity", 900.0)],
        )];
        let history = calculator.compute("E1", &records);

        assert_eq!(history[0].get("net_income_ttm"), None);
        assert_eq!(history[0].get("total_equity"), Some(900.0));
    }

    #[test]
    fn test_growth_uses_year_ago_window() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let records = vec![
            record(Taxonomy::company(), 2022, 4, Frequency::Annual, &[("revenue", 100.0)]),
            record(Taxonomy::company(), 2023, 4, Frequency::Annual, &[("revenue", 125.0)]),
        ];
        let history = calculator.compute("E1", &records);

        assert_eq!(history[0].get("revenue_growth"), None);
        assert_relative_eq!(history[1].get("revenue_growth").unwrap(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_period_keeps_first() {
        let registry = MetricRegistry::builtin().unwrap();
        let calculator = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        let records = vec![
            record(Taxonomy::company(), 2023, 4, Frequency::Annual, &[("revenue", 1.0)]),
            record(Taxonomy::company(), 2023, 4, Frequency::Annual, &[("revenue", 2.0)]),
        ];
        let history = calculator.compute("E1", &records);

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].get("revenue_ttm"), Some(1.0));
    }

    #[test]
    fn test_bank_only_metrics() {
        let registry = MetricRegistry::builtin().unwrap();
        let bank = EntityCalculator::new(&registry, Taxonomy::bank()).unwrap();
        let company = EntityCalculator::new(&registry, Taxonomy::company()).unwrap();

        assert!(bank.metric_names().any(|n| n == "nim"));
        assert!(!company.metric_names().any(|n| n == "nim"));
    }

    #[rstest]
    #[case(Taxonomy::company())]
    #[case(Taxonomy::bank())]
    #[case(Taxonomy::insurer())]
    #[case(Taxonomy::broker())]
    #[case(Taxonomy::new("trust"))]
    fn test_builtin_tables_validate(#[case] taxonomy: Taxonomy) {
        let registry = MetricRegistry::builtin().unwrap();
        assert!(EntityCalculator::new(&registry, taxonomy).is_ok());
    }

    #[test]
    fn test_unknown_formula_is_configuration_error() {
        let registry = MetricRegistry::builtin().unwrap();
        let err =
            EntityCalculator::with_formulas(&registry, Taxonomy::company(), &["roe", "pegy"])
                .unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, EngineError::UnknownFormula { ref name, .. } if name == "pegy"));
    }
}
