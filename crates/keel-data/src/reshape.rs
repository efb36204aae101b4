//! Long-to-wide reshaping.
//!
//! Facts arrive one line item at a time. The [`Reshaper`] groups them by
//! entity and normalized fiscal period, translates each native code into its
//! generic name through the registry's inverse lookup, and emits one
//! [`WideRecord`] per `(entity, fiscal_year, fiscal_quarter)`.
//!
//! Duplicate `(entity, period, generic_name)` facts resolve last-write-wins
//! in ingestion order. Groups in which no fact resolved to a catalogued
//! generic name are dropped. A period that received any annual-report fact
//! stays classified as an annual report.

use crate::{error::Result, fact::FactRecord, period::PeriodKey, wide::WideRecord};
use keel_registry::{MetricRegistry, Taxonomy};
use std::collections::BTreeMap;
use tracing::{debug, warn};

type GroupKey = (String, PeriodKey);

/// Reshapes long-format facts of one taxonomy into wide records.
#[derive(Debug, Clone)]
pub struct Reshaper<'a> {
    registry: &'a MetricRegistry,
    taxonomy: Taxonomy,
}

impl<'a> Reshaper<'a> {
    /// Create a reshaper for facts reported under `taxonomy`.
    pub const fn new(registry: &'a MetricRegistry, taxonomy: Taxonomy) -> Self {
        Self { registry, taxonomy }
    }

    /// Taxonomy this reshaper reads.
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Reshape facts into wide records sorted by entity and period.
    ///
    /// Fails on the first fact with an unrecognized frequency, an invalid
    /// period or a native code that maps to more than one generic name.
    pub fn reshape<'f, I>(&self, facts: I) -> Result<Vec<WideRecord>>
    where
        I: IntoIterator<Item = &'f FactRecord>,
    {
        let groups = self.group(facts)?;
        Ok(self.finish(groups))
    }

    /// Merge new facts into an existing set of wide records.
    ///
    /// A period present in `facts` replaces the existing record with the same
    /// key; all other existing records are kept as-is.
    pub fn reshape_incremental<'f, I>(
        &self,
        existing: Vec<WideRecord>,
        facts: I,
    ) -> Result<Vec<WideRecord>>
    where
        I: IntoIterator<Item = &'f FactRecord>,
    {
        let fresh = self.finish(self.group(facts)?);

        let mut merged: BTreeMap<GroupKey, WideRecord> = existing
            .into_iter()
            .map(|r| ((r.entity_id.clone(), r.key()), r))
            .collect();
        for record in fresh {
            merged.insert((record.entity_id.clone(), record.key()), record);
        }

        Ok(merged.into_values().collect())
    }

    fn group<'f, I>(&self, facts: I) -> Result<BTreeMap<GroupKey, WideRecord>>
    where
        I: IntoIterator<Item = &'f FactRecord>,
    {
        let mut groups: BTreeMap<GroupKey, WideRecord> = BTreeMap::new();
        let mut unmapped = 0usize;

        for fact in facts {
            let period = fact.fiscal_period()?;
            let record = groups
                .entry((fact.entity_id.clone(), period.key()))
                .or_insert_with(|| {
                    WideRecord::new(&fact.entity_id, self.taxonomy.clone(), period, fact.frequency)
                });

            let Some(generic) = self.registry.generic_for(&self.taxonomy, &fact.native_code)?
            else {
                unmapped += 1;
                continue;
            };

            if !fact.value.is_finite() {
                debug!(
                    entity = %fact.entity_id,
                    code = %fact.native_code,
                    "skipping non-finite fact value"
                );
                continue;
            }

            record.classify(period, fact.frequency);
            record.set(generic, fact.value);
        }

        if unmapped > 0 {
            debug!(
                taxonomy = %self.taxonomy,
                unmapped,
                "ignored facts with uncatalogued native codes"
            );
        }
        Ok(groups)
    }

    fn finish(&self, groups: BTreeMap<GroupKey, WideRecord>) -> Vec<WideRecord> {
        groups
            .into_values()
            .filter(|record| {
                let keep = !record.values.is_empty();
                if !keep {
                    warn!(
                        entity = %record.entity_id,
                        period = %record.key(),
                        taxonomy = %self.taxonomy,
                        "dropping period with no catalogued facts"
                    );
                }
                keep
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataError, period::Frequency};
    use approx::assert_relative_eq;
    use keel_registry::{Catalogue, RegistryError};
    use rstest::rstest;

    fn fact(entity: &str, code: &str, period_end: &str, freq: &str, value: f64) -> FactRecord {
        FactRecord::new(entity, code, period_end, freq, value).unwrap()
    }

    #[test]
    fn test_groups_facts_by_entity_and_period() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::bank());

        let facts = vec![
            fact("B1", "BIS_22A", "2023-03-31", "Q", 10.0),
            fact("B1", "BBS_85", "2023-03-31", "Q", 500.0),
            fact("B1", "BIS_22A", "2023-06-30", "Q", 12.0),
            fact("B2", "BIS_22A", "2023-03-31", "Q", 7.0),
        ];
        let records = reshaper.reshape(&facts).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].entity_id, "B1");
        assert_eq!(records[0].key(), PeriodKey::new(2023, 1));
        assert_eq!(records[0].get("net_income"), Some(10.0));
        assert_eq!(records[0].get("total_equity"), Some(500.0));
        assert_eq!(records[1].key(), PeriodKey::new(2023, 2));
        assert_eq!(records[2].entity_id, "B2");
    }

    #[test]
    fn test_last_write_wins() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::company());

        let facts = vec![
            fact("C1", "CIS_22", "2023-12-31", "Q", 100.0),
            fact("C1", "CIS_22", "2023-12-31", "Y", 400.0),
        ];
        let records = reshaper.reshape(&facts).unwrap();

        assert_eq!(records.len(), 1);
        assert_relative_eq!(records[0].get("net_income").unwrap(), 400.0);
        assert!(records[0].is_full_year);
        assert_eq!(records[0].source, Frequency::Annual);
    }

    #[test]
    fn test_annual_report_survives_later_quarterly_fact() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::company());

        let facts = vec![
            fact("C1", "CIS_22", "2023-12-31", "Y", 460.0),
            fact("C1", "CBS_85", "2023-12-31", "Q", 500.0),
        ];
        let records = reshaper.reshape(&facts).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, Frequency::Annual);
        assert!(records[0].is_annual_report());
        assert_eq!(records[0].get("net_income"), Some(460.0));
        assert_eq!(records[0].get("total_equity"), Some(500.0));
    }

    #[test]
    fn test_unmapped_only_period_is_dropped() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::company());

        let facts = vec![
            fact("C1", "CIS_22", "2023-03-31", "Q", 1.0),
            fact("C1", "XYZ_999", "2023-06-30", "Q", 2.0),
            fact("C1", "CIS_22", "2023-09-30", "Q", f64::NAN),
        ];
        let records = reshaper.reshape(&facts).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), PeriodKey::new(2023, 1));
    }

    #[test]
    fn test_ambiguous_code_is_fatal() {
        let catalogue = Catalogue::parse(
            "# version: 1
generic_name,display_name,unit,taxonomy,native_code
net_income,Net income,currency,bank,BIS_22A
net_income_parent,Net income to parent,currency,bank,BIS_22A
",
        )
        .unwrap();
        let registry = MetricRegistry::from_catalogue(catalogue);
        let reshaper = Reshaper::new(&registry, Taxonomy::bank());

        let facts = vec![fact("B1", "BIS_22A", "2023-03-31", "Q", 1.0)];
        let err = reshaper.reshape(&facts).unwrap_err();

        assert!(err.is_configuration());
        assert!(matches!(
            err,
            DataError::Registry(RegistryError::AmbiguousCodeMapping { .. })
        ));
    }

    #[test]
    fn test_invalid_period_is_fatal() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::company());
        let facts = vec![fact("C1", "CIS_22", "2023-09-30", "S", 1.0)];

        assert!(matches!(
            reshaper.reshape(&facts),
            Err(DataError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_incremental_overwrites_by_key() {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, Taxonomy::company());

        let first = reshaper
            .reshape(&[
                fact("C1", "CIS_22", "2023-03-31", "Q", 1.0),
                fact("C1", "CIS_22", "2023-06-30", "Q", 2.0),
            ])
            .unwrap();
        let merged = reshaper
            .reshape_incremental(first, &[fact("C1", "CIS_22", "2023-06-30", "Q", 20.0)])
            .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("net_income"), Some(1.0));
        assert_eq!(merged[1].get("net_income"), Some(20.0));
    }

    #[rstest]
    #[case(Taxonomy::company())]
    #[case(Taxonomy::bank())]
    #[case(Taxonomy::insurer())]
    #[case(Taxonomy::broker())]
    fn test_every_resolved_code_round_trips(#[case] taxonomy: Taxonomy) {
        let registry = MetricRegistry::builtin().unwrap();
        let reshaper = Reshaper::new(&registry, taxonomy.clone());

        for name in registry.generic_names_for(&taxonomy) {
            let code = registry.resolve(name, &taxonomy).unwrap().native().unwrap();
            let facts = vec![fact("E1", code, "2024-06-30", "Q", 42.0)];
            let records = reshaper.reshape(&facts).unwrap();

            assert_eq!(records.len(), 1, "{taxonomy}/{name}");
            assert_eq!(records[0].get(name), Some(42.0), "{taxonomy}/{name}");
        }
    }
}
