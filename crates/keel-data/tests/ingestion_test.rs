//! Integration tests for fact ingestion, storage and reshaping.

use keel_data::{
    FactRecord, Frequency, PeriodEnd, PeriodKey, Reshaper, SqliteStore, facts_from_frame,
    normalize,
};
use keel_registry::{MetricRegistry, Taxonomy};
use polars::prelude::*;
use proptest::prelude::*;

#[test]
fn test_frame_to_store_to_wide_records() {
    let df = DataFrame::new(vec![
        Series::new("entity_id".into(), vec!["B1", "B1", "B1", "B1"]).into(),
        Series::new("native_code".into(), vec!["BIS_22A", "BBS_85", "BIS_03", "ZZZ_01"]).into(),
        Series::new(
            "period_end".into(),
            vec!["2023-06-30", "2023-06-30", "2023-12-31", "2023-12-31"],
        )
        .into(),
        Series::new("frequency".into(), vec!["S", "S", "S", "S"]).into(),
        Series::new("value".into(), vec![50.0, 900.0, 30.0, 1.0]).into(),
    ])
    .unwrap();

    let facts = facts_from_frame(&df).unwrap();
    let store = SqliteStore::in_memory().unwrap();
    store.put_facts(&Taxonomy::bank(), &facts).unwrap();

    let registry = MetricRegistry::builtin().unwrap();
    let reshaper = Reshaper::new(&registry, Taxonomy::bank());
    let records = reshaper
        .reshape(&store.get_facts(&Taxonomy::bank()).unwrap())
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key(), PeriodKey::new(2023, 2));
    assert!(!records[0].is_full_year);
    assert_eq!(records[0].get("total_equity"), Some(900.0));
    assert_eq!(records[1].key(), PeriodKey::new(2023, 4));
    assert!(records[1].is_full_year);
    assert_eq!(records[1].source, Frequency::SemiAnnual);
    assert_eq!(records[1].values.len(), 1);
}

#[test]
fn test_reingestion_does_not_duplicate_periods() {
    let registry = MetricRegistry::builtin().unwrap();
    let reshaper = Reshaper::new(&registry, Taxonomy::insurer());
    let fact = |v: f64| FactRecord::new("I1", "IIS_03", "2024-03-31", "Q", v).unwrap();

    let first = reshaper.reshape(&[fact(1.0)]).unwrap();
    let second = reshaper.reshape_incremental(first.clone(), &[fact(2.0)]).unwrap();
    let third = reshaper.reshape_incremental(second.clone(), &[fact(2.0)]).unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].get("net_premiums_earned"), Some(2.0));
    assert_eq!(second, third);
}

proptest! {
    #[test]
    fn prop_quarter_is_ceil_of_month(year in 1990i32..2100, month in 1u32..=11) {
        let period = normalize(PeriodEnd { year, month, day: 28 }, Frequency::Quarterly).unwrap();
        prop_assert_eq!(u32::from(period.fiscal_quarter), month.div_ceil(3));
        prop_assert!(!period.is_full_year);
        prop_assert_eq!(period.fiscal_year, year);
    }

    #[test]
    fn prop_annual_is_always_full_year_q4(year in 1990i32..2100, month in 0u32..=12) {
        let period = normalize(PeriodEnd { year, month, day: 0 }, Frequency::Annual).unwrap();
        prop_assert_eq!(period.fiscal_quarter, 4);
        prop_assert!(period.is_full_year);
    }
}
