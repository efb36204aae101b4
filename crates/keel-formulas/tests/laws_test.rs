//! Property tests for the formula primitives.

use keel_formulas::{
    TtmSource, percentage, period_over_period_growth, safe_ratio, trailing_twelve_month,
};
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -1.0e9..1.0e9f64
}

proptest! {
    #[test]
    fn prop_safe_ratio_undefined_iff_denominator_zero_or_absent(
        numerator in proptest::option::of(finite()),
        denominator in proptest::option::of(finite()),
    ) {
        let result = safe_ratio(numerator, denominator);
        let expect_none = numerator.is_none() || denominator.is_none_or(|d| d == 0.0);
        prop_assert_eq!(result.is_none(), expect_none);
    }

    #[test]
    fn prop_safe_ratio_zero_denominator(numerator in finite()) {
        prop_assert_eq!(safe_ratio(Some(numerator), Some(0.0)), None);
    }

    #[test]
    fn prop_ttm_of_four_quarters_is_their_sum(quarters in proptest::array::uniform4(finite())) {
        let values = quarters.map(Some);
        let ttm = trailing_twelve_month(TtmSource::Quarters(&values)).unwrap();
        let expected: f64 = quarters.iter().sum();
        prop_assert!((ttm - expected).abs() <= 1e-6 * expected.abs().max(1.0));
    }

    #[test]
    fn prop_ttm_with_gap_is_undefined(
        quarters in proptest::array::uniform4(finite()),
        gap in 0usize..4,
    ) {
        let mut values = quarters.map(Some);
        values[gap] = None;
        prop_assert_eq!(trailing_twelve_month(TtmSource::Quarters(&values)), None);
        prop_assert_eq!(trailing_twelve_month(TtmSource::Quarters(&values[..3])), None);
    }

    #[test]
    fn prop_annual_ttm_is_identity(value in finite()) {
        prop_assert_eq!(trailing_twelve_month(TtmSource::Annual(Some(value))), Some(value));
    }

    #[test]
    fn prop_growth_inverts(previous in 1.0..1.0e6f64, rate in -0.99..10.0f64) {
        let current = previous * (1.0 + rate);
        let growth = period_over_period_growth(Some(current), Some(previous)).unwrap();
        prop_assert!((growth - rate).abs() < 1e-9);
        prop_assert!(percentage(Some(growth)).is_some());
    }
}

#[test]
fn test_ttm_law_examples() {
    let quarters = [Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
    assert_eq!(trailing_twelve_month(TtmSource::Quarters(&quarters)), Some(100.0));
    assert_eq!(trailing_twelve_month(TtmSource::Quarters(&quarters[1..])), None);
    assert_eq!(trailing_twelve_month(TtmSource::Annual(Some(100.0))), Some(100.0));
}
