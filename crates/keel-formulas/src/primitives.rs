//! Arithmetic building blocks.
//!
//! Every primitive propagates `None` and maps non-finite results to `None`,
//! so callers never see `NaN` or `inf`.

/// Keep a value only if it is finite.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `numerator / denominator`, or `None` if either is absent or the
/// denominator is exactly zero.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator?;
    if denominator == 0.0 {
        return None;
    }
    finite(numerator? / denominator)
}

/// Express a ratio in percent.
pub fn percentage(ratio: Option<f64>) -> Option<f64> {
    ratio.and_then(|r| finite(r * 100.0))
}

/// `(current - previous) / previous`.
pub fn period_over_period_growth(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let previous_value = previous?;
    safe_ratio(Some(current? - previous_value), previous)
}

/// Sum of two values, defined only when both are.
pub fn sum(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? + b?)
}

/// Difference of two values, defined only when both are.
pub fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? - b?)
}

/// What a trailing-twelve-month figure is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TtmSource<'a> {
    /// Four consecutive discrete quarters, oldest first
    Quarters(&'a [Option<f64>]),
    /// A full-year report, used as-is
    Annual(Option<f64>),
}

/// Trailing-twelve-month value.
///
/// Quarterly input must hold exactly four present values; anything shorter,
/// longer or with a gap is `None`. An annual report is its own TTM.
pub fn trailing_twelve_month(source: TtmSource<'_>) -> Option<f64> {
    let total = match source {
        TtmSource::Annual(value) => value,
        TtmSource::Quarters(values) if values.len() == 4 => {
            values.iter().try_fold(0.0, |acc, v| v.map(|v| acc + v))
        }
        TtmSource::Quarters(_) => None,
    };
    total.and_then(finite)
}
