//! Distribution analyzer.
//!
//! Summarizes the history of one valuation ratio into percentile bands and
//! ranks the latest value against them.
//!
//! Outliers are capped in a first pass: walking the window chronologically,
//! a value is kept only if it does not exceed
//! `min(absolute_ceiling, median_multiple × median of all earlier values)`.
//! The median is taken over the earlier values before capping, and only
//! applies while it is positive. If fewer than `min_capped_sample` values
//! survive, the uncapped window is used instead. The current value is always
//! the latest uncapped observation.

use crate::{
    compositor::RatioName,
    config::{CapConfig, DistributionConfig},
    error::Result,
};
use chrono::{Days, Months, NaiveDate};
use keel_data::ValuationObservation;
use serde::{Deserialize, Serialize};

/// How far back from the latest observation the window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookback {
    /// Calendar years
    Years(u32),
    /// Calendar days
    Days(u32),
    /// Entire history
    All,
}

impl Default for Lookback {
    fn default() -> Self {
        Self::Years(5)
    }
}

impl Lookback {
    /// First date inside the window ending at `as_of`; `None` when unbounded.
    pub fn start(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Years(n) => as_of.checked_sub_months(Months::new(n.saturating_mul(12))),
            Self::Days(n) => as_of.checked_sub_days(Days::new(u64::from(n))),
            Self::All => None,
        }
    }
}

/// Percentile summary of one ratio for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Instrument identifier
    pub instrument_id: String,
    /// Ratio summarized
    pub ratio_name: RatioName,
    /// Date of the latest observation in the window
    pub as_of_date: NaiveDate,
    /// 5th percentile
    pub p5: f64,
    /// 25th percentile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
    /// Latest uncapped value
    pub current_value: f64,
    /// Rank of the current value in the sample, 0..=100
    pub current_percentile: f64,
    /// Number of values the percentiles were computed from
    pub sample_size: usize,
    /// Whether the capped sample was used
    pub used_capped: bool,
}

/// Computes [`DistributionSummary`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionAnalyzer {
    config: DistributionConfig,
}

impl DistributionAnalyzer {
    /// Create an analyzer, validating the cap configuration.
    pub fn new(config: DistributionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Summarize `ratio` for `instrument_id` over `lookback`.
    ///
    /// Observations of other instruments or ratios are ignored, as are
    /// undefined values. Returns `None` if no defined value remains.
    pub fn summarize(
        &self,
        instrument_id: &str,
        ratio: RatioName,
        observations: &[ValuationObservation],
        lookback: Lookback,
    ) -> Option<DistributionSummary> {
        let mut series: Vec<(NaiveDate, f64)> = observations
            .iter()
            .filter(|o| o.instrument_id == instrument_id && o.ratio_name == ratio.as_str())
            .filter_map(|o| {
                o.ratio_value
                    .filter(|v| v.is_finite())
                    .map(|v| (o.trade_date, v))
            })
            .collect();
        series.sort_by_key(|(date, _)| *date);

        let &(as_of_date, current_value) = series.last()?;
        let start = lookback.start(as_of_date);
        let window: Vec<f64> = series
            .iter()
            .filter(|(date, _)| start.is_none_or(|s| *date >= s))
            .map(|(_, v)| *v)
            .collect();

        let capped = cap_outliers(&window, self.config.cap_for(ratio.kind()));
        let used_capped = capped.len() >= self.config.min_capped_sample;
        let mut sample = if used_capped { capped } else { window };
        sample.sort_by(f64::total_cmp);

        Some(DistributionSummary {
            instrument_id: instrument_id.to_string(),
            ratio_name: ratio,
            as_of_date,
            p5: percentile(&sample, 5.0)?,
            p25: percentile(&sample, 25.0)?,
            p50: percentile(&sample, 50.0)?,
            p75: percentile(&sample, 75.0)?,
            p95: percentile(&sample, 95.0)?,
            current_value,
            current_percentile: percentile_rank(current_value, &sample),
            sample_size: sample.len(),
            used_capped,
        })
    }
}

/// Drop values above the running-median cap, preserving order.
pub fn cap_outliers(values: &[f64], cap: &CapConfig) -> Vec<f64> {
    let mut seen: Vec<f64> = Vec::with_capacity(values.len());
    let mut kept = Vec::with_capacity(values.len());

    for &value in values {
        let mut limit = cap.absolute_ceiling;
        if let Some(median) = sorted_median(&seen).filter(|m| *m > 0.0) {
            limit = limit.min(cap.median_multiple * median);
        }
        if value <= limit {
            kept.push(value);
        }

        let at = seen.partition_point(|x| *x < value);
        seen.insert(at, value);
    }
    kept
}

fn sorted_median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Percentile of a sorted sample by linear interpolation between order statistics.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    })
}

/// Rank of `value` within `sample`, in percent; ties count as half.
pub fn percentile_rank(value: f64, sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 50.0;
    }
    let below = sample.iter().filter(|&&x| x < value).count();
    let equal = sample.iter().filter(|&&x| x == value).count();
    (below as f64 + 0.5 * equal as f64) / sample.len() as f64 * 100.0
}
