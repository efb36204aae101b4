//! Valuation compositor.
//!
//! Joins a daily price series with an entity's metrics history. For each
//! trading day the most recent metrics record whose availability date
//! (period end plus the configured publication lag) is on or before the
//! trading day is used; later records are never visible. Days before the
//! first available record produce no observation at all.

use crate::{
    config::CompositorConfig,
    error::{EngineError, Result},
};
use chrono::{Days, NaiveDate};
use derive_more::Display;
use keel_data::{MetricsRecord, PriceObservation, ValuationObservation};
use keel_formulas::valuation;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Cap family a ratio belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioKind {
    /// Price over an earnings-like flow
    Earnings,
    /// Price over book value
    Book,
}

/// Valuation ratios the compositor can produce.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioName {
    /// Price over TTM earnings per share
    #[display("pe_ttm")]
    PeTtm,
    /// Price over book value per share
    #[display("pb")]
    Pb,
    /// Price over TTM revenue per share
    #[display("ps_ttm")]
    PsTtm,
    /// Enterprise value over TTM EBITDA
    #[display("ev_ebitda")]
    EvEbitda,
}

impl RatioName {
    /// Every ratio.
    pub const ALL: [Self; 4] = [Self::PeTtm, Self::Pb, Self::PsTtm, Self::EvEbitda];

    /// Stable string name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PeTtm => "pe_ttm",
            Self::Pb => "pb",
            Self::PsTtm => "ps_ttm",
            Self::EvEbitda => "ev_ebitda",
        }
    }

    /// Parse a ratio name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| EngineError::UnknownRatio(name.to_string()))
    }

    /// Cap family.
    pub const fn kind(&self) -> RatioKind {
        match self {
            Self::Pb => RatioKind::Book,
            Self::PeTtm | Self::PsTtm | Self::EvEbitda => RatioKind::Earnings,
        }
    }

    /// Ratio for one trading day against one metrics record.
    pub fn evaluate(&self, price: &PriceObservation, metrics: &MetricsRecord) -> Option<f64> {
        let close = Some(price.close_price);
        let shares = Some(price.shares_outstanding);
        match self {
            Self::PeTtm => valuation::pe(close, shares, metrics.get("net_income_ttm")),
            Self::Pb => valuation::pb(close, shares, metrics.get("total_equity")),
            Self::PsTtm => valuation::ps(close, shares, metrics.get("revenue_ttm")),
            Self::EvEbitda => {
                let ev = valuation::enterprise_value(
                    valuation::market_cap(close, shares),
                    metrics.get("total_debt"),
                    metrics.get("cash"),
                );
                valuation::ev_ebitda(ev, metrics.get("ebitda_ttm"))
            }
        }
    }
}

impl FromStr for RatioName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Builds valuation series from prices and metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    config: CompositorConfig,
}

impl Compositor {
    /// Create a compositor.
    pub const fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    /// Compose the daily series of `ratio` for `instrument_id`.
    ///
    /// `prices` rows of other instruments are ignored; `metrics` is the
    /// history of the entity behind the instrument, in any order.
    pub fn compose<'a>(
        &self,
        instrument_id: &'a str,
        ratio: RatioName,
        prices: &'a [PriceObservation],
        metrics: &'a [MetricsRecord],
    ) -> ValuationSeries<'a> {
        let mut days: Vec<&PriceObservation> = prices
            .iter()
            .filter(|p| p.instrument_id == instrument_id)
            .collect();
        days.sort_by_key(|p| p.trade_date);

        let lag = Days::new(u64::from(self.config.publication_lag_days));
        let mut published: Vec<(NaiveDate, &MetricsRecord)> = metrics
            .iter()
            .filter_map(|m| m.period_end.checked_add_days(lag).map(|d| (d, m)))
            .collect();
        published.sort_by_key(|(available, m)| (*available, m.key()));

        ValuationSeries {
            instrument_id,
            ratio,
            days,
            published,
            next_day: 0,
            next_metric: 0,
            current: None,
            last_date: None,
            skipped_before_first: 0,
        }
    }
}

/// Restartable, chronological sequence of valuation observations.
#[derive(Debug, Clone)]
pub struct ValuationSeries<'a> {
    instrument_id: &'a str,
    ratio: RatioName,
    days: Vec<&'a PriceObservation>,
    published: Vec<(NaiveDate, &'a MetricsRecord)>,
    next_day: usize,
    next_metric: usize,
    current: Option<&'a MetricsRecord>,
    last_date: Option<NaiveDate>,
    skipped_before_first: usize,
}

impl ValuationSeries<'_> {
    /// Ratio being produced.
    pub const fn ratio(&self) -> RatioName {
        self.ratio
    }

    /// Skip ahead so the next item is the first observation after `date`.
    ///
    /// The remaining items are exactly those a full run would yield after
    /// `date`.
    pub fn resume_after(mut self, date: NaiveDate) -> Self {
        while self
            .days
            .get(self.next_day)
            .is_some_and(|p| p.trade_date <= date)
        {
            let day = self.days[self.next_day].trade_date;
            self.next_day += 1;
            self.advance_metrics(day);
            self.last_date = Some(day);
        }
        self
    }

    fn advance_metrics(&mut self, day: NaiveDate) {
        while let Some(&(available, record)) = self.published.get(self.next_metric) {
            if available > day {
                break;
            }
            self.current = Some(record);
            self.next_metric += 1;
        }
    }
}

impl Iterator for ValuationSeries<'_> {
    type Item = ValuationObservation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(price) = self.days.get(self.next_day).copied() else {
                if self.skipped_before_first > 0 {
                    debug!(
                        instrument = self.instrument_id,
                        skipped = self.skipped_before_first,
                        "trading days before first published fundamentals produced no observation"
                    );
                    self.skipped_before_first = 0;
                }
                return None;
            };
            self.next_day += 1;

            if self.last_date == Some(price.trade_date) {
                warn!(
                    instrument = self.instrument_id,
                    date = %price.trade_date,
                    "duplicate trade date, skipping"
                );
                continue;
            }
            self.last_date = Some(price.trade_date);
            self.advance_metrics(price.trade_date);

            let Some(metrics) = self.current else {
                self.skipped_before_first += 1;
                continue;
            };

            return Some(ValuationObservation {
                instrument_id: self.instrument_id.to_string(),
                trade_date: price.trade_date,
                ratio_name: self.ratio.as_str().to_string(),
                ratio_value: self.ratio.evaluate(price, metrics),
            });
        }
    }
}
