//! Period normalization.
//!
//! Reports arrive with a raw period-end date and a frequency code. This
//! module maps them onto a canonical fiscal key:
//!
//! | frequency | month      | fiscal quarter   | full year |
//! |-----------|------------|------------------|-----------|
//! | `Q`       | 1..=11     | ceil(month / 3)  | no        |
//! | `Q`       | 12         | 4                | yes       |
//! | `S`       | 6          | 2                | no        |
//! | `S`       | 12         | 4                | yes       |
//! | `Y`       | any        | 4                | yes       |
//! | `M`       | 1..=12     | ceil(month / 3)  | no        |
//! | any       | 0          | 4                | yes       |
//!
//! Month 0 only occurs in malformed source timestamps; treating it as an
//! annual report is a fallback, not a business rule.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reporting frequency of a fact.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Quarterly report
    #[display("Q")]
    Quarterly,
    /// Semi-annual report
    #[display("S")]
    SemiAnnual,
    /// Annual report
    #[display("Y")]
    Annual,
    /// Monthly report
    #[display("M")]
    Monthly,
}

impl Frequency {
    /// Parse a frequency code.
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "Q" => Ok(Self::Quarterly),
            "S" => Ok(Self::SemiAnnual),
            "Y" => Ok(Self::Annual),
            "M" => Ok(Self::Monthly),
            other => Err(DataError::UnrecognizedFrequency(other.to_string())),
        }
    }

    /// Single-letter code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Quarterly => "Q",
            Self::SemiAnnual => "S",
            Self::Annual => "Y",
            Self::Monthly => "M",
        }
    }
}

impl FromStr for Frequency {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

/// Raw period-end stamp as reported upstream.
///
/// Unlike [`NaiveDate`] this admits month 0, which some sources emit for
/// undated annual figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodEnd {
    /// Calendar year
    pub year: i32,
    /// Month in period, 0..=12
    pub month: u32,
    /// Day of month, 0 when unknown
    pub day: u32,
}

impl PeriodEnd {
    /// Period end from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Parse `YYYY-MM-DD`, `YYYY-MM`, `YYYYMMDD` or `YYYYMM`.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw.trim().chars().filter(|c| *c != '-').collect();
        let invalid = |reason: &str| DataError::Parse(format!("period end {raw:?}: {reason}"));

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("non-numeric characters"));
        }

        let (year, month, day) = match digits.len() {
            8 => (&digits[0..4], &digits[4..6], &digits[6..8]),
            6 => (&digits[0..4], &digits[4..6], "0"),
            _ => return Err(invalid("expected YYYY-MM-DD or YYYY-MM")),
        };

        let period = Self {
            year: year.parse().map_err(|_| invalid("bad year"))?,
            month: month.parse().map_err(|_| invalid("bad month"))?,
            day: day.parse().map_err(|_| invalid("bad day"))?,
        };

        if period.month > 12 {
            return Err(invalid("month out of range"));
        }
        Ok(period)
    }
}

impl fmt::Display for PeriodEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Canonical fiscal key of a reported period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Fiscal quarter, 1..=4
    pub fiscal_quarter: u8,
    /// Whether the report covers the full fiscal year
    pub is_full_year: bool,
    /// Last calendar day of the fiscal quarter
    pub period_end: NaiveDate,
}

impl FiscalPeriod {
    /// Build a fiscal period, deriving its quarter-end date.
    pub fn new(fiscal_year: i32, fiscal_quarter: u8, is_full_year: bool) -> Result<Self> {
        let period_end = quarter_end(fiscal_year, fiscal_quarter).ok_or_else(|| {
            DataError::Parse(format!("no quarter end for {fiscal_year}Q{fiscal_quarter}"))
        })?;
        Ok(Self {
            fiscal_year,
            fiscal_quarter,
            is_full_year,
            period_end,
        })
    }

    /// The `(fiscal_year, fiscal_quarter)` key.
    pub const fn key(&self) -> PeriodKey {
        PeriodKey::new(self.fiscal_year, self.fiscal_quarter)
    }
}

/// `(fiscal_year, fiscal_quarter)` ordering key.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{year}Q{quarter}")]
pub struct PeriodKey {
    /// Fiscal year
    pub year: i32,
    /// Fiscal quarter, 1..=4
    pub quarter: u8,
}

impl PeriodKey {
    /// Create a key.
    pub const fn new(year: i32, quarter: u8) -> Self {
        Self { year, quarter }
    }

    /// Monotonic quarter counter; consecutive quarters differ by exactly 1.
    pub const fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }

    /// The quarter immediately before this one.
    pub const fn previous(&self) -> Self {
        if self.quarter <= 1 {
            Self::new(self.year - 1, 4)
        } else {
            Self::new(self.year, self.quarter - 1)
        }
    }

    /// Same quarter one year earlier.
    pub const fn year_ago(&self) -> Self {
        Self::new(self.year - 1, self.quarter)
    }
}

/// Normalize a raw period end and frequency into a fiscal period.
pub fn normalize(period_end: PeriodEnd, frequency: Frequency) -> Result<FiscalPeriod> {
    let year = period_end.year;
    let invalid = |reason: &str| DataError::InvalidPeriod {
        period_end: period_end.to_string(),
        frequency: frequency.to_string(),
        reason: reason.to_string(),
    };

    match (frequency, period_end.month) {
        (_, 0) => FiscalPeriod::new(year, 4, true),
        (_, m) if m > 12 => Err(invalid("month out of range")),
        (Frequency::Annual, _) | (Frequency::Quarterly, 12) => FiscalPeriod::new(year, 4, true),
        (Frequency::Quarterly | Frequency::Monthly, m) => {
            FiscalPeriod::new(year, quarter_of_month(m), false)
        }
        (Frequency::SemiAnnual, 6) => FiscalPeriod::new(year, 2, false),
        (Frequency::SemiAnnual, 12) => FiscalPeriod::new(year, 4, true),
        (Frequency::SemiAnnual, _) => Err(invalid("semi-annual reports end in June or December")),
    }
}

/// Normalize raw string inputs (period end, frequency code).
pub fn normalize_raw(period_end: &str, frequency_code: &str) -> Result<FiscalPeriod> {
    let frequency = Frequency::from_code(frequency_code)?;
    normalize(PeriodEnd::parse(period_end)?, frequency)
}

const fn quarter_of_month(month: u32) -> u8 {
    month.div_ceil(3) as u8
}

fn quarter_end(year: i32, quarter: u8) -> Option<NaiveDate> {
    let (month, day) = match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        4 => (12, 31),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
