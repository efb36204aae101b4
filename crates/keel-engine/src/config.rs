//! Engine configuration.

use crate::{
    compositor::RatioKind,
    error::{EngineError, Result},
};
use serde::{Deserialize, Serialize};

/// Configuration for the valuation compositor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Days after a fiscal period end before its metrics may be joined (default: 0)
    pub publication_lag_days: u32,
}

/// Outlier cap for one kind of ratio.
///
/// A value is excluded from the percentile sample when it exceeds
/// `min(absolute_ceiling, median_multiple × running_median)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapConfig {
    /// Multiple of the running median above which values are capped
    pub median_multiple: f64,
    /// Hard upper bound regardless of the median
    pub absolute_ceiling: f64,
}

impl CapConfig {
    /// Cap for earnings-like ratios (PE, PS, EV/EBITDA).
    pub const EARNINGS: Self = Self {
        median_multiple: 3.0,
        absolute_ceiling: 1000.0,
    };

    /// Cap for book-like ratios (PB).
    pub const BOOK: Self = Self {
        median_multiple: 2.0,
        absolute_ceiling: 100.0,
    };

    fn validate(&self, label: &str) -> Result<()> {
        if !self.median_multiple.is_finite() || self.median_multiple <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "{label}.median_multiple must be positive, got {}",
                self.median_multiple
            )));
        }
        if self.absolute_ceiling.is_nan() || self.absolute_ceiling <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "{label}.absolute_ceiling must be positive, got {}",
                self.absolute_ceiling
            )));
        }
        Ok(())
    }
}

/// Configuration for the distribution analyzer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Cap applied to earnings-like ratios
    pub earnings_cap: CapConfig,
    /// Cap applied to book-like ratios
    pub book_cap: CapConfig,
    /// Below this many capped values the uncapped series is used (default: 20)
    pub min_capped_sample: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            earnings_cap: CapConfig::EARNINGS,
            book_cap: CapConfig::BOOK,
            min_capped_sample: 20,
        }
    }
}

impl DistributionConfig {
    /// Cap parameters for a ratio kind.
    pub const fn cap_for(&self, kind: RatioKind) -> &CapConfig {
        match kind {
            RatioKind::Earnings => &self.earnings_cap,
            RatioKind::Book => &self.book_cap,
        }
    }

    /// Reject non-positive cap parameters.
    pub fn validate(&self) -> Result<()> {
        self.earnings_cap.validate("earnings_cap")?;
        self.book_cap.validate("book_cap")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DistributionConfig::default();
        assert_eq!(config.cap_for(RatioKind::Earnings).median_multiple, 3.0);
        assert_eq!(config.cap_for(RatioKind::Book).median_multiple, 2.0);
        assert_eq!(config.min_capped_sample, 20);
        assert!(config.validate().is_ok());
        assert_eq!(CompositorConfig::default().publication_lag_days, 0);
    }

    #[test]
    fn test_invalid_cap_is_rejected() {
        let config = DistributionConfig {
            book_cap: CapConfig {
                median_multiple: 0.0,
                absolute_ceiling: 100.0,
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("book_cap"));
    }
}
