#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calculator;
pub mod compositor;
pub mod config;
pub mod distribution;
pub mod error;

pub use calculator::{EntityCalculator, FormulaTable};
pub use compositor::{Compositor, RatioKind, RatioName, ValuationSeries};
pub use config::{CapConfig, CompositorConfig, DistributionConfig};
pub use distribution::{DistributionAnalyzer, DistributionSummary, Lookback};
pub use error::{EngineError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
