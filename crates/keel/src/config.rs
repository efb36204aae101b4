//! Pipeline configuration.

use crate::error::Result;
use keel_engine::{CompositorConfig, DistributionConfig, Lookback, RatioName};
use keel_output::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`Pipeline`](crate::Pipeline) run.
///
/// Every field has a default, so `{}` is a valid document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads; 0 lets rayon pick one per core (default: 0)
    pub workers: usize,
    /// Directory for materialized tables (default: `<data dir>/keel`)
    pub output_dir: PathBuf,
    /// Table format, `csv` or `json` (default: `csv`)
    pub output_format: String,
    /// Ratios composed for every instrument (default: all)
    pub ratios: Vec<RatioName>,
    /// Distribution window (default: 5 years)
    pub lookback: Lookback,
    /// Compositor settings
    pub compositor: CompositorConfig,
    /// Distribution analyzer settings
    pub distribution: DistributionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            output_dir: default_output_dir(),
            output_format: "csv".to_string(),
            ratios: RatioName::ALL.to_vec(),
            lookback: Lookback::default(),
            compositor: CompositorConfig::default(),
            distribution: DistributionConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keel")
}

impl PipelineConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON document from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Parsed output format.
    pub fn export_format(&self) -> Result<ExportFormat> {
        Ok(ExportFormat::from_extension(&self.output_format)?)
    }

    /// Check the settings that are not enforced by types.
    pub fn validate(&self) -> Result<()> {
        self.distribution.validate()?;
        self.export_format()?;
        Ok(())
    }
}
