#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export the workspace crates
pub use keel_data as data;
pub use keel_engine as engine;
pub use keel_formulas as formulas;
pub use keel_output as output;
pub use keel_registry as registry;

pub use config::PipelineConfig;
pub use error::{KeelError, Result};
pub use pipeline::{Pipeline, PipelineInput, PipelineRun};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
