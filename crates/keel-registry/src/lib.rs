#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod catalogue;
pub mod error;
pub mod handle;
pub mod registry;
pub mod taxonomy;

pub use catalogue::{Catalogue, MetricDefinition};
pub use error::{RegistryError, Result};
pub use handle::RegistryHandle;
pub use registry::{MetricRegistry, Resolution};
pub use taxonomy::Taxonomy;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
