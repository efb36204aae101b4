//! Top-level error type.

use keel_data::DataError;
use keel_engine::EngineError;
use keel_output::ExportError;
use keel_registry::RegistryError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, KeelError>;

/// Any failure surfaced by keel.
#[derive(Debug, Error)]
pub enum KeelError {
    /// Catalogue loading or resolution failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Ingestion, normalization or storage failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Calculation setup failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration document could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeelError {
    /// Whether this is a configuration error: the run must halt and the
    /// message names the offending metric, taxonomy or code.
    pub const fn is_configuration(&self) -> bool {
        match self {
            Self::Registry(_) | Self::Config(_) => true,
            Self::Data(e) => e.is_configuration(),
            Self::Engine(e) => e.is_configuration(),
            Self::Export(_) | Self::ThreadPool(_) | Self::Io(_) => false,
        }
    }
}
