//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Catalogue lookup failed
    #[error(transparent)]
    Registry(#[from] keel_registry::RegistryError),

    /// Data-layer failure
    #[error(transparent)]
    Data(#[from] keel_data::DataError),

    /// A formula table names a formula that does not exist
    #[error("Unknown formula {name:?} in table for taxonomy {taxonomy}")]
    UnknownFormula {
        /// Formula name
        name: String,
        /// Taxonomy whose table referenced it
        taxonomy: String,
    },

    /// Unknown valuation ratio name
    #[error("Unknown ratio: {0:?}")]
    UnknownRatio(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Whether this error is a configuration error that must halt the run.
    pub const fn is_configuration(&self) -> bool {
        match self {
            Self::Registry(_)
            | Self::UnknownFormula { .. }
            | Self::UnknownRatio(_)
            | Self::InvalidConfig(_) => true,
            Self::Data(e) => e.is_configuration(),
        }
    }
}
