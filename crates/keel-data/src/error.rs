//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Catalogue lookup failed (unknown metric, ambiguous code)
    #[error(transparent)]
    Registry(#[from] keel_registry::RegistryError),

    /// Frequency code outside {Q, S, Y, M}
    #[error("Unrecognized frequency code: {0:?}")]
    UnrecognizedFrequency(String),

    /// Period end that cannot be mapped to a fiscal quarter
    #[error("Invalid period {period_end} for frequency {frequency}: {reason}")]
    InvalidPeriod {
        /// Raw period end as reported
        period_end: String,
        /// Frequency code of the fact
        frequency: String,
        /// Why the period was rejected
        reason: String,
    },

    /// Missing required column in an input frame
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl DataError {
    /// Whether this error signals a catalogue or ingestion bug that must halt the run.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Registry(_) | Self::UnrecognizedFrequency(_) | Self::InvalidPeriod { .. }
        )
    }
}
