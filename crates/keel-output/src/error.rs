//! Error types for keel-output.

use thiserror::Error;

/// Errors that can occur while exporting or writing tables.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
