//! Error types for catalogue loading and metric resolution.

use crate::Taxonomy;
use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised by the metric registry.
///
/// Every variant is a configuration error: it points at a catalogue or
/// ingestion bug and must halt the run rather than degrade silently.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Generic name is not declared in the catalogue
    #[error("Unknown metric: {generic_name}")]
    UnknownMetric {
        /// The generic name that was looked up
        generic_name: String,
    },

    /// A native code maps to more than one generic name within a taxonomy
    #[error(
        "Ambiguous code mapping: {taxonomy}/{native_code} maps to {}",
        generic_names.join(", ")
    )]
    AmbiguousCodeMapping {
        /// Taxonomy the code belongs to
        taxonomy: Taxonomy,
        /// The offending native code
        native_code: String,
        /// Every generic name the code maps to
        generic_names: Vec<String>,
    },

    /// The same (generic, taxonomy) pair is mapped to two different codes
    #[error("Conflicting mapping for {generic_name}/{taxonomy}: {first} vs {second}")]
    ConflictingMapping {
        /// Generic name declared twice
        generic_name: String,
        /// Taxonomy of the duplicate rows
        taxonomy: Taxonomy,
        /// Code from the first row
        first: String,
        /// Code from the later row
        second: String,
    },

    /// Catalogue document has no `# version: N` header
    #[error("Catalogue is missing its version header")]
    MissingVersion,

    /// Catalogue version header could not be parsed
    #[error("Invalid catalogue version: {0}")]
    InvalidVersion(String),

    /// Catalogue row is malformed
    #[error("Invalid catalogue row {line}: {reason}")]
    InvalidRow {
        /// 1-based line number in the document
        line: u64,
        /// What is wrong with the row
        reason: String,
    },

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
