//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// A requested column does not exist in the table
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A column with the same name is already present
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Column length does not match the number of rows
    #[error("Length mismatch for {name}: expected {expected} rows, got {actual}")]
    LengthMismatch {
        /// Column or field being attached
        name: String,
        /// Number of rows in the table
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Table has no segment keys but a segment operation was requested
    #[error("Table is not segmented")]
    NotSegmented,

    /// Segment key outside the bedroom/density universe
    #[error("Invalid segment: {bedrooms} bedroom(s), density code {density_code}")]
    InvalidSegment {
        /// Bedroom count supplied
        bedrooms: i64,
        /// Urban-density code supplied
        density_code: i64,
    },

    /// A join or key check found duplicate or missing keys
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Missing data
    #[error("Missing data in {source_name}: {reason}")]
    MissingData {
        /// Dataset that was loaded
        source_name: String,
        /// Reason for missing data
        reason: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
