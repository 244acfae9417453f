//! Error types for feature transforms.

use abode_data::DataError;
use thiserror::Error;

/// Result type alias for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while building or applying a feature transform.
///
/// Every variant names the pipeline stage that failed.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A column required by a stage is absent
    #[error("{stage}: missing required column '{column}'")]
    MissingColumn {
        /// Failing stage
        stage: String,
        /// Missing column
        column: String,
    },

    /// A stage would produce a column that already exists
    #[error("{stage}: column '{column}' already exists")]
    DuplicateColumn {
        /// Failing stage
        stage: String,
        /// Clashing column
        column: String,
    },

    /// A stage parameter is invalid
    #[error("{stage}: invalid parameter: {reason}")]
    InvalidParameter {
        /// Failing stage
        stage: String,
        /// What is wrong
        reason: String,
    },

    /// Too few rows for the stage
    #[error("{stage}: needs at least {required} rows, got {actual}")]
    InsufficientData {
        /// Failing stage
        stage: String,
        /// Minimum number of rows
        required: usize,
        /// Number of rows supplied
        actual: usize,
    },

    /// A series transform received rows that are not one date-ordered series
    #[error("{stage}: rows must form a single series with strictly increasing dates")]
    NotASeries {
        /// Failing stage
        stage: String,
    },

    /// Underlying table error
    #[error(transparent)]
    Data(#[from] DataError),
}
