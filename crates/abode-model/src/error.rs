//! Error types for model fitting and prediction.

use abode_data::{DataError, SegmentKey};
use abode_features::FeatureError;
use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

fn join_keys(keys: &[SegmentKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while fitting or evaluating segment models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Feature transform error
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    /// Table error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// No fitted model for the requested segment
    #[error("Segment not fitted: {bedrooms} bedroom(s), density code {density_code}")]
    SegmentNotFitted {
        /// Requested bedroom count
        bedrooms: i64,
        /// Requested density code
        density_code: i64,
    },

    /// A segment has no training rows
    #[error("Segment {0} has no training rows")]
    EmptySegment(SegmentKey),

    /// Too few observations
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Training or prediction input contains NaN or infinity
    #[error("Non-finite value in column '{0}'")]
    NonFinite(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fitting one segment failed
    #[error("Fit failed for segment {segment}: {source}")]
    SegmentFit {
        /// Segment whose fit failed
        segment: SegmentKey,
        /// Underlying failure
        #[source]
        source: Box<ModelError>,
    },

    /// Some segments failed under the best-effort policy
    #[error("{} segment(s) failed to fit: {}", .failed.len(), join_keys(.failed))]
    PartialFit {
        /// Segments without a model
        failed: Vec<SegmentKey>,
    },
}

impl ModelError {
    /// Missing-model error for a key.
    pub fn not_fitted(key: SegmentKey) -> Self {
        Self::SegmentNotFitted {
            bedrooms: i64::from(key.bedrooms()),
            density_code: i64::from(key.density_code()),
        }
    }
}
