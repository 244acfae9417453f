//! Error types for market models.

use abode_data::DataError;
use abode_features::FeatureError;
use abode_model::ModelError;
use thiserror::Error;

/// Errors raised while loading, fitting or predicting a market.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Loading or joining data failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// A feature transform was misconfigured or could not run
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Fitting or prediction failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A market name could not be parsed
    #[error("Unknown market '{0}', expected 'price' or 'rent'")]
    UnknownMarket(String),
}

/// Result type for market operations
pub type Result<T> = std::result::Result<T, MarketError>;
