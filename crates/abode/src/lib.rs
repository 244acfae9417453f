#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/abode-rs/abode/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod market;

// Re-export main types from sub-crates
pub use abode_data as data;
pub use abode_features as features;
pub use abode_model as model;
pub use abode_output as output;

pub use abode_data::{DataPaths, DensityCode, LoaderConfig, Observations, SegmentKey};
pub use abode_model::{FitPolicy, FitReport, ModelConfig, Prediction};
pub use error::{MarketError, Result};
pub use market::{Market, MarketModel};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
