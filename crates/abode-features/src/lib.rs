#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/abode-rs/abode/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod derivative;
pub mod error;
pub mod periodic;
pub mod pipeline;
pub mod select;
pub mod smooth;
pub mod transform;

pub use derivative::{Derivatives, derivative_column, gradient};
pub use error::{FeatureError, Result};
pub use periodic::{MAX_HARMONICS, PeriodicExpansion};
pub use pipeline::FeaturePipeline;
pub use select::SelectFeatures;
pub use smooth::{SAVGOL_SUFFIX, SavgolFilter, SmoothingConfig, savgol};
pub use transform::Transform;
