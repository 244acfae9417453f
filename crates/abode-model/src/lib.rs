#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/abode-rs/abode/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

pub mod config;
pub mod cv;
pub mod error;
pub mod estimator;
pub mod fitter;
pub mod lasso;
pub mod metrics;
pub mod predictor;
pub mod scaling;
pub mod search;

// Re-export main types
pub use config::{FitPolicy, LassoConfig, ModelConfig, SearchConfig, logspace};
pub use cv::{FoldSplit, KFold};
pub use error::{ModelError, Result};
pub use estimator::{FittedSegmentModel, fit_pipeline};
pub use fitter::{FitEvent, FitReport, SegmentFailure, SegmentFitter, SegmentModels};
pub use lasso::{FittedLasso, Lasso};
pub use metrics::{Scoring, baseline_mae, mean_absolute_error, mean_squared_error, r2_score};
pub use predictor::{Prediction, Predictor};
pub use scaling::StandardScaler;
pub use search::{Candidate, CvResult, GridSearch, SearchOutcome, candidate_grid};
